use std::marker::PhantomData;
use std::str::FromStr;

use tracing::trace;

use crate::error::SecurityError;
use crate::web::request::{WebRequest, WebResponse};

pub const DEFAULT_REMEMBER_ME_COOKIE_NAME: &str = "rememberMe";

/// A single named cookie read/written through the request/response pair.
/// Optionally falls back to a request parameter of the same name on the read
/// path (off by default; remember-me tokens should only travel in cookies).
#[derive(Debug, Clone)]
pub struct CookieStore<T = String> {
    name: String,
    check_request_params: bool,
    _value: PhantomData<fn() -> T>,
}

impl<T> CookieStore<T>
where
    T: FromStr + ToString,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), check_request_params: false, _value: PhantomData }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn check_request_params(&self) -> bool {
        self.check_request_params
    }

    pub fn set_check_request_params(&mut self, check: bool) {
        self.check_request_params = check;
    }

    /// The stored value, if present and parsable. Blank and unparsable values
    /// resolve to `None`; client-supplied data never raises an error here.
    pub fn retrieve_value(&self, request: &WebRequest) -> Option<T> {
        let raw = request.cookie(&self.name).or_else(|| {
            if self.check_request_params {
                request.param(&self.name)
            } else {
                None
            }
        })?;
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                trace!(cookie = %self.name, "cookie_value_unparsable");
                None
            }
        }
    }

    /// Writes the value to the response. Fails only when the response has
    /// already been committed.
    pub fn store_value(&self, value: &T, response: &mut WebResponse) -> Result<(), SecurityError> {
        response.set_cookie(self.name.clone(), value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_wins_and_blank_is_absent() {
        let store: CookieStore = CookieStore::new("tok");
        let req = WebRequest::new().with_cookie("tok", "abc");
        assert_eq!(store.retrieve_value(&req), Some("abc".to_string()));

        let blank = WebRequest::new().with_cookie("tok", "   ");
        assert_eq!(store.retrieve_value(&blank), None);
    }

    #[test]
    fn param_fallback_is_opt_in() {
        let req = WebRequest::new().with_param("tok", "from-param");

        let store: CookieStore = CookieStore::new("tok");
        assert_eq!(store.retrieve_value(&req), None);

        let mut with_params: CookieStore = CookieStore::new("tok");
        with_params.set_check_request_params(true);
        assert_eq!(with_params.retrieve_value(&req), Some("from-param".to_string()));
    }

    #[test]
    fn unparsable_typed_value_is_absent() {
        let store: CookieStore<u32> = CookieStore::new("n");
        let req = WebRequest::new().with_cookie("n", "not-a-number");
        assert_eq!(store.retrieve_value(&req), None);

        let ok = WebRequest::new().with_cookie("n", "17");
        assert_eq!(store.retrieve_value(&ok), Some(17));
    }

    #[test]
    fn store_respects_commit() {
        let store: CookieStore = CookieStore::new("tok");
        let mut resp = WebResponse::new();
        store.store_value(&"v".to_string(), &mut resp).unwrap();
        assert_eq!(resp.cookie("tok"), Some("v"));
        resp.commit();
        assert!(store.store_value(&"w".to_string(), &mut resp).is_err());
    }
}
