use std::collections::HashMap;
use std::net::IpAddr;

use parking_lot::Mutex;

use crate::error::SecurityError;
use crate::web::session::{MapSession, SessionHandle};

/// Opaque view of an inbound request: the pieces this layer consumes (remote
/// address, cookies, parameters) plus the container-session slot the host
/// transport may populate. Header parsing and transport mechanics stay
/// outside.
#[derive(Debug, Default)]
pub struct WebRequest {
    pub remote_addr: Option<IpAddr>,
    pub cookies: HashMap<String, String>,
    pub params: HashMap<String, String>,
    // The transport's own session, minted on demand in container mode.
    container_session: Mutex<Option<SessionHandle>>,
    container_sessions_disabled: bool,
}

impl WebRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remote_addr(mut self, addr: IpAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Marks this request as coming from a transport that cannot supply
    /// container sessions. Container-mode session starts will then fail.
    pub fn without_container_sessions(mut self) -> Self {
        self.container_sessions_disabled = true;
        self
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }

    pub fn param(&self, name: &str) -> Option<String> {
        self.params.get(name).cloned()
    }

    /// The session the transport attached to this request, if any.
    pub fn container_session(&self) -> Option<SessionHandle> {
        self.container_session.lock().clone()
    }

    /// Lets a host transport attach its session before resolution runs.
    pub fn attach_container_session(&self, session: SessionHandle) {
        *self.container_session.lock() = Some(session);
    }

    /// Existing container session, or a newly minted one. The servlet-style
    /// `getSession(true)` analog.
    pub fn start_container_session(&self) -> Result<SessionHandle, SecurityError> {
        let mut slot = self.container_session.lock();
        if let Some(existing) = slot.as_ref() {
            return Ok(existing.clone());
        }
        if self.container_sessions_disabled {
            return Err(SecurityError::ContainerSessionUnavailable);
        }
        let session: SessionHandle = std::sync::Arc::new(MapSession::new());
        *slot = Some(session.clone());
        Ok(session)
    }
}

/// Opaque view of the outbound response: a cookie sink and the committed flag.
/// Once the response is committed no further cookie can be written; the write
/// paths check this so the ordering violation surfaces as a typed error
/// instead of a silently dropped header.
#[derive(Debug, Default)]
pub struct WebResponse {
    cookies: Vec<(String, String)>,
    committed: bool,
}

impl WebResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cookie(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), SecurityError> {
        if self.committed {
            return Err(SecurityError::ResponseCommitted);
        }
        self.cookies.push((name.into(), value.into()));
        Ok(())
    }

    /// Last written value for a named cookie, if any.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn cookies(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cookies.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Marks the header block as flushed. Cookie writes fail from here on.
    pub fn commit(&mut self) {
        self.committed = true;
    }

    pub fn committed(&self) -> bool {
        self.committed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::session::Session;

    #[test]
    fn cookie_write_after_commit_is_rejected() {
        let mut resp = WebResponse::new();
        resp.set_cookie("a", "1").unwrap();
        resp.commit();
        let err = resp.set_cookie("b", "2");
        assert!(matches!(err, Err(SecurityError::ResponseCommitted)));
        assert_eq!(resp.cookie("a"), Some("1"));
        assert_eq!(resp.cookie("b"), None);
    }

    #[test]
    fn container_session_is_minted_once() {
        let req = WebRequest::new();
        assert!(req.container_session().is_none());
        let first = req.start_container_session().unwrap();
        let second = req.start_container_session().unwrap();
        assert_eq!(first.id(), second.id());
    }

    #[test]
    fn disabled_transport_cannot_mint_sessions() {
        let req = WebRequest::new().without_container_sessions();
        assert!(matches!(
            req.start_container_session(),
            Err(SecurityError::ContainerSessionUnavailable)
        ));
    }
}
