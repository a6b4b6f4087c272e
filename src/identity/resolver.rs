use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::web::cookies::CookieStore;
use crate::web::request::WebRequest;
use crate::web::session::SessionHandle;

use super::principal::PrincipalCollection;
use super::serializer::PrincipalSerializer;

/// Session attribute holding the subject's principal collection.
pub const PRINCIPALS_SESSION_KEY: &str = "palisade.principals";

/// Session attribute marking that the identity was established by a verified
/// login in this session, as opposed to recalled from a persistent cookie.
pub const AUTHENTICATED_SESSION_KEY: &str = "palisade.authenticated";

/// Where a resolved identity came from. Kept tagged so trust derivation never
/// conflates "known" with "authenticated": a remembered identity is a
/// convenience identity, not a verified one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedIdentity {
    /// Principals read from the session. Highest precedence.
    Session(PrincipalCollection),
    /// Principals recalled from the remember-me cookie.
    Remembered(PrincipalCollection),
    /// No identity from either source: an anonymous request.
    Anonymous,
}

impl ResolvedIdentity {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, ResolvedIdentity::Anonymous)
    }

    pub fn is_remembered(&self) -> bool {
        matches!(self, ResolvedIdentity::Remembered(_))
    }

    pub fn into_principals(self) -> PrincipalCollection {
        match self {
            ResolvedIdentity::Session(p) | ResolvedIdentity::Remembered(p) => p,
            ResolvedIdentity::Anonymous => PrincipalCollection::new(),
        }
    }
}

/// Merges the two identity sources with session-before-cookie precedence.
/// Resolution is read-only and fail-soft: absent or malformed optional state
/// degrades to `Anonymous`, never to an error.
pub struct IdentityResolver<'a> {
    remember_me_store: &'a CookieStore<String>,
    serializer: Option<&'a dyn PrincipalSerializer>,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(
        remember_me_store: &'a CookieStore<String>,
        serializer: Option<&'a dyn PrincipalSerializer>,
    ) -> Self {
        Self { remember_me_store, serializer }
    }

    /// Session principals first; else the remember-me cookie. Cookie-derived
    /// principals are not written back into the session here.
    pub fn resolve_principals(
        &self,
        session: Option<&SessionHandle>,
        request: &WebRequest,
    ) -> ResolvedIdentity {
        if let Some(session) = session {
            if let Some(principals) = session_principals(session) {
                if !principals.is_empty() {
                    trace!(count = principals.len(), "principals_from_session");
                    return ResolvedIdentity::Session(principals);
                }
            }
        }

        let Some(token) = self.remember_me_store.retrieve_value(request) else {
            return ResolvedIdentity::Anonymous;
        };
        let Some(serializer) = self.serializer else {
            trace!("remember_me_serializer_absent");
            return ResolvedIdentity::Anonymous;
        };
        match serializer.deserialize(&token) {
            Ok(principals) if !principals.is_empty() => {
                debug!(count = principals.len(), "principals_recalled_from_cookie");
                ResolvedIdentity::Remembered(principals)
            }
            Ok(_) => ResolvedIdentity::Anonymous,
            Err(e) => {
                // Client-controlled data; never fatal.
                debug!(error = %e, "remember_me_token_unparsable");
                ResolvedIdentity::Anonymous
            }
        }
    }

    /// True only when the session exists and carries the authenticated flag as
    /// a literal `true`. The cookie path never contributes here.
    pub fn resolve_authenticated(&self, session: Option<&SessionHandle>) -> bool {
        session
            .map(|s| matches!(s.get_attribute(AUTHENTICATED_SESSION_KEY), Some(Value::Bool(true))))
            .unwrap_or(false)
    }
}

fn session_principals(session: &SessionHandle) -> Option<PrincipalCollection> {
    let value = session.get_attribute(PRINCIPALS_SESSION_KEY)?;
    match serde_json::from_value::<PrincipalCollection>(value) {
        Ok(principals) => Some(principals),
        Err(e) => {
            warn!(error = %e, "session_principals_attribute_malformed");
            None
        }
    }
}
