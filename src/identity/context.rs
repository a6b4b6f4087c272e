use std::net::IpAddr;

use crate::error::SecurityError;
use crate::web::session::SessionHandle;

use super::principal::{Account, PrincipalCollection};

/// The resolved identity for one request: principals, trust state, originating
/// address, and the session it came from (if any). Constructed per request and
/// discarded at request end; anything meant to outlive the request must be
/// bound back to the session or cookie store before the response is sent.
///
/// Invariant: `authenticated == true` requires a non-empty principal
/// collection. Empty principals with `authenticated == false` is the anonymous
/// context.
#[derive(Debug, Clone)]
pub struct SecurityContext {
    principals: PrincipalCollection,
    authenticated: bool,
    remote_addr: Option<IpAddr>,
    session: Option<SessionHandle>,
}

impl SecurityContext {
    pub fn new(
        principals: PrincipalCollection,
        authenticated: bool,
        remote_addr: Option<IpAddr>,
        session: Option<SessionHandle>,
    ) -> Result<Self, SecurityError> {
        if authenticated && principals.is_empty() {
            return Err(SecurityError::AuthenticatedWithoutPrincipals);
        }
        Ok(Self { principals, authenticated, remote_addr, session })
    }

    pub fn anonymous(remote_addr: Option<IpAddr>, session: Option<SessionHandle>) -> Self {
        Self { principals: PrincipalCollection::new(), authenticated: false, remote_addr, session }
    }

    pub fn principals(&self) -> &PrincipalCollection {
        &self.principals
    }

    /// True only when the identity was established by a verified login in the
    /// active session. A remembered (cookie-derived) identity is known but not
    /// authenticated.
    pub fn authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn remote_addr(&self) -> Option<IpAddr> {
        self.remote_addr
    }

    pub fn session(&self) -> Option<&SessionHandle> {
        self.session.as_ref()
    }

    pub(crate) fn attach_session(&mut self, session: SessionHandle) {
        self.session = Some(session);
    }

    /// Transition after a successful login. The caller has already verified
    /// credentials; this only records the outcome.
    pub fn login(&mut self, account: &Account) -> Result<(), SecurityError> {
        if account.principals.is_empty() {
            return Err(SecurityError::AuthenticatedWithoutPrincipals);
        }
        self.principals = account.principals.clone();
        self.authenticated = true;
        Ok(())
    }

    /// Transition to anonymous. The session reference is kept so a subsequent
    /// bind can remove the identity attributes from it.
    pub fn logout(&mut self) {
        self.principals = PrincipalCollection::new();
        self.authenticated = false;
    }
}
