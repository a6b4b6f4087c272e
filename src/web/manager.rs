use anyhow::{anyhow, Result};
use tracing::{debug, trace, warn};

use crate::error::SecurityError;
use crate::identity::{
    Account, IdentityResolver, PrincipalSerializer, SecurityContext,
};
use crate::web::binder::ContextBinder;
use crate::web::cookies::{CookieStore, DEFAULT_REMEMBER_ME_COOKIE_NAME};
use crate::web::request::{WebRequest, WebResponse};
use crate::web::session::{
    ContainerWebSessionFactory, NativeWebSessionFactory, Session, WebSessionFactory,
};

/// Which tier owns session storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Sessions are delegated to the host transport (the container).
    Container,
    /// Sessions are managed by this layer's own in-memory registry.
    Native,
}

impl Default for SessionMode {
    fn default() -> Self {
        SessionMode::Container
    }
}

impl std::str::FromStr for SessionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "container" => Ok(SessionMode::Container),
            "native" => Ok(SessionMode::Native),
            other => Err(anyhow!("unknown_session_mode: {}", other)),
        }
    }
}

/// The identity-resolution-and-persistence layer of the security manager.
///
/// Public surface upward: [`build_context`](Self::build_context),
/// [`bind_context`](Self::bind_context),
/// [`remember_identity`](Self::remember_identity).
pub struct WebSecurityManager {
    session_mode: SessionMode,
    session_factory: Box<dyn WebSessionFactory>,
    remember_me_store: CookieStore<String>,
    remember_me_serializer: Option<Box<dyn PrincipalSerializer>>,
}

impl Default for WebSecurityManager {
    fn default() -> Self {
        Self::new(SessionMode::default())
    }
}

impl WebSecurityManager {
    pub fn new(session_mode: SessionMode) -> Self {
        let session_factory: Box<dyn WebSessionFactory> = match session_mode {
            SessionMode::Container => Box::new(ContainerWebSessionFactory),
            SessionMode::Native => Box::new(NativeWebSessionFactory::new()),
        };
        Self {
            session_mode,
            session_factory,
            remember_me_store: CookieStore::new(DEFAULT_REMEMBER_ME_COOKIE_NAME),
            remember_me_serializer: None,
        }
    }

    pub fn session_mode(&self) -> SessionMode {
        self.session_mode
    }

    /// Replaces the session factory constructed for the configured mode.
    pub fn set_session_factory(&mut self, factory: Box<dyn WebSessionFactory>) {
        self.session_factory = factory;
    }

    pub fn set_remember_me_cookie_name(&mut self, name: impl Into<String>) {
        let check = self.remember_me_store.check_request_params();
        let mut store = CookieStore::new(name);
        store.set_check_request_params(check);
        self.remember_me_store = store;
    }

    pub fn set_remember_me_check_request_params(&mut self, check: bool) {
        self.remember_me_store.set_check_request_params(check);
    }

    pub fn set_remember_me_serializer(&mut self, serializer: Box<dyn PrincipalSerializer>) {
        self.remember_me_serializer = Some(serializer);
    }

    pub fn remember_me_cookie_name(&self) -> &str {
        self.remember_me_store.name()
    }

    fn resolver(&self) -> IdentityResolver<'_> {
        IdentityResolver::new(&self.remember_me_store, self.remember_me_serializer.as_deref())
    }

    /// Builds the security context for one request: session first, cookie
    /// fallback, authenticated flag strictly from session state. Resolution is
    /// read-only; a request with remembered principals and
    /// `authenticated == false` means "known but not verified".
    pub fn build_context(&self, request: &WebRequest, response: &WebResponse) -> SecurityContext {
        let session = self.session_factory.get_session(request, response);
        match &session {
            Some(s) => trace!(session_id = %s.id(), "session_resolved"),
            None => trace!("no_session_for_request"),
        }

        let resolver = self.resolver();
        let resolved = resolver.resolve_principals(session.as_ref(), request);
        let authenticated = resolver.resolve_authenticated(session.as_ref());
        let principals = resolved.into_principals();
        let remote_addr = request.remote_addr;

        match SecurityContext::new(principals, authenticated, remote_addr, session.clone()) {
            Ok(context) => context,
            Err(_) => {
                // The session carried the flag without a resolvable identity;
                // fall back to the anonymous trust level.
                warn!("authenticated_flag_without_principals");
                SecurityContext::anonymous(remote_addr, session)
            }
        }
    }

    /// Persists the context's authoritative state back into the session.
    /// Call after any context mutation that must survive the request.
    pub fn bind_context(
        &self,
        context: &mut SecurityContext,
        request: &WebRequest,
        response: &mut WebResponse,
    ) -> Result<()> {
        ContextBinder::new(self.session_factory.as_ref()).bind(context, request, response)
    }

    /// Writes the account's principals to the remember-me cookie. Invoked only
    /// at the point a login succeeds, before any response bytes are flushed;
    /// cookie headers cannot be added after response commit.
    ///
    /// A missing serializer is a configuration error and is surfaced:
    /// silently failing to remember identity is visible to a user expecting
    /// persistent login.
    pub fn remember_identity(&self, account: &Account, response: &mut WebResponse) -> Result<()> {
        let serializer = self
            .remember_me_serializer
            .as_deref()
            .ok_or(SecurityError::SerializerMissing)?;
        let token = serializer.serialize(&account.principals)?;
        self.remember_me_store.store_value(&token, response)?;
        debug!(count = account.principals.len(), "identity_remembered");
        Ok(())
    }
}
