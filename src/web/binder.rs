use anyhow::Result;
use serde_json::Value;
use tracing::trace;

use crate::identity::{SecurityContext, AUTHENTICATED_SESSION_KEY, PRINCIPALS_SESSION_KEY};
use crate::web::request::{WebRequest, WebResponse};
use crate::web::session::{SessionHandle, WebSessionFactory};

/// Persists authoritative context state into the session after a mutation
/// that must outlive the request (login, logout, identity change).
///
/// Each attribute is handled independently, with one asymmetry: the set
/// branches may lazily start a session, the remove branches never do. Logout
/// on a sessionless request must not create a session just to record absence.
pub struct ContextBinder<'a> {
    session_factory: &'a dyn WebSessionFactory,
}

impl<'a> ContextBinder<'a> {
    pub fn new(session_factory: &'a dyn WebSessionFactory) -> Self {
        Self { session_factory }
    }

    pub fn bind(
        &self,
        context: &mut SecurityContext,
        request: &WebRequest,
        response: &mut WebResponse,
    ) -> Result<()> {
        if !context.principals().is_empty() {
            let session = self.session_for(context, request, response)?;
            session.set_attribute(
                PRINCIPALS_SESSION_KEY,
                serde_json::to_value(context.principals())?,
            );
        } else if let Some(session) = self.existing_session(context, request, response) {
            session.remove_attribute(PRINCIPALS_SESSION_KEY);
        }

        if context.authenticated() {
            let session = self.session_for(context, request, response)?;
            session.set_attribute(AUTHENTICATED_SESSION_KEY, Value::Bool(true));
        } else if let Some(session) = self.existing_session(context, request, response) {
            // Remove rather than store false: absence stays distinct from an
            // explicit false and the attribute set stays minimal.
            session.remove_attribute(AUTHENTICATED_SESSION_KEY);
        }

        trace!(
            authenticated = context.authenticated(),
            principals = context.principals().len(),
            "context_bound"
        );
        Ok(())
    }

    /// Context session, or a freshly started one (attached back to the
    /// context so later binds reuse it).
    fn session_for(
        &self,
        context: &mut SecurityContext,
        request: &WebRequest,
        response: &mut WebResponse,
    ) -> Result<SessionHandle> {
        if let Some(session) = context.session() {
            return Ok(session.clone());
        }
        let session = self.session_factory.start_session(request, response)?;
        context.attach_session(session.clone());
        Ok(session)
    }

    /// Context session, or whatever already exists for the exchange. Never
    /// creates one.
    fn existing_session(
        &self,
        context: &SecurityContext,
        request: &WebRequest,
        response: &WebResponse,
    ) -> Option<SessionHandle> {
        context
            .session()
            .cloned()
            .or_else(|| self.session_factory.get_session(request, response))
    }
}
