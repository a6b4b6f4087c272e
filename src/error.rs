//! Typed errors for configuration and ordering misuse.
//! Resolution paths never surface these; absent or malformed optional state
//! (no session, no cookie, unparsable token) resolves to an anonymous identity
//! instead of an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecurityError {
    /// remember_identity was invoked without a configured principal serializer.
    #[error("remember_me_serializer_not_configured")]
    SerializerMissing,

    /// Cookie write attempted after the response was committed. Cookie headers
    /// cannot be added once the response header block has been flushed.
    #[error("response_already_committed")]
    ResponseCommitted,

    /// A context claimed authenticated=true with an empty principal collection.
    #[error("authenticated_context_requires_principals")]
    AuthenticatedWithoutPrincipals,

    /// Container session mode was asked to start a session on a request whose
    /// transport did not attach one and cannot mint one.
    #[error("container_session_unavailable")]
    ContainerSessionUnavailable,
}
