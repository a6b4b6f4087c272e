//! Web-facing half of the security manager: the opaque request/response pair,
//! cookie storage, session factories, and the manager that composes them with
//! identity resolution.

mod binder;
pub mod cookies;
mod manager;
pub mod request;
pub mod session;

pub use binder::ContextBinder;
pub use cookies::{CookieStore, DEFAULT_REMEMBER_ME_COOKIE_NAME};
pub use manager::{SessionMode, WebSecurityManager};
pub use request::{WebRequest, WebResponse};
pub use session::{
    ContainerWebSessionFactory, MapSession, NativeWebSessionFactory, Session, SessionHandle,
    WebSessionFactory, SESSION_ID_COOKIE_NAME,
};
