pub mod error;
pub mod identity;
pub mod web;

pub use error::SecurityError;
pub use identity::{
    Account, Base64JsonSerializer, Principal, PrincipalCollection, PrincipalSerializer,
    ResolvedIdentity, SecurityContext,
};
pub use web::{SessionMode, WebRequest, WebResponse, WebSecurityManager};
