//! Identity resolution for the security manager: who the subject is, and how
//! much we trust the answer. Keep the public surface thin and split
//! implementation across sub-modules.

mod context;
mod principal;
mod resolver;
mod serializer;

pub use context::SecurityContext;
pub use principal::{Account, Principal, PrincipalCollection};
pub use resolver::{
    IdentityResolver, ResolvedIdentity, AUTHENTICATED_SESSION_KEY, PRINCIPALS_SESSION_KEY,
};
pub use serializer::{Base64JsonSerializer, PrincipalSerializer};
