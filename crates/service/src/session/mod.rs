//! Session storage and the expiry guard.

pub mod context;
pub mod guard;
pub mod store;
pub mod token;

pub use context::SessionContext;
pub use guard::SessionGuard;
pub use store::{
    FileSessionStore, MemorySessionStore, ScopedSessionStore, SessionStore, TOKEN_KEY, USER_KEY,
};
pub use token::{decode_claims, is_expired, Claims};
