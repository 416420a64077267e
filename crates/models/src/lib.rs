//! Records mirrored from the remote backend plus the request schemas the
//! proxy validates before forwarding anything upstream.
//!
//! Nothing here is persisted locally; values live for one request or one
//! form session.

pub mod errors;
pub mod brand;
pub mod client;
pub mod service;
pub mod achievement;
pub mod contact;
pub mod user;
pub mod forms;

pub use achievement::Achievement;
pub use brand::Brand;
pub use client::Client;
pub use contact::ContactMessage;
pub use service::{Feature, Service, SubService, Work};
pub use user::UserProfile;

/// Backend identifiers are plain integers.
pub type EntityId = i64;
