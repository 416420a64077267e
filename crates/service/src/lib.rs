//! Service layer between the same-origin HTTP surface and the remote backend.
//! - `upstream`: typed proxy over the backend's REST collections.
//! - `listing`: search, sort and pagination for admin lists.
//! - `forms`: create/edit flow with image preview and validation.
//! - `session`: token storage and the expiry guard.

pub mod errors;
pub mod forms;
pub mod image;
pub mod listing;
pub mod observability;
pub mod pagination;
pub mod runtime;
pub mod scope;
pub mod session;
pub mod storage;
pub mod upstream;

pub use errors::ProxyError;
pub use listing::{ListParams, Listable, Page};
pub use scope::ViewScope;
pub use upstream::{Resource, UpstreamClient};
