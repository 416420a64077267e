//! Remote resource proxy: typed access to the backend's REST collections.

pub mod body;
pub mod client;
pub mod form;
pub mod resource;

pub use client::UpstreamClient;
pub use form::{OutboundForm, UploadedFile};
pub use resource::Resource;
