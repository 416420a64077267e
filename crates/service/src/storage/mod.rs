//! Storage abstractions for service layer
//!
//! Small file-backed maps; the only thing this application persists is the
//! session (token + user profile).

pub mod json_map_store;
