//! Data shapes exchanged with clients and with the object store.
//!
//! Nothing here is persisted by the service; these types only describe what
//! travels through a request.

pub mod api;
pub mod upload;
