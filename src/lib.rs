//! Presigned multipart upload gateway.
//!
//! Lets browsers upload large files straight to an S3-compatible bucket
//! without ever seeing storage credentials. The gateway opens multipart
//! sessions, presigns one URL per part, reports committed parts so an
//! interrupted upload can resume, and asks the store to assemble the result.
//! It holds no session state of its own.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
