//! HTTP middleware: request ID and ingest authentication.

pub mod auth;
pub mod request_id;
