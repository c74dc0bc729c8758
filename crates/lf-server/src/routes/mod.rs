//! Route handlers for the HTTP API.

pub mod events;
pub mod health;
pub mod hls;
pub mod ingest;
pub mod status;
