//! Application context.
//!
//! [`AppContext`] is the central struct shared across all route handlers via
//! Axum state. Everything in it is behind an `Arc`, so cloning is cheap.

use std::sync::Arc;

use lf_core::config::Config;
use lf_core::events::EventBus;

use crate::engine::PlaylistEngine;
use crate::ingest::Ingest;

#[derive(Clone)]
pub struct AppContext {
    /// Configuration the server was started with.
    pub config: Arc<Config>,
    /// The playlist engine for the served stream.
    pub engine: Arc<PlaylistEngine>,
    /// Producer side feeding the engine from HTTP uploads.
    pub ingest: Arc<Ingest>,
    /// Engine events, streamed to clients over SSE.
    pub event_bus: Arc<EventBus>,
}

impl AppContext {
    /// Build the engine, ingest adapter and event bus for `config`.
    pub fn new(config: Config) -> Self {
        let event_bus = Arc::new(EventBus::default());
        let engine = Arc::new(PlaylistEngine::new(&config.muxer, event_bus.clone()));
        let ingest = Arc::new(Ingest::new(&config.muxer, engine.clone()));

        Self {
            config: Arc::new(config),
            engine,
            ingest,
            event_bus,
        }
    }
}
