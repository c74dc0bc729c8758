//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which builds a full [`AppContext`] from a config.
//! The `with_server*` constructors start Axum on a random port for
//! HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;

use lf_core::config::Config;
use lf_core::MuxerVariant;
use lf_server::context::AppContext;
use lf_server::router::build_router;

/// Test harness wrapping a fully-constructed [`AppContext`].
pub struct TestHarness {
    pub ctx: AppContext,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            ctx: AppContext::new(config),
        }
    }

    /// Create a harness for `variant` with otherwise default settings.
    pub fn with_variant(variant: MuxerVariant) -> Self {
        let mut config = Config::default();
        config.muxer.variant = variant;
        Self::with_config(config)
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = build_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Start a server for `variant` with otherwise default settings.
    pub async fn with_server_variant(variant: MuxerVariant) -> (Self, SocketAddr) {
        let mut config = Config::default();
        config.muxer.variant = variant;
        Self::with_server_config(config).await
    }
}

/// Upload a complete segment through the ingest API.
pub async fn push_segment(
    client: &reqwest::Client,
    addr: SocketAddr,
    duration: f64,
    body: &'static [u8],
) -> serde_json::Value {
    let resp = client
        .post(format!("http://{addr}/ingest/segments?duration={duration}"))
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    resp.json().await.unwrap()
}

/// Upload a part through the ingest API.
pub async fn push_part(
    client: &reqwest::Client,
    addr: SocketAddr,
    duration: f64,
    independent: bool,
) -> serde_json::Value {
    let resp = client
        .post(format!(
            "http://{addr}/ingest/parts?duration={duration}&independent={independent}"
        ))
        .body(&b"moof+mdat"[..])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    resp.json().await.unwrap()
}
