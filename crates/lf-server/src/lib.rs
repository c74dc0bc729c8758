//! lf-server: playlist engine, ingest adapter and HTTP server.
//!
//! This crate ties the lf-* crates together into a running server. It
//! provides:
//!
//! - [`engine::PlaylistEngine`], the monitor that serializes producers and
//!   blocks HLS requests until the content they ask for exists
//! - [`ingest::Ingest`], which turns uploaded payloads into finalized
//!   segments and parts
//! - Axum-based HTTP API with request ids, SSE and bearer-token ingest auth
//! - Graceful shutdown via signal handling

pub mod context;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod middleware;
pub mod router;
pub mod routes;

use std::net::SocketAddr;

use lf_core::config::Config;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::context::AppContext;

/// Start the liveforged server.
///
/// Builds the [`AppContext`], binds the configured address and serves until a
/// shutdown signal is received.
pub async fn start(config: Config) -> lf_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| lf_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let ctx = AppContext::new(config);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| lf_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!(
        variant = %ctx.config.muxer.variant,
        playlist = %ctx.config.muxer.playlist_name,
        "Starting server on {addr}"
    );

    serve(ctx, listener, CancellationToken::new()).await
}

/// Serve `ctx` on an already bound listener until SIGINT/SIGTERM or until
/// `cancel` fires.
///
/// The playlist engine is closed as soon as shutdown begins so parked
/// long-poll requests complete and graceful shutdown can drain connections.
pub async fn serve(
    ctx: AppContext,
    listener: TcpListener,
    cancel: CancellationToken,
) -> lf_core::Result<()> {
    let app = router::build_router(ctx.clone());
    let engine = ctx.engine.clone();

    let shutdown = async move {
        shutdown_signal(cancel).await;
        engine.close();
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    // Covers the case where the server stopped without a signal.
    ctx.engine.close();

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM) or cancellation.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = cancel.cancelled() => {}
    }

    tracing::info!("Shutdown signal received");
}
