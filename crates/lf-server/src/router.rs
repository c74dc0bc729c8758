//! Axum router construction.
//!
//! Builds the full application router with the HLS, status, events and
//! ingest route groups plus middleware layers.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::auth::ingest_auth_middleware;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

/// Largest accepted ingest payload.
const MAX_INGEST_BODY: usize = 64 * 1024 * 1024;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/status", get(routes::status::get_status))
        .route("/events", get(routes::events::events_handler));

    let mut app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/hls/{name}", get(routes::hls::serve_hls))
        .nest("/api", api);

    if ctx.config.ingest.enabled {
        let ingest = Router::new()
            .route("/init.mp4", put(routes::ingest::put_init))
            .route("/parts", post(routes::ingest::push_part))
            .route("/segments", post(routes::ingest::push_segment))
            .layer(DefaultBodyLimit::max(MAX_INGEST_BODY))
            .layer(middleware::from_fn_with_state(
                ctx.clone(),
                ingest_auth_middleware,
            ));
        app = app.nest("/ingest", ingest);
    } else {
        tracing::info!("Ingest endpoints disabled");
    }

    app.layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
