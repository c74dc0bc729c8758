//! Liveness probe.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::context::AppContext;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health
///
/// Reports `closing` once the playlist engine has been shut down.
pub async fn health_check(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    let status = if ctx.engine.is_closed() {
        "closing"
    } else {
        "ok"
    };
    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
    })
}
