//! Engine status for dashboards and probes.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use lf_media::{Bandwidth, WindowStats};

use crate::context::AppContext;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub playlist: String,
    pub window: WindowStats,
    pub bandwidth: Bandwidth,
}

/// GET /api/status
pub async fn get_status(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    Json(StatusResponse {
        playlist: ctx.engine.playlist_name().to_string(),
        window: ctx.engine.stats(),
        bandwidth: ctx.engine.bandwidth(),
    })
}
