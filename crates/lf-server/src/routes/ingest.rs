//! Ingest route handlers.
//!
//! An external packager publishes the stream through these endpoints. Bodies
//! are the raw payload bytes; timing metadata travels in the query string.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lf_core::{Error, PartId, SegmentId};
use lf_media::{part_name, segment_name};

use crate::context::AppContext;
use crate::error::AppError;
use crate::ingest::parse_duration_secs;

/// Query parameters for part uploads.
#[derive(Debug, Deserialize)]
pub struct PartParams {
    /// Part duration in seconds.
    pub duration: f64,
    #[serde(default)]
    pub independent: bool,
}

/// Query parameters for segment uploads.
#[derive(Debug, Deserialize)]
pub struct SegmentParams {
    /// Segment duration in seconds.
    pub duration: f64,
    /// Wall-clock time of the first sample, RFC 3339.
    pub start: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PartResponse {
    pub part_id: PartId,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct SegmentResponse {
    pub segment_id: SegmentId,
    pub name: String,
}

/// PUT /ingest/init.mp4
pub async fn put_init(
    State(ctx): State<AppContext>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    ctx.ingest.put_init(body).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /ingest/parts
pub async fn push_part(
    State(ctx): State<AppContext>,
    Query(params): Query<PartParams>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let duration = parse_duration_secs("duration", params.duration)?;
    let part_id = ctx
        .ingest
        .push_part(body, duration, params.independent)
        .await?;

    let name = format!("{}{}", part_name(part_id), ctx.engine.variant().extension());
    Ok((StatusCode::CREATED, Json(PartResponse { part_id, name })))
}

/// POST /ingest/segments
pub async fn push_segment(
    State(ctx): State<AppContext>,
    Query(params): Query<SegmentParams>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let duration = parse_duration_secs("duration", params.duration)?;
    let start = params.start.as_deref().map(parse_start).transpose()?;

    let segment_id = ctx.ingest.push_segment(body, duration, start).await?;

    let name = format!(
        "{}{}",
        segment_name(segment_id),
        ctx.engine.variant().extension()
    );
    Ok((StatusCode::CREATED, Json(SegmentResponse { segment_id, name })))
}

fn parse_start(raw: &str) -> lf_core::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::validation(format!("invalid start '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_start_accepts_offsets() {
        let dt = parse_start("2024-03-01T10:00:00.250+01:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-01T09:00:00.250+00:00");
    }

    #[test]
    fn parse_start_rejects_garbage() {
        assert!(matches!(parse_start("yesterday"), Err(Error::Validation(_))));
    }
}
