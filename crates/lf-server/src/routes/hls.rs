//! HLS delivery: the media playlist, segments, parts and the init segment.
//!
//! Every request goes through [`PlaylistEngine::handle_request`], which may
//! park the request until the asked-for content exists. Payloads are streamed
//! from their storage in 64KB chunks so spooled segments never load fully
//! into memory.
//!
//! [`PlaylistEngine::handle_request`]: crate::engine::PlaylistEngine::handle_request

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use tokio_util::io::ReaderStream;

use crate::context::AppContext;
use crate::engine::{Delivery, ReloadParams, PLAYLIST_CONTENT_TYPE};
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

/// GET /hls/{name}
pub async fn serve_hls(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
    Query(params): Query<ReloadParams>,
    request_id: Option<Extension<RequestId>>,
) -> Result<Response, AppError> {
    let delivery = ctx
        .engine
        .handle_request(&name, &params)
        .await
        .map_err(|e| {
            let err = AppError::new(e);
            match &request_id {
                Some(Extension(RequestId(id))) => err.with_request_id(id.clone()),
                None => err,
            }
        })?;

    let response = match delivery {
        Delivery::Playlist(body) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, PLAYLIST_CONTENT_TYPE),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            body,
        )
            .into_response(),
        Delivery::Content {
            content_type,
            size,
            reader,
        } => {
            let stream = ReaderStream::with_capacity(reader, 64 * 1024);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type.to_string()),
                    (header::CONTENT_LENGTH, size.to_string()),
                ],
                Body::from_stream(stream),
            )
                .into_response()
        }
        Delivery::NotFound => {
            tracing::debug!(file = %name, "HLS file not found");
            StatusCode::NOT_FOUND.into_response()
        }
    };

    Ok(response)
}
