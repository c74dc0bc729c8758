//! Ingest authentication middleware.
//!
//! When `ingest.api_key` is configured, every ingest request must carry
//! `Authorization: Bearer <api_key>`. Without a key the endpoints are open.

use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

/// Check a raw `Authorization` header value against the configured key.
pub fn validate_bearer(api_key: Option<&str>, authorization: Option<&str>) -> bool {
    let Some(expected) = api_key else {
        return true;
    };
    authorization
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token.trim() == expected)
}

/// Authentication middleware. Applied to the ingest routes only.
pub async fn ingest_auth_middleware(
    State(ctx): State<AppContext>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let authorization = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if validate_bearer(ctx.config.ingest.api_key.as_deref(), authorization) {
        return next.run(request).await;
    }

    tracing::warn!(path = %request.uri().path(), "Rejected unauthenticated ingest request");

    let mut err = AppError::new(lf_core::Error::Unauthorized(
        "valid bearer token required".into(),
    ));
    if let Some(RequestId(id)) = request.extensions().get::<RequestId>().cloned() {
        err = err.with_request_id(id);
    }
    err.into_response()
}
