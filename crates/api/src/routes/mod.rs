//! API route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use madani_core::attachment::AttachmentRepository;
use madani_shared::AppError;
use serde_json::json;

use crate::AppState;

pub mod health;
pub mod maintenance;
pub mod serve;
pub mod upload;

/// Creates the API router with all routes.
///
/// `body_limit` caps upload request bodies.
pub fn api_routes<R: AttachmentRepository + 'static>(body_limit: usize) -> Router<AppState<R>> {
    Router::new()
        .merge(health::routes())
        .merge(upload::routes(body_limit))
        .merge(serve::routes())
        .merge(maintenance::routes())
}

/// `{success: false, error, code, details}` with the error's status.
pub(crate) fn error_response(summary: &str, err: &AppError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "success": false,
            "error": summary,
            "code": err.error_code(),
            "details": err.to_string(),
            "retryable": err.is_retryable(),
        })),
    )
        .into_response()
}
