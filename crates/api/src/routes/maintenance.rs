//! Repair and diagnostics routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use madani_core::attachment::{AttachmentError, AttachmentRepository, RepairOutcome};
use madani_shared::AppError;
use serde::Serialize;
use serde_json::json;

use super::error_response;
use crate::AppState;

/// Creates the maintenance routes.
pub fn routes<R: AttachmentRepository + 'static>() -> Router<AppState<R>> {
    Router::new()
        .route("/fix-pdf/{filename}", post(fix_pdf::<R>))
        .route("/debug-pdf/{filename}", get(debug_pdf::<R>))
}

/// Response for a repair request.
#[derive(Debug, Serialize)]
pub struct RepairResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable summary.
    pub message: &'static str,
    /// What the repair did.
    #[serde(flatten)]
    pub outcome: RepairOutcome,
}

/// POST `/api/fix-pdf/{filename}`
async fn fix_pdf<R: AttachmentRepository + 'static>(
    State(state): State<AppState<R>>,
    Path(filename): Path<String>,
) -> Response {
    match state.attachments.repair(&filename).await {
        Ok(outcome) => {
            let message = match outcome {
                RepairOutcome::AlreadyStored { .. } => "PDF already has stored content",
                RepairOutcome::Repaired { .. } => "PDF fixed successfully",
            };
            Json(RepairResponse {
                success: true,
                message,
                outcome,
            })
            .into_response()
        }
        Err(AttachmentError::LocalCopyMissing { filename, searched }) => {
            tracing::warn!(%filename, ?searched, "Repair found no local copy");
            (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "success": false,
                    "error": "Local PDF file not found",
                    "code": "not_found",
                    "filename": filename,
                    "searched": searched,
                })),
            )
                .into_response()
        }
        Err(err) => {
            tracing::warn!(%filename, error = %err, "Repair failed");
            error_response("Failed to fix PDF", &AppError::from(err))
        }
    }
}

/// GET `/api/debug-pdf/{filename}`
async fn debug_pdf<R: AttachmentRepository + 'static>(
    State(state): State<AppState<R>>,
    Path(filename): Path<String>,
) -> Response {
    match state.attachments.inspect(&filename).await {
        Ok(report) => Json(report).into_response(),
        Err(err) => error_response("Failed to inspect PDF", &AppError::from(err)),
    }
}
