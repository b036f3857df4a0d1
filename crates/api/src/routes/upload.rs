//! PDF upload route.
//!
//! The `pdf` part is streamed chunk by chunk into a temporary file so the size
//! cap is enforced before the whole body is buffered.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use madani_core::attachment::{
    AttachmentDescriptor, AttachmentError, AttachmentRepository, AttachmentService, StagedUpload,
    UploadOutcome,
};
use madani_core::storage::StorageTier;
use madani_shared::AppError;
use serde::Serialize;
use uuid::Uuid;

use super::error_response;
use crate::AppState;

/// Multipart field carrying the file.
pub const FILE_FIELD: &str = "pdf";
/// Multipart field carrying the optional post ID.
pub const POST_ID_FIELD: &str = "postId";

/// Creates the upload route with its body limit.
pub fn routes<R: AttachmentRepository + 'static>(body_limit: usize) -> Router<AppState<R>> {
    Router::new().route(
        "/upload-pdf",
        post(upload_pdf::<R>).layer(DefaultBodyLimit::max(body_limit)),
    )
}

/// Response for an accepted upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Always `true`.
    pub success: bool,
    /// Descriptor fields.
    #[serde(flatten)]
    pub descriptor: AttachmentDescriptor,
    /// Post the descriptor was saved on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<Uuid>,
    /// Tiers that refused the bytes before the canonical one.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_tiers: Vec<StorageTier>,
}

impl From<UploadOutcome> for UploadResponse {
    fn from(outcome: UploadOutcome) -> Self {
        Self {
            success: true,
            descriptor: outcome.descriptor,
            post_id: outcome.post_id,
            failed_tiers: outcome.failed_tiers,
        }
    }
}

/// POST `/api/upload-pdf`
async fn upload_pdf<R: AttachmentRepository + 'static>(
    State(state): State<AppState<R>>,
    multipart: Multipart,
) -> Response {
    match receive(&state.attachments, multipart).await {
        Ok(outcome) => (StatusCode::OK, Json(UploadResponse::from(outcome))).into_response(),
        Err(err) => {
            if err.status_code() < 500 {
                tracing::warn!(error = %err, "PDF upload rejected");
            } else {
                tracing::error!(error = %err, "PDF upload failed");
            }
            error_response("Failed to upload PDF", &err)
        }
    }
}

async fn receive<R: AttachmentRepository>(
    service: &AttachmentService<R>,
    mut multipart: Multipart,
) -> Result<UploadOutcome, AppError> {
    let mut staged: Option<StagedUpload> = None;
    let mut post_id: Option<Uuid> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FILE_FIELD) if staged.is_none() => {
                let mut upload = service.begin_upload(
                    field.file_name().map(str::to_string),
                    field.content_type().map(str::to_string),
                )?;
                while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                    upload.append(&chunk).await?;
                }
                staged = Some(upload);
            }
            Some(POST_ID_FIELD) => {
                let text = field.text().await.map_err(multipart_error)?;
                let text = text.trim();
                if !text.is_empty() {
                    post_id = Some(Uuid::parse_str(text).map_err(|_| {
                        AppError::Validation(format!("invalid postId: {text}"))
                    })?);
                }
            }
            _ => {}
        }
    }

    let staged = staged.ok_or(AttachmentError::MissingFile)?;
    Ok(service.upload(staged, post_id).await?)
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::Validation(err.body_text())
}
