//! PDF serving routes.
//!
//! `HEAD` is answered by the `GET` handlers; axum drops the body and keeps the
//! headers, so both methods run the same resolution.

use std::fmt::Write as _;

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{
        HeaderMap, HeaderName, HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::get,
};
use madani_core::attachment::{AttachmentRepository, ServeFailure, ServeOutcome, ServedPdf};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use crate::AppState;

/// Tier that produced the bytes.
pub const X_STORAGE_TIER: HeaderName = HeaderName::from_static("x-storage-tier");

const X_CONTENT_TYPE_OPTIONS: HeaderName = HeaderName::from_static("x-content-type-options");

/// Creates the serve routes.
pub fn routes<R: AttachmentRepository + 'static>() -> Router<AppState<R>> {
    Router::new()
        .route("/serve-pdf/{filename}", get(serve_pdf::<R>))
        .route("/serve-object/{file_id}", get(serve_object::<R>))
}

/// GET|HEAD `/api/serve-pdf/{filename}`
async fn serve_pdf<R: AttachmentRepository + 'static>(
    State(state): State<AppState<R>>,
    Path(filename): Path<String>,
) -> Response {
    match state.attachments.serve(&filename).await {
        Ok(ServeOutcome::Pdf(pdf)) => {
            pdf_response(pdf, state.attachments.config().cache_max_age_secs)
        }
        Ok(ServeOutcome::Redirect { location, tier }) => (
            AppendHeaders([(X_STORAGE_TIER, tier.as_str())]),
            Redirect::temporary(&location),
        )
            .into_response(),
        Err(failure) => failure_response(&failure),
    }
}

/// GET|HEAD `/api/serve-object/{file_id}`
async fn serve_object<R: AttachmentRepository + 'static>(
    State(state): State<AppState<R>>,
    Path(file_id): Path<String>,
) -> Response {
    match state.attachments.serve_object(&file_id).await {
        Ok(pdf) => pdf_response(pdf, state.attachments.config().cache_max_age_secs),
        Err(failure) => failure_response(&failure),
    }
}

fn pdf_response(pdf: ServedPdf, max_age: u64) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    headers.insert(CONTENT_DISPOSITION, content_disposition(&pdf.original_name));
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_str(&format!("public, max-age={max_age}"))
            .unwrap_or_else(|_| HeaderValue::from_static("no-cache")),
    );
    headers.insert(CONTENT_LENGTH, HeaderValue::from(pdf.data.len()));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(X_STORAGE_TIER, HeaderValue::from_static(pdf.tier.as_str()));

    (StatusCode::OK, headers, Body::from(pdf.data)).into_response()
}

fn failure_response(failure: &ServeFailure) -> Response {
    let status = StatusCode::from_u16(failure.status_code()).unwrap_or(StatusCode::NOT_FOUND);
    (status, Json(failure)).into_response()
}

/// `inline; filename="..."`, plus an RFC 5987 `filename*` for non-ASCII names.
fn content_disposition(original_name: &str) -> HeaderValue {
    let ascii: String = original_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();

    let mut value = format!("inline; filename=\"{ascii}\"");
    if ascii != original_name {
        let _ = write!(
            value,
            "; filename*=UTF-8''{}",
            utf8_percent_encode(original_name, NON_ALPHANUMERIC)
        );
    }
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("inline"))
}
