//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - PDF upload, serve and repair routes
//! - Diagnostics and health endpoints
//! - JSON error responses

pub mod routes;

use std::sync::Arc;

use axum::Router;
use madani_core::attachment::{AttachmentRepository, AttachmentService};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Room left for multipart boundaries and the `postId` field.
pub const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// Application state shared across handlers.
pub struct AppState<R: AttachmentRepository> {
    /// Attachment resolvers.
    pub attachments: Arc<AttachmentService<R>>,
}

impl<R: AttachmentRepository> AppState<R> {
    /// Wraps an attachment service.
    pub fn new(attachments: AttachmentService<R>) -> Self {
        Self {
            attachments: Arc::new(attachments),
        }
    }
}

// Derive would require `R: Clone`.
impl<R: AttachmentRepository> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            attachments: Arc::clone(&self.attachments),
        }
    }
}

/// Creates the main application router.
pub fn create_router<R: AttachmentRepository + 'static>(state: AppState<R>) -> Router {
    let body_limit = state
        .attachments
        .config()
        .max_file_size
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .nest(
            "/api",
            routes::api_routes::<R>(usize::try_from(body_limit).unwrap_or(usize::MAX)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
