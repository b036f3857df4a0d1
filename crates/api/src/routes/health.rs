//! Health check endpoint.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, StatusCode, header::CACHE_CONTROL},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use madani_core::attachment::AttachmentRepository;
use madani_core::service_cell::ServiceState;
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// `production` or `development`.
    pub environment: &'static str,
    /// `serverless` or `persistent`.
    pub platform: &'static str,
    /// Time of the check.
    pub timestamp: DateTime<Utc>,
    /// Per-dependency results.
    pub checks: HealthChecks,
}

/// Per-dependency results.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthChecks {
    /// Post and overflow document store.
    pub database: CheckResult,
    /// External object store.
    pub external_storage: CheckResult,
}

/// Result of one dependency check.
#[derive(Debug, Serialize)]
pub struct CheckResult {
    /// `ready`, `failed`, `not_configured` or `uninitialized`.
    pub status: &'static str,
    /// Failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResult {
    fn failed(&self) -> bool {
        self.error.is_some()
    }
}

impl From<ServiceState> for CheckResult {
    fn from(state: ServiceState) -> Self {
        let status = state.as_str();
        let error = match state {
            ServiceState::Failed(reason) => Some(reason),
            _ => None,
        };
        Self { status, error }
    }
}

/// Health check handler.
async fn health_check<R: AttachmentRepository + 'static>(
    State(state): State<AppState<R>>,
) -> Response {
    let service = &state.attachments;

    let database = match service.check_repository().await {
        Ok(()) => CheckResult::from(ServiceState::Ready),
        Err(e) => {
            tracing::error!(error = %e, "Health check: database unreachable");
            CheckResult::from(ServiceState::Failed(e.to_string()))
        }
    };
    let external_storage = CheckResult::from(service.external_state());

    let database_down = database.failed();
    let status = if database_down || external_storage.failed() {
        "degraded"
    } else {
        "healthy"
    };

    let body = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        environment: service.environment().mode_name(),
        platform: service.environment().platform_name(),
        timestamp: Utc::now(),
        checks: HealthChecks {
            database,
            external_storage,
        },
    };

    let code = if database_down {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        code,
        [(CACHE_CONTROL, HeaderValue::from_static("no-cache"))],
        Json(body),
    )
        .into_response()
}

/// Creates health check routes.
pub fn routes<R: AttachmentRepository + 'static>() -> Router<AppState<R>> {
    Router::new().route("/health", get(health_check::<R>))
}
