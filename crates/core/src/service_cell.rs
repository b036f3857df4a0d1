//! Process-wide, lazily initialised service clients.
//!
//! The database connection and the external object-storage client are created
//! on first use and then shared for the life of the process. A failed
//! initialisation is remembered: every later caller gets the same
//! [`ServiceUnavailable`] instead of retrying the handshake per request.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::OnceCell;

/// A service that could not be initialised (or was never configured).
#[derive(Debug, Clone, Error)]
#[error("{service} unavailable: {reason}")]
pub struct ServiceUnavailable {
    /// Service name, e.g. `database`.
    pub service: &'static str,
    /// Why initialisation failed.
    pub reason: String,
}

/// Observable state of a [`ServiceCell`], used by health reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceState {
    /// No configuration was supplied; the service is permanently absent.
    NotConfigured,
    /// Configured but not yet used.
    Uninitialized,
    /// Initialised and usable.
    Ready,
    /// Initialisation failed; the failure is cached.
    Failed(String),
}

impl ServiceState {
    /// Short machine-readable label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Failed(_) => "failed",
        }
    }
}

type Initializer<T> = Box<dyn Fn() -> BoxFuture<'static, Result<Arc<T>, String>> + Send + Sync>;

/// Lazily initialised singleton with a cached failure state.
pub struct ServiceCell<T: ?Sized + Send + Sync + 'static> {
    name: &'static str,
    init: Option<Initializer<T>>,
    cell: OnceCell<Result<Arc<T>, ServiceUnavailable>>,
}

impl<T: ?Sized + Send + Sync + 'static> ServiceCell<T> {
    /// Creates a cell that runs `init` on first access.
    pub fn new<F, Fut>(name: &'static str, init: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<T>, String>> + Send + 'static,
    {
        Self {
            name,
            init: Some(Box::new(move || Box::pin(init()))),
            cell: OnceCell::new(),
        }
    }

    /// Creates an already initialised cell.
    pub fn ready(name: &'static str, value: Arc<T>) -> Self {
        Self {
            name,
            init: None,
            cell: OnceCell::new_with(Some(Ok(value))),
        }
    }

    /// Creates a cell for a service that has no configuration.
    pub fn not_configured(name: &'static str) -> Self {
        Self {
            name,
            init: None,
            cell: OnceCell::new(),
        }
    }

    /// Service name used in logs and errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the shared client, initialising it on first call.
    pub async fn get(&self) -> Result<Arc<T>, ServiceUnavailable> {
        let Some(init) = &self.init else {
            return match self.cell.get() {
                Some(result) => result.clone(),
                None => Err(ServiceUnavailable {
                    service: self.name,
                    reason: "not configured".to_string(),
                }),
            };
        };

        self.cell
            .get_or_init(|| async {
                match init().await {
                    Ok(value) => {
                        tracing::info!(service = self.name, "Service initialised");
                        Ok(value)
                    }
                    Err(reason) => {
                        tracing::error!(
                            service = self.name,
                            reason = %reason,
                            "Service initialisation failed; caching failure for process lifetime"
                        );
                        Err(ServiceUnavailable {
                            service: self.name,
                            reason,
                        })
                    }
                }
            })
            .await
            .clone()
    }

    /// Current state without triggering initialisation.
    #[must_use]
    pub fn state(&self) -> ServiceState {
        match self.cell.get() {
            Some(Ok(_)) => ServiceState::Ready,
            Some(Err(e)) => ServiceState::Failed(e.reason.clone()),
            None if self.init.is_none() => ServiceState::NotConfigured,
            None => ServiceState::Uninitialized,
        }
    }

    /// Releases the client (or the cached failure) so the next `get` starts over.
    pub fn teardown(&mut self) -> Option<Arc<T>> {
        let released = self.cell.take().and_then(Result::ok);
        tracing::debug!(service = self.name, "Service torn down");
        released
    }
}

impl<T: ?Sized + Send + Sync + 'static> fmt::Debug for ServiceCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCell")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}
