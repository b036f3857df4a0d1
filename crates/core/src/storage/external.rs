//! The `external_object` tier.

use std::sync::Arc;

use bytes::Bytes;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use super::config::{ExternalReadMode, StorageConfig};
use super::error::StorageError;
use super::object::{ObjectStorage, ObjectUpload, StoredObject, build_provider};
use crate::service_cell::{ServiceCell, ServiceState};

/// Route that proxies external objects by identifier.
pub const SERVE_OBJECT_ROUTE: &str = "/api/serve-object";

/// Characters escaped in a single URL path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Locator fields recorded for an external object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalLocator {
    /// Provider identifier.
    pub file_id: String,
    /// Direct download URL.
    pub public_url: Option<String>,
    /// Browser view URL.
    pub view_url: Option<String>,
    /// Same-origin proxy path.
    pub proxy_url: String,
}

/// Lazily connected external provider plus a plain HTTP client for public URLs.
pub struct ExternalObjectStore {
    cell: ServiceCell<dyn ObjectStorage>,
    http: reqwest::Client,
    read_mode: ExternalReadMode,
}

impl std::fmt::Debug for ExternalObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalObjectStore")
            .field("cell", &self.cell)
            .field("read_mode", &self.read_mode)
            .finish_non_exhaustive()
    }
}

impl ExternalObjectStore {
    /// Store for `config.external`; the provider client is built on first use.
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        let http = reqwest::Client::new();
        let cell = if config.external.is_some() {
            let config = config.clone();
            let client = http.clone();
            ServiceCell::new("external object storage", move || {
                let built = build_provider(&config, client.clone()).map_err(|e| e.to_string());
                async move { built }
            })
        } else {
            ServiceCell::not_configured("external object storage")
        };

        Self {
            cell,
            http,
            read_mode: config.external_read,
        }
    }

    /// Store backed by an already constructed provider.
    #[must_use]
    pub fn with_storage(storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            cell: ServiceCell::ready("external object storage", storage),
            http: reqwest::Client::new(),
            read_mode: ExternalReadMode::Proxy,
        }
    }

    /// Store with no provider.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            cell: ServiceCell::not_configured("external object storage"),
            http: reqwest::Client::new(),
            read_mode: ExternalReadMode::Proxy,
        }
    }

    /// Set how objects are served.
    #[must_use]
    pub fn with_read_mode(mut self, mode: ExternalReadMode) -> Self {
        self.read_mode = mode;
        self
    }

    /// How objects are served.
    #[must_use]
    pub fn read_mode(&self) -> ExternalReadMode {
        self.read_mode
    }

    /// Provider client state.
    #[must_use]
    pub fn state(&self) -> ServiceState {
        self.cell.state()
    }

    /// Releases the provider client.
    pub fn teardown(&mut self) {
        self.cell.teardown();
    }

    /// Uploads `data` and makes it publicly readable.
    ///
    /// A failed permission grant is logged and tolerated: the object is still
    /// reachable through the proxy route.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unavailable or the upload fails.
    pub async fn put(
        &self,
        key: &str,
        display_name: &str,
        data: Bytes,
    ) -> Result<ExternalLocator, StorageError> {
        let storage = self.cell.get().await?;
        let StoredObject {
            file_id,
            public_url,
            view_url,
        } = storage
            .upload(ObjectUpload {
                key: key.to_string(),
                display_name: display_name.to_string(),
                content_type: "application/pdf".to_string(),
                data,
            })
            .await?;

        if let Err(e) = storage.grant_public_read(&file_id).await {
            tracing::warn!(
                file_id = %file_id,
                provider = storage.provider_name(),
                error = %e,
                "Could not make external object public"
            );
        }

        Ok(ExternalLocator {
            proxy_url: proxy_url(&file_id),
            file_id,
            public_url,
            view_url,
        })
    }

    /// Downloads through the provider API, falling back to `public_url`.
    ///
    /// When no URL is given the provider is asked to derive one.
    ///
    /// # Errors
    ///
    /// Returns the provider error when both paths fail.
    pub async fn fetch(&self, file_id: &str, public_url: Option<&str>) -> Result<Bytes, StorageError> {
        let (proxy_error, derived) = match self.cell.get().await {
            Ok(storage) => match storage.download(file_id).await {
                Ok(data) => return Ok(data),
                Err(e) => (e, storage.public_url(file_id)),
            },
            Err(e) => (StorageError::from(e), None),
        };

        let Some(url) = public_url.map(str::to_string).or(derived) else {
            return Err(proxy_error);
        };

        tracing::warn!(
            file_id,
            error = %proxy_error,
            "Provider download failed; trying public URL"
        );
        self.fetch_public(&url).await
    }

    /// Fetches a public URL.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures or non-success status.
    pub async fn fetch_public(&self, url: &str) -> Result<Bytes, StorageError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Http {
                status: status.as_u16(),
                body: format!("GET {url}"),
            });
        }
        Ok(response.bytes().await?)
    }
}

/// Same-origin proxy path for an external object.
#[must_use]
pub fn proxy_url(file_id: &str) -> String {
    format!(
        "{SERVE_OBJECT_ROUTE}/{}",
        utf8_percent_encode(file_id, PATH_SEGMENT)
    )
}
