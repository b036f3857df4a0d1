//! External object-storage providers behind one trait.
//!
//! Google Drive is reached through its REST API; S3, Azure Blob and a local
//! directory go through OpenDAL.

mod bucket;
mod drive;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

pub use bucket::OpendalStorage;
pub use drive::{DriveStorage, normalize_private_key};

use super::config::{ExternalProvider, StorageConfig};
use super::error::StorageError;

/// An object to upload.
#[derive(Debug, Clone)]
pub struct ObjectUpload {
    /// Object key (the generated attachment filename).
    pub key: String,
    /// Name shown to users by the provider.
    pub display_name: String,
    /// MIME type.
    pub content_type: String,
    /// Object bytes.
    pub data: Bytes,
}

/// An object accepted by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Provider identifier used for later downloads.
    pub file_id: String,
    /// Direct download URL, when the provider exposes one.
    pub public_url: Option<String>,
    /// Browser view URL, when the provider exposes one.
    pub view_url: Option<String>,
}

/// External object storage.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Uploads an object.
    async fn upload(&self, object: ObjectUpload) -> Result<StoredObject, StorageError>;

    /// Downloads an object by its provider identifier.
    async fn download(&self, file_id: &str) -> Result<Bytes, StorageError>;

    /// Makes an object world-readable.
    async fn grant_public_read(&self, file_id: &str) -> Result<(), StorageError>;

    /// Public download URL for a known identifier, if the provider can derive one.
    fn public_url(&self, _file_id: &str) -> Option<String> {
        None
    }

    /// Provider name for logs.
    fn provider_name(&self) -> &'static str;
}

/// Builds the provider client described by `config.external`.
///
/// # Errors
///
/// Returns an error if no provider is configured or its settings are invalid.
pub fn build_provider(
    config: &StorageConfig,
    http: reqwest::Client,
) -> Result<Arc<dyn ObjectStorage>, StorageError> {
    let provider = config
        .external
        .as_ref()
        .ok_or_else(|| StorageError::NotConfigured("external object storage".to_string()))?;

    match provider {
        ExternalProvider::GoogleDrive {
            service_account_email,
            private_key,
            folder_id,
        } => Ok(Arc::new(DriveStorage::new(
            http,
            service_account_email,
            private_key,
            folder_id.clone(),
        )?)),
        other => Ok(Arc::new(OpendalStorage::from_provider(
            other,
            config.presign_download_ttl_secs,
        )?)),
    }
}
