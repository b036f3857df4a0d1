//! OpenDAL-backed object storage.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use opendal::{Operator, services};

use super::{ObjectStorage, ObjectUpload, StoredObject};
use crate::storage::config::ExternalProvider;
use crate::storage::error::StorageError;

/// Object storage over an OpenDAL operator (S3, Azure Blob, filesystem, memory).
#[derive(Debug, Clone)]
pub struct OpendalStorage {
    operator: Operator,
    name: &'static str,
    public_base_url: Option<String>,
    presign_ttl: Duration,
}

impl OpendalStorage {
    /// Create storage from provider config.
    ///
    /// # Errors
    ///
    /// Returns an error if the operator cannot be built. Google Drive is not an
    /// OpenDAL provider and is rejected here.
    pub fn from_provider(
        provider: &ExternalProvider,
        presign_ttl_secs: u64,
    ) -> Result<Self, StorageError> {
        let (operator, public_base_url) = Self::create_operator(provider)?;
        Ok(Self {
            operator,
            name: provider.name(),
            public_base_url,
            presign_ttl: Duration::from_secs(presign_ttl_secs),
        })
    }

    /// In-memory storage, for tests and local experiments.
    ///
    /// # Errors
    ///
    /// Returns an error if the operator cannot be built.
    pub fn memory() -> Result<Self, StorageError> {
        let operator = Operator::new(services::Memory::default())
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .finish();
        Ok(Self {
            operator,
            name: "memory",
            public_base_url: None,
            presign_ttl: Duration::from_secs(3600),
        })
    }

    /// Set the public base URL objects are published under.
    #[must_use]
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into());
        self
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(
        provider: &ExternalProvider,
    ) -> Result<(Operator, Option<String>), StorageError> {
        match provider {
            ExternalProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
                public_base_url,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                let operator = Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish();
                Ok((operator, public_base_url.clone()))
            }
            ExternalProvider::AzureBlob {
                account,
                access_key,
                container,
                public_base_url,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);

                let operator = Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish();
                Ok((operator, public_base_url.clone()))
            }
            ExternalProvider::LocalFs {
                root,
                public_base_url,
            } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                let operator = Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish();
                Ok((operator, public_base_url.clone()))
            }
            ExternalProvider::GoogleDrive { .. } => Err(StorageError::configuration(
                "google_drive is not an OpenDAL provider",
            )),
        }
    }

    async fn presigned_url(&self, key: &str) -> Option<String> {
        match self.operator.presign_read(key, self.presign_ttl).await {
            Ok(presigned) => Some(presigned.uri().to_string()),
            Err(e) => {
                tracing::debug!(key, error = %e, "Presigned read not available");
                None
            }
        }
    }
}

#[async_trait]
impl ObjectStorage for OpendalStorage {
    async fn upload(&self, object: ObjectUpload) -> Result<StoredObject, StorageError> {
        let capability = self.operator.info().full_capability();
        let mut write = self.operator.write_with(&object.key, object.data);
        if capability.write_with_content_type {
            write = write.content_type(&object.content_type);
        }
        if capability.write_with_content_disposition {
            write = write.content_disposition(&format!(
                "inline; filename=\"{}\"",
                object.display_name
            ));
        }
        write.await?;

        let public_url = match self.public_url(&object.key) {
            Some(url) => Some(url),
            None => self.presigned_url(&object.key).await,
        };

        Ok(StoredObject {
            file_id: object.key,
            view_url: public_url.clone(),
            public_url,
        })
    }

    async fn download(&self, file_id: &str) -> Result<Bytes, StorageError> {
        Ok(self.operator.read(file_id).await?.to_bytes())
    }

    async fn grant_public_read(&self, _file_id: &str) -> Result<(), StorageError> {
        // Bucket policy decides visibility; per-object ACLs are not used.
        Ok(())
    }

    fn public_url(&self, file_id: &str) -> Option<String> {
        self.public_base_url
            .as_deref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), file_id))
    }

    fn provider_name(&self) -> &'static str {
        self.name
    }
}
