//! Tier-agnostic binary store.
//!
//! One `write`/`read` pair over every tier, so the upload and serve resolvers
//! never branch on the tier themselves. Failures are logged here, once, with
//! the tier attached.

use std::sync::Arc;

use bytes::Bytes;
use uuid::Uuid;

use super::codec;
use super::error::{StorageError, TierFailure};
use super::external::ExternalObjectStore;
use super::local::{LocalFileStore, LocalMatch, LocalSearch};
use super::tier::StorageTier;
use crate::attachment::{AttachmentRepository, NewOverflowDocument, StoredContent};

/// What a write is keyed by.
#[derive(Debug, Clone, Copy)]
pub struct StoreKey<'a> {
    /// Generated attachment filename.
    pub filename: &'a str,
    /// Name the uploader gave the file.
    pub original_name: &'a str,
    /// Post the attachment belongs to, when known.
    pub post_id: Option<Uuid>,
}

/// Reads and writes attachment bytes on any tier.
#[derive(Debug)]
pub struct BinaryStore<R: AttachmentRepository> {
    local: Option<LocalFileStore>,
    external: ExternalObjectStore,
    repo: Arc<R>,
    inline_ceiling: usize,
}

impl<R: AttachmentRepository> BinaryStore<R> {
    /// Create a store. Pass `local: None` on hosts without a durable filesystem.
    #[must_use]
    pub fn new(
        local: Option<LocalFileStore>,
        external: ExternalObjectStore,
        repo: Arc<R>,
        inline_ceiling: usize,
    ) -> Self {
        Self {
            local,
            external,
            repo,
            inline_ceiling,
        }
    }

    /// The local tier, if this host has one.
    #[must_use]
    pub fn local(&self) -> Option<&LocalFileStore> {
        self.local.as_ref()
    }

    /// The external tier.
    #[must_use]
    pub fn external(&self) -> &ExternalObjectStore {
        &self.external
    }

    /// Exclusive inline ceiling in base64 characters.
    #[must_use]
    pub fn inline_ceiling(&self) -> usize {
        self.inline_ceiling
    }

    /// True when `size` bytes would fit the inline tier.
    #[must_use]
    pub fn fits_inline(&self, size: usize) -> bool {
        codec::encoded_len(size) < self.inline_ceiling
    }

    /// Writes `data` to `tier`.
    ///
    /// # Errors
    ///
    /// Returns the failure attributed to `tier`.
    pub async fn write(
        &self,
        tier: StorageTier,
        data: &Bytes,
        key: &StoreKey<'_>,
    ) -> Result<StoredContent, TierFailure> {
        let result = match tier {
            StorageTier::LocalFile => self.write_local(data, key).await,
            StorageTier::InlineContent => self.write_inline(data),
            StorageTier::OverflowDocument => self.write_overflow(data, key).await,
            StorageTier::ExternalObject => self.write_external(data, key).await,
            StorageTier::MetadataOnly => Err(StorageError::NotWritable(tier)),
        };

        match result {
            Ok(content) => {
                tracing::debug!(
                    tier = %tier,
                    filename = key.filename,
                    size = data.len(),
                    "Attachment bytes written"
                );
                Ok(content)
            }
            Err(e) => Err(fail(tier, key.filename, e)),
        }
    }

    /// Reads the bytes a locator points at.
    ///
    /// # Errors
    ///
    /// Returns the failure attributed to the locator's tier. `metadata_only`
    /// always fails.
    pub async fn read(&self, content: &StoredContent) -> Result<Bytes, TierFailure> {
        let tier = content.tier();
        let result = match content {
            StoredContent::LocalFile { path } => match &self.local {
                Some(local) => local.read(path).await,
                None => Err(StorageError::NotConfigured("local file storage".to_string())),
            },
            StoredContent::InlineContent { content } => codec::decode(content),
            StoredContent::OverflowDocument { content_doc_id } => {
                self.read_overflow(content_doc_id).await
            }
            StoredContent::ExternalObject {
                file_id,
                public_url,
                ..
            } => self.external.fetch(file_id, public_url.as_deref()).await,
            StoredContent::MetadataOnly { .. } => Err(StorageError::NotWritable(tier)),
        };

        result.map_err(|e| fail(tier, &content.locator(), e))
    }

    /// Searches the local tier for any of `candidates`, widening to the closest
    /// directory entry under [`LocalSearch::Fuzzy`].
    ///
    /// # Errors
    ///
    /// Fails when the host has no local tier, nothing matches, or the directory
    /// cannot be read.
    pub async fn find_local(
        &self,
        candidates: &[String],
        search: LocalSearch,
    ) -> Result<LocalMatch, TierFailure> {
        let Some(local) = &self.local else {
            return Err(TierFailure::new(
                StorageTier::LocalFile,
                StorageError::NotConfigured("local file storage".to_string()),
            ));
        };
        let label = candidates.first().map_or("", String::as_str);
        match local.find(candidates, search).await {
            Ok(Some(found)) => Ok(found),
            Ok(None) => Err(fail(
                StorageTier::LocalFile,
                label,
                StorageError::not_found(candidates.join(", ")),
            )),
            Err(e) => Err(fail(StorageTier::LocalFile, label, e)),
        }
    }

    async fn write_local(&self, data: &Bytes, key: &StoreKey<'_>) -> Result<StoredContent, StorageError> {
        let local = self
            .local
            .as_ref()
            .ok_or_else(|| StorageError::NotConfigured("local file storage".to_string()))?;
        let name = local.write(key.filename, data.clone()).await?;
        Ok(StoredContent::LocalFile { path: name })
    }

    fn write_inline(&self, data: &Bytes) -> Result<StoredContent, StorageError> {
        let encoded_len = codec::encoded_len(data.len());
        if encoded_len >= self.inline_ceiling {
            return Err(StorageError::ExceedsInlineCeiling {
                encoded: encoded_len,
                ceiling: self.inline_ceiling,
            });
        }
        Ok(StoredContent::InlineContent {
            content: codec::encode(data),
        })
    }

    async fn write_overflow(
        &self,
        data: &Bytes,
        key: &StoreKey<'_>,
    ) -> Result<StoredContent, StorageError> {
        let document = NewOverflowDocument {
            filename: key.filename.to_string(),
            content: codec::encode(data),
            size: data.len() as u64,
            post_id: key.post_id,
        };
        let id = self
            .repo
            .create_overflow_document(document)
            .await
            .map_err(|e| StorageError::Repository(e.to_string()))?;
        Ok(StoredContent::OverflowDocument { content_doc_id: id })
    }

    async fn write_external(
        &self,
        data: &Bytes,
        key: &StoreKey<'_>,
    ) -> Result<StoredContent, StorageError> {
        let locator = self
            .external
            .put(key.filename, key.original_name, data.clone())
            .await?;
        Ok(StoredContent::ExternalObject {
            file_id: locator.file_id,
            public_url: locator.public_url,
            view_url: locator.view_url,
            proxy_url: Some(locator.proxy_url),
        })
    }

    async fn read_overflow(&self, id: &str) -> Result<Bytes, StorageError> {
        let document = self
            .repo
            .find_overflow_document(id)
            .await
            .map_err(|e| StorageError::Repository(e.to_string()))?
            .ok_or_else(|| StorageError::not_found(id))?;
        codec::decode(&document.content)
    }
}

/// Logs a tier failure once and wraps it. Unconfigured tiers log at debug.
fn fail(tier: StorageTier, subject: &str, error: StorageError) -> TierFailure {
    if error.is_not_configured() {
        tracing::debug!(tier = %tier, subject, error = %error, "Storage tier skipped");
    } else {
        tracing::warn!(tier = %tier, subject, error = %error, "Storage tier failed");
    }
    TierFailure::new(tier, error)
}
