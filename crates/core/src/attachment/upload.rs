//! Upload resolver.

use chrono::Utc;
use uuid::Uuid;

use super::error::AttachmentError;
use super::filename::{generate_filename, original_name_or_default};
use super::repository::AttachmentRepository;
use super::service::AttachmentService;
use super::staging::StagedUpload;
use super::types::AttachmentDescriptor;
use crate::storage::{StorageConfig, StorageTier, StoreKey};

/// Result of an accepted upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Descriptor describing where the bytes went.
    pub descriptor: AttachmentDescriptor,
    /// Post the descriptor was saved on, if any.
    pub post_id: Option<Uuid>,
    /// Tiers tried and refused before the canonical one.
    pub failed_tiers: Vec<StorageTier>,
}

impl<R: AttachmentRepository> AttachmentService<R> {
    /// Opens a staging file for an incoming upload.
    ///
    /// A declared non-PDF MIME type is rejected here, before any bytes are read.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::InvalidMimeType`] or a staging I/O error.
    pub fn begin_upload(
        &self,
        original_name: Option<String>,
        content_type: Option<String>,
    ) -> Result<StagedUpload, AttachmentError> {
        if let Some(content_type) = content_type.as_deref() {
            if !StorageConfig::is_mime_type_allowed(content_type) {
                return Err(AttachmentError::InvalidMimeType(content_type.to_string()));
            }
        }
        StagedUpload::create(
            &self.environment.temp_dir(),
            self.config.max_file_size,
            original_name,
            content_type,
        )
    }

    /// Stores a staged upload, stamped with the current time.
    ///
    /// # Errors
    ///
    /// See [`Self::upload_at`].
    pub async fn upload(
        &self,
        staged: StagedUpload,
        post_id: Option<Uuid>,
    ) -> Result<UploadOutcome, AttachmentError> {
        self.upload_at(staged, post_id, Utc::now().timestamp_millis())
            .await
    }

    /// Stores a staged upload under `{timestamp_ms}_{sanitized name}`.
    ///
    /// Tries external storage, then inline content below the ceiling, then an
    /// overflow document. When all refuse, the upload still succeeds with a
    /// `metadata_only` descriptor. On persistent hosts a local copy is also
    /// written and recorded as `localCopy`.
    ///
    /// # Errors
    ///
    /// Returns a validation error (MIME type, empty, too large),
    /// [`AttachmentError::PostNotFound`] for an unknown `post_id`, or a
    /// staging/repository error.
    pub async fn upload_at(
        &self,
        mut staged: StagedUpload,
        post_id: Option<Uuid>,
        timestamp_ms: i64,
    ) -> Result<UploadOutcome, AttachmentError> {
        self.validate_staged(&staged)?;

        if let Some(id) = post_id {
            if self.repo.find_post(id).await?.is_none() {
                return Err(AttachmentError::PostNotFound(id));
            }
        }

        let original_name = original_name_or_default(staged.original_name());
        let data = staged.read_all().await?;
        drop(staged);

        let filename = generate_filename(timestamp_ms, &original_name);
        let key = StoreKey {
            filename: &filename,
            original_name: &original_name,
            post_id,
        };

        let persisted = self.persist_durable(&data, &key).await;
        let local_copy = self.write_local_copy(&data, &key).await;
        let failed_tiers = persisted.failed_tiers();

        let descriptor = AttachmentDescriptor::new(
            filename.clone(),
            original_name.clone(),
            data.len() as u64,
            persisted.content,
        )
        .with_local_copy(local_copy);

        if let Some(id) = post_id {
            self.repo
                .save_pdf_attachment(id, &descriptor)
                .await
                .inspect_err(|e| {
                    if matches!(
                        descriptor.tier(),
                        StorageTier::OverflowDocument | StorageTier::ExternalObject
                    ) {
                        tracing::warn!(
                            post_id = %id,
                            filename = %descriptor.filename,
                            tier = %descriptor.tier(),
                            locator = %descriptor.stored.locator(),
                            error = %e,
                            "Descriptor save failed; stored payload is orphaned"
                        );
                    }
                })?;
        }

        tracing::info!(
            filename = %descriptor.filename,
            original_name = %descriptor.original_name,
            size = descriptor.size,
            tier = %descriptor.tier(),
            local_copy = descriptor.local_copy.is_some(),
            post_id = ?post_id,
            "PDF uploaded"
        );

        Ok(UploadOutcome {
            descriptor,
            post_id,
            failed_tiers,
        })
    }

    fn validate_staged(&self, staged: &StagedUpload) -> Result<(), AttachmentError> {
        match staged.content_type() {
            Some(content_type) if StorageConfig::is_mime_type_allowed(content_type) => {}
            Some(content_type) => {
                return Err(AttachmentError::InvalidMimeType(content_type.to_string()));
            }
            None => return Err(AttachmentError::InvalidMimeType("(none)".to_string())),
        }
        if staged.is_empty() {
            return Err(AttachmentError::EmptyFile);
        }
        if staged.len() > self.config.max_file_size {
            return Err(AttachmentError::file_too_large(
                staged.len(),
                self.config.max_file_size,
            ));
        }
        Ok(())
    }
}
