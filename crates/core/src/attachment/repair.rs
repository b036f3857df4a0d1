//! Repair of `metadata_only` attachments from a local copy.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::error::AttachmentError;
use super::filename::lookup_candidates;
use super::repository::AttachmentRepository;
use super::service::AttachmentService;
use super::types::StoredContent;
use crate::storage::{LocalSearch, StorageTier, StoreKey, codec};

/// What a repair did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RepairOutcome {
    /// The descriptor already points at content; nothing changed.
    #[serde(rename_all = "camelCase")]
    AlreadyStored {
        /// Post ID.
        post_id: Uuid,
        /// Attachment filename.
        filename: String,
        /// Current canonical tier.
        storage_tier: StorageTier,
    },
    /// The bytes were moved to a durable tier.
    #[serde(rename_all = "camelCase")]
    Repaired {
        /// Post ID.
        post_id: Uuid,
        /// Post title.
        post_title: String,
        /// Attachment filename.
        filename: String,
        /// Local file the bytes came from.
        recovered_from: String,
        /// New canonical tier.
        storage_tier: StorageTier,
        /// Size in bytes of the recovered file.
        size: u64,
        /// Base64 length of the payload.
        content_length: usize,
    },
}

impl<R: AttachmentRepository> AttachmentService<R> {
    /// Moves a `metadata_only` attachment's bytes into a durable tier.
    ///
    /// Descriptors that already hold content are left alone, so repeating a
    /// repair never duplicates overflow documents or external objects.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::NotFound`] when no post references the file,
    /// [`AttachmentError::NoPersistentFilesystem`] or
    /// [`AttachmentError::LocalCopyMissing`] when there is nothing to recover
    /// from, and [`AttachmentError::PersistenceExhausted`] when every durable
    /// tier refuses the bytes.
    pub async fn repair(&self, requested: &str) -> Result<RepairOutcome, AttachmentError> {
        let post = self
            .find_owner(requested)
            .await?
            .ok_or_else(|| AttachmentError::NotFound(requested.to_string()))?;
        let mut descriptor = post.descriptor;

        if descriptor.tier().holds_content() {
            tracing::info!(
                filename = %descriptor.filename,
                tier = %descriptor.tier(),
                "Repair skipped; attachment already has content"
            );
            return Ok(RepairOutcome::AlreadyStored {
                post_id: post.id,
                storage_tier: descriptor.tier(),
                filename: descriptor.filename,
            });
        }

        if !self.environment.has_persistent_filesystem() {
            return Err(AttachmentError::NoPersistentFilesystem);
        }

        let mut searched: Vec<String> = Vec::new();
        for name in descriptor
            .local_copy
            .iter()
            .cloned()
            .chain(std::iter::once(descriptor.filename.clone()))
            .chain(lookup_candidates(requested))
        {
            if !searched.contains(&name) {
                searched.push(name);
            }
        }

        // Exact names only: the recovered bytes become the post's durable copy.
        let found = self
            .store
            .find_local(&searched, LocalSearch::Exact)
            .await
            .map_err(|failure| {
                tracing::warn!(
                    filename = %descriptor.filename,
                    error = %failure,
                    "Repair found no local copy"
                );
                AttachmentError::LocalCopyMissing {
                    filename: requested.to_string(),
                    searched: searched.clone(),
                }
            })?;

        let key = StoreKey {
            filename: &descriptor.filename,
            original_name: &descriptor.original_name,
            post_id: Some(post.id),
        };
        let persisted = self.persist_durable(&found.data, &key).await;
        if !persisted.content.tier().holds_content() {
            return Err(AttachmentError::PersistenceExhausted(
                descriptor.filename.clone(),
            ));
        }

        let content_length = match &persisted.content {
            StoredContent::InlineContent { content } => content.len(),
            _ => codec::encoded_len(found.data.len()),
        };

        descriptor.stored = persisted.content;
        descriptor.size = found.data.len() as u64;
        descriptor.repaired_at = Some(Utc::now());
        if descriptor.local_copy.is_none() {
            descriptor.local_copy = Some(found.name.clone());
        }
        self.repo.save_pdf_attachment(post.id, &descriptor).await?;

        tracing::info!(
            post_id = %post.id,
            filename = %descriptor.filename,
            recovered_from = %found.name,
            tier = %descriptor.tier(),
            size = descriptor.size,
            "Attachment repaired"
        );

        Ok(RepairOutcome::Repaired {
            post_id: post.id,
            post_title: post.title,
            filename: descriptor.filename.clone(),
            recovered_from: found.name,
            storage_tier: descriptor.tier(),
            size: descriptor.size,
            content_length,
        })
    }
}
