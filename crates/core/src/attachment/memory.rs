//! In-memory attachment repository.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::AttachmentError;
use super::repository::AttachmentRepository;
use super::types::{
    AttachmentDescriptor, NewOverflowDocument, OverflowDocument, OwningPost, PostSummary,
};

#[derive(Debug, Clone)]
struct StoredPost {
    title: String,
    pdf_filename: Option<String>,
    pdf_attachment: Option<Value>,
}

/// Posts and overflow documents held in process memory.
///
/// Descriptors are kept as JSON, the same shape a database row holds, so
/// legacy records can be seeded and are parsed on read.
#[derive(Debug, Default)]
pub struct MemoryAttachmentRepository {
    posts: RwLock<HashMap<Uuid, StoredPost>>,
    overflow: RwLock<HashMap<String, OverflowDocument>>,
}

impl MemoryAttachmentRepository {
    /// Empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a post without an attachment.
    pub async fn insert_post(&self, title: impl Into<String>) -> Uuid {
        let id = Uuid::new_v4();
        self.posts.write().await.insert(
            id,
            StoredPost {
                title: title.into(),
                pdf_filename: None,
                pdf_attachment: None,
            },
        );
        id
    }

    /// Adds a post with a raw descriptor value (current or legacy shape).
    pub async fn insert_post_with_attachment(&self, title: impl Into<String>, attachment: Value) -> Uuid {
        let id = Uuid::new_v4();
        let pdf_filename = attachment
            .get("filename")
            .and_then(Value::as_str)
            .map(str::to_string);
        self.posts.write().await.insert(
            id,
            StoredPost {
                title: title.into(),
                pdf_filename,
                pdf_attachment: Some(attachment),
            },
        );
        id
    }

    /// Raw stored descriptor of a post.
    pub async fn attachment_value(&self, post_id: Uuid) -> Option<Value> {
        self.posts
            .read()
            .await
            .get(&post_id)
            .and_then(|p| p.pdf_attachment.clone())
    }

    /// Number of overflow documents.
    pub async fn overflow_count(&self) -> usize {
        self.overflow.read().await.len()
    }
}

impl AttachmentRepository for MemoryAttachmentRepository {
    async fn find_post_by_pdf_filename(
        &self,
        filename: &str,
    ) -> Result<Option<OwningPost>, AttachmentError> {
        let posts = self.posts.read().await;
        let found = posts.iter().find(|(_, post)| {
            post.pdf_filename.as_deref() == Some(filename)
                || post
                    .pdf_attachment
                    .as_ref()
                    .and_then(|a| a.get("filename"))
                    .and_then(Value::as_str)
                    == Some(filename)
        });

        let Some((id, post)) = found else {
            return Ok(None);
        };
        let Some(value) = post.pdf_attachment.clone() else {
            return Ok(None);
        };

        Ok(Some(OwningPost {
            id: *id,
            title: post.title.clone(),
            descriptor: AttachmentDescriptor::from_stored_value(value)?,
        }))
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<PostSummary>, AttachmentError> {
        Ok(self.posts.read().await.get(&id).map(|p| PostSummary {
            id,
            title: p.title.clone(),
        }))
    }

    async fn save_pdf_attachment(
        &self,
        post_id: Uuid,
        descriptor: &AttachmentDescriptor,
    ) -> Result<(), AttachmentError> {
        let value = serde_json::to_value(descriptor)
            .map_err(|e| AttachmentError::InvalidDescriptor(e.to_string()))?;
        let mut posts = self.posts.write().await;
        let post = posts
            .get_mut(&post_id)
            .ok_or(AttachmentError::PostNotFound(post_id))?;
        post.pdf_filename = Some(descriptor.filename.clone());
        post.pdf_attachment = Some(value);
        Ok(())
    }

    async fn create_overflow_document(
        &self,
        document: NewOverflowDocument,
    ) -> Result<String, AttachmentError> {
        let id = Uuid::new_v4().to_string();
        self.overflow.write().await.insert(
            id.clone(),
            OverflowDocument {
                id: id.clone(),
                filename: document.filename,
                content: document.content,
                size: document.size,
                post_id: document.post_id,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn find_overflow_document(
        &self,
        id: &str,
    ) -> Result<Option<OverflowDocument>, AttachmentError> {
        Ok(self.overflow.read().await.get(id).cloned())
    }

    async fn ping(&self) -> Result<(), AttachmentError> {
        Ok(())
    }
}
