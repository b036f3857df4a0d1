//! Attachment repository for database operations.
//!
//! Implements post descriptor and overflow document access using `SeaORM`.
//! The connection is opened lazily through a [`ServiceCell`], so a database
//! that is down at startup surfaces as a cached failure per request instead of
//! a crash.

use std::sync::Arc;

use chrono::Utc;
use madani_core::attachment::{
    AttachmentDescriptor, AttachmentError, AttachmentRepository, NewOverflowDocument,
    OverflowDocument, OwningPost, PostSummary,
};
use madani_core::service_cell::{ServiceCell, ServiceState};
use madani_shared::config::DatabaseConfig;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::{pdf_contents, posts};

/// `PostgreSQL` attachment repository.
#[derive(Debug, Clone)]
pub struct PgAttachmentRepository {
    db: Arc<ServiceCell<DatabaseConnection>>,
}

impl PgAttachmentRepository {
    /// Wraps an open connection.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db: Arc::new(ServiceCell::ready("database", Arc::new(db))),
        }
    }

    /// Connects on first use; a failed connect is cached for the process.
    #[must_use]
    pub fn lazy(config: DatabaseConfig) -> Self {
        let cell = ServiceCell::new("database", move || {
            let config = config.clone();
            async move {
                crate::connect_with(&config)
                    .await
                    .map(Arc::new)
                    .map_err(|e| e.to_string())
            }
        });
        Self { db: Arc::new(cell) }
    }

    /// Connection state for health reporting.
    #[must_use]
    pub fn state(&self) -> ServiceState {
        self.db.state()
    }

    /// Inserts a post without an attachment.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create_post(&self, title: &str) -> Result<Uuid, AttachmentError> {
        let db = self.conn().await?;
        let now = Utc::now().into();
        let post = posts::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            pdf_filename: Set(None),
            pdf_attachment: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = post.insert(db.as_ref()).await.map_err(db_error)?;
        Ok(model.id)
    }

    async fn conn(&self) -> Result<Arc<DatabaseConnection>, AttachmentError> {
        self.db
            .get()
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))
    }
}

impl AttachmentRepository for PgAttachmentRepository {
    async fn find_post_by_pdf_filename(
        &self,
        filename: &str,
    ) -> Result<Option<OwningPost>, AttachmentError> {
        let db = self.conn().await?;
        let model = posts::Entity::find()
            .filter(posts::Column::PdfFilename.eq(filename))
            .one(db.as_ref())
            .await
            .map_err(db_error)?;

        let Some(model) = model else {
            return Ok(None);
        };
        let Some(value) = model.pdf_attachment else {
            return Ok(None);
        };

        Ok(Some(OwningPost {
            id: model.id,
            title: model.title,
            descriptor: AttachmentDescriptor::from_stored_value(value)?,
        }))
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<PostSummary>, AttachmentError> {
        let db = self.conn().await?;
        let model = posts::Entity::find_by_id(id)
            .one(db.as_ref())
            .await
            .map_err(db_error)?;

        Ok(model.map(|m| PostSummary {
            id: m.id,
            title: m.title,
        }))
    }

    async fn save_pdf_attachment(
        &self,
        post_id: Uuid,
        descriptor: &AttachmentDescriptor,
    ) -> Result<(), AttachmentError> {
        let value = serde_json::to_value(descriptor)
            .map_err(|e| AttachmentError::InvalidDescriptor(e.to_string()))?;
        let db = self.conn().await?;

        let post = posts::ActiveModel {
            id: Set(post_id),
            pdf_filename: Set(Some(descriptor.filename.clone())),
            pdf_attachment: Set(Some(value)),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        match post.update(db.as_ref()).await {
            Ok(_) => Ok(()),
            Err(DbErr::RecordNotUpdated) => {
                tracing::warn!(%post_id, "PDF attachment saved on a missing post");
                Err(AttachmentError::PostNotFound(post_id))
            }
            Err(e) => Err(db_error(e)),
        }
    }

    async fn create_overflow_document(
        &self,
        document: NewOverflowDocument,
    ) -> Result<String, AttachmentError> {
        let size = i64::try_from(document.size)
            .map_err(|_| AttachmentError::repository("overflow document size out of range"))?;
        let db = self.conn().await?;

        let model = pdf_contents::ActiveModel {
            id: Set(Uuid::new_v4()),
            filename: Set(document.filename),
            content: Set(document.content),
            size: Set(size),
            post_id: Set(document.post_id),
            created_at: Set(Utc::now().into()),
        }
        .insert(db.as_ref())
        .await
        .map_err(db_error)?;

        Ok(model.id.to_string())
    }

    async fn find_overflow_document(
        &self,
        id: &str,
    ) -> Result<Option<OverflowDocument>, AttachmentError> {
        // Identifiers written by other stores are not UUIDs and cannot exist here.
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(None);
        };
        let db = self.conn().await?;
        let model = pdf_contents::Entity::find_by_id(id)
            .one(db.as_ref())
            .await
            .map_err(db_error)?;

        Ok(model.map(to_domain))
    }

    async fn ping(&self) -> Result<(), AttachmentError> {
        let db = self.conn().await?;
        db.ping().await.map_err(db_error)
    }
}

fn db_error(e: DbErr) -> AttachmentError {
    tracing::warn!(error = %e, "Attachment repository query failed");
    AttachmentError::repository(e.to_string())
}

/// Convert database model to domain model.
fn to_domain(model: pdf_contents::Model) -> OverflowDocument {
    OverflowDocument {
        id: model.id.to_string(),
        filename: model.filename,
        content: model.content,
        size: u64::try_from(model.size).unwrap_or_default(),
        post_id: model.post_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
