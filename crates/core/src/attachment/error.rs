//! Attachment error types.

use madani_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::storage::StorageError;

/// Attachment operation errors.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// The upload carried no file part.
    #[error("no PDF file provided")]
    MissingFile,

    /// The uploaded file has no bytes.
    #[error("uploaded file is empty")]
    EmptyFile,

    /// Invalid MIME type.
    #[error("invalid MIME type: {0}")]
    InvalidMimeType(String),

    /// File too large.
    #[error("file too large: {size} bytes exceeds maximum {max} bytes")]
    FileTooLarge {
        /// Actual file size (so far, for streamed uploads).
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// Post not found.
    #[error("post not found: {0}")]
    PostNotFound(Uuid),

    /// No post references the filename.
    #[error("no post references PDF '{0}'")]
    NotFound(String),

    /// Repair needs the uploads directory, which this host does not keep.
    #[error("repair needs a persistent filesystem; this host has none")]
    NoPersistentFilesystem,

    /// Repair found no local copy to recover from.
    #[error("no local copy of '{filename}' found")]
    LocalCopyMissing {
        /// Requested filename.
        filename: String,
        /// Names that were tried.
        searched: Vec<String>,
    },

    /// Repair found the bytes but no durable tier accepted them.
    #[error("no durable storage tier accepted '{0}'")]
    PersistenceExhausted(String),

    /// Stored descriptor could not be parsed.
    #[error("invalid attachment descriptor: {0}")]
    InvalidDescriptor(String),

    /// Temporary upload file failed.
    #[error("upload staging failed: {0}")]
    Staging(#[from] std::io::Error),

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl AttachmentError {
    /// Create a file too large error.
    #[must_use]
    pub fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// True for errors caused by the request rather than the server.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingFile | Self::EmptyFile | Self::InvalidMimeType(_) | Self::FileTooLarge { .. }
        )
    }
}

impl From<AttachmentError> for AppError {
    fn from(err: AttachmentError) -> Self {
        match err {
            AttachmentError::MissingFile
            | AttachmentError::EmptyFile
            | AttachmentError::InvalidMimeType(_)
            | AttachmentError::FileTooLarge { .. } => Self::Validation(err.to_string()),
            AttachmentError::PostNotFound(_)
            | AttachmentError::NotFound(_)
            | AttachmentError::NoPersistentFilesystem
            | AttachmentError::LocalCopyMissing { .. } => Self::NotFound(err.to_string()),
            AttachmentError::PersistenceExhausted(_) => Self::ServiceUnavailable(err.to_string()),
            AttachmentError::Repository(_) => Self::Database(err.to_string()),
            AttachmentError::Storage(_) => Self::ExternalService(err.to_string()),
            AttachmentError::InvalidDescriptor(_) | AttachmentError::Staging(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}
