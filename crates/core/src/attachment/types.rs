//! Attachment descriptor and related data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::StorageTier;

/// Route serving attachments by filename.
pub const SERVE_PDF_ROUTE: &str = "/api/serve-pdf";

/// Locator for an attachment's bytes, tagged by `storageTier`.
///
/// Each tier carries exactly the fields needed to read it back; no record can
/// hold a locator for a tier other than its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "storageTier",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum StoredContent {
    /// File under the uploads directory.
    LocalFile {
        /// File name (legacy records carry `/uploads/pdfs/{name}`).
        path: String,
    },
    /// Base64 payload embedded in the descriptor.
    InlineContent {
        /// Base64 text.
        content: String,
    },
    /// Base64 payload in an overflow document.
    OverflowDocument {
        /// Overflow document identifier.
        content_doc_id: String,
    },
    /// Object held by the external provider.
    ExternalObject {
        /// Provider identifier.
        file_id: String,
        /// Direct download URL.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        public_url: Option<String>,
        /// Browser view URL.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        view_url: Option<String>,
        /// Same-origin proxy path.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        proxy_url: Option<String>,
    },
    /// No bytes retained.
    MetadataOnly {
        /// Explanation shown to operators.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        warning: Option<String>,
    },
}

impl StoredContent {
    /// The tier this locator belongs to.
    #[must_use]
    pub fn tier(&self) -> StorageTier {
        match self {
            Self::LocalFile { .. } => StorageTier::LocalFile,
            Self::InlineContent { .. } => StorageTier::InlineContent,
            Self::OverflowDocument { .. } => StorageTier::OverflowDocument,
            Self::ExternalObject { .. } => StorageTier::ExternalObject,
            Self::MetadataOnly { .. } => StorageTier::MetadataOnly,
        }
    }

    /// Metadata-only locator with a warning.
    #[must_use]
    pub fn metadata_only(warning: impl Into<String>) -> Self {
        Self::MetadataOnly {
            warning: Some(warning.into()),
        }
    }

    /// Short description for logs. Never includes inline payloads.
    #[must_use]
    pub fn locator(&self) -> String {
        match self {
            Self::LocalFile { path } => path.clone(),
            Self::InlineContent { content } => format!("inline ({} chars)", content.len()),
            Self::OverflowDocument { content_doc_id } => content_doc_id.clone(),
            Self::ExternalObject { file_id, .. } => file_id.clone(),
            Self::MetadataOnly { .. } => "none".to_string(),
        }
    }
}

/// Attachment descriptor embedded in a post under `pdfAttachment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDescriptor {
    /// Generated name: `{timestamp_ms}_{sanitized original}`.
    pub filename: String,
    /// Name the uploader gave the file.
    pub original_name: String,
    /// Size in bytes.
    pub size: u64,
    /// Serve URL, always `/api/serve-pdf/{filename}`.
    pub url: String,
    /// Upload time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
    /// Canonical tier and its locator.
    #[serde(flatten)]
    pub stored: StoredContent,
    /// Best-effort copy in the uploads directory. Never canonical.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_copy: Option<String>,
    /// When a repair last moved the bytes to a durable tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repaired_at: Option<DateTime<Utc>>,
}

impl AttachmentDescriptor {
    /// Builds a descriptor for a fresh upload.
    #[must_use]
    pub fn new(
        filename: impl Into<String>,
        original_name: impl Into<String>,
        size: u64,
        stored: StoredContent,
    ) -> Self {
        let filename = filename.into();
        Self {
            url: serve_url(&filename),
            filename,
            original_name: original_name.into(),
            size,
            uploaded_at: Some(Utc::now()),
            stored,
            local_copy: None,
            repaired_at: None,
        }
    }

    /// Records the best-effort local copy.
    #[must_use]
    pub fn with_local_copy(mut self, name: Option<String>) -> Self {
        self.local_copy = name;
        self
    }

    /// The canonical tier.
    #[must_use]
    pub fn tier(&self) -> StorageTier {
        self.stored.tier()
    }
}

/// Serve URL for a generated filename.
#[must_use]
pub fn serve_url(filename: &str) -> String {
    format!("{SERVE_PDF_ROUTE}/{filename}")
}

/// A post whose descriptor references a filename.
#[derive(Debug, Clone, PartialEq)]
pub struct OwningPost {
    /// Post ID.
    pub id: Uuid,
    /// Post title.
    pub title: String,
    /// The post's attachment descriptor.
    pub descriptor: AttachmentDescriptor,
}

/// A post, without its attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSummary {
    /// Post ID.
    pub id: Uuid,
    /// Post title.
    pub title: String,
}

/// Input for creating an overflow document.
#[derive(Debug, Clone)]
pub struct NewOverflowDocument {
    /// Attachment filename.
    pub filename: String,
    /// Base64 payload.
    pub content: String,
    /// Decoded size in bytes.
    pub size: u64,
    /// Post the payload belongs to, when known at upload time.
    pub post_id: Option<Uuid>,
}

/// A stored overflow document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverflowDocument {
    /// Document ID.
    pub id: String,
    /// Attachment filename.
    pub filename: String,
    /// Base64 payload.
    pub content: String,
    /// Decoded size in bytes.
    pub size: u64,
    /// Owning post.
    pub post_id: Option<Uuid>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}
