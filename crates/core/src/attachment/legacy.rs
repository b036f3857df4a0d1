//! Reading descriptors written before the `storageTier` tag existed.
//!
//! Older records signalled their tier through which fields happened to be
//! present (`driveFileId`, `contentDocId`, `content`, a `/uploads/pdfs/` URL)
//! and a free-form `storageType`. They are converted into a tagged
//! [`StoredContent`] on read and written back in the current shape on the
//! next save.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::error::AttachmentError;
use super::filename::DEFAULT_ORIGINAL_NAME;
use super::types::{AttachmentDescriptor, StoredContent, serve_url};
use crate::storage::proxy_url;

const LEGACY_UPLOADS_PREFIX: &str = "/uploads/pdfs/";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LegacyAttachment {
    filename: Option<String>,
    original_name: Option<String>,
    size: Option<Value>,
    url: Option<String>,
    uploaded_at: Option<DateTime<Utc>>,
    storage_type: Option<String>,
    content: Option<String>,
    content_doc_id: Option<String>,
    drive_file_id: Option<String>,
    file_id: Option<String>,
    public_url: Option<String>,
    view_url: Option<String>,
    proxy_url: Option<String>,
    warning: Option<String>,
    local_copy: Option<String>,
    repaired_at: Option<DateTime<Utc>>,
}

impl AttachmentDescriptor {
    /// Parses a stored descriptor, current or legacy.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::InvalidDescriptor`] when the value is not an
    /// object or has no usable filename.
    pub fn from_stored_value(value: Value) -> Result<Self, AttachmentError> {
        if !value.is_object() {
            return Err(AttachmentError::InvalidDescriptor(
                "descriptor is not an object".to_string(),
            ));
        }

        if value.get("storageTier").is_some() {
            return serde_json::from_value(value)
                .map_err(|e| AttachmentError::InvalidDescriptor(e.to_string()));
        }

        let legacy: LegacyAttachment = serde_json::from_value(value)
            .map_err(|e| AttachmentError::InvalidDescriptor(e.to_string()))?;
        legacy.into_descriptor()
    }
}

impl LegacyAttachment {
    fn into_descriptor(self) -> Result<AttachmentDescriptor, AttachmentError> {
        let filename = self
            .filename
            .clone()
            .filter(|f| !f.trim().is_empty())
            .or_else(|| {
                self.url
                    .as_deref()
                    .and_then(|u| u.rsplit('/').next())
                    .filter(|f| !f.is_empty())
                    .map(str::to_string)
            })
            .ok_or_else(|| {
                AttachmentError::InvalidDescriptor("descriptor has no filename".to_string())
            })?;

        let size = self.size.as_ref().map_or(0, |size| {
            size.as_u64()
                .or_else(|| size.as_str().and_then(|s| s.trim().parse().ok()))
                .unwrap_or(0)
        });

        let stored = self.stored_content();

        Ok(AttachmentDescriptor {
            url: serve_url(&filename),
            original_name: self
                .original_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ORIGINAL_NAME.to_string()),
            filename,
            size,
            uploaded_at: self.uploaded_at,
            stored,
            local_copy: self.local_copy,
            repaired_at: self.repaired_at,
        })
    }

    /// Infers the tier, most specific evidence first.
    fn stored_content(&self) -> StoredContent {
        let storage_type = self.storage_type.as_deref().unwrap_or_default();

        if storage_type == "metadata_only" {
            return StoredContent::MetadataOnly {
                warning: self.warning.clone(),
            };
        }

        if let Some(file_id) = self.drive_file_id.as_ref().or(self.file_id.as_ref()) {
            return StoredContent::ExternalObject {
                file_id: file_id.clone(),
                public_url: self.public_url.clone(),
                view_url: self.view_url.clone(),
                proxy_url: Some(self.proxy_url.clone().unwrap_or_else(|| proxy_url(file_id))),
            };
        }

        if let Some(id) = &self.content_doc_id {
            return StoredContent::OverflowDocument {
                content_doc_id: id.clone(),
            };
        }

        if let Some(content) = self.content.as_ref().filter(|c| !c.is_empty()) {
            return StoredContent::InlineContent {
                content: content.clone(),
            };
        }

        if let Some(name) = self
            .url
            .as_deref()
            .and_then(|u| u.strip_prefix(LEGACY_UPLOADS_PREFIX))
        {
            return StoredContent::LocalFile {
                path: name.to_string(),
            };
        }

        StoredContent::MetadataOnly {
            warning: Some(self.warning.clone().unwrap_or_else(|| {
                format!("legacy record without a recognisable locator (storageType: {storage_type:?})")
            })),
        }
    }
}
