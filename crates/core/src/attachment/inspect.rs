//! Payload-free attachment diagnostics.

use serde::Serialize;
use uuid::Uuid;

use super::error::AttachmentError;
use super::repository::AttachmentRepository;
use super::service::AttachmentService;
use super::types::{AttachmentDescriptor, StoredContent};
use crate::storage::{PdfSignature, StorageTier, codec};

/// Descriptor fields without any payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorSummary {
    /// Attachment filename.
    pub filename: String,
    /// Uploader's file name.
    pub original_name: String,
    /// Size in bytes.
    pub size: u64,
    /// Canonical tier.
    pub storage_tier: StorageTier,
    /// Length of the inline base64 payload.
    pub inline_length: Option<usize>,
    /// Overflow document ID.
    pub content_doc_id: Option<String>,
    /// External object ID.
    pub file_id: Option<String>,
    /// Recorded local copy.
    pub local_copy: Option<String>,
    /// Metadata-only warning.
    pub warning: Option<String>,
}

impl From<&AttachmentDescriptor> for DescriptorSummary {
    fn from(descriptor: &AttachmentDescriptor) -> Self {
        let mut summary = Self {
            filename: descriptor.filename.clone(),
            original_name: descriptor.original_name.clone(),
            size: descriptor.size,
            storage_tier: descriptor.tier(),
            inline_length: None,
            content_doc_id: None,
            file_id: None,
            local_copy: descriptor.local_copy.clone(),
            warning: None,
        };
        match &descriptor.stored {
            StoredContent::InlineContent { content } => summary.inline_length = Some(content.len()),
            StoredContent::OverflowDocument { content_doc_id } => {
                summary.content_doc_id = Some(content_doc_id.clone());
            }
            StoredContent::ExternalObject { file_id, .. } => summary.file_id = Some(file_id.clone()),
            StoredContent::MetadataOnly { warning } => summary.warning.clone_from(warning),
            StoredContent::LocalFile { .. } => {}
        }
        summary
    }
}

/// State of the overflow document a descriptor points at.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverflowReport {
    /// Whether the document exists.
    pub exists: bool,
    /// Base64 length, when it exists.
    pub content_length: Option<usize>,
}

/// PDF header check of an inline payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureReport {
    /// Whether the payload decoded.
    pub decodes: bool,
    /// Decoded length.
    pub decoded_length: Option<usize>,
    /// Marker at offset zero.
    pub valid_header: bool,
    /// Marker offset when not at zero.
    pub header_offset: Option<usize>,
}

/// Diagnostic report for one attachment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentReport {
    /// Post ID.
    pub post_id: Uuid,
    /// Post title.
    pub post_title: String,
    /// Descriptor summary.
    pub descriptor: DescriptorSummary,
    /// Overflow document state, for `overflow_document`.
    pub overflow: Option<OverflowReport>,
    /// Inline header check, for `inline_content`.
    pub inline_signature: Option<SignatureReport>,
}

impl<R: AttachmentRepository> AttachmentService<R> {
    /// Reports where an attachment lives, without returning payloads.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::NotFound`] when no post references the file.
    pub async fn inspect(&self, requested: &str) -> Result<AttachmentReport, AttachmentError> {
        let post = self
            .find_owner(requested)
            .await?
            .ok_or_else(|| AttachmentError::NotFound(requested.to_string()))?;
        let descriptor = &post.descriptor;

        let overflow = match &descriptor.stored {
            StoredContent::OverflowDocument { content_doc_id } => {
                let document = self.repo.find_overflow_document(content_doc_id).await?;
                Some(OverflowReport {
                    exists: document.is_some(),
                    content_length: document.map(|d| d.content.len()),
                })
            }
            _ => None,
        };

        let inline_signature = match &descriptor.stored {
            StoredContent::InlineContent { content } => Some(signature_report(content)),
            _ => None,
        };

        Ok(AttachmentReport {
            post_id: post.id,
            post_title: post.title.clone(),
            descriptor: DescriptorSummary::from(descriptor),
            overflow,
            inline_signature,
        })
    }
}

fn signature_report(content: &str) -> SignatureReport {
    match codec::decode(content) {
        Ok(bytes) => {
            let signature = PdfSignature::inspect(&bytes);
            SignatureReport {
                decodes: true,
                decoded_length: Some(bytes.len()),
                valid_header: signature.is_valid(),
                header_offset: match signature {
                    PdfSignature::Offset(offset) => Some(offset),
                    PdfSignature::Valid | PdfSignature::Missing => None,
                },
            }
        }
        Err(_) => SignatureReport {
            decodes: false,
            decoded_length: None,
            valid_header: false,
            header_offset: None,
        },
    }
}
