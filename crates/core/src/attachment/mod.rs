//! PDF attachments for posts.
//!
//! This module provides the resolvers behind the attachment endpoints:
//! - Upload: validate, pick the first storage tier that accepts the bytes
//! - Serve: find the owning post, read the canonical tier, fall back locally
//! - Repair: move `metadata_only` attachments to a durable tier
//! - Inspect: payload-free diagnostics

mod error;
mod filename;
mod inspect;
mod legacy;
mod memory;
mod repair;
mod repository;
mod serve;
mod service;
mod staging;
mod types;
mod upload;

#[cfg(test)]
mod service_tests;

pub use error::AttachmentError;
pub use filename::{
    DEFAULT_ORIGINAL_NAME, generate_filename, lookup_candidates, original_name_or_default,
    sanitize_filename,
};
pub use inspect::{AttachmentReport, DescriptorSummary, OverflowReport, SignatureReport};
pub use memory::MemoryAttachmentRepository;
pub use repair::RepairOutcome;
pub use repository::AttachmentRepository;
pub use serve::{
    Recommendation, RecommendationAction, ServeFailure, ServeFailureKind, ServeOutcome, ServedPdf,
};
pub use service::AttachmentService;
pub use staging::StagedUpload;
pub use types::{
    AttachmentDescriptor, NewOverflowDocument, OverflowDocument, OwningPost, PostSummary,
    SERVE_PDF_ROUTE, StoredContent, serve_url,
};
pub use upload::UploadOutcome;
