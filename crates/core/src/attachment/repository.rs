//! Persistence seam for posts and overflow documents.

use std::future::Future;

use uuid::Uuid;

use super::error::AttachmentError;
use super::types::{
    AttachmentDescriptor, NewOverflowDocument, OverflowDocument, OwningPost, PostSummary,
};

/// Repository trait for attachment persistence.
///
/// This trait is implemented by the db crate to provide actual database
/// operations; [`super::MemoryAttachmentRepository`] backs tests and
/// database-less deployments.
pub trait AttachmentRepository: Send + Sync {
    /// Finds the post whose attachment has `filename`.
    fn find_post_by_pdf_filename(
        &self,
        filename: &str,
    ) -> impl Future<Output = Result<Option<OwningPost>, AttachmentError>> + Send;

    /// Finds a post by ID.
    fn find_post(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<PostSummary>, AttachmentError>> + Send;

    /// Replaces a post's attachment descriptor.
    ///
    /// Returns [`AttachmentError::PostNotFound`] when the post does not exist.
    fn save_pdf_attachment(
        &self,
        post_id: Uuid,
        descriptor: &AttachmentDescriptor,
    ) -> impl Future<Output = Result<(), AttachmentError>> + Send;

    /// Stores an overflow document and returns its ID.
    fn create_overflow_document(
        &self,
        document: NewOverflowDocument,
    ) -> impl Future<Output = Result<String, AttachmentError>> + Send;

    /// Loads an overflow document.
    fn find_overflow_document(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<OverflowDocument>, AttachmentError>> + Send;

    /// Checks that the backing store answers.
    fn ping(&self) -> impl Future<Output = Result<(), AttachmentError>> + Send;
}
