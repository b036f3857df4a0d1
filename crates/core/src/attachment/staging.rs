//! Request-scoped temporary files for incoming uploads.
//!
//! Multipart bodies are streamed to a temp file with the size cap enforced per
//! chunk. The file is deleted when the [`StagedUpload`] is dropped, on every
//! exit path.

use std::path::Path;

use bytes::Bytes;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use super::error::AttachmentError;

/// An upload being received.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
    writer: tokio::fs::File,
    len: u64,
    max: u64,
    original_name: Option<String>,
    content_type: Option<String>,
}

impl StagedUpload {
    /// Creates an empty staging file in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the temp file cannot be created.
    pub fn create(
        dir: &Path,
        max: u64,
        original_name: Option<String>,
        content_type: Option<String>,
    ) -> Result<Self, AttachmentError> {
        let file = tempfile::Builder::new()
            .prefix("madani-upload-")
            .suffix(".pdf")
            .tempfile_in(dir)?;
        let writer = tokio::fs::File::from_std(file.as_file().try_clone()?);
        Ok(Self {
            file,
            writer,
            len: 0,
            max,
            original_name,
            content_type,
        })
    }

    /// Stages an in-memory payload in one step.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::FileTooLarge`] when `data` exceeds `max`.
    pub async fn from_bytes(
        dir: &Path,
        max: u64,
        original_name: Option<String>,
        content_type: Option<String>,
        data: &[u8],
    ) -> Result<Self, AttachmentError> {
        let mut staged = Self::create(dir, max, original_name, content_type)?;
        staged.append(data).await?;
        Ok(staged)
    }

    /// Appends a chunk, rejecting it if the running total would pass the cap.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::FileTooLarge`] or an I/O error.
    pub async fn append(&mut self, chunk: &[u8]) -> Result<(), AttachmentError> {
        let next = self.len + chunk.len() as u64;
        if next > self.max {
            return Err(AttachmentError::file_too_large(next, self.max));
        }
        self.writer.write_all(chunk).await?;
        self.len = next;
        Ok(())
    }

    /// Bytes received so far.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True when nothing has been received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Name the client gave the file.
    #[must_use]
    pub fn original_name(&self) -> Option<&str> {
        self.original_name.as_deref()
    }

    /// MIME type the client declared.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Path of the staging file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Flushes and reads the whole payload.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read.
    pub async fn read_all(&mut self) -> Result<Bytes, AttachmentError> {
        self.writer.flush().await?;
        Ok(Bytes::from(tokio::fs::read(self.file.path()).await?))
    }
}
