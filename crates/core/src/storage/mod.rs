//! Storage tiers for PDF attachment bytes.
//!
//! Every attachment's bytes live in exactly one canonical tier:
//! - `local_file` - the uploads directory (durable only on persistent hosts)
//! - `inline_content` - base64 text inside the descriptor
//! - `overflow_document` - base64 text in a separate document
//! - `external_object` - Google Drive, or S3 / Azure Blob / filesystem via Apache OpenDAL
//! - `metadata_only` - nothing retained
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         BinaryStore                              │
//! │              write(tier, bytes) / read(locator)                  │
//! ├──────────────┬──────────────┬──────────────┬────────────────────┤
//! │ LocalFileStore│ codec (b64)  │ Repository   │ ExternalObjectStore│
//! │ (OpenDAL Fs) │              │ (overflow)   │ (Drive | OpenDAL)  │
//! └──────────────┴──────────────┴──────────────┴────────────────────┘
//! ```

pub mod codec;
mod config;
mod error;
mod external;
mod local;
pub mod object;
mod store;
mod tier;

pub use codec::PdfSignature;
pub use config::{ExternalProvider, ExternalReadMode, StorageConfig};
pub use error::{StorageError, TierFailure};
pub use external::{ExternalLocator, ExternalObjectStore, SERVE_OBJECT_ROUTE, proxy_url};
pub use local::{LocalFileStore, LocalMatch, LocalSearch};
pub use store::{BinaryStore, StoreKey};
pub use tier::StorageTier;
