//! Storage error types.

use thiserror::Error;

use super::tier::StorageTier;
use crate::service_cell::ServiceUnavailable;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Object not found in storage.
    #[error("file not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// The tier has no backing service configured.
    #[error("{0} is not configured")]
    NotConfigured(String),

    /// The backing service failed to initialise.
    #[error(transparent)]
    Unavailable(#[from] ServiceUnavailable),

    /// Presign operation not supported by provider.
    #[error("presign operation not supported by storage provider")]
    PresignNotSupported,

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// OpenDAL or HTTP operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),

    /// Remote API answered with a non-success status.
    #[error("remote storage returned {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        body: String,
    },

    /// Service-account token exchange failed.
    #[error("storage authentication failed: {0}")]
    Auth(String),

    /// Base64 payload could not be decoded.
    #[error("stored content is not valid base64: {0}")]
    Decode(String),

    /// Encoded payload does not fit the inline tier.
    #[error("encoded size {encoded} exceeds inline ceiling {ceiling}")]
    ExceedsInlineCeiling {
        /// Base64 text length.
        encoded: usize,
        /// Configured ceiling.
        ceiling: usize,
    },

    /// Overflow document store failed.
    #[error("overflow document store failed: {0}")]
    Repository(String),

    /// Invalid storage key format.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// The tier cannot hold bytes.
    #[error("{0} tier does not hold content")]
    NotWritable(StorageTier),
}

impl StorageError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// True when the tier was never configured, as opposed to having failed.
    #[must_use]
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured(_))
            || matches!(self, Self::Unavailable(e) if e.reason == "not configured")
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            opendal::ErrorKind::Unsupported => Self::PresignNotSupported,
            _ => Self::Operation(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        Self::Operation(err.to_string())
    }
}

impl From<base64::DecodeError> for StorageError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Decode(err.to_string())
    }
}

/// A storage error attributed to the tier that produced it.
#[derive(Debug, Error)]
#[error("{tier} tier failed: {source}")]
pub struct TierFailure {
    /// Tier that failed.
    pub tier: StorageTier,
    /// Underlying error.
    #[source]
    pub source: StorageError,
}

impl TierFailure {
    /// Attribute `source` to `tier`.
    #[must_use]
    pub fn new(tier: StorageTier, source: StorageError) -> Self {
        Self { tier, source }
    }
}
