//! Storage configuration types.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// External object-storage provider configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExternalProvider {
    /// Google Drive, authenticated with a service account.
    GoogleDrive {
        /// Service account email (`client_email` in the key file).
        service_account_email: String,
        /// PEM private key. Literal `\n` sequences are accepted.
        private_key: String,
        /// Folder that receives uploads.
        #[serde(default)]
        folder_id: Option<String>,
    },
    /// S3-compatible storage: Cloudflare R2, Supabase, AWS S3, DigitalOcean Spaces
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// AWS region.
        region: String,
        /// Public base URL of the bucket, when objects are world-readable.
        #[serde(default)]
        public_base_url: Option<String>,
    },
    /// Azure Blob Storage
    AzureBlob {
        /// Azure storage account name.
        account: String,
        /// Azure storage access key.
        access_key: String,
        /// Azure container name.
        container: String,
        /// Public base URL of the container.
        #[serde(default)]
        public_base_url: Option<String>,
    },
    /// Local filesystem standing in for a remote bucket (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
        /// Base URL the directory is published under, if any.
        #[serde(default)]
        public_base_url: Option<String>,
    },
}

impl ExternalProvider {
    /// Create Google Drive provider.
    #[must_use]
    pub fn google_drive(
        service_account_email: impl Into<String>,
        private_key: impl Into<String>,
        folder_id: Option<String>,
    ) -> Self {
        Self::GoogleDrive {
            service_account_email: service_account_email.into(),
            private_key: private_key.into(),
            folder_id,
        }
    }

    /// Create S3-compatible provider (Cloudflare R2, Supabase, AWS S3).
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
            public_base_url: None,
        }
    }

    /// Create Azure Blob Storage provider.
    #[must_use]
    pub fn azure_blob(
        account: impl Into<String>,
        access_key: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self::AzureBlob {
            account: account.into(),
            access_key: access_key.into(),
            container: container.into(),
            public_base_url: None,
        }
    }

    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs {
            root: root.into(),
            public_base_url: None,
        }
    }

    /// Set the public base URL (ignored for Google Drive, which has its own).
    #[must_use]
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        match &mut self {
            Self::S3 {
                public_base_url, ..
            }
            | Self::AzureBlob {
                public_base_url, ..
            }
            | Self::LocalFs {
                public_base_url, ..
            } => *public_base_url = Some(url.into()),
            Self::GoogleDrive { .. } => {}
        }
        self
    }

    /// Get the provider name for logs and health output.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::GoogleDrive { .. } => "google_drive",
            Self::S3 { .. } => "s3",
            Self::AzureBlob { .. } => "azure_blob",
            Self::LocalFs { .. } => "local",
        }
    }

    /// Get the bucket, container or folder name.
    #[must_use]
    pub fn location(&self) -> &str {
        match self {
            Self::GoogleDrive { folder_id, .. } => folder_id.as_deref().unwrap_or("root"),
            Self::S3 { bucket, .. } => bucket,
            Self::AzureBlob { container, .. } => container,
            Self::LocalFs { root, .. } => root.to_str().unwrap_or("local"),
        }
    }
}

impl fmt::Debug for ExternalProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalProvider")
            .field("type", &self.name())
            .field("location", &self.location())
            .finish_non_exhaustive()
    }
}

/// How the serve resolver hands out external objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalReadMode {
    /// Download through the provider API and stream the bytes back.
    #[default]
    Proxy,
    /// Redirect the client to the object's public URL.
    Redirect,
}

/// Storage configuration, loaded from the `storage` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory backing the `local_file` tier.
    pub uploads_dir: PathBuf,
    /// Maximum upload size in bytes.
    pub max_file_size: u64,
    /// Largest base64 text length accepted by the `inline_content` tier (exclusive).
    pub inline_ceiling: usize,
    /// Also write a local copy when the filesystem persists.
    pub keep_local_copy: bool,
    /// `Cache-Control: max-age` for served PDFs.
    pub cache_max_age_secs: u64,
    /// Presigned download URL TTL in seconds (default: 3600 = 1 hour).
    pub presign_download_ttl_secs: u64,
    /// How external objects are served.
    pub external_read: ExternalReadMode,
    /// External provider, if any.
    pub external: Option<ExternalProvider>,
}

impl StorageConfig {
    /// Default max file size: 50MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;
    /// Default inline ceiling: 4 MiB of base64 text.
    pub const DEFAULT_INLINE_CEILING: usize = 4 * 1024 * 1024;
    /// Default cache lifetime: 1 hour.
    pub const DEFAULT_CACHE_MAX_AGE: u64 = 3600;
    /// Default download TTL: 1 hour.
    pub const DEFAULT_DOWNLOAD_TTL: u64 = 3600;
    /// Default uploads directory.
    pub const DEFAULT_UPLOADS_DIR: &'static str = "./public/uploads/pdfs";

    /// Create a new storage config with default settings and no external provider.
    #[must_use]
    pub fn new() -> Self {
        Self {
            uploads_dir: PathBuf::from(Self::DEFAULT_UPLOADS_DIR),
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            inline_ceiling: Self::DEFAULT_INLINE_CEILING,
            keep_local_copy: true,
            cache_max_age_secs: Self::DEFAULT_CACHE_MAX_AGE,
            presign_download_ttl_secs: Self::DEFAULT_DOWNLOAD_TTL,
            external_read: ExternalReadMode::Proxy,
            external: None,
        }
    }

    /// Loads the `storage` section of the layered configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the section is present but malformed.
    pub fn load() -> Result<Self, config::ConfigError> {
        madani_shared::load_section("storage")
    }

    /// Set the uploads directory.
    #[must_use]
    pub fn with_uploads_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.uploads_dir = dir.into();
        self
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Set the inline ceiling.
    #[must_use]
    pub fn with_inline_ceiling(mut self, ceiling: usize) -> Self {
        self.inline_ceiling = ceiling;
        self
    }

    /// Enable or disable the best-effort local copy.
    #[must_use]
    pub fn with_keep_local_copy(mut self, keep: bool) -> Self {
        self.keep_local_copy = keep;
        self
    }

    /// Set the external provider.
    #[must_use]
    pub fn with_external(mut self, provider: ExternalProvider) -> Self {
        self.external = Some(provider);
        self
    }

    /// Set how external objects are served.
    #[must_use]
    pub fn with_external_read(mut self, mode: ExternalReadMode) -> Self {
        self.external_read = mode;
        self
    }

    /// Set presigned download URL TTL.
    #[must_use]
    pub fn with_download_ttl(mut self, secs: u64) -> Self {
        self.presign_download_ttl_secs = secs;
        self
    }

    /// Check if a MIME type is accepted for upload.
    ///
    /// Browsers disagree on PDF MIME types (`application/pdf`, `application/x-pdf`),
    /// so anything mentioning `pdf` passes.
    #[must_use]
    pub fn is_mime_type_allowed(mime_type: &str) -> bool {
        mime_type.to_ascii_lowercase().contains("pdf")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new()
    }
}
