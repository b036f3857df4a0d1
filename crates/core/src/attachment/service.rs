//! Attachment service: shared state for the upload, serve and repair resolvers.

use std::sync::Arc;

use bytes::Bytes;
use madani_shared::DeploymentEnvironment;

use super::error::AttachmentError;
use super::filename::lookup_candidates;
use super::repository::AttachmentRepository;
use super::types::{OwningPost, StoredContent};
use crate::service_cell::ServiceState;
use crate::storage::{
    BinaryStore, ExternalObjectStore, LocalFileStore, StorageConfig, StorageTier, StoreKey,
    TierFailure,
};

/// Result of running the durable persistence policy.
#[derive(Debug)]
pub(crate) struct Persisted {
    /// Canonical locator (possibly `metadata_only`).
    pub content: StoredContent,
    /// Tiers that were tried and failed, in order.
    pub failures: Vec<TierFailure>,
}

impl Persisted {
    pub fn failed_tiers(&self) -> Vec<StorageTier> {
        self.failures.iter().map(|f| f.tier).collect()
    }
}

/// Attachment service for PDF upload, serving and repair.
#[derive(Debug)]
pub struct AttachmentService<R: AttachmentRepository> {
    pub(crate) store: BinaryStore<R>,
    pub(crate) repo: Arc<R>,
    pub(crate) config: StorageConfig,
    pub(crate) environment: DeploymentEnvironment,
}

impl<R: AttachmentRepository> AttachmentService<R> {
    /// Create a new attachment service around an explicit external store.
    ///
    /// The local tier is only opened on hosts with a persistent filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error if the uploads directory cannot be opened.
    pub fn new(
        config: StorageConfig,
        environment: DeploymentEnvironment,
        repo: Arc<R>,
        external: ExternalObjectStore,
    ) -> Result<Self, AttachmentError> {
        let local = if environment.has_persistent_filesystem() {
            Some(LocalFileStore::new(&config.uploads_dir)?)
        } else {
            tracing::info!(
                platform = environment.platform_name(),
                "No persistent filesystem; local file tier disabled"
            );
            None
        };

        let external = external.with_read_mode(config.external_read);
        let store = BinaryStore::new(local, external, repo.clone(), config.inline_ceiling);

        Ok(Self {
            store,
            repo,
            config,
            environment,
        })
    }

    /// Create a service whose external store follows `config.external`.
    ///
    /// # Errors
    ///
    /// Returns an error if the uploads directory cannot be opened.
    pub fn from_config(
        config: StorageConfig,
        environment: DeploymentEnvironment,
        repo: Arc<R>,
    ) -> Result<Self, AttachmentError> {
        let external = ExternalObjectStore::from_config(&config);
        Self::new(config, environment, repo, external)
    }

    /// Storage configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Deployment environment.
    #[must_use]
    pub fn environment(&self) -> &DeploymentEnvironment {
        &self.environment
    }

    /// Repository.
    #[must_use]
    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    /// Tier store.
    #[must_use]
    pub fn store(&self) -> &BinaryStore<R> {
        &self.store
    }

    /// State of the external provider client.
    #[must_use]
    pub fn external_state(&self) -> ServiceState {
        self.store.external().state()
    }

    /// Checks the repository connection.
    ///
    /// # Errors
    ///
    /// Returns the repository error.
    pub async fn check_repository(&self) -> Result<(), AttachmentError> {
        self.repo.ping().await
    }

    /// Finds the post owning `requested`, trying each lookup candidate.
    pub(crate) async fn find_owner(
        &self,
        requested: &str,
    ) -> Result<Option<OwningPost>, AttachmentError> {
        for candidate in lookup_candidates(requested) {
            if let Some(post) = self.repo.find_post_by_pdf_filename(&candidate).await? {
                if candidate != requested {
                    tracing::debug!(requested, matched = %candidate, "Attachment matched by alternate name");
                }
                return Ok(Some(post));
            }
        }
        Ok(None)
    }

    /// Durable persistence policy: external, then inline, then overflow.
    ///
    /// Never fails; when every tier refuses the bytes the result is
    /// `metadata_only` with the reasons recorded.
    pub(crate) async fn persist_durable(&self, data: &Bytes, key: &StoreKey<'_>) -> Persisted {
        let mut failures = Vec::new();

        match self.store.write(StorageTier::ExternalObject, data, key).await {
            Ok(content) => return Persisted { content, failures },
            Err(failure) => failures.push(failure),
        }

        if self.store.fits_inline(data.len()) {
            match self.store.write(StorageTier::InlineContent, data, key).await {
                Ok(content) => return Persisted { content, failures },
                Err(failure) => failures.push(failure),
            }
        }

        match self.store.write(StorageTier::OverflowDocument, data, key).await {
            Ok(content) => return Persisted { content, failures },
            Err(failure) => failures.push(failure),
        }

        let reasons = failures
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        tracing::error!(
            filename = key.filename,
            size = data.len(),
            reasons = %reasons,
            "No storage tier accepted the PDF; keeping metadata only"
        );
        Persisted {
            content: StoredContent::metadata_only(format!(
                "File content could not be stored ({} bytes); only metadata was saved",
                data.len()
            )),
            failures,
        }
    }

    /// Writes the best-effort local copy, when this host keeps one.
    pub(crate) async fn write_local_copy(&self, data: &Bytes, key: &StoreKey<'_>) -> Option<String> {
        if !self.environment.has_persistent_filesystem() || !self.config.keep_local_copy {
            return None;
        }
        match self.store.write(StorageTier::LocalFile, data, key).await {
            Ok(StoredContent::LocalFile { path }) => Some(path),
            Ok(_) | Err(_) => None,
        }
    }
}
