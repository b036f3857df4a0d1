//! Serve resolver.

use bytes::Bytes;
use serde::Serialize;

use super::filename::lookup_candidates;
use super::repository::AttachmentRepository;
use super::service::AttachmentService;
use super::types::{AttachmentDescriptor, StoredContent};
use crate::storage::{ExternalReadMode, LocalSearch, PdfSignature, StorageTier, TierFailure};

/// PDF bytes ready to send.
#[derive(Debug, Clone)]
pub struct ServedPdf {
    /// File bytes.
    pub data: Bytes,
    /// Tier that produced the bytes.
    pub tier: StorageTier,
    /// Generated filename.
    pub filename: String,
    /// Name for `Content-Disposition`.
    pub original_name: String,
    /// Result of the header check.
    pub signature: PdfSignature,
}

/// What the serve resolver produced.
#[derive(Debug, Clone)]
pub enum ServeOutcome {
    /// Bytes to stream back.
    Pdf(ServedPdf),
    /// Send the client elsewhere.
    Redirect {
        /// Target URL.
        location: String,
        /// Tier of the target.
        tier: StorageTier,
    },
}

/// Why serving failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServeFailureKind {
    /// No post references the filename.
    NotFound,
    /// A descriptor exists but no tier produced the bytes.
    ContentUnavailable,
}

/// Suggested next step for the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationAction {
    /// Download the file instead of viewing inline.
    Download,
    /// Open the viewer full screen.
    FullScreen,
    /// Try again later.
    Retry,
    /// Ask an administrator to re-upload the file.
    ContactAdmin,
}

/// A suggestion shown with a failed serve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    /// Suggested action.
    pub action: RecommendationAction,
    /// Human-readable text.
    pub message: String,
}

impl Recommendation {
    fn new(action: RecommendationAction, message: &str) -> Self {
        Self {
            action,
            message: message.to_string(),
        }
    }
}

/// A serve that could not produce bytes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServeFailure {
    /// Failure kind.
    #[serde(rename = "error")]
    pub kind: ServeFailureKind,
    /// Human-readable explanation.
    pub message: String,
    /// Requested filename.
    pub filename: String,
    /// Canonical tier of the descriptor, when one exists.
    pub storage_tier: Option<StorageTier>,
    /// Suggested next steps.
    pub recommendations: Vec<Recommendation>,
    /// True in production mode.
    pub is_production: bool,
    /// True when the file was too big for inline storage.
    pub is_large_file: bool,
    /// True when the same request may succeed later.
    #[serde(skip)]
    pub retryable: bool,
}

impl ServeFailure {
    /// HTTP status: 503 for transient exhaustion, 404 otherwise.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        if self.retryable { 503 } else { 404 }
    }
}

impl<R: AttachmentRepository> AttachmentService<R> {
    /// Resolves a requested filename to PDF bytes (or a redirect).
    ///
    /// The canonical tier is tried first. When it fails, or the descriptor is
    /// `metadata_only`, a persistent host also searches the uploads directory.
    ///
    /// # Errors
    ///
    /// Returns a structured [`ServeFailure`]; never a bare error.
    pub async fn serve(&self, requested: &str) -> Result<ServeOutcome, ServeFailure> {
        let post = match self.find_owner(requested).await {
            Ok(Some(post)) => post,
            Ok(None) => {
                tracing::info!(requested, "No post references requested PDF");
                return Err(self.not_found(requested));
            }
            Err(e) => {
                tracing::error!(requested, error = %e, "Attachment lookup failed");
                return Err(self.lookup_failed(requested));
            }
        };
        let descriptor = post.descriptor;

        if let Some(location) = self.redirect_target(&descriptor) {
            tracing::debug!(filename = %descriptor.filename, "Redirecting to public URL");
            return Ok(ServeOutcome::Redirect {
                location,
                tier: StorageTier::ExternalObject,
            });
        }

        let mut canonical_failure: Option<TierFailure> = None;
        if descriptor.tier().holds_content() {
            match self.store.read(&descriptor.stored).await {
                Ok(data) => {
                    return Ok(ServeOutcome::Pdf(
                        self.served(data, descriptor.tier(), &descriptor),
                    ));
                }
                Err(failure) => canonical_failure = Some(failure),
            }
        }

        if self.environment.has_persistent_filesystem() {
            let candidates = local_candidates(&descriptor, requested);
            if let Ok(found) = self.store.find_local(&candidates, LocalSearch::Fuzzy).await {
                tracing::info!(
                    filename = %descriptor.filename,
                    canonical = %descriptor.tier(),
                    local = %found.name,
                    fuzzy = found.fuzzy,
                    "PDF served from local fallback"
                );
                return Ok(ServeOutcome::Pdf(self.served(
                    found.data,
                    StorageTier::LocalFile,
                    &descriptor,
                )));
            }
        }

        Err(self.unavailable(requested, &descriptor, canonical_failure.as_ref()))
    }

    /// Proxies an external object by provider identifier.
    ///
    /// # Errors
    ///
    /// Returns a retryable [`ServeFailure`] when neither the provider nor the
    /// public URL produces the bytes.
    pub async fn serve_object(&self, file_id: &str) -> Result<ServedPdf, ServeFailure> {
        match self.store.external().fetch(file_id, None).await {
            Ok(data) => {
                let signature = PdfSignature::inspect(&data);
                if !signature.is_valid() {
                    tracing::warn!(file_id, ?signature, "External object lacks a clean PDF header");
                }
                Ok(ServedPdf {
                    data,
                    tier: StorageTier::ExternalObject,
                    filename: file_id.to_string(),
                    original_name: file_id.to_string(),
                    signature,
                })
            }
            Err(e) => {
                tracing::warn!(file_id, error = %e, "External object could not be fetched");
                Err(ServeFailure {
                    kind: ServeFailureKind::ContentUnavailable,
                    message: "The file could not be fetched from external storage right now."
                        .to_string(),
                    filename: file_id.to_string(),
                    storage_tier: Some(StorageTier::ExternalObject),
                    recommendations: vec![
                        Recommendation::new(RecommendationAction::Retry, "Try again in a moment."),
                        Recommendation::new(
                            RecommendationAction::ContactAdmin,
                            "If this keeps happening, contact the administrator.",
                        ),
                    ],
                    is_production: self.environment.is_production(),
                    is_large_file: false,
                    retryable: !e.is_not_configured(),
                })
            }
        }
    }

    fn redirect_target(&self, descriptor: &AttachmentDescriptor) -> Option<String> {
        if self.store.external().read_mode() != ExternalReadMode::Redirect {
            return None;
        }
        match &descriptor.stored {
            StoredContent::ExternalObject {
                public_url: Some(url),
                ..
            } => Some(url.clone()),
            _ => None,
        }
    }

    fn served(&self, data: Bytes, tier: StorageTier, descriptor: &AttachmentDescriptor) -> ServedPdf {
        let signature = PdfSignature::inspect(&data);
        if !signature.is_valid() {
            tracing::warn!(
                filename = %descriptor.filename,
                tier = %tier,
                ?signature,
                "Served bytes lack a clean PDF header"
            );
        }
        ServedPdf {
            data,
            tier,
            filename: descriptor.filename.clone(),
            original_name: descriptor.original_name.clone(),
            signature,
        }
    }

    fn not_found(&self, requested: &str) -> ServeFailure {
        ServeFailure {
            kind: ServeFailureKind::NotFound,
            message: format!("No post references the PDF '{requested}'."),
            filename: requested.to_string(),
            storage_tier: None,
            recommendations: vec![Recommendation::new(
                RecommendationAction::ContactAdmin,
                "Check the link, or ask the administrator to re-attach the file.",
            )],
            is_production: self.environment.is_production(),
            is_large_file: false,
            retryable: false,
        }
    }

    fn lookup_failed(&self, requested: &str) -> ServeFailure {
        ServeFailure {
            kind: ServeFailureKind::ContentUnavailable,
            message: "The attachment record could not be loaded right now.".to_string(),
            filename: requested.to_string(),
            storage_tier: None,
            recommendations: vec![
                Recommendation::new(RecommendationAction::Retry, "Try again in a moment."),
                Recommendation::new(
                    RecommendationAction::ContactAdmin,
                    "If this keeps happening, contact the administrator.",
                ),
            ],
            is_production: self.environment.is_production(),
            is_large_file: false,
            retryable: true,
        }
    }

    fn unavailable(
        &self,
        requested: &str,
        descriptor: &AttachmentDescriptor,
        canonical_failure: Option<&TierFailure>,
    ) -> ServeFailure {
        let tier = descriptor.tier();
        let production = self.environment.is_production();
        let is_large_file = usize::try_from(descriptor.size)
            .map_or(true, |size| !self.store.fits_inline(size));

        // Retrying helps only when a tier that holds the bytes failed for a
        // reason other than being unconfigured.
        let retryable = canonical_failure.is_some_and(|f| !f.source.is_not_configured());

        let (message, recommendations) = if retryable {
            (
                format!("The PDF is stored in {tier} but could not be read right now."),
                vec![
                    Recommendation::new(RecommendationAction::Retry, "Try again in a moment."),
                    Recommendation::new(
                        RecommendationAction::FullScreen,
                        "Open the viewer full screen once the file loads.",
                    ),
                    Recommendation::new(
                        RecommendationAction::ContactAdmin,
                        "If this keeps happening, contact the administrator.",
                    ),
                ],
            )
        } else if production {
            (
                "This PDF's content is not available on this server. Please contact the administrator to upload it to cloud storage.".to_string(),
                vec![Recommendation::new(
                    RecommendationAction::ContactAdmin,
                    "Ask the administrator to re-upload the file.",
                )],
            )
        } else {
            (
                "This PDF's content was not stored; only its details were saved.".to_string(),
                vec![
                    Recommendation::new(
                        RecommendationAction::Download,
                        "Download the original from wherever it was first shared.",
                    ),
                    Recommendation::new(
                        RecommendationAction::ContactAdmin,
                        "Ask the administrator to re-upload the file.",
                    ),
                ],
            )
        };

        tracing::warn!(
            filename = %descriptor.filename,
            tier = %tier,
            retryable,
            "PDF content unavailable"
        );

        ServeFailure {
            kind: ServeFailureKind::ContentUnavailable,
            message,
            filename: requested.to_string(),
            storage_tier: Some(tier),
            recommendations,
            is_production: production,
            is_large_file,
            retryable,
        }
    }
}

/// Local names to try: recorded copy, stored filename, then request variants.
fn local_candidates(descriptor: &AttachmentDescriptor, requested: &str) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    let mut push = |name: String| {
        if !name.is_empty() && !candidates.contains(&name) {
            candidates.push(name);
        }
    };
    if let Some(copy) = &descriptor.local_copy {
        push(copy.clone());
    }
    if let StoredContent::LocalFile { path } = &descriptor.stored {
        push(path.clone());
    }
    push(descriptor.filename.clone());
    for name in lookup_candidates(requested) {
        push(name);
    }
    candidates
}
