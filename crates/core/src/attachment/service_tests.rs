//! Resolver scenarios against in-memory and temp-dir backends.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use madani_shared::DeploymentEnvironment;
use serde_json::json;
use tempfile::TempDir;
use uuid::Uuid;

use super::*;
use crate::storage::object::{ObjectStorage, ObjectUpload, OpendalStorage, StoredObject};
use crate::storage::{
    ExternalObjectStore, ExternalReadMode, StorageConfig, StorageError, StorageTier,
};

const TS: i64 = 1_700_000_000_000;

/// Memory repository whose overflow writes and descriptor saves can be switched off.
#[derive(Debug, Default)]
struct FlakyRepository {
    inner: MemoryAttachmentRepository,
    fail_overflow: AtomicBool,
    fail_save: AtomicBool,
}

impl FlakyRepository {
    fn failing_overflow() -> Self {
        Self {
            inner: MemoryAttachmentRepository::new(),
            fail_overflow: AtomicBool::new(true),
            fail_save: AtomicBool::new(false),
        }
    }

    fn failing_save() -> Self {
        Self {
            fail_save: AtomicBool::new(true),
            ..Self::default()
        }
    }
}

impl AttachmentRepository for FlakyRepository {
    async fn find_post_by_pdf_filename(
        &self,
        filename: &str,
    ) -> Result<Option<OwningPost>, AttachmentError> {
        self.inner.find_post_by_pdf_filename(filename).await
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<PostSummary>, AttachmentError> {
        self.inner.find_post(id).await
    }

    async fn save_pdf_attachment(
        &self,
        post_id: Uuid,
        descriptor: &AttachmentDescriptor,
    ) -> Result<(), AttachmentError> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(AttachmentError::repository("write conflict"));
        }
        self.inner.save_pdf_attachment(post_id, descriptor).await
    }

    async fn create_overflow_document(
        &self,
        document: NewOverflowDocument,
    ) -> Result<String, AttachmentError> {
        if self.fail_overflow.load(Ordering::SeqCst) {
            return Err(AttachmentError::repository("document exceeds size limit"));
        }
        self.inner.create_overflow_document(document).await
    }

    async fn find_overflow_document(
        &self,
        id: &str,
    ) -> Result<Option<OverflowDocument>, AttachmentError> {
        self.inner.find_overflow_document(id).await
    }

    async fn ping(&self) -> Result<(), AttachmentError> {
        self.inner.ping().await
    }
}

/// Provider that refuses everything.
#[derive(Debug)]
struct FailingStorage;

#[async_trait]
impl ObjectStorage for FailingStorage {
    async fn upload(&self, _object: ObjectUpload) -> Result<StoredObject, StorageError> {
        Err(StorageError::Http {
            status: 403,
            body: "storage quota exceeded".to_string(),
        })
    }

    async fn download(&self, _file_id: &str) -> Result<Bytes, StorageError> {
        Err(StorageError::operation("connection reset"))
    }

    async fn grant_public_read(&self, _file_id: &str) -> Result<(), StorageError> {
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "failing"
    }
}

struct Fixture {
    dir: TempDir,
    service: AttachmentService<FlakyRepository>,
}

impl Fixture {
    fn build(
        environment: DeploymentEnvironment,
        repo: FlakyRepository,
        external: ExternalObjectStore,
        tune: impl FnOnce(StorageConfig) -> StorageConfig,
    ) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = tune(StorageConfig::new().with_uploads_dir(dir.path().join("uploads")));
        let service = AttachmentService::new(config, environment, Arc::new(repo), external)
            .expect("service");
        Self { dir, service }
    }

    fn serverless() -> Self {
        Self::build(
            DeploymentEnvironment::serverless("VERCEL"),
            FlakyRepository::default(),
            ExternalObjectStore::disabled(),
            |c| c,
        )
    }

    fn persistent() -> Self {
        Self::build(
            DeploymentEnvironment::persistent(),
            FlakyRepository::default(),
            ExternalObjectStore::disabled(),
            |c| c,
        )
    }

    fn repo(&self) -> &FlakyRepository {
        self.service.repository()
    }

    async fn post(&self) -> Uuid {
        self.repo().inner.insert_post("Weekly class").await
    }

    async fn upload(&self, name: &str, data: &[u8], post_id: Option<Uuid>) -> UploadOutcome {
        let mut staged = self
            .service
            .begin_upload(Some(name.to_string()), Some("application/pdf".to_string()))
            .expect("stage");
        staged.append(data).await.expect("append");
        self.service
            .upload_at(staged, post_id, TS)
            .await
            .expect("upload")
    }
}

fn pdf(len: usize) -> Vec<u8> {
    let mut data = b"%PDF-1.4\n".to_vec();
    data.resize(len, b'x');
    data
}

fn served(outcome: ServeOutcome) -> ServedPdf {
    match outcome {
        ServeOutcome::Pdf(pdf) => pdf,
        ServeOutcome::Redirect { location, .. } => panic!("unexpected redirect to {location}"),
    }
}

#[tokio::test]
async fn test_two_mib_upload_is_inline_and_round_trips() {
    let fixture = Fixture::serverless();
    let post_id = fixture.post().await;
    let data = pdf(2 * 1024 * 1024);

    let outcome = fixture.upload("Fiqh Notes.pdf", &data, Some(post_id)).await;
    let descriptor = &outcome.descriptor;
    assert_eq!(descriptor.filename, "1700000000000_Fiqh_Notes.pdf");
    assert_eq!(descriptor.original_name, "Fiqh Notes.pdf");
    assert_eq!(descriptor.tier(), StorageTier::InlineContent);
    assert_eq!(descriptor.size, 2_097_152);
    assert_eq!(descriptor.url, "/api/serve-pdf/1700000000000_Fiqh_Notes.pdf");
    assert_eq!(descriptor.local_copy, None);
    assert_eq!(outcome.failed_tiers, vec![StorageTier::ExternalObject]);

    let pdf = served(
        fixture
            .service
            .serve("1700000000000_Fiqh_Notes.pdf")
            .await
            .expect("serve"),
    );
    assert_eq!(pdf.data.len(), 2_097_152);
    assert!(pdf.data.starts_with(b"%PDF"));
    assert_eq!(pdf.tier, StorageTier::InlineContent);
    assert_eq!(pdf.original_name, "Fiqh Notes.pdf");
}

#[tokio::test]
async fn test_serve_accepts_encoded_and_unsanitized_names() {
    let fixture = Fixture::serverless();
    let post_id = fixture.post().await;
    let data = pdf(1000);
    fixture.upload("Fiqh Notes.pdf", &data, Some(post_id)).await;

    for requested in [
        "1700000000000_Fiqh_Notes.pdf",
        "1700000000000_Fiqh%20Notes.pdf",
        "1700000000000_Fiqh Notes.pdf",
    ] {
        let pdf = served(fixture.service.serve(requested).await.expect("serve"));
        assert_eq!(pdf.data.as_ref(), data.as_slice(), "requested {requested}");
    }
}

#[tokio::test]
async fn test_above_ceiling_goes_to_overflow() {
    let fixture = Fixture::build(
        DeploymentEnvironment::serverless("NETLIFY"),
        FlakyRepository::default(),
        ExternalObjectStore::disabled(),
        |c| c.with_inline_ceiling(1024),
    );
    let post_id = fixture.post().await;
    let data = pdf(8 * 1024);

    let outcome = fixture.upload("long.pdf", &data, Some(post_id)).await;
    assert_eq!(outcome.descriptor.tier(), StorageTier::OverflowDocument);
    assert_eq!(fixture.repo().inner.overflow_count().await, 1);

    let pdf = served(
        fixture
            .service
            .serve(&outcome.descriptor.filename)
            .await
            .expect("serve"),
    );
    assert_eq!(pdf.data.as_ref(), data.as_slice());
    assert_eq!(pdf.tier, StorageTier::OverflowDocument);
}

#[tokio::test]
async fn test_external_success_skips_inline_and_overflow() {
    let storage = Arc::new(OpendalStorage::memory().expect("memory"));
    let fixture = Fixture::build(
        DeploymentEnvironment::serverless("VERCEL"),
        FlakyRepository::default(),
        ExternalObjectStore::with_storage(storage),
        |c| c,
    );
    let post_id = fixture.post().await;
    let data = pdf(4096);

    let outcome = fixture.upload("talk.pdf", &data, Some(post_id)).await;
    assert!(outcome.failed_tiers.is_empty());
    match &outcome.descriptor.stored {
        StoredContent::ExternalObject {
            file_id, proxy_url, ..
        } => {
            assert_eq!(file_id, "1700000000000_talk.pdf");
            assert_eq!(
                proxy_url.as_deref(),
                Some("/api/serve-object/1700000000000_talk.pdf")
            );
        }
        other => panic!("expected external object, got {other:?}"),
    }
    assert_eq!(fixture.repo().inner.overflow_count().await, 0);

    let stored = fixture
        .repo()
        .inner
        .attachment_value(post_id)
        .await
        .expect("saved");
    assert!(stored.get("content").is_none());

    let pdf = served(
        fixture
            .service
            .serve("1700000000000_talk.pdf")
            .await
            .expect("serve"),
    );
    assert_eq!(pdf.data.as_ref(), data.as_slice());
    assert_eq!(pdf.tier, StorageTier::ExternalObject);

    let proxied = fixture
        .service
        .serve_object("1700000000000_talk.pdf")
        .await
        .expect("proxy");
    assert_eq!(proxied.data.as_ref(), data.as_slice());
}

#[tokio::test]
async fn test_failing_external_falls_back_to_inline() {
    let fixture = Fixture::build(
        DeploymentEnvironment::serverless("VERCEL"),
        FlakyRepository::default(),
        ExternalObjectStore::with_storage(Arc::new(FailingStorage)),
        |c| c,
    );
    let outcome = fixture.upload("a.pdf", &pdf(100), None).await;
    assert_eq!(outcome.descriptor.tier(), StorageTier::InlineContent);
    assert_eq!(outcome.failed_tiers, vec![StorageTier::ExternalObject]);
    assert_eq!(outcome.post_id, None);
}

#[tokio::test]
async fn test_every_tier_failing_keeps_metadata_only() {
    let fixture = Fixture::build(
        DeploymentEnvironment::serverless("VERCEL"),
        FlakyRepository::failing_overflow(),
        ExternalObjectStore::disabled(),
        |c| c.with_inline_ceiling(1024),
    );
    let post_id = fixture.post().await;

    let outcome = fixture.upload("huge.pdf", &pdf(64 * 1024), Some(post_id)).await;
    assert_eq!(outcome.descriptor.tier(), StorageTier::MetadataOnly);
    assert_eq!(
        outcome.failed_tiers,
        vec![StorageTier::ExternalObject, StorageTier::OverflowDocument]
    );

    let failure = fixture
        .service
        .serve(&outcome.descriptor.filename)
        .await
        .unwrap_err();
    assert_eq!(failure.kind, ServeFailureKind::ContentUnavailable);
    assert_eq!(failure.storage_tier, Some(StorageTier::MetadataOnly));
    assert_eq!(failure.status_code(), 404);
    assert!(failure.is_large_file);
    assert!(!failure.is_production);
    let actions: Vec<_> = failure.recommendations.iter().map(|r| r.action).collect();
    assert_eq!(
        actions,
        vec![RecommendationAction::Download, RecommendationAction::ContactAdmin]
    );
}

#[tokio::test]
async fn test_production_metadata_only_recommends_admin_only() {
    let fixture = Fixture::build(
        DeploymentEnvironment::serverless("VERCEL").with_production(true),
        FlakyRepository::failing_overflow(),
        ExternalObjectStore::disabled(),
        |c| c.with_inline_ceiling(1024),
    );
    let post_id = fixture.post().await;
    let outcome = fixture.upload("huge.pdf", &pdf(4096), Some(post_id)).await;

    let failure = fixture
        .service
        .serve(&outcome.descriptor.filename)
        .await
        .unwrap_err();
    assert!(failure.is_production);
    assert_eq!(failure.recommendations.len(), 1);
    assert_eq!(
        failure.recommendations[0].action,
        RecommendationAction::ContactAdmin
    );
}

#[tokio::test]
async fn test_unknown_filename_is_not_found() {
    let fixture = Fixture::serverless();
    let failure = fixture.service.serve("1_missing.pdf").await.unwrap_err();
    assert_eq!(failure.kind, ServeFailureKind::NotFound);
    assert_eq!(failure.storage_tier, None);
    assert_eq!(failure.status_code(), 404);
}

#[tokio::test]
async fn test_persistent_host_keeps_local_copy_and_serves_it_as_fallback() {
    let fixture = Fixture::build(
        DeploymentEnvironment::persistent(),
        FlakyRepository::failing_overflow(),
        ExternalObjectStore::disabled(),
        |c| c.with_inline_ceiling(1024),
    );
    let post_id = fixture.post().await;
    let data = pdf(4096);

    let outcome = fixture.upload("lecture.pdf", &data, Some(post_id)).await;
    assert_eq!(outcome.descriptor.tier(), StorageTier::MetadataOnly);
    assert_eq!(
        outcome.descriptor.local_copy.as_deref(),
        Some("1700000000000_lecture.pdf")
    );
    assert!(
        fixture
            .dir
            .path()
            .join("uploads/1700000000000_lecture.pdf")
            .exists()
    );

    let pdf = served(
        fixture
            .service
            .serve("1700000000000_lecture.pdf")
            .await
            .expect("serve"),
    );
    assert_eq!(pdf.tier, StorageTier::LocalFile);
    assert_eq!(pdf.data.as_ref(), data.as_slice());
}

#[tokio::test]
async fn test_external_read_failure_falls_back_to_local_on_persistent_host() {
    let storage = Arc::new(OpendalStorage::memory().expect("memory"));
    let fixture = Fixture::build(
        DeploymentEnvironment::persistent(),
        FlakyRepository::default(),
        ExternalObjectStore::with_storage(storage),
        |c| c,
    );
    fixture
        .repo()
        .inner
        .insert_post_with_attachment(
            "Old upload",
            json!({"filename": "1600000000000_old.pdf", "driveFileId": "gone"}),
        )
        .await;
    std::fs::create_dir_all(fixture.dir.path().join("uploads")).expect("mkdir");
    std::fs::write(
        fixture.dir.path().join("uploads/1600000000000_old.pdf"),
        pdf(300),
    )
    .expect("write");

    let pdf = served(
        fixture
            .service
            .serve("1600000000000_old.pdf")
            .await
            .expect("serve"),
    );
    assert_eq!(pdf.tier, StorageTier::LocalFile);
    assert_eq!(pdf.data.len(), 300);
}

#[tokio::test]
async fn test_external_read_failure_on_serverless_is_retryable() {
    let fixture = Fixture::build(
        DeploymentEnvironment::serverless("VERCEL"),
        FlakyRepository::default(),
        ExternalObjectStore::with_storage(Arc::new(FailingStorage)),
        |c| c,
    );
    fixture
        .repo()
        .inner
        .insert_post_with_attachment(
            "Old upload",
            json!({"filename": "1600000000000_old.pdf", "driveFileId": "d1", "size": 10}),
        )
        .await;

    let failure = fixture
        .service
        .serve("1600000000000_old.pdf")
        .await
        .unwrap_err();
    assert_eq!(failure.kind, ServeFailureKind::ContentUnavailable);
    assert_eq!(failure.storage_tier, Some(StorageTier::ExternalObject));
    assert!(failure.retryable);
    assert_eq!(failure.status_code(), 503);
}

#[tokio::test]
async fn test_redirect_mode_returns_public_url() {
    let storage = Arc::new(OpendalStorage::memory().expect("memory"));
    let fixture = Fixture::build(
        DeploymentEnvironment::serverless("VERCEL"),
        FlakyRepository::default(),
        ExternalObjectStore::with_storage(storage),
        |c| c.with_external_read(ExternalReadMode::Redirect),
    );
    fixture
        .repo()
        .inner
        .insert_post_with_attachment(
            "Shared",
            json!({
                "filename": "1_shared.pdf",
                "storageTier": "external_object",
                "originalName": "shared.pdf",
                "size": 10,
                "url": "/api/serve-pdf/1_shared.pdf",
                "fileId": "abc",
                "publicUrl": "https://drive.google.com/uc?export=download&id=abc"
            }),
        )
        .await;

    match fixture.service.serve("1_shared.pdf").await.expect("serve") {
        ServeOutcome::Redirect { location, tier } => {
            assert_eq!(location, "https://drive.google.com/uc?export=download&id=abc");
            assert_eq!(tier, StorageTier::ExternalObject);
        }
        ServeOutcome::Pdf(_) => panic!("expected redirect"),
    }
}

#[tokio::test]
async fn test_failed_descriptor_save_leaves_overflow_record() {
    let fixture = Fixture::build(
        DeploymentEnvironment::serverless("VERCEL"),
        FlakyRepository::failing_save(),
        ExternalObjectStore::disabled(),
        |c| c.with_inline_ceiling(1024),
    );
    let post_id = fixture.post().await;
    let mut staged = fixture
        .service
        .begin_upload(Some("hadith.pdf".to_string()), Some("application/pdf".to_string()))
        .expect("stage");
    staged.append(&pdf(4096)).await.expect("append");

    let result = fixture.service.upload_at(staged, Some(post_id), TS).await;
    assert!(matches!(result, Err(AttachmentError::Repository(_))));
    assert_eq!(fixture.repo().inner.overflow_count().await, 1);
    assert!(fixture.repo().inner.attachment_value(post_id).await.is_none());
}

#[tokio::test]
async fn test_repair_moves_local_copy_to_durable_tier_once() {
    let fixture = Fixture::build(
        DeploymentEnvironment::persistent(),
        FlakyRepository::failing_overflow(),
        ExternalObjectStore::disabled(),
        |c| c.with_inline_ceiling(1024),
    );
    let post_id = fixture.post().await;
    let data = pdf(4096);
    let outcome = fixture.upload("lecture.pdf", &data, Some(post_id)).await;
    assert_eq!(outcome.descriptor.tier(), StorageTier::MetadataOnly);

    fixture.repo().fail_overflow.store(false, Ordering::SeqCst);

    let repaired = fixture
        .service
        .repair("1700000000000_lecture.pdf")
        .await
        .expect("repair");
    match &repaired {
        RepairOutcome::Repaired {
            post_id: id,
            storage_tier,
            size,
            recovered_from,
            ..
        } => {
            assert_eq!(*id, post_id);
            assert_eq!(*storage_tier, StorageTier::OverflowDocument);
            assert_eq!(*size, 4096);
            assert_eq!(recovered_from, "1700000000000_lecture.pdf");
        }
        other => panic!("expected repair, got {other:?}"),
    }
    assert_eq!(fixture.repo().inner.overflow_count().await, 1);

    let again = fixture
        .service
        .repair("1700000000000_lecture.pdf")
        .await
        .expect("repair");
    assert!(matches!(
        again,
        RepairOutcome::AlreadyStored {
            storage_tier: StorageTier::OverflowDocument,
            ..
        }
    ));
    assert_eq!(fixture.repo().inner.overflow_count().await, 1);

    let stored = fixture
        .repo()
        .inner
        .attachment_value(post_id)
        .await
        .expect("saved");
    assert!(stored.get("repairedAt").is_some());
}

#[tokio::test]
async fn test_repair_without_persistent_filesystem() {
    let fixture = Fixture::build(
        DeploymentEnvironment::serverless("VERCEL"),
        FlakyRepository::failing_overflow(),
        ExternalObjectStore::disabled(),
        |c| c.with_inline_ceiling(1024),
    );
    let post_id = fixture.post().await;
    fixture.upload("x.pdf", &pdf(4096), Some(post_id)).await;

    assert!(matches!(
        fixture.service.repair("1700000000000_x.pdf").await,
        Err(AttachmentError::NoPersistentFilesystem)
    ));
}

#[tokio::test]
async fn test_repair_without_local_copy_reports_searched_names() {
    let fixture = Fixture::persistent();
    fixture
        .repo()
        .inner
        .insert_post_with_attachment(
            "Lost",
            json!({"filename": "1_lost.pdf", "storageType": "metadata_only"}),
        )
        .await;

    match fixture.service.repair("1_lost.pdf").await {
        Err(AttachmentError::LocalCopyMissing { searched, .. }) => {
            assert_eq!(searched, vec!["1_lost.pdf".to_string()]);
        }
        other => panic!("expected missing local copy, got {other:?}"),
    }
}

#[tokio::test]
async fn test_repair_ignores_similarly_named_local_file() {
    let fixture = Fixture::persistent();
    let uploads = fixture.dir.path().join("uploads");
    std::fs::create_dir_all(&uploads).expect("mkdir");
    std::fs::write(
        uploads.join("1600000000000_Tafsir_Ibn_Kathir_Vol2.pdf"),
        b"%PDF-OTHER-BOOK",
    )
    .expect("write");
    let post_id = fixture
        .repo()
        .inner
        .insert_post_with_attachment(
            "Tafsir",
            json!({"filename": "1700000000000_Tafsir.pdf", "storageType": "metadata_only"}),
        )
        .await;

    match fixture.service.repair("1700000000000_Tafsir.pdf").await {
        Err(AttachmentError::LocalCopyMissing { searched, .. }) => {
            assert_eq!(searched, vec!["1700000000000_Tafsir.pdf".to_string()]);
        }
        other => panic!("expected missing local copy, got {other:?}"),
    }
    let stored = fixture
        .repo()
        .inner
        .attachment_value(post_id)
        .await
        .expect("attachment");
    assert!(stored.get("repairedAt").is_none());
    assert_eq!(fixture.repo().inner.overflow_count().await, 0);
}

#[tokio::test]
async fn test_repair_when_every_tier_refuses() {
    let fixture = Fixture::build(
        DeploymentEnvironment::persistent(),
        FlakyRepository::failing_overflow(),
        ExternalObjectStore::disabled(),
        |c| c.with_inline_ceiling(1024),
    );
    let post_id = fixture.post().await;
    fixture.upload("x.pdf", &pdf(4096), Some(post_id)).await;

    assert!(matches!(
        fixture.service.repair("1700000000000_x.pdf").await,
        Err(AttachmentError::PersistenceExhausted(_))
    ));
}

#[tokio::test]
async fn test_repair_unknown_post() {
    let fixture = Fixture::persistent();
    assert!(matches!(
        fixture.service.repair("1_none.pdf").await,
        Err(AttachmentError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_upload_validation() {
    let fixture = Fixture::serverless();

    assert!(matches!(
        fixture
            .service
            .begin_upload(Some("a.png".to_string()), Some("image/png".to_string())),
        Err(AttachmentError::InvalidMimeType(_))
    ));

    let staged = fixture
        .service
        .begin_upload(Some("a.pdf".to_string()), Some("application/pdf".to_string()))
        .expect("stage");
    assert!(matches!(
        fixture.service.upload_at(staged, None, TS).await,
        Err(AttachmentError::EmptyFile)
    ));

    let mut staged = fixture
        .service
        .begin_upload(Some("a.pdf".to_string()), None)
        .expect("stage");
    staged.append(b"%PDF").await.expect("append");
    assert!(matches!(
        fixture.service.upload_at(staged, None, TS).await,
        Err(AttachmentError::InvalidMimeType(_))
    ));

    let mut staged = fixture
        .service
        .begin_upload(Some("a.pdf".to_string()), Some("application/pdf".to_string()))
        .expect("stage");
    staged.append(b"%PDF").await.expect("append");
    let missing = Uuid::new_v4();
    assert!(matches!(
        fixture.service.upload_at(staged, Some(missing), TS).await,
        Err(AttachmentError::PostNotFound(id)) if id == missing
    ));
}

#[tokio::test]
async fn test_upload_cap_is_enforced_while_streaming() {
    let fixture = Fixture::build(
        DeploymentEnvironment::serverless("VERCEL"),
        FlakyRepository::default(),
        ExternalObjectStore::disabled(),
        |c| c.with_max_file_size(1024),
    );
    let mut staged = fixture
        .service
        .begin_upload(Some("a.pdf".to_string()), Some("application/pdf".to_string()))
        .expect("stage");
    staged.append(&pdf(1000)).await.expect("append");
    assert!(matches!(
        staged.append(&pdf(100)).await,
        Err(AttachmentError::FileTooLarge { max: 1024, .. })
    ));
}

#[tokio::test]
async fn test_missing_original_name_uses_default() {
    let fixture = Fixture::serverless();
    let mut staged = fixture
        .service
        .begin_upload(None, Some("application/pdf".to_string()))
        .expect("stage");
    staged.append(&pdf(10)).await.expect("append");
    let outcome = fixture
        .service
        .upload_at(staged, None, TS)
        .await
        .expect("upload");
    assert_eq!(outcome.descriptor.original_name, DEFAULT_ORIGINAL_NAME);
    assert_eq!(outcome.descriptor.filename, "1700000000000_document.pdf");
}

#[tokio::test]
async fn test_inspect_reports_without_payload() {
    let fixture = Fixture::build(
        DeploymentEnvironment::serverless("VERCEL"),
        FlakyRepository::default(),
        ExternalObjectStore::disabled(),
        |c| c.with_inline_ceiling(1024),
    );
    let post_id = fixture.post().await;
    fixture.upload("big.pdf", &pdf(2048), Some(post_id)).await;

    let report = fixture
        .service
        .inspect("1700000000000_big.pdf")
        .await
        .expect("inspect");
    assert_eq!(report.post_id, post_id);
    assert_eq!(report.descriptor.storage_tier, StorageTier::OverflowDocument);
    let overflow = report.overflow.expect("overflow report");
    assert!(overflow.exists);
    assert_eq!(overflow.content_length, Some(2732));

    let value = serde_json::to_value(&report.descriptor).expect("serialize");
    assert!(value.get("content").is_none());
}

#[tokio::test]
async fn test_inspect_inline_signature() {
    let fixture = Fixture::serverless();
    let post_id = fixture.post().await;
    fixture.upload("small.pdf", &pdf(100), Some(post_id)).await;

    let report = fixture
        .service
        .inspect("1700000000000_small.pdf")
        .await
        .expect("inspect");
    let signature = report.inline_signature.expect("signature");
    assert!(signature.decodes);
    assert!(signature.valid_header);
    assert_eq!(signature.decoded_length, Some(100));
}

#[tokio::test]
async fn test_persistent_service_health_inputs() {
    let fixture = Fixture::persistent();
    assert!(fixture.service.check_repository().await.is_ok());
    assert_eq!(
        fixture.service.external_state(),
        crate::service_cell::ServiceState::NotConfigured
    );
    assert!(fixture.service.store().local().is_some());
    assert!(Fixture::serverless().service.store().local().is_none());
}
