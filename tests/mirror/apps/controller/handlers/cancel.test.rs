// [tests/mirror/apps/controller/handlers/cancel.test.rs]
//! `POST /api/v1/jobs/:jobId/cancel` debe ser idempotente sobre un job ya
//! terminal y rechazar la cancelación de un job de otro propietario.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use narrata_controller::routes::build_router;
use narrata_controller::state::AppState;
use narrata_domain_billing::QuotaLedger;
use narrata_domain_models::{FeatureToggles, Job, JobConfig};
use narrata_infra_blob_store::{BlobStore, LocalBlobStore};
use narrata_infra_job_store::{
    client::JobStoreClient,
    repositories::{JobRepository, ProgressRingRepository, SegmentRepository, SqlQuotaLedger},
    JobStore, SegmentStore,
};
use narrata_infra_provider_gate::ExternalCallGate;
use narrata_infra_transcoder::{EchoStitcher, FixedDurationProbe, MediaProbe};
use tower::ServiceExt;
use uuid::Uuid;

mod support;
use support::{build_pipeline_controller, StubChapterProvider, StubTts, StubVision};

async fn build_app_state() -> (AppState, Arc<dyn JobStore>, Arc<dyn BlobStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let blob_store: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(dir.path()).await.unwrap());

    let client = JobStoreClient::connect(":memory:", None).await.unwrap();
    let job_repository: Arc<dyn JobStore> = Arc::new(JobRepository::new(client.clone()));
    let segment_repository: Arc<dyn SegmentStore> = Arc::new(SegmentRepository::new(client.clone()));
    let progress_ring = Arc::new(ProgressRingRepository::new(client.clone()));
    let ledger: Arc<dyn QuotaLedger> = Arc::new(SqlQuotaLedger::new(client, 120.0));
    let probe: Arc<dyn MediaProbe> = Arc::new(FixedDurationProbe { duration_seconds: 12.0 });

    let gate = Arc::new(ExternalCallGate::new(vec![
        narrata_domain_models::ProviderConfig::default_for("vision"),
        narrata_domain_models::ProviderConfig::default_for("tts"),
        narrata_domain_models::ProviderConfig::default_for(narrata_domain_planner::CHAPTER_PROVIDER_ID),
    ]));

    let (controller, progress_bus) = build_pipeline_controller(
        Arc::clone(&gate),
        Arc::new(StubChapterProvider),
        Arc::new(StubVision),
        Arc::new(StubTts),
        Arc::clone(&blob_store),
        Arc::clone(&job_repository),
        Arc::clone(&segment_repository),
        progress_ring,
        Arc::clone(&ledger),
        Arc::new(EchoStitcher),
    );

    let app_state = AppState::new(
        Arc::clone(&job_repository),
        Arc::clone(&segment_repository),
        ledger,
        Arc::clone(&blob_store),
        probe,
        progress_bus,
        controller,
        32,
    );

    (app_state, job_repository, blob_store, dir)
}

async fn seed_job(job_store: &Arc<dyn JobStore>, blob_store: &Arc<dyn BlobStore>, owner_id: &str) -> Job {
    let source_handle = blob_store.put_object("source.mp4", b"source bytes".to_vec(), "video/mp4").await.unwrap();
    let config = JobConfig {
        override_script: Some("a paragraph awaiting cancellation.".to_string()),
        target_duration_minutes: None,
        series_id: None,
        feature_toggles: FeatureToggles::default(),
        character_guide_text: None,
        source_duration_seconds: 12.0,
    };
    let job = Job::new_pending(owner_id.to_string(), source_handle, config);
    job_store.create(&job).await.unwrap();
    job
}

#[tokio::test]
async fn cancelling_an_unknown_job_is_not_found() {
    let (app_state, _job_store, _blob_store, _dir) = build_app_state().await;
    let router = build_router(app_state);

    let response = router
        .oneshot(
            Request::post(format!("/api/v1/jobs/{}/cancel", Uuid::new_v4()))
                .header("X-Narrata-Owner-Id", "owner-1")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cancelling_another_owners_job_is_forbidden() {
    let (app_state, job_store, blob_store, _dir) = build_app_state().await;
    let job = seed_job(&job_store, &blob_store, "owner-a").await;
    let router = build_router(app_state);

    let response = router
        .oneshot(
            Request::post(format!("/api/v1/jobs/{}/cancel", job.id.0))
                .header("X-Narrata-Owner-Id", "owner-b")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn cancelling_an_idle_job_settles_it_as_cancelled_and_is_idempotent_on_retry() {
    let (app_state, job_store, blob_store, _dir) = build_app_state().await;
    let job = seed_job(&job_store, &blob_store, "owner-1").await;
    let router = build_router(app_state);

    let first = router
        .clone()
        .oneshot(
            Request::post(format!("/api/v1/jobs/{}/cancel", job.id.0))
                .header("X-Narrata-Owner-Id", "owner-1")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let body = first.into_body().collect().await.unwrap().to_bytes();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["stage"].as_str().unwrap(), "cancelled");

    let second = router
        .oneshot(
            Request::post(format!("/api/v1/jobs/{}/cancel", job.id.0))
                .header("X-Narrata-Owner-Id", "owner-1")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let body = second.into_body().collect().await.unwrap().to_bytes();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["stage"].as_str().unwrap(), "cancelled");
}
