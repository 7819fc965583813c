// [tests/mirror/apps/controller/handlers/quota.test.rs]
//! `GET /api/v1/users/:userId/quota` sólo permite que el propietario
//! consulte su propia cuota; cualquier otra identidad recibe 403.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use narrata_controller::routes::build_router;
use narrata_controller::state::AppState;
use narrata_domain_billing::QuotaLedger;
use narrata_infra_blob_store::{BlobStore, LocalBlobStore};
use narrata_infra_job_store::{
    client::JobStoreClient,
    repositories::{JobRepository, ProgressRingRepository, SegmentRepository, SqlQuotaLedger},
    JobStore, SegmentStore,
};
use narrata_infra_provider_gate::ExternalCallGate;
use narrata_infra_transcoder::{EchoStitcher, FixedDurationProbe, MediaProbe};
use tower::ServiceExt;

mod support;
use support::{build_pipeline_controller, StubChapterProvider, StubTts, StubVision};

async fn build_app_state() -> (AppState, tempfile::TempDir) {
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
        job_repository,
        segment_repository,
        ledger,
        blob_store,
        probe,
        progress_bus,
        controller,
        32,
    );

    (app_state, dir)
}

#[tokio::test]
async fn querying_another_users_quota_is_forbidden() {
    let (app_state, _dir) = build_app_state().await;
    let router = build_router(app_state);

    let response = router
        .oneshot(
            Request::get("/api/v1/users/owner-b/quota")
                .header("X-Narrata-Owner-Id", "owner-a")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn the_owner_reads_their_own_quota_snapshot() {
    let (app_state, _dir) = build_app_state().await;
    let router = build_router(app_state);

    let response = router
        .oneshot(
            Request::get("/api/v1/users/owner-a/quota")
                .header("X-Narrata-Owner-Id", "owner-a")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["subscriptionMinutesLimit"].as_f64().unwrap(), 120.0);
    assert_eq!(parsed["subscriptionMinutesUsed"].as_f64().unwrap(), 0.0);
}
