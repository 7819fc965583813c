// [tests/mirror/apps/controller/handlers/admission.test.rs]
//! `POST /api/v1/jobs` debe exigir la cabecera de propietario, rechazar un
//! cuerpo sin blob fuente y, en el camino feliz, admitir el job y devolver
//! su identificador de inmediato sin esperar a que el pipeline termine.

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
use serde_json::json;
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
        Arc::clone(&job_repository),
        Arc::clone(&segment_repository),
        Arc::clone(&ledger),
        Arc::clone(&blob_store),
        probe,
        progress_bus,
        controller,
        32,
    );

    (app_state, dir)
}

#[tokio::test]
async fn a_request_missing_the_owner_header_is_rejected_with_unauthorized() {
    let (app_state, _dir) = build_app_state().await;
    let router = build_router(app_state);

    let response = router
        .oneshot(
            Request::post("/api/v1/jobs")
                .header("content-type", "application/json")
                .body(axum::body::Body::from(json!({"sourceBlobHandle": "blob://local/anything"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn a_request_with_neither_source_handle_nor_upload_token_is_bad_request() {
    let (app_state, _dir) = build_app_state().await;
    let router = build_router(app_state);

    let response = router
        .oneshot(
            Request::post("/api/v1/jobs")
                .header("content-type", "application/json")
                .header("X-Narrata-Owner-Id", "owner-1")
                .body(axum::body::Body::from(json!({}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn a_malformed_series_id_is_rejected_with_invalid_input() {
    let (app_state, _dir) = build_app_state().await;
    let blob_store = Arc::clone(&app_state.blob_store);
    let source_handle = blob_store.put_object("source.mp4", b"source bytes".to_vec(), "video/mp4").await.unwrap();
    let router = build_router(app_state);

    let response = router
        .oneshot(
            Request::post("/api/v1/jobs")
                .header("content-type", "application/json")
                .header("X-Narrata-Owner-Id", "owner-1")
                .body(axum::body::Body::from(
                    json!({
                        "sourceBlobHandle": source_handle.0,
                        "seriesId": "Invalid!",
                        "targetDurationMinutes": -5,
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["error"], "invalidInput");
}

#[tokio::test]
async fn a_non_positive_target_duration_is_rejected_with_invalid_input() {
    let (app_state, _dir) = build_app_state().await;
    let blob_store = Arc::clone(&app_state.blob_store);
    let source_handle = blob_store.put_object("source.mp4", b"source bytes".to_vec(), "video/mp4").await.unwrap();
    let router = build_router(app_state);

    let response = router
        .oneshot(
            Request::post("/api/v1/jobs")
                .header("content-type", "application/json")
                .header("X-Narrata-Owner-Id", "owner-1")
                .body(axum::body::Body::from(
                    json!({
                        "sourceBlobHandle": source_handle.0,
                        "targetDurationMinutes": 0,
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn a_valid_series_id_is_accepted() {
    let (app_state, _dir) = build_app_state().await;
    let blob_store = Arc::clone(&app_state.blob_store);
    let source_handle = blob_store.put_object("source.mp4", b"source bytes".to_vec(), "video/mp4").await.unwrap();
    let router = build_router(app_state);

    let response = router
        .oneshot(
            Request::post("/api/v1/jobs")
                .header("content-type", "application/json")
                .header("X-Narrata-Owner-Id", "owner-1")
                .body(axum::body::Body::from(
                    json!({
                        "sourceBlobHandle": source_handle.0,
                        "seriesId": "weekly-recap-01",
                        "targetDurationMinutes": 5.5,
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn admitting_a_job_returns_accepted_with_a_job_id_before_the_pipeline_finishes() {
    let (app_state, _dir) = build_app_state().await;
    let blob_store = Arc::clone(&app_state.blob_store);
    let source_handle = blob_store.put_object("source.mp4", b"source bytes".to_vec(), "video/mp4").await.unwrap();
    let router = build_router(app_state);

    let response = router
        .oneshot(
            Request::post("/api/v1/jobs")
                .header("content-type", "application/json")
                .header("X-Narrata-Owner-Id", "owner-1")
                .body(axum::body::Body::from(
                    json!({
                        "sourceBlobHandle": source_handle.0,
                        "overrideScript": "a single admitted paragraph.",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(parsed["jobId"].as_str().unwrap().len() > 0);
}
