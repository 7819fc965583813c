// [tests/mirror/apps/controller/recovery_sweep.test.rs]
//! El barrido de recuperación debe reclamar un job cuyo arrendamiento ya
//! expiró y conducirlo hasta un estado terminal sin intervención externa.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use narrata_controller::pipeline::{spawn_recovery_sweep, ControllerConfig, PipelineController, ProgressBus, SegmentWorkerPool};
use narrata_domain_billing::{LoggingBillingSink, QuotaLedger};
use narrata_domain_models::{BlobHandle, FeatureToggles, Job, JobConfig, PlanLimits, SegmentConfig, Stage, StageTimeouts};
use narrata_domain_planner::SegmentPlanner;
use narrata_infra_blob_store::{BlobStore, LocalBlobStore};
use narrata_infra_job_store::{
    client::JobStoreClient,
    repositories::{JobRepository, ProgressRingRepository, SegmentRepository, SqlQuotaLedger},
    JobStore, SegmentStore,
};
use narrata_infra_provider_gate::clients::chapters::{ChapterProvider, SourceChapter};
use narrata_infra_provider_gate::clients::tts::{SynthesizeRequest, SynthesizedAudio, TtsProvider};
use narrata_infra_provider_gate::clients::vision::{DescribeSegmentRequest, DescribedSegment, VisionProvider};
use narrata_infra_provider_gate::{AttemptOutcome, ExternalCallGate};
use narrata_infra_transcoder::EchoStitcher;

struct StubChapterProvider;
#[async_trait]
impl ChapterProvider for StubChapterProvider {
    async fn coarse_chapters(&self, _source_blob_url: &str) -> AttemptOutcome<Vec<SourceChapter>> {
        AttemptOutcome::Success(vec![])
    }
}

struct StubVision;
#[async_trait]
impl VisionProvider for StubVision {
    async fn describe(&self, _request: &DescribeSegmentRequest) -> AttemptOutcome<DescribedSegment> {
        AttemptOutcome::Success(DescribedSegment { narration_text: "a narrated line".to_string() })
    }
}

struct StubTts;
#[async_trait]
impl TtsProvider for StubTts {
    async fn synthesize(&self, _request: &SynthesizeRequest) -> AttemptOutcome<SynthesizedAudio> {
        AttemptOutcome::Success(SynthesizedAudio { audio_bytes: b"pcm".to_vec(), duration_seconds: 2.0 })
    }
}

#[tokio::test]
async fn a_stranded_job_with_an_expired_lease_is_reclaimed_and_completed() {
    let dir = tempfile::tempdir().unwrap();
    let blob_store: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(dir.path()).await.unwrap());

    let client = JobStoreClient::connect(":memory:", None).await.unwrap();
    let job_repository: Arc<dyn JobStore> = Arc::new(JobRepository::new(client.clone()));
    let segment_repository: Arc<dyn SegmentStore> = Arc::new(SegmentRepository::new(client.clone()));
    let progress_ring = Arc::new(ProgressRingRepository::new(client.clone()));
    let ledger: Arc<dyn QuotaLedger> = Arc::new(SqlQuotaLedger::new(client, 120.0));

    let gate = Arc::new(ExternalCallGate::new(vec![
        narrata_domain_models::ProviderConfig::default_for("vision"),
        narrata_domain_models::ProviderConfig::default_for("tts"),
        narrata_domain_models::ProviderConfig::default_for(narrata_domain_planner::CHAPTER_PROVIDER_ID),
    ]));

    let planner = Arc::new(SegmentPlanner::new(Arc::clone(&gate), Arc::new(StubChapterProvider)));
    let worker_pool = Arc::new(SegmentWorkerPool::new(
        Arc::clone(&gate),
        Arc::new(StubVision),
        Arc::new(StubTts),
        Arc::clone(&blob_store),
        Arc::clone(&segment_repository),
        SegmentConfig::default(),
        4,
        0,
    ));
    let progress_bus = Arc::new(ProgressBus::new(progress_ring, Arc::clone(&job_repository)));

    let controller_config = ControllerConfig {
        worker_id: "stranded-worker".to_string(),
        lease_seconds: 60,
        worker_concurrency_per_job: 4,
        segment_failure_tolerance: 0,
        segment_config: SegmentConfig::default(),
        plan_limits: PlanLimits::default(),
        stage_timeouts: StageTimeouts::default(),
    };

    let controller = Arc::new(PipelineController::new(
        Arc::clone(&job_repository),
        Arc::clone(&segment_repository),
        Arc::clone(&ledger),
        Arc::clone(&blob_store),
        planner,
        worker_pool,
        Arc::new(EchoStitcher),
        progress_bus,
        Arc::new(LoggingBillingSink),
        controller_config,
    ));

    let source_handle = blob_store.put_object("source.mp4", b"source bytes".to_vec(), "video/mp4").await.unwrap();
    let config = JobConfig {
        override_script: Some("a single paragraph for the stranded job.".to_string()),
        target_duration_minutes: None,
        series_id: None,
        feature_toggles: FeatureToggles::default(),
        character_guide_text: None,
        source_duration_seconds: 10.0,
    };
    let job = Job::new_pending("owner-stranded".to_string(), source_handle, config);
    job_repository.create(&job).await.unwrap();

    // Simulate a worker that claimed the job and then died: claim it under a
    // different worker id with a lease that is already in the past.
    job_repository.claim(job.id, "dead-worker", -60).await.unwrap();

    let claimed = job_repository.get_snapshot(job.id).await.unwrap();
    assert_eq!(claimed.stage, Stage::Pending);

    let handle = spawn_recovery_sweep(Arc::clone(&controller), Arc::clone(&job_repository), Duration::from_millis(20));

    let mut finished = None;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let snapshot = job_repository.get_snapshot(job.id).await.unwrap();
        if snapshot.stage.is_terminal() {
            finished = Some(snapshot);
            break;
        }
    }
    handle.abort();

    let finished = finished.expect("recovery sweep should reclaim the stranded job within the poll window");
    assert_eq!(finished.stage, Stage::Completed);
}
