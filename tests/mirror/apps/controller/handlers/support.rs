// [tests/mirror/apps/controller/handlers/support.rs]
//! Embaucadores y una fábrica de `PipelineController` compartidos por las
//! pruebas de rutas HTTP y WebSocket de este directorio.

use std::sync::Arc;

use async_trait::async_trait;
use narrata_controller::pipeline::{
    ControllerConfig, PipelineController, ProgressBus, SegmentWorkerPool,
};
use narrata_domain_billing::QuotaLedger;
use narrata_domain_models::{PlanLimits, SegmentConfig, StageTimeouts};
use narrata_domain_billing::LoggingBillingSink;
use narrata_domain_planner::SegmentPlanner;
use narrata_infra_blob_store::BlobStore;
use narrata_infra_job_store::repositories::ProgressRingRepository;
use narrata_infra_job_store::{JobStore, SegmentStore};
use narrata_infra_provider_gate::clients::chapters::{ChapterProvider, SourceChapter};
use narrata_infra_provider_gate::clients::tts::{SynthesizeRequest, SynthesizedAudio, TtsProvider};
use narrata_infra_provider_gate::clients::vision::{DescribeSegmentRequest, DescribedSegment, VisionProvider};
use narrata_infra_provider_gate::{AttemptOutcome, ExternalCallGate};
use narrata_infra_transcoder::StitchEngine;

pub struct StubChapterProvider;
#[async_trait]
impl ChapterProvider for StubChapterProvider {
    async fn coarse_chapters(&self, _source_blob_url: &str) -> AttemptOutcome<Vec<SourceChapter>> {
        AttemptOutcome::Success(vec![])
    }
}

pub struct StubVision;
#[async_trait]
impl VisionProvider for StubVision {
    async fn describe(&self, _request: &DescribeSegmentRequest) -> AttemptOutcome<DescribedSegment> {
        AttemptOutcome::Success(DescribedSegment { narration_text: "a narrated line".to_string() })
    }
}

pub struct StubTts;
#[async_trait]
impl TtsProvider for StubTts {
    async fn synthesize(&self, _request: &SynthesizeRequest) -> AttemptOutcome<SynthesizedAudio> {
        AttemptOutcome::Success(SynthesizedAudio { audio_bytes: b"pcm".to_vec(), duration_seconds: 2.0 })
    }
}

#[allow(clippy::too_many_arguments)]
pub fn build_pipeline_controller(
    gate: Arc<ExternalCallGate>,
    chapter_provider: Arc<dyn ChapterProvider>,
    vision_provider: Arc<dyn VisionProvider>,
    tts_provider: Arc<dyn TtsProvider>,
    blob_store: Arc<dyn BlobStore>,
    job_repository: Arc<dyn JobStore>,
    segment_repository: Arc<dyn SegmentStore>,
    progress_ring: Arc<ProgressRingRepository>,
    ledger: Arc<dyn QuotaLedger>,
    stitch_engine: Arc<dyn StitchEngine>,
) -> (Arc<PipelineController>, Arc<ProgressBus>) {
    let planner = Arc::new(SegmentPlanner::new(Arc::clone(&gate), chapter_provider));
    let worker_pool = Arc::new(SegmentWorkerPool::new(
        Arc::clone(&gate),
        vision_provider,
        tts_provider,
        Arc::clone(&blob_store),
        Arc::clone(&segment_repository),
        SegmentConfig::default(),
        4,
        0,
    ));
    let progress_bus = Arc::new(ProgressBus::new(progress_ring, Arc::clone(&job_repository)));

    let controller_config = ControllerConfig {
        worker_id: "route-test-worker".to_string(),
        lease_seconds: 60,
        worker_concurrency_per_job: 4,
        segment_failure_tolerance: 0,
        segment_config: SegmentConfig::default(),
        plan_limits: PlanLimits::default(),
        stage_timeouts: StageTimeouts::default(),
    };

    let controller = Arc::new(PipelineController::new(
        job_repository,
        segment_repository,
        ledger,
        blob_store,
        planner,
        worker_pool,
        stitch_engine,
        Arc::clone(&progress_bus),
        Arc::new(LoggingBillingSink),
        controller_config,
    ));

    (controller, progress_bus)
}
