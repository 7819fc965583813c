// [apps/controller/src/kernel.rs]
/*!
 * APARATO: CONTROLLER KERNEL (V1.0)
 * CLASIFICACIÓN: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: CONECTAR TODOS LOS COLABORADORES E IGNICIÓN DEL SERVIDOR
 *
 * Grounded in the neighbor's `OrchestratorKernel`: `ignite` connects the
 * database and wires every collaborator into a shared `AppState`, `launch`
 * consumes `self` to spawn the background daemons and finally bind axum.
 * Unlike the neighbor there is exactly one infrastructure daemon besides
 * the HTTP server: the recovery sweep (lease renewal itself lives inside
 * each `drive_job` call, not as a free-standing kernel daemon).
 */

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use narrata_domain_billing::{BillingSink, LoggingBillingSink};
use narrata_domain_models::{PlanLimits, ProviderConfig, SegmentConfig, StageTimeouts};
use narrata_domain_planner::SegmentPlanner;
use narrata_infra_blob_store::{BlobStore, LocalBlobStore, RemoteBlobStore};
use narrata_infra_job_store::{JobRepository, JobStoreClient, ProgressRingRepository, SegmentRepository, SqlQuotaLedger};
use narrata_infra_provider_gate::{ExternalCallGate, HttpChapterProvider, HttpTtsProvider, HttpVisionProvider};
use narrata_infra_transcoder::{EchoStitcher, FixedDurationProbe, MediaProbe, StitchEngine, Stitcher, SubprocessProbe};
use tracing::{error, info, instrument};

use crate::pipeline::{spawn_recovery_sweep, ControllerConfig, PipelineController, ProgressBus, SegmentWorkerPool, WebhookBillingSink, TTS_PROVIDER_ID, VISION_PROVIDER_ID};
use crate::routes::build_router;
use crate::state::AppState;

const CHAPTER_PROVIDER_ID: &str = "chapters";
const DEFAULT_LEASE_SECONDS: i64 = 60;
const DEFAULT_WORKER_CONCURRENCY_PER_JOB: usize = 4;
const DEFAULT_MAX_CONCURRENT_JOBS: usize = 32;
const DEFAULT_SEGMENT_FAILURE_TOLERANCE: usize = 1;
const DEFAULT_RECOVERY_SWEEP_SECONDS: u64 = 30;
const DEFAULT_SUBSCRIPTION_MINUTES: f64 = 60.0;

pub struct ControllerKernel {
    server_network_port: u16,
    app_state: AppState,
}

impl ControllerKernel {
    #[instrument(skip(database_access_token))]
    pub async fn ignite(database_connection_url: &str, database_access_token: Option<String>, listening_port: u16) -> Self {
        let client = JobStoreClient::connect(database_connection_url, database_access_token)
            .await
            .expect("FATAL: database connection failed, ignition aborted");

        let job_repository: Arc<dyn narrata_infra_job_store::JobStore> = Arc::new(JobRepository::new(client.clone()));
        let segment_repository: Arc<dyn narrata_infra_job_store::SegmentStore> = Arc::new(SegmentRepository::new(client.clone()));
        let progress_ring = Arc::new(ProgressRingRepository::new(client.clone()));
        let default_subscription_minutes = env_f64("DEFAULT_SUBSCRIPTION_MINUTES", DEFAULT_SUBSCRIPTION_MINUTES);
        let ledger: Arc<dyn narrata_domain_billing::QuotaLedger> =
            Arc::new(SqlQuotaLedger::new(client, default_subscription_minutes));

        let blob_store = build_blob_store().await;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build provider http client");

        let vision_config = provider_config_from_env(VISION_PROVIDER_ID);
        let tts_config = provider_config_from_env(TTS_PROVIDER_ID);
        let chapter_config = provider_config_from_env(CHAPTER_PROVIDER_ID);

        let vision_provider = Arc::new(HttpVisionProvider::new(
            http_client.clone(),
            env_or("VISION_PROVIDER_BASE_URL", "http://localhost:9001"),
            env_or("VISION_PROVIDER_API_KEY", ""),
            vision_config.retriable_statuses.clone(),
        ));
        let tts_provider = Arc::new(HttpTtsProvider::new(
            http_client.clone(),
            env_or("TTS_PROVIDER_BASE_URL", "http://localhost:9002"),
            env_or("TTS_PROVIDER_API_KEY", ""),
            env_or("TTS_PROVIDER_VOICE_ID", "default"),
            tts_config.retriable_statuses.clone(),
        ));
        let chapter_provider = Arc::new(HttpChapterProvider::new(
            http_client,
            env_or("CHAPTER_PROVIDER_BASE_URL", "http://localhost:9003"),
            env_or("CHAPTER_PROVIDER_API_KEY", ""),
            chapter_config.retriable_statuses.clone(),
        ));

        let gate = Arc::new(ExternalCallGate::new(vec![vision_config, tts_config, chapter_config]));

        let planner = Arc::new(SegmentPlanner::new(Arc::clone(&gate), chapter_provider));
        let worker_concurrency_per_job = env_usize("WORKER_CONCURRENCY_PER_JOB", DEFAULT_WORKER_CONCURRENCY_PER_JOB);
        let segment_failure_tolerance = env_usize("SEGMENT_FAILURE_TOLERANCE", DEFAULT_SEGMENT_FAILURE_TOLERANCE);
        let worker_pool = Arc::new(SegmentWorkerPool::new(
            gate,
            vision_provider,
            tts_provider,
            Arc::clone(&blob_store),
            Arc::clone(&segment_repository),
            SegmentConfig::default(),
            worker_concurrency_per_job,
            segment_failure_tolerance,
        ));

        let stitch_engine = build_stitch_engine();
        let progress_bus = Arc::new(ProgressBus::new(progress_ring, Arc::clone(&job_repository)));
        let billing_sink = build_billing_sink();

        let controller_config = ControllerConfig {
            worker_id: env_or("WORKER_ID", "controller-local"),
            lease_seconds: env_i64("LEASE_SECONDS", DEFAULT_LEASE_SECONDS),
            worker_concurrency_per_job,
            segment_failure_tolerance,
            segment_config: SegmentConfig::default(),
            plan_limits: PlanLimits { target_overrun_factor: env_f64("PLAN_TARGET_OVERRUN_FACTOR", PlanLimits::default().target_overrun_factor) },
            stage_timeouts: StageTimeouts::default(),
        };

        let pipeline_controller = Arc::new(PipelineController::new(
            Arc::clone(&job_repository),
            Arc::clone(&segment_repository),
            Arc::clone(&ledger),
            Arc::clone(&blob_store),
            planner,
            worker_pool,
            stitch_engine,
            Arc::clone(&progress_bus),
            billing_sink,
            controller_config,
        ));

        let max_concurrent_jobs = env_usize("MAX_CONCURRENT_JOBS", DEFAULT_MAX_CONCURRENT_JOBS);
        let probe = build_media_probe();
        let app_state = AppState::new(
            job_repository,
            segment_repository,
            ledger,
            blob_store,
            probe,
            progress_bus,
            pipeline_controller,
            max_concurrent_jobs,
        );

        Self { server_network_port: listening_port, app_state }
    }

    pub async fn launch(self) {
        let recovery_interval = Duration::from_secs(env_u64("RECOVERY_SWEEP_SECONDS", DEFAULT_RECOVERY_SWEEP_SECONDS));
        spawn_recovery_sweep(
            Arc::clone(&self.app_state.pipeline_controller),
            Arc::clone(&self.app_state.job_store),
            recovery_interval,
        );

        let router = build_router(self.app_state);
        let bind_address = SocketAddr::new("0.0.0.0".parse::<IpAddr>().expect("valid literal"), self.server_network_port);

        info!(%bind_address, "controller listening");
        let listener = tokio::net::TcpListener::bind(bind_address)
            .await
            .expect("failed to bind network port");

        if let Err(fault) = axum::serve(listener, router).await {
            error!(%fault, "server terminated unexpectedly");
            std::process::exit(1);
        }
    }
}

async fn build_blob_store() -> Arc<dyn BlobStore> {
    match std::env::var("REMOTE_BLOB_STORE_BASE_URL") {
        Ok(base_url) if !base_url.is_empty() => Arc::new(RemoteBlobStore::new(base_url)),
        _ => {
            let root_dir = env_or("LOCAL_BLOB_STORE_ROOT", "./data/blobs");
            Arc::new(
                LocalBlobStore::new(root_dir)
                    .await
                    .expect("failed to initialize local blob store"),
            )
        }
    }
}

fn build_stitch_engine() -> Arc<dyn StitchEngine> {
    match std::env::var("TRANSCODER_BINARY_PATH") {
        Ok(path) if !path.is_empty() => Arc::new(Stitcher::new(path)),
        _ => Arc::new(EchoStitcher),
    }
}

fn build_media_probe() -> Arc<dyn MediaProbe> {
    match std::env::var("TRANSCODER_BINARY_PATH") {
        Ok(path) if !path.is_empty() => Arc::new(SubprocessProbe::new(path)),
        _ => Arc::new(FixedDurationProbe { duration_seconds: 0.0 }),
    }
}

fn build_billing_sink() -> Arc<dyn BillingSink> {
    match std::env::var("BILLING_WEBHOOK_URL") {
        Ok(url) if !url.is_empty() => Arc::new(WebhookBillingSink::with_default_client(url)),
        _ => Arc::new(LoggingBillingSink),
    }
}

fn provider_config_from_env(provider_id: &str) -> ProviderConfig {
    let prefix = provider_id.to_uppercase();
    let mut config = ProviderConfig::default_for(provider_id);
    config.requests_per_second = env_f64(&format!("{prefix}_REQUESTS_PER_SECOND"), config.requests_per_second);
    config.max_in_flight = env_usize(&format!("{prefix}_MAX_IN_FLIGHT"), config.max_in_flight);
    config
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|value| value.parse().ok()).unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key).ok().and_then(|value| value.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|value| value.parse().ok()).unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key).ok().and_then(|value| value.parse().ok()).unwrap_or(default)
}
