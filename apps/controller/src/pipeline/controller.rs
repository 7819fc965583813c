// [apps/controller/src/pipeline/controller.rs]
/*!
 * APARATO: PIPELINE CONTROLLER (V1.0)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L1)
 * RESPONSABILIDAD: CONDUCIR UN JOB A TRAVÉS DE SU MÁQUINA DE ESTADOS
 *
 * No existe una superficie de librería separable para este componente: es
 * el corazón de la aplicación controller, análogo a como
 * `OrchestratorKernel` del vecino coordina sus propios servicios sin
 * exponerlos como librerías. El arrendamiento se renueva con un ticker
 * propio en el estilo de `ChronosPacemaker`, y cada suspensión respeta el
 * árbol de tokens de cancelación tal como exige §5.
 */

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use narrata_domain_billing::{BillingCompletionNotice, BillingPeriod, BillingSink, LedgerError, QuotaLedger};
use narrata_domain_models::{ErrorKind, Job, JobId, Segment, SegmentConfig, Stage, TerminalError};
use narrata_domain_planner::{PlannerError, SegmentPlanner};
use narrata_infra_blob_store::{BlobStore, BlobStoreError};
use narrata_infra_job_store::{DbError, JobStore, SegmentStore};
use narrata_infra_transcoder::{AssemblyPlan, AssemblyStep, StitchEngine, StitcherError};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::progress_bus::ProgressBus;
use super::segment_worker::SegmentWorkerPool;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("[L1_CONTROLLER_STORAGE_FAULT]: {0}")]
    Storage(#[from] DbError),

    #[error("[L1_CONTROLLER_LEDGER_FAULT]: {0}")]
    Ledger(#[from] LedgerError),

    #[error("[L1_CONTROLLER_BLOB_FAULT]: {0}")]
    Blob(#[from] BlobStoreError),

    #[error("[L1_CONTROLLER_PLANNER_FAULT]: {0}")]
    Planner(#[from] PlannerError),

    #[error("[L1_CONTROLLER_STITCH_FAULT]: {0}")]
    Stitch(#[from] StitcherError),

    #[error("[L1_CONTROLLER_SEGMENTS_FAULT]: {0}")]
    Segments(#[from] super::segment_worker::SegmentWorkerError),

    #[error("[L1_CONTROLLER_STAGE_TIMEOUT]: stage {stage:?} exceeded its budget")]
    StageTimeout { stage: Stage },

    #[error("[L1_CONTROLLER_CANCELLED]: job {0} was cancelled")]
    Cancelled(JobId),
}

impl ControllerError {
    pub fn to_error_kind(&self) -> ErrorKind {
        match self {
            ControllerError::Storage(_) | ControllerError::Blob(_) => ErrorKind::Internal,
            ControllerError::Ledger(source) => source.to_error_kind(),
            ControllerError::Planner(source) => source.to_error_kind(),
            ControllerError::Stitch(source) => source.to_error_kind(),
            ControllerError::Segments(source) => source.to_error_kind(),
            ControllerError::StageTimeout { .. } => ErrorKind::StageTimeout,
            ControllerError::Cancelled(_) => ErrorKind::Cancelled,
        }
    }
}

pub struct ControllerConfig {
    pub worker_id: String,
    pub lease_seconds: i64,
    pub worker_concurrency_per_job: usize,
    pub segment_failure_tolerance: usize,
    pub segment_config: SegmentConfig,
    pub plan_limits: narrata_domain_models::PlanLimits,
    pub stage_timeouts: narrata_domain_models::StageTimeouts,
}

pub struct PipelineController {
    job_store: Arc<dyn JobStore>,
    segment_store: Arc<dyn SegmentStore>,
    ledger: Arc<dyn QuotaLedger>,
    blob_store: Arc<dyn BlobStore>,
    planner: Arc<SegmentPlanner>,
    worker_pool: Arc<SegmentWorkerPool>,
    stitch_engine: Arc<dyn StitchEngine>,
    progress_bus: Arc<ProgressBus>,
    billing_sink: Arc<dyn BillingSink>,
    config: ControllerConfig,
    /// Jobs currently being driven by this process, keyed for out-of-band
    /// cancellation requests. `Job` carries no persisted cancellation flag,
    /// so a `POST .../cancel` reaches a running `drive_job` only through this
    /// registry — a single-controller-process simplification (see DESIGN.md).
    running: RwLock<HashMap<JobId, CancellationToken>>,
}

impl PipelineController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job_store: Arc<dyn JobStore>,
        segment_store: Arc<dyn SegmentStore>,
        ledger: Arc<dyn QuotaLedger>,
        blob_store: Arc<dyn BlobStore>,
        planner: Arc<SegmentPlanner>,
        worker_pool: Arc<SegmentWorkerPool>,
        stitch_engine: Arc<dyn StitchEngine>,
        progress_bus: Arc<ProgressBus>,
        billing_sink: Arc<dyn BillingSink>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            job_store,
            segment_store,
            ledger,
            blob_store,
            planner,
            worker_pool,
            stitch_engine,
            progress_bus,
            billing_sink,
            config,
            running: RwLock::new(HashMap::new()),
        }
    }

    /// Cancels the given job's in-flight `drive_job` task if this process is
    /// currently driving it. Returns `false` when the job isn't running here
    /// (already terminal, or being driven by a different worker process).
    pub async fn request_cancellation(&self, job_id: JobId) -> bool {
        if let Some(token) = self.running.read().await.get(&job_id) {
            token.cancel();
            true
        } else {
            false
        }
    }

    /// Handles a cancellation request for the cancel HTTP endpoint: if
    /// `drive_job` is currently running this job in this process, signals
    /// its token and lets the state machine settle into `Cancelled` on its
    /// own next checkpoint. Otherwise (no other worker process exists in
    /// this deployment, see DESIGN.md) the job is idle between stages —
    /// finalize it to `Cancelled` directly. Idempotent: a job already in a
    /// terminal stage is returned unchanged.
    pub async fn cancel_job_on_request(&self, job_id: JobId) -> Result<Job, ControllerError> {
        let snapshot = self.job_store.get_snapshot(job_id).await?;
        if snapshot.stage.is_terminal() {
            return Ok(snapshot);
        }
        if self.request_cancellation(job_id).await {
            return Ok(snapshot);
        }
        self.cancel_job(snapshot).await
    }

    /// Reclama `job_id` bajo el arrendamiento de este worker y lo conduce
    /// hasta un estado terminal, renovando la concesión cada
    /// `leaseSeconds/3` en una tarea de fondo que se cancela cuando el job
    /// llega a término.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn drive_job(self: &Arc<Self>, job_id: JobId) -> Result<(), ControllerError> {
        let job = self.job_store.claim(job_id, &self.config.worker_id, self.config.lease_seconds).await?;
        let cancellation = CancellationToken::new();
        self.running.write().await.insert(job_id, cancellation.clone());

        let lease_renewal = tokio::spawn({
            let job_store = Arc::clone(&self.job_store);
            let worker_id = self.config.worker_id.clone();
            let lease_seconds = self.config.lease_seconds;
            let renewal_cancellation = cancellation.clone();
            let renewal_period = std::time::Duration::from_secs((lease_seconds / 3).max(1) as u64);
            async move {
                let mut ticker = tokio::time::interval(renewal_period);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            if let Err(fault) = job_store.renew_lease(job_id, &worker_id, lease_seconds).await {
                                warn!(%fault, "lease renewal failed");
                            }
                        }
                        _ = renewal_cancellation.cancelled() => break,
                    }
                }
            }
        });

        let outcome = self.run_state_machine(job, cancellation.clone()).await;
        cancellation.cancel();
        let _ = lease_renewal.await;
        self.running.write().await.remove(&job_id);
        outcome
    }

    async fn run_state_machine(&self, mut job: Job, cancellation: CancellationToken) -> Result<(), ControllerError> {
        loop {
            if job.stage.is_terminal() {
                return Ok(());
            }

            if cancellation.is_cancelled() && job.stage != Stage::Pending {
                self.cancel_job(job).await?;
                return Ok(());
            }

            job = match job.stage {
                Stage::Pending => self.enter_reserving(job).await?,
                Stage::Reserving => self.run_reserving(job).await?,
                Stage::Ingesting => self.run_ingesting(job, cancellation.clone()).await?,
                Stage::Planning => self.run_planning(job, cancellation.clone()).await?,
                Stage::SegmentProcessing => self.run_segment_processing(job, cancellation.clone()).await?,
                Stage::Stitching => self.run_stitching(job, cancellation.clone()).await?,
                Stage::Committing => self.run_committing(job).await?,
                Stage::Completed | Stage::Failed | Stage::Cancelled => return Ok(()),
            };
        }
    }

    async fn persist_and_advance(&self, mut job: Job, stage: Stage, current_step: impl Into<String>) -> Result<Job, ControllerError> {
        job.stage = stage;
        job.current_step = current_step.into();
        let (floor, _) = stage.progress_budget();
        job.progress = job.progress.max(floor);
        job.updated_at = Utc::now();
        let updated = self.job_store.update(&job).await?;
        self.emit_progress(&updated).await;
        Ok(updated)
    }

    async fn emit_progress(&self, job: &Job) {
        let event = narrata_domain_models::ProgressEvent {
            job_id: job.id,
            sequence: job.revision,
            stage: job.stage,
            progress: job.progress,
            current_step: job.current_step.clone(),
            completed: job.segments.completed,
            planned: job.segments.planned,
            terminal_error: job.terminal_error.clone(),
        };
        if let Err(fault) = self.progress_bus.publish(event).await {
            warn!(%fault, "failed to publish progress event");
        }
    }

    async fn fail_job(&self, mut job: Job, kind: ErrorKind, message: impl Into<String>) -> Result<Job, ControllerError> {
        let message = message.into();
        job.stage = Stage::Failed;
        job.terminal_error = Some(TerminalError::new(kind, message));
        job.updated_at = Utc::now();
        if let Some(reservation_id) = job.reservation_id {
            if let Err(fault) = self.ledger.release(reservation_id).await {
                warn!(%fault, "failed to release reservation on job failure");
            }
        }
        let updated = self.job_store.mark_terminal(&job).await?;
        self.emit_progress(&updated).await;
        Ok(updated)
    }

    async fn cancel_job(&self, mut job: Job) -> Result<Job, ControllerError> {
        job.stage = Stage::Cancelled;
        job.terminal_error = Some(TerminalError::new(ErrorKind::Cancelled, "job cancelled"));
        job.updated_at = Utc::now();
        if let Some(reservation_id) = job.reservation_id {
            if let Err(fault) = self.ledger.release(reservation_id).await {
                warn!(%fault, "failed to release reservation on cancellation");
            }
        }
        let updated = self.job_store.mark_terminal(&job).await?;
        self.emit_progress(&updated).await;
        Ok(updated)
    }

    async fn enter_reserving(&self, job: Job) -> Result<Job, ControllerError> {
        self.persist_and_advance(job, Stage::Reserving, "reserving quota").await
    }

    /// La estimación de la reserva es `min(duraciónFuenteEnMinutos,
    /// límiteDeSuscripción + Σtop-ups)`, derivada determinísticamente de
    /// `job_id` para que `reserve` sea idempotente ante reintentos.
    async fn run_reserving(&self, mut job: Job) -> Result<Job, ControllerError> {
        let source_duration_minutes = job.config.source_duration_seconds / 60.0;
        let quota_snapshot = match self.ledger.get_quota_snapshot(&job.owner_id).await {
            Ok(snapshot) => snapshot,
            Err(fault) => return self.fail_job(job, fault.to_error_kind(), fault.to_string()).await,
        };
        let estimate_minutes = source_duration_minutes.min(quota_snapshot.total_available_minutes);

        match self.ledger.reserve(&job.owner_id, job.id.0, estimate_minutes).await {
            Ok(reservation_id) => {
                job.reservation_id = Some(reservation_id);
                self.persist_and_advance(job, Stage::Ingesting, "source blob admitted").await
            }
            Err(fault) => self.fail_job(job, fault.to_error_kind(), fault.to_string()).await,
        }
    }

    /// Confirma que el blob fuente es legible; la lectura transitoria ya la
    /// reintenta el Blob Store Gateway internamente.
    async fn run_ingesting(&self, job: Job, _cancellation: CancellationToken) -> Result<Job, ControllerError> {
        match self.blob_store.get_object(&job.source_blob).await {
            Ok(_bytes) => self.persist_and_advance(job, Stage::Planning, "source blob verified").await,
            Err(fault) => self.fail_job(job, ErrorKind::Internal, fault.to_string()).await,
        }
    }

    async fn run_planning(&self, job: Job, cancellation: CancellationToken) -> Result<Job, ControllerError> {
        let source_blob_url = match self.blob_store.presign_get(&job.source_blob, std::time::Duration::from_secs(3600)).await {
            Ok(url) => url,
            Err(fault) => return self.fail_job(job, ErrorKind::Internal, fault.to_string()).await,
        };

        let plan_result = self
            .planner
            .plan(
                job.id,
                job.config.source_duration_seconds,
                &source_blob_url,
                &job.config,
                &self.config.segment_config,
                &self.config.plan_limits,
                cancellation,
            )
            .await;

        match plan_result {
            Ok(segments) => {
                self.segment_store.insert_plan(&segments).await?;
                let mut job = job;
                job.segments.planned = segments.len() as u32;
                self.persist_and_advance(job, Stage::SegmentProcessing, "segments planned").await
            }
            // Planner failures are deterministic, never retried (§4.I).
            Err(fault) => self.fail_job(job, fault.to_error_kind(), fault.to_string()).await,
        }
    }

    async fn run_segment_processing(&self, job: Job, cancellation: CancellationToken) -> Result<Job, ControllerError> {
        let segments = self.segment_store.list_for_job(job.id).await?;
        let source_blob_url = self.blob_store.presign_get(&job.source_blob, std::time::Duration::from_secs(3600)).await?;

        let job_store = Arc::clone(&self.job_store);
        let segment_store = Arc::clone(&self.segment_store);
        let job_id = job.id;
        let planned = job.segments.planned;
        let (stage_floor, stage_ceiling) = Stage::SegmentProcessing.progress_budget();
        let progress_bus = Arc::clone(&self.progress_bus);

        let run_result = tokio::time::timeout(
            self.config.stage_timeouts.segment_processing,
            self.worker_pool.run(
                job_id,
                source_blob_url,
                &segments,
                job.config.character_guide_text.as_deref(),
                cancellation.clone(),
                move |completed| {
                    let progress = stage_floor
                        + ((completed as f64 / planned.max(1) as f64) * (stage_ceiling - stage_floor) as f64) as u8;
                    let job_store = Arc::clone(&job_store);
                    let segment_store = Arc::clone(&segment_store);
                    let progress_bus = Arc::clone(&progress_bus);
                    tokio::spawn(async move {
                        report_segment_progress(job_store, segment_store, progress_bus, job_id, completed, progress).await;
                    });
                },
            ),
        )
        .await;

        match run_result {
            Err(_elapsed) => self.fail_job(job, ErrorKind::StageTimeout, "segment processing exceeded its stage budget").await,
            Ok(Ok(())) => {
                let mut job = self.job_store.get_snapshot(job.id).await?;
                if cancellation.is_cancelled() {
                    return self.cancel_job(job).await;
                }
                job.segments.completed = self.segment_store.list_for_job(job.id).await?.iter().filter(|s| s.status == narrata_domain_models::SegmentStatus::Done).count() as u32;
                self.persist_and_advance(job, Stage::Stitching, "segments complete").await
            }
            Ok(Err(fault)) => self.fail_job(job, fault.to_error_kind(), fault.to_string()).await,
        }
    }

    /// Falla el Stitching se reintenta una sola vez: los fallos del
    /// transcodificador son comunes y el plan de ensamblado es idempotente.
    async fn run_stitching(&self, job: Job, cancellation: CancellationToken) -> Result<Job, ControllerError> {
        let segments = self.segment_store.list_for_job(job.id).await?;
        let plan = build_assembly_plan(&job, &segments);

        let first_attempt = tokio::time::timeout(self.config.stage_timeouts.stitching, self.stitch_engine.stitch(&plan)).await;
        let result = match first_attempt {
            Ok(result) => result,
            Err(_elapsed) => return self.fail_job(job, ErrorKind::StageTimeout, "stitching exceeded its stage budget").await,
        };

        let assembly_result = match result {
            Ok(assembly_result) => assembly_result,
            Err(_first_fault) => {
                if cancellation.is_cancelled() {
                    return self.cancel_job(job).await;
                }
                let retry = tokio::time::timeout(self.config.stage_timeouts.stitching, self.stitch_engine.stitch(&plan)).await;
                match retry {
                    Ok(Ok(assembly_result)) => assembly_result,
                    Ok(Err(fault)) => return self.fail_job(job, fault.to_error_kind(), fault.to_string()).await,
                    Err(_elapsed) => return self.fail_job(job, ErrorKind::StageTimeout, "stitching exceeded its stage budget on retry").await,
                }
            }
        };

        let mut job = job;
        job.output_blob = Some(assembly_result.output_blob);
        job.output_duration_seconds = Some(assembly_result.output_duration_seconds);
        self.persist_and_advance(job, Stage::Committing, "recap assembled").await
    }

    /// Nunca marca el job `Completed` sin un `commit` exitoso del Ledger; si
    /// falla, el job permanece en `Committing` para la siguiente barrida de
    /// recuperación.
    async fn run_committing(&self, job: Job) -> Result<Job, ControllerError> {
        let reservation_id = job.reservation_id.expect("a job reaching Committing always holds a reservation");
        let output_minutes = job.output_duration_seconds.expect("Stitching always sets output_duration_seconds") / 60.0;

        let billing_period = BillingPeriod::current();
        match self.ledger.commit(reservation_id, output_minutes, job.id.0, billing_period.clone()).await {
            Ok(()) => {
                let mut job = job;
                job.terminal_committed = true;
                job.stage = Stage::Completed;
                job.progress = 100;
                job.current_step = "completed".to_string();
                job.updated_at = Utc::now();
                let updated = self.job_store.mark_terminal(&job).await?;
                self.emit_progress(&updated).await;
                self.billing_sink
                    .notify_completion(BillingCompletionNotice {
                        job_id: updated.id.0,
                        user_id: updated.owner_id.clone(),
                        billed_minutes: output_minutes,
                        billing_period,
                    })
                    .await;
                info!(job_id = %updated.id, "job completed");
                Ok(updated)
            }
            Err(fault) => {
                warn!(%fault, "commit failed, job stays in Committing for the next recovery sweep");
                Ok(job)
            }
        }
    }
}

async fn report_segment_progress(
    job_store: Arc<dyn JobStore>,
    segment_store: Arc<dyn SegmentStore>,
    progress_bus: Arc<ProgressBus>,
    job_id: JobId,
    completed: u32,
    progress: u8,
) {
    let job = match job_store.get_snapshot(job_id).await {
        Ok(job) => job,
        Err(fault) => {
            warn!(%fault, "failed to load job snapshot while reporting segment progress");
            return;
        }
    };
    let mut job = job;
    job.segments.completed = job.segments.completed.max(completed);
    job.progress = job.progress.max(progress);
    job.current_step = format!("{} of {} segments complete", completed, job.segments.planned);
    job.updated_at = Utc::now();
    let updated = match job_store.update(&job).await {
        Ok(updated) => updated,
        Err(fault) => {
            warn!(%fault, "failed to persist segment progress");
            return;
        }
    };
    let _ = segment_store;
    let event = narrata_domain_models::ProgressEvent {
        job_id: updated.id,
        sequence: updated.revision,
        stage: updated.stage,
        progress: updated.progress,
        current_step: updated.current_step.clone(),
        completed: updated.segments.completed,
        planned: updated.segments.planned,
        terminal_error: updated.terminal_error.clone(),
    };
    if let Err(fault) = progress_bus.publish(event).await {
        warn!(%fault, "failed to publish segment progress event");
    }
}

fn build_assembly_plan(job: &Job, segments: &[Segment]) -> AssemblyPlan {
    let mut ordered = segments.to_vec();
    ordered.sort_by_key(|segment| segment.index);
    let steps = ordered
        .into_iter()
        .filter_map(|segment| {
            let outcome = segment.outcome?;
            Some(AssemblyStep {
                source_start: segment.start,
                source_end: segment.end,
                narration_audio: outcome.narration_audio,
                speed_factor: outcome.speed_factor,
            })
        })
        .collect();
    AssemblyPlan::new(job.id.to_string(), job.source_blob.clone(), steps)
}
