// [apps/controller/src/pipeline/segment_worker.rs]
/*!
 * APARATO: SEGMENT WORKER POOL (V1.0)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L1)
 * RESPONSABILIDAD: EJECUTAR DESCRIBE -> SYNTHESIZE -> ALIGN POR SEGMENTO
 *
 * No existe una superficie de librería separable para este componente: vive
 * dentro de la aplicación controller de la misma forma en que el motor del
 * minero del panel vecino mantiene su bucle de ejecución de etapas dentro de
 * su propio crate de aplicación en lugar de exportarlo como librería. La
 * forma de concurrencia (canal de hallazgos + `tokio::spawn` acotado) viene
 * de ese mismo motor; aquí el trabajo es de E/S (llamadas a proveedores) en
 * vez de CPU, así que no hay `spawn_blocking`.
 */

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use narrata_domain_models::{
    JobId, Segment, SegmentConfig, SegmentError, SegmentFingerprint, SegmentOutcome, SegmentStatus,
};
use narrata_infra_blob_store::{BlobStore, BlobStoreError};
use narrata_infra_job_store::{DbError, SegmentStore};
use narrata_infra_provider_gate::clients::tts::{SynthesizeRequest, TtsProvider};
use narrata_infra_provider_gate::clients::vision::{DescribeSegmentRequest, VisionProvider};
use narrata_infra_provider_gate::{ExternalCallGate, GateError};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Identificadores de proveedor bajo los que Describe y Synthesize se
/// registran en el Gate; compartidos con la configuración de arranque.
pub const VISION_PROVIDER_ID: &str = "vision";
pub const TTS_PROVIDER_ID: &str = "tts";

const PRESIGN_TTL: std::time::Duration = std::time::Duration::from_secs(3600);

#[derive(Debug, Error)]
pub enum SegmentWorkerError {
    #[error("[L1_SEGMENT_PROVIDER_FAULT]: segment {index} of job {job_id}: {source}")]
    ProviderFault {
        job_id: JobId,
        index: u32,
        #[source]
        source: GateError,
    },

    #[error("[L1_SEGMENT_STORAGE_FAULT]: segment {index} of job {job_id}: {source}")]
    Storage {
        job_id: JobId,
        index: u32,
        #[source]
        source: DbError,
    },

    #[error("[L1_SEGMENT_BLOB_FAULT]: segment {index} of job {job_id}: {source}")]
    Blob {
        job_id: JobId,
        index: u32,
        #[source]
        source: BlobStoreError,
    },

    #[error("[L1_SEGMENT_TASK_FAULT]: {0}")]
    TaskFault(String),
}

impl SegmentWorkerError {
    pub fn to_error_kind(&self) -> narrata_domain_models::ErrorKind {
        match self {
            SegmentWorkerError::ProviderFault { source, .. } => source.to_error_kind(),
            SegmentWorkerError::Storage { .. } => narrata_domain_models::ErrorKind::Internal,
            SegmentWorkerError::Blob { .. } => narrata_domain_models::ErrorKind::Internal,
            SegmentWorkerError::TaskFault(_) => narrata_domain_models::ErrorKind::Internal,
        }
    }
}

/// Un grupo de trabajadores por job con paralelismo configurable. No
/// reintenta por sí mismo: cada llamada saliente ya trae su propia política
/// de reintento por el Gate; el pool sólo cuenta fallas contra la
/// tolerancia y decide cuándo cancelar el trabajo restante.
pub struct SegmentWorkerPool {
    gate: Arc<ExternalCallGate>,
    vision_provider: Arc<dyn VisionProvider>,
    tts_provider: Arc<dyn TtsProvider>,
    blob_store: Arc<dyn BlobStore>,
    segment_store: Arc<dyn SegmentStore>,
    segment_config: SegmentConfig,
    parallelism: usize,
    failure_tolerance: usize,
}

impl SegmentWorkerPool {
    pub fn new(
        gate: Arc<ExternalCallGate>,
        vision_provider: Arc<dyn VisionProvider>,
        tts_provider: Arc<dyn TtsProvider>,
        blob_store: Arc<dyn BlobStore>,
        segment_store: Arc<dyn SegmentStore>,
        segment_config: SegmentConfig,
        parallelism: usize,
        failure_tolerance: usize,
    ) -> Self {
        Self {
            gate,
            vision_provider,
            tts_provider,
            blob_store,
            segment_store,
            segment_config,
            parallelism,
            failure_tolerance,
        }
    }

    /// Corre Describe -> Synthesize -> Align para cada segmento de `segments`
    /// que aún no esté `Done`, con paralelismo acotado por `self.parallelism`.
    /// `on_segment_finished` se invoca con el conteo acumulado de segmentos
    /// terminados (éxito o falla) cada vez que uno concluye, para que el
    /// Pipeline Controller derive el evento de progreso sin que el pool
    /// conozca el presupuesto de etapa.
    #[instrument(skip(self, segments, character_guide_text, cancellation, on_segment_finished), fields(job_id = %job_id))]
    pub async fn run(
        self: &Arc<Self>,
        job_id: JobId,
        source_blob_url: String,
        segments: &[Segment],
        character_guide_text: Option<&str>,
        cancellation: CancellationToken,
        on_segment_finished: impl Fn(u32) + Send + Sync + 'static,
    ) -> Result<(), SegmentWorkerError> {
        let on_segment_finished = Arc::new(on_segment_finished);
        let finished = Arc::new(AtomicU32::new(0));
        let failures = Arc::new(AtomicUsize::new(0));
        let semaphore = Arc::new(Semaphore::new(self.parallelism.max(1)));
        let mut join_set = JoinSet::new();

        for segment in segments {
            if segment.status == SegmentStatus::Done {
                let count = finished.fetch_add(1, Ordering::SeqCst) + 1;
                on_segment_finished(count);
                continue;
            }

            let pool = Arc::clone(self);
            let segment = segment.clone();
            let source_blob_url = source_blob_url.clone();
            let character_guide_text = character_guide_text.map(str::to_string);
            let semaphore = Arc::clone(&semaphore);
            let segment_cancellation = cancellation.child_token();
            let finished = Arc::clone(&finished);
            let failures = Arc::clone(&failures);
            let on_segment_finished = Arc::clone(&on_segment_finished);

            join_set.spawn(async move {
                let permit = tokio::select! {
                    permit = semaphore.acquire_owned() => permit.ok(),
                    _ = segment_cancellation.cancelled() => None,
                };
                let Some(_permit) = permit else {
                    return Ok(());
                };

                let result = pool
                    .process_one_segment(
                        job_id,
                        &segment,
                        &source_blob_url,
                        character_guide_text.as_deref(),
                        segment_cancellation,
                    )
                    .await;

                let count = finished.fetch_add(1, Ordering::SeqCst) + 1;
                on_segment_finished(count);
                if result.is_err() {
                    failures.fetch_add(1, Ordering::SeqCst);
                }
                result
            });
        }

        let mut first_error = None;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    if failures.load(Ordering::SeqCst) > self.failure_tolerance {
                        warn!("segment failure tolerance exceeded, cancelling remaining work");
                        cancellation.cancel();
                    }
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
                Err(join_fault) => {
                    if first_error.is_none() {
                        first_error = Some(SegmentWorkerError::TaskFault(join_fault.to_string()));
                    }
                }
            }
        }

        if failures.load(Ordering::SeqCst) > self.failure_tolerance {
            Err(first_error.expect("a failure was counted but never recorded"))
        } else {
            Ok(())
        }
    }

    async fn process_one_segment(
        &self,
        job_id: JobId,
        segment: &Segment,
        source_blob_url: &str,
        character_guide_text: Option<&str>,
        cancellation: CancellationToken,
    ) -> Result<(), SegmentWorkerError> {
        if let Some(reused) = self.reuse_by_fingerprint(job_id, segment).await? {
            self.segment_store
                .mark_done(job_id, segment.index, &reused)
                .await
                .map_err(|source| SegmentWorkerError::Storage { job_id, index: segment.index, source })?;
            info!(index = segment.index, "segment reused from fingerprint cache");
            return Ok(());
        }

        self.segment_store
            .mark_in_progress(job_id, segment.index, SegmentStatus::Describing)
            .await
            .map_err(|source| SegmentWorkerError::Storage { job_id, index: segment.index, source })?;

        let describe_request = DescribeSegmentRequest {
            source_blob_url: source_blob_url.to_string(),
            start_seconds: segment.start,
            end_seconds: segment.end,
            target_words: None,
            character_guide_text: character_guide_text.map(str::to_string),
        };
        let described = self
            .gate
            .call(VISION_PROVIDER_ID, cancellation.clone(), || {
                let vision_provider = Arc::clone(&self.vision_provider);
                let describe_request = &describe_request;
                async move { vision_provider.describe(describe_request).await }
            })
            .await
            .map_err(|source| self.fail_segment_sync(job_id, segment.index, source))?;

        self.segment_store
            .mark_in_progress(job_id, segment.index, SegmentStatus::Synthesizing)
            .await
            .map_err(|source| SegmentWorkerError::Storage { job_id, index: segment.index, source })?;

        let synthesize_request = SynthesizeRequest { narration_text: described.narration_text.clone() };
        let synthesized = self
            .gate
            .call(TTS_PROVIDER_ID, cancellation.clone(), || {
                let tts_provider = Arc::clone(&self.tts_provider);
                let synthesize_request = &synthesize_request;
                async move { tts_provider.synthesize(synthesize_request).await }
            })
            .await
            .map_err(|source| self.fail_segment_sync(job_id, segment.index, source))?;

        self.segment_store
            .mark_in_progress(job_id, segment.index, SegmentStatus::Aligning)
            .await
            .map_err(|source| SegmentWorkerError::Storage { job_id, index: segment.index, source })?;

        let speed_factor = (synthesized.duration_seconds / segment.duration())
            .clamp(self.segment_config.speed_min, self.segment_config.speed_max);

        let audio_handle = self
            .blob_store
            .put_object(
                &format!("segment-{}-{}.audio", job_id, segment.index),
                synthesized.audio_bytes,
                "audio/mpeg",
            )
            .await
            .map_err(|source| SegmentWorkerError::Blob { job_id, index: segment.index, source })?;

        let outcome = SegmentOutcome {
            narration_text: described.narration_text,
            narration_audio: audio_handle,
            speed_factor,
        };

        self.segment_store
            .mark_done(job_id, segment.index, &outcome)
            .await
            .map_err(|source| SegmentWorkerError::Storage { job_id, index: segment.index, source })?;

        Ok(())
    }

    /// Consulta la cache de fingerprints entre jobs; si otro job ya completó
    /// un segmento idéntico, su resultado se reutiliza sin llamar a ningún
    /// proveedor. Los handles de blob son inmutables, así que reutilizarlos
    /// entre jobs es seguro.
    async fn reuse_by_fingerprint(
        &self,
        job_id: JobId,
        segment: &Segment,
    ) -> Result<Option<SegmentOutcome>, SegmentWorkerError> {
        let fingerprint: SegmentFingerprint = segment.fingerprint;
        let found = self
            .segment_store
            .find_completed_by_fingerprint(fingerprint)
            .await
            .map_err(|source| SegmentWorkerError::Storage { job_id, index: segment.index, source })?;
        Ok(found.and_then(|candidate| candidate.outcome))
    }

    /// Clasifica una falla del Gate, la persiste como `SegmentError` y
    /// devuelve el error tipado para que el llamador la propague. Esta
    /// función no es verdaderamente síncrona respecto al Job Store — el
    /// nombre refleja que corre en el mismo `await` del llamador, sin
    /// lanzar una tarea nueva.
    fn fail_segment_sync(&self, job_id: JobId, index: u32, source: GateError) -> SegmentWorkerError {
        let error = SegmentError { kind: source.to_error_kind(), message: source.to_string() };
        let segment_store = Arc::clone(&self.segment_store);
        tokio::spawn(async move {
            if let Err(persist_fault) = segment_store.mark_failed(job_id, index, &error).await {
                warn!(%persist_fault, "failed to persist segment failure");
            }
        });
        SegmentWorkerError::ProviderFault { job_id, index, source }
    }
}
