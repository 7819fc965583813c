// [apps/controller/src/state/mod.rs]
/*!
 * APARATO: APPLICATION STATE (V1.0)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: CONTENEDOR COMPARTIDO DE COLABORADORES DEL PIPELINE
 *
 * Análogo al `AppState` del vecino: un único lugar donde se conectan el
 * almacén de jobs, el ledger de cuota, el blob store, el bus de progreso y
 * el controlador del pipeline, todos detrás de `Arc` para clonación barata
 * entre handlers de axum.
 */

use std::sync::Arc;

use narrata_domain_billing::QuotaLedger;
use narrata_infra_blob_store::BlobStore;
use narrata_infra_job_store::{JobStore, SegmentStore};
use narrata_infra_transcoder::MediaProbe;
use tokio::sync::Semaphore;

use crate::pipeline::{PipelineController, ProgressBus};

#[derive(Clone)]
pub struct AppState {
    pub job_store: Arc<dyn JobStore>,
    pub segment_store: Arc<dyn SegmentStore>,
    pub ledger: Arc<dyn QuotaLedger>,
    pub blob_store: Arc<dyn BlobStore>,
    pub probe: Arc<dyn MediaProbe>,
    pub progress_bus: Arc<ProgressBus>,
    pub pipeline_controller: Arc<PipelineController>,
    /// Bounds the number of jobs this process drives concurrently
    /// (`maxConcurrentJobs`, default 32). Acquired at admission time and
    /// held for the lifetime of the spawned `drive_job` task.
    pub admission_semaphore: Arc<Semaphore>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job_store: Arc<dyn JobStore>,
        segment_store: Arc<dyn SegmentStore>,
        ledger: Arc<dyn QuotaLedger>,
        blob_store: Arc<dyn BlobStore>,
        probe: Arc<dyn MediaProbe>,
        progress_bus: Arc<ProgressBus>,
        pipeline_controller: Arc<PipelineController>,
        max_concurrent_jobs: usize,
    ) -> Self {
        Self {
            job_store,
            segment_store,
            ledger,
            blob_store,
            probe,
            progress_bus,
            pipeline_controller,
            admission_semaphore: Arc::new(Semaphore::new(max_concurrent_jobs)),
        }
    }
}
