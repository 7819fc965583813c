// [apps/controller/src/pipeline/recovery.rs]
/*!
 * APARATO: RECOVERY SWEEP (V1.0)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L1)
 * RESPONSABILIDAD: RECLAMAR JOBS CON ARRENDAMIENTO EXPIRADO
 *
 * Un worker que muere a mitad de una etapa deja su job varado bajo su propio
 * `worker_id` hasta que el arrendamiento expira. Este barrido, en el estilo
 * del ticker perpetuo del vecino, vuelve a listar esos jobs periódicamente y
 * los reencola en `drive_job`, que ya sabe reanudar cualquier etapa no
 * terminal desde donde quedó persistida.
 */

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use narrata_infra_job_store::JobStore;
use tracing::{error, info, warn};

use super::controller::PipelineController;

/// Lanza el barrido de recuperación como una tarea de fondo perpetua.
/// Cada job reclamado se conduce en su propia tarea para que uno lento no
/// retrase el resto del lote.
pub fn spawn_recovery_sweep(
    controller: Arc<PipelineController>,
    job_store: Arc<dyn JobStore>,
    sweep_interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            if let Err(fault) = run_recovery_sweep(&controller, &job_store).await {
                error!(%fault, "recovery sweep failed to list pending jobs");
            }
        }
    })
}

async fn run_recovery_sweep(
    controller: &Arc<PipelineController>,
    job_store: &Arc<dyn JobStore>,
) -> Result<(), narrata_infra_job_store::DbError> {
    let stranded = job_store.list_pending_for_recovery(Utc::now()).await?;
    if stranded.is_empty() {
        return Ok(());
    }
    info!(count = stranded.len(), "recovery sweep reclaiming stranded jobs");

    for job in stranded {
        let controller = Arc::clone(controller);
        let job_id = job.id;
        tokio::spawn(async move {
            if let Err(fault) = controller.drive_job(job_id).await {
                warn!(%job_id, %fault, "reclaimed job failed to reach a terminal state");
            }
        });
    }
    Ok(())
}
