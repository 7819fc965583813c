// [apps/controller/src/pipeline/progress_bus.rs]
/*!
 * APARATO: PROGRESS BUS (V1.0)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L1)
 * RESPONSABILIDAD: DISTRIBUIR EVENTOS DE PROGRESO POR JOB EN PROCESO
 *
 * Generaliza el `EventBus` de un único canal `broadcast` de todo el proceso
 * vecino a un canal por job: cada job tiene su propio anillo acotado
 * (`N ≈ 64`) en memoria, respaldado por `ProgressRingRepository` para que un
 * suscriptor que reconecta resincronice desde su último `sequence` visto en
 * lugar de recibir la transmisión completa otra vez. Los suscriptores lentos
 * se descartan en vez de aplicar contrapresión sobre el Controller — el Job
 * Store sigue siendo la fuente de verdad, así que un suscriptor caído puede
 * resincronizar releyendo el snapshot.
 */

use std::collections::HashMap;
use std::sync::Arc;

use narrata_domain_models::{Job, JobId, ProgressEvent, SubscriptionEnvelope};
use narrata_infra_job_store::{DbError, JobStore, ProgressRingRepository};
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

/// Tamaño del anillo en memoria por job (§4.E: "N ≈ 64").
const RING_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum ProgressBusError {
    #[error("[L1_PROGRESS_STORAGE_FAULT]: {0}")]
    Storage(#[from] DbError),
}

impl ProgressBusError {
    pub fn to_error_kind(&self) -> narrata_domain_models::ErrorKind {
        narrata_domain_models::ErrorKind::Internal
    }
}

struct JobProgressChannel {
    sender: broadcast::Sender<ProgressEvent>,
}

/// Lo que ve un nuevo suscriptor de la Live Subscription (§6): el snapshot
/// actual, el tramo del anillo persistido más nuevo que su último
/// `sequence` visto, y un receptor en vivo para lo que venga después.
pub struct ProgressSubscription {
    pub snapshot: Job,
    pub backlog: Vec<ProgressEvent>,
    pub live: broadcast::Receiver<ProgressEvent>,
}

pub struct ProgressBus {
    channels: RwLock<HashMap<JobId, Arc<JobProgressChannel>>>,
    ring: Arc<ProgressRingRepository>,
    job_store: Arc<dyn JobStore>,
}

impl ProgressBus {
    pub fn new(ring: Arc<ProgressRingRepository>, job_store: Arc<dyn JobStore>) -> Self {
        Self { channels: RwLock::new(HashMap::new()), ring, job_store }
    }

    async fn channel_for(&self, job_id: JobId) -> Arc<JobProgressChannel> {
        if let Some(channel) = self.channels.read().await.get(&job_id) {
            return Arc::clone(channel);
        }
        let mut channels = self.channels.write().await;
        Arc::clone(channels.entry(job_id).or_insert_with(|| {
            let (sender, _first_receiver) = broadcast::channel(RING_CAPACITY);
            Arc::new(JobProgressChannel { sender })
        }))
    }

    /// Persiste `event` en el anillo y lo transmite a cualquier suscriptor
    /// en vivo. Una vez que la etapa del evento es terminal, el canal del
    /// job se libera: ningún evento posterior puede llegar y un suscriptor
    /// tardío ya resuelve todo desde el Job Store.
    pub async fn publish(&self, event: ProgressEvent) -> Result<(), ProgressBusError> {
        self.ring.append(&event).await?;
        let channel = self.channel_for(event.job_id).await;
        let subscriber_count = channel.sender.send(event.clone()).unwrap_or(0);
        debug!(job_id = %event.job_id, sequence = event.sequence, subscriber_count, "progress event dispatched");
        if event.stage.is_terminal() {
            self.channels.write().await.remove(&event.job_id);
        }
        Ok(())
    }

    /// Construye una suscripción completa: snapshot + tramo faltante del
    /// anillo + receptor en vivo, en ese orden, tal como exige §6.
    pub async fn subscribe(
        &self,
        job_id: JobId,
        last_seen_sequence: Option<u64>,
    ) -> Result<ProgressSubscription, ProgressBusError> {
        let snapshot = self.job_store.get_snapshot(job_id).await?;
        let backlog = self.ring.since(job_id, last_seen_sequence.unwrap_or(0)).await?;
        let live = self.channel_for(job_id).await.sender.subscribe();
        Ok(ProgressSubscription { snapshot, backlog, live })
    }
}

/// Clasifica un evento de progreso en el sobre de transporte correcto: el
/// único evento cuya etapa es terminal se envuelve como `Terminal`, todos
/// los demás como `Update`.
pub fn envelope_for_event(event: ProgressEvent) -> SubscriptionEnvelope {
    if event.stage.is_terminal() {
        SubscriptionEnvelope::Terminal { event }
    } else {
        SubscriptionEnvelope::Update { event }
    }
}
