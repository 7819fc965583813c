// [libs/domain/models/src/progress.rs]
/*!
 * APARATO: EVENTO SOBERANO DE PROGRESO (V1.0)
 * CLASIFICACIÓN: DOMAIN MODEL (ESTRATO L2)
 * RESPONSABILIDAD: REEMPLAZAR CARGAS DINÁMICAMENTE TIPADAS POR UNA VARIANTE ÚNICA
 *
 * El tipo dinámico de payload de progreso del sistema original se reemplaza
 * aquí por una estructura única y totalmente tipada; `sequence` es la llave
 * que permite a cualquier suscriptor detectar huecos (§3, §8 invariante 5).
 */

use serde::{Deserialize, Serialize};

use crate::error_kind::TerminalError;
use crate::job::{JobId, Stage};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub job_id: JobId,
    /// Entero estrictamente creciente por job; nunca se reutiliza ni se
    /// reordena.
    pub sequence: u64,
    pub stage: Stage,
    pub progress: u8,
    pub current_step: String,
    pub completed: u32,
    pub planned: u32,
    pub terminal_error: Option<TerminalError>,
}

/// El sobre de transporte que ve un suscriptor de la Live Subscription
/// (§6): un snapshot inicial, cero o más deltas, y exactamente un evento
/// terminal antes del cierre del canal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SubscriptionEnvelope {
    Initial { snapshot: crate::job::Job },
    Update { event: ProgressEvent },
    Terminal { event: ProgressEvent },
}
