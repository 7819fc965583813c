// [libs/domain/models/src/error_kind.rs]
/*!
 * APARATO: TAXONOMÍA DE FALLOS SOBERANA (V1.0)
 * CLASIFICACIÓN: DOMAIN MODEL (ESTRATO L2)
 * RESPONSABILIDAD: ETIQUETAR TODA FALLA OBSERVABLE DEL PIPELINE CON UN TAG ÚNICO
 *
 * Cada fallo que cruza la frontera del Pipeline Controller se normaliza a uno
 * de estos tags antes de ser escrito en el Job Store o emitido al Progress Bus.
 * El tag es la unidad de verdad para el operador; el mensaje humano es sólo
 * contexto.
 */

use serde::{Deserialize, Serialize};

/// Clasificación estable de toda falla terminal o transitoria del pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Carga de admisión inválida; se rechaza antes de crear el job.
    InvalidInput,
    /// El usuario no tiene minutos suficientes para la estimación de la reserva.
    QuotaExceeded,
    /// El medio de pago está vencido o rechazado; ningún job se crea.
    PaymentRequired,
    /// Falla de un proveedor externo clasificada como reintentable por el Gate.
    ProviderTransient,
    /// Falla de un proveedor externo clasificada como definitiva.
    ProviderPermanent,
    /// Una etapa excedió su presupuesto de tiempo total.
    StageTimeout,
    /// El Planner no pudo producir al menos un segmento.
    PlanUnrealizable,
    /// El Stitcher falló después de su único reintento permitido.
    StitcherFailed,
    /// Terminal por cancelación explícita; no es un error de negocio.
    Cancelled,
    /// Cualquier otra falla; se registra con contexto completo.
    Internal,
}

impl ErrorKind {
    /// Verdadero si el cliente puede reenviar exactamente la misma solicitud
    /// con una expectativa razonable de éxito.
    pub fn is_retriable(self) -> bool {
        matches!(
            self,
            ErrorKind::ProviderTransient | ErrorKind::StageTimeout | ErrorKind::StitcherFailed
        )
    }
}

/// Registro de error terminal adjunto a un Job, tal como lo ve el llamador.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalError {
    pub kind: ErrorKind,
    pub human_message: String,
    pub retriable: bool,
}

impl TerminalError {
    pub fn new(kind: ErrorKind, human_message: impl Into<String>) -> Self {
        Self {
            retriable: kind.is_retriable(),
            kind,
            human_message: human_message.into(),
        }
    }
}
