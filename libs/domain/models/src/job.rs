// [libs/domain/models/src/job.rs]
/*!
 * =================================================================
 * APARATO: ENTIDAD SOBERANA DE JOB (V1.0 - GOLD MASTER)
 * CLASIFICACIÓN: DOMAIN MODEL (ESTRATO L2)
 * RESPONSABILIDAD: REPRESENTAR EL CICLO DE VIDA COMPLETO DE UNA SOLICITUD
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. ZERO ABBREVIATIONS: cada campo se nombra por lo que representa, no
 *    por cómo se persiste.
 * 2. INVARIANTES EXPLÍCITAS: `Stage` codifica el diagrama de transición
 *    soberano; un job nunca regresa de un estado terminal.
 * 3. OPTIMISTIC CONCURRENCY: toda mutación del Job Store está guiada por
 *    `(job_id, revision)`; `revision` vive aquí porque es parte de la
 *    identidad observable del snapshot, no un detalle de persistencia.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error_kind::TerminalError;

/// Identificador estable de un Job. Nuevo tipo para evitar confundirlo con
/// cualquier otro UUID que transite por el sistema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Las etapas recorridas por un job, en el orden exacto del diagrama de
/// transición soberano. El orden de las variantes importa para comparación
/// defensiva pero el motor nunca debe depender de `derive(PartialOrd)` para
/// decidir transiciones — las transiciones son explícitas en el Controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Pending,
    Reserving,
    Ingesting,
    Planning,
    SegmentProcessing,
    Stitching,
    Committing,
    Completed,
    Failed,
    Cancelled,
}

impl Stage {
    /// Verdadero para los tres estados que no admiten más transiciones.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Completed | Stage::Failed | Stage::Cancelled)
    }

    /// El piso y techo de progreso reservados para esta etapa, tal como
    /// establece el presupuesto de progreso del Pipeline Controller.
    pub fn progress_budget(self) -> (u8, u8) {
        match self {
            Stage::Pending => (0, 0),
            Stage::Reserving => (0, 2),
            Stage::Ingesting => (2, 10),
            Stage::Planning => (10, 20),
            Stage::SegmentProcessing => (20, 90),
            Stage::Stitching => (90, 97),
            Stage::Committing => (97, 100),
            Stage::Completed => (100, 100),
            Stage::Failed | Stage::Cancelled => (0, 100),
        }
    }
}

/// Conmutadores de características de admisión; ver §6 de la especificación
/// de interfaces externas.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureToggles {
    #[serde(default)]
    pub short_clip_mode: bool,
    #[serde(default)]
    pub ai_segment_matching: bool,
}

/// Configuración de admisión de un job: todo lo que el solicitante puede
/// especificar al crearlo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Texto de guion provisto manualmente; si está presente, el Planner
    /// deriva segmentos de sus párrafos en lugar de consultar capítulos.
    pub override_script: Option<String>,
    /// Duración objetivo del recap final, en minutos.
    pub target_duration_minutes: Option<f64>,
    /// Identificador de serie (para persistencia de personajes entre jobs);
    /// entrada del Planner únicamente, no afecta la corrección del core.
    pub series_id: Option<String>,
    pub feature_toggles: FeatureToggles,
    pub character_guide_text: Option<String>,
    /// Duración del video fuente en segundos, sondeada durante la admisión
    /// (antes de que exista el job) para que `Reserving` pueda estimar
    /// consumo de cuota sin esperar a la etapa `Ingesting`.
    pub source_duration_seconds: f64,
}

/// Un identificador opaco que localiza un objeto en el Blob Store Gateway.
/// Nunca contiene una URL firmada; las URLs se generan bajo demanda.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobHandle(pub String);

/// Contadores de segmentos planificados y completados. `completed` nunca
/// decrece y nunca excede `planned`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SegmentCounters {
    pub planned: u32,
    pub completed: u32,
}

/// El snapshot completo de un Job tal como lo persiste el Job Store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub stage: Stage,
    /// Progreso monotónico no decreciente en [0, 100].
    pub progress: u8,
    pub current_step: String,
    pub segments: SegmentCounters,
    pub source_blob: BlobHandle,
    pub config: JobConfig,
    pub output_blob: Option<BlobHandle>,
    pub output_duration_seconds: Option<f64>,
    pub terminal_error: Option<TerminalError>,
    /// Guarda de facturación exactamente-una-vez; una vez en `true` nunca
    /// vuelve a `false`.
    pub terminal_committed: bool,
    /// Clave de concurrencia optimista; cada escritura exitosa la incrementa.
    pub revision: u64,
    /// Identificador de la reserva de cuota activa, si la hay.
    pub reservation_id: Option<Uuid>,
}

impl Job {
    /// Construye un job recién admitido en estado `Pending`, `progress = 0`.
    pub fn new_pending(owner_id: String, source_blob: BlobHandle, config: JobConfig) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            owner_id,
            created_at: now,
            updated_at: now,
            stage: Stage::Pending,
            progress: 0,
            current_step: "admitted".to_string(),
            segments: SegmentCounters::default(),
            source_blob,
            config,
            output_blob: None,
            output_duration_seconds: None,
            terminal_error: None,
            terminal_committed: false,
            revision: 0,
            reservation_id: None,
        }
    }
}

/// Metadatos de arrendamiento (lease) asociados a la reclamación de un job
/// por una instancia específica del Pipeline Controller. No forma parte del
/// snapshot público (§6: "Status query" excluye metadatos de lease).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobLease {
    pub job_id: JobId,
    pub worker_id: String,
    pub expires_at: DateTime<Utc>,
}
