// [libs/infra/job-store/src/errors.rs]
/*!
 * APARATO: CATÁLOGO DE ERRORES DEL JOB STORE (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// Error de enlace físico o de red con el motor libSQL.
    #[error("[L3_DB_NET_FAULT]: DATABASE_UPLINK_SEVERED -> {0}")]
    ConnectionError(String),

    /// Fallo en la configuración del entorno (variables vacías o malformadas).
    #[error("[L3_DB_CONFIG_FAULT]: STRATEGIC_ENV_VOID -> {0}")]
    ConfigurationError(String),

    /// Error de sintaxis o ejecución devuelto por el motor libSQL.
    #[error("[L3_DB_QUERY_FAULT]: SQL_QUERY_REJECTED -> {0}")]
    QueryError(#[from] libsql::Error),

    /// Fallo en la transformación de tipos entre SQLite y el dominio Rust.
    #[error("[L3_DB_MAPPING_FAULT]: DATA_MAPPING_VIOLATION -> {0}")]
    MappingError(String),

    /// El job solicitado no existe en las tablas activas.
    #[error("[L3_JOB_FAULT]: JOB_NOT_FOUND")]
    JobNotFound,

    /// Conflicto de concurrencia optimista: la revisión provista ya no coincide.
    #[error("[L3_JOB_FAULT]: REVISION_CONFLICT")]
    RevisionConflict,

    /// El job ya tiene un arrendamiento (lease) vigente de otro worker.
    #[error("[L3_JOB_FAULT]: LEASE_OWNERSHIP_CONFLICT")]
    LeaseConflict,

    /// El segmento solicitado no existe para este job.
    #[error("[L3_SEGMENT_FAULT]: SEGMENT_NOT_FOUND")]
    SegmentNotFound,

    /// La reserva de cuota solicitada no existe o ya fue liberada.
    #[error("[L3_LEDGER_FAULT]: RESERVATION_NOT_FOUND")]
    ReservationNotFound,

    /// Error al comprometer cambios en una secuencia multi-tabla.
    #[error("[L3_DB_FAULT]: TRANSACTION_COLLAPSE -> {0}")]
    TransactionError(String),
}

impl DbError {
    pub fn to_error_kind(&self) -> narrata_domain_models::ErrorKind {
        use narrata_domain_models::ErrorKind;
        match self {
            DbError::JobNotFound
            | DbError::SegmentNotFound
            | DbError::ReservationNotFound
            | DbError::RevisionConflict
            | DbError::LeaseConflict => ErrorKind::Internal,
            _ => ErrorKind::Internal,
        }
    }
}
