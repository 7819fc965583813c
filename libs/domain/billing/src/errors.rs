// [libs/domain/billing/src/errors.rs]
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("[L2_QUOTA_EXCEEDED]: user {user_id} requested {requested} minutes, {available} available")]
    QuotaExceeded {
        user_id: String,
        requested: f64,
        available: f64,
    },

    #[error("[L2_RESERVATION_NOT_FOUND]: reservation {0} is unknown or already released")]
    ReservationNotFound(Uuid),

    #[error("[L2_LEDGER_STORAGE_FAULT]: {0}")]
    Storage(String),
}

use uuid::Uuid;

impl LedgerError {
    pub fn to_error_kind(&self) -> narrata_domain_models::ErrorKind {
        match self {
            LedgerError::QuotaExceeded { .. } => narrata_domain_models::ErrorKind::QuotaExceeded,
            LedgerError::ReservationNotFound(_) => narrata_domain_models::ErrorKind::Internal,
            LedgerError::Storage(_) => narrata_domain_models::ErrorKind::Internal,
        }
    }
}
