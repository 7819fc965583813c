// [libs/infra/provider-gate/src/errors.rs]
use thiserror::Error;

/// Cómo el llamador de `ExternalCallGate::call` clasifica el resultado de un
/// intento; el Gate decide si reintentar basándose exclusivamente en esto,
/// nunca inspeccionando el error concreto del proveedor.
#[derive(Debug, Clone)]
pub enum AttemptOutcome<T> {
    Success(T),
    Retriable { status: Option<u16>, message: String },
    Permanent { message: String },
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("[L3_GATE_CANCELLED]: operation against provider '{0}' cancelled before completion")]
    Cancelled(String),

    #[error("[L3_GATE_TIMEOUT]: attempt against provider '{provider_id}' exceeded its per-attempt timeout")]
    AttemptTimeout { provider_id: String },

    #[error("[L3_GATE_RETRIES_EXHAUSTED]: provider '{provider_id}' failed after {attempts} attempts: {last_message}")]
    RetriesExhausted {
        provider_id: String,
        attempts: u32,
        last_message: String,
    },

    #[error("[L3_GATE_PERMANENT_FAULT]: provider '{provider_id}' returned a non-retriable failure: {message}")]
    Permanent { provider_id: String, message: String },

    #[error("[L3_GATE_UNKNOWN_PROVIDER]: no configuration registered for provider '{0}'")]
    UnknownProvider(String),
}

impl GateError {
    pub fn to_error_kind(&self) -> narrata_domain_models::ErrorKind {
        match self {
            GateError::Cancelled(_) => narrata_domain_models::ErrorKind::Cancelled,
            GateError::AttemptTimeout { .. } => narrata_domain_models::ErrorKind::StageTimeout,
            GateError::RetriesExhausted { .. } => narrata_domain_models::ErrorKind::ProviderTransient,
            GateError::Permanent { .. } => narrata_domain_models::ErrorKind::ProviderPermanent,
            GateError::UnknownProvider(_) => narrata_domain_models::ErrorKind::Internal,
        }
    }
}
