// [libs/domain/planner/src/errors.rs]
use thiserror::Error;

/// Las fallas del Planner nunca se reintentan: son deterministas frente a
/// las mismas entradas, así que reintentar produciría exactamente el mismo
/// resultado. El Pipeline Controller siempre las trata como terminales.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("[L2_PLAN_EMPTY_SCRIPT]: override script was provided but contains no paragraphs")]
    EmptyScript,

    #[error("[L2_PLAN_ZERO_DURATION]: source duration must be strictly positive, got {0}")]
    ZeroDuration(f64),

    #[error("[L2_PLAN_NO_CHAPTERS]: chapter service returned no chapters for a scriptless job")]
    NoChapters,

    #[error("[L2_PLAN_GATE_FAULT]: chapter service call failed: {0}")]
    GateFault(#[from] narrata_infra_provider_gate::GateError),

    #[error("[L2_PLAN_UNREALIZABLE]: no segment survives the configured constraints")]
    Unrealizable,
}

impl PlannerError {
    pub fn to_error_kind(&self) -> narrata_domain_models::ErrorKind {
        narrata_domain_models::ErrorKind::PlanUnrealizable
    }
}
