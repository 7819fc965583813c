// [libs/infra/transcoder/src/errors.rs]
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StitcherError {
    #[error("[L3_STITCH_SPAWN_FAULT]: failed to spawn media transcoder sub-process: {0}")]
    SpawnFault(#[source] std::io::Error),

    #[error("[L3_STITCH_IO_FAULT]: failed to write assembly plan to sub-process stdin: {0}")]
    StdinFault(#[source] std::io::Error),

    #[error("[L3_STITCH_ENCODE_FAULT]: assembly plan failed to serialize: {0}")]
    EncodeFault(#[from] bincode::Error),

    #[error("[L3_STITCH_DECODE_FAULT]: sub-process output failed to deserialize: {0}")]
    DecodeFault(bincode::Error),

    #[error("[L3_STITCH_PROCESS_FAULT]: media transcoder exited with status {status}: {stderr}")]
    ProcessFault { status: String, stderr: String },

    #[error("[L3_STITCH_EMPTY_PLAN]: assembly plan has no steps; nothing to stitch")]
    EmptyPlan,
}

impl StitcherError {
    pub fn to_error_kind(&self) -> narrata_domain_models::ErrorKind {
        match self {
            StitcherError::EmptyPlan => narrata_domain_models::ErrorKind::PlanUnrealizable,
            _ => narrata_domain_models::ErrorKind::StitcherFailed,
        }
    }
}
