// [libs/infra/transcoder/src/stitcher.rs]
/*!
 * APARATO: STITCHER (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: ENTREGAR EL PLAN DE ENSAMBLADO AL SUB-PROCESO
 *                   TRANSCODIFICADOR Y RECIBIR SU RESULTADO
 *
 * Todo el muxing, la codificación y el re-timing del medio quedan delegados
 * al sub-proceso; el Stitcher sólo serializa el plan, lo entrega por stdin,
 * y deserializa lo que el sub-proceso escriba en stdout. Nunca decodifica el
 * medio él mismo.
 */

use crate::errors::StitcherError;
use crate::plan::{AssemblyPlan, AssemblyResult};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{info, instrument, warn};

/// Longitud de prefijo (bytes, big-endian u32) que antecede tanto al plan
/// enviado por stdin como al resultado recibido por stdout, para que el
/// sub-proceso sepa dónde termina un mensaje sin depender de EOF.
const FRAME_PREFIX_LEN: usize = 4;

pub struct Stitcher {
    transcoder_binary_path: PathBuf,
}

impl Stitcher {
    pub fn new(transcoder_binary_path: impl Into<PathBuf>) -> Self {
        Self { transcoder_binary_path: transcoder_binary_path.into() }
    }

    #[instrument(skip(self, plan), fields(job_id = %plan.job_id, steps = plan.steps.len()))]
    pub async fn stitch(&self, plan: &AssemblyPlan) -> Result<AssemblyResult, StitcherError> {
        if plan.steps.is_empty() {
            return Err(StitcherError::EmptyPlan);
        }

        let encoded_plan = bincode::serialize(plan)?;

        let mut child = Command::new(&self.transcoder_binary_path)
            .arg("--assemble")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(StitcherError::SpawnFault)?;

        {
            let stdin = child.stdin.as_mut().expect("stdin was piped");
            stdin
                .write_all(&(encoded_plan.len() as u32).to_be_bytes())
                .await
                .map_err(StitcherError::StdinFault)?;
            stdin.write_all(&encoded_plan).await.map_err(StitcherError::StdinFault)?;
            stdin.shutdown().await.map_err(StitcherError::StdinFault)?;
        }

        let output = child.wait_with_output().await.map_err(StitcherError::SpawnFault)?;

        if !output.status.success() {
            return Err(StitcherError::ProcessFault {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        if output.stdout.len() < FRAME_PREFIX_LEN {
            return Err(StitcherError::ProcessFault {
                status: output.status.to_string(),
                stderr: "sub-process produced a truncated result frame".to_string(),
            });
        }

        let (length_prefix, payload) = output.stdout.split_at(FRAME_PREFIX_LEN);
        let declared_len = u32::from_be_bytes(length_prefix.try_into().expect("4-byte slice")) as usize;
        if payload.len() != declared_len {
            warn!(
                declared_len,
                actual_len = payload.len(),
                "result frame length mismatch; attempting to decode anyway"
            );
        }

        let result: AssemblyResult = bincode::deserialize(payload).map_err(StitcherError::DecodeFault)?;

        info!(
            output_duration_seconds = result.output_duration_seconds,
            "stitch complete"
        );
        Ok(result)
    }
}

/// Variante de prueba que no invoca ningún binario externo: útil para
/// ejercitar el Pipeline Controller sin depender de un transcodificador real.
pub struct EchoStitcher;

#[async_trait::async_trait]
pub trait StitchEngine: Send + Sync {
    async fn stitch(&self, plan: &AssemblyPlan) -> Result<AssemblyResult, StitcherError>;
}

#[async_trait::async_trait]
impl StitchEngine for Stitcher {
    async fn stitch(&self, plan: &AssemblyPlan) -> Result<AssemblyResult, StitcherError> {
        Stitcher::stitch(self, plan).await
    }
}

#[async_trait::async_trait]
impl StitchEngine for EchoStitcher {
    async fn stitch(&self, plan: &AssemblyPlan) -> Result<AssemblyResult, StitcherError> {
        if plan.steps.is_empty() {
            return Err(StitcherError::EmptyPlan);
        }
        let measured_duration: f64 = plan.steps.iter().map(|s| (s.source_end - s.source_start) / s.speed_factor).sum();
        Ok(AssemblyResult {
            output_blob: plan.source_blob.clone(),
            output_duration_seconds: measured_duration,
        })
    }
}
