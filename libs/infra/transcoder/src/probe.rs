// [libs/infra/transcoder/src/probe.rs]
/*!
 * APARATO: MEDIA PROBE (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: SONDEAR LA DURACIÓN DEL VIDEO FUENTE DURANTE LA ADMISIÓN
 *
 * La admisión necesita `source_duration_seconds` antes de que exista un job
 * (la etapa `Reserving` estima consumo de cuota a partir de ella), así que el
 * sondeo ocurre fuera del ciclo de vida del Pipeline Controller, por el mismo
 * canal de IPC con framing que usa el Stitcher: un sub-proceso recibe una
 * referencia al blob fuente por stdin y devuelve la duración medida por
 * stdout, nunca decodificando el medio dentro de este proceso.
 */

use crate::errors::StitcherError;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::instrument;

const FRAME_PREFIX_LEN: usize = 4;

#[async_trait::async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe_duration_seconds(&self, source_blob_url: &str) -> Result<f64, StitcherError>;
}

/// Invoca el mismo binario transcodificador que el Stitcher, con el flag
/// `--probe`, pasándole la URL del blob fuente por stdin y leyendo la
/// duración medida (un `f64` little-endian) por stdout.
pub struct SubprocessProbe {
    transcoder_binary_path: PathBuf,
}

impl SubprocessProbe {
    pub fn new(transcoder_binary_path: impl Into<PathBuf>) -> Self {
        Self { transcoder_binary_path: transcoder_binary_path.into() }
    }
}

#[async_trait::async_trait]
impl MediaProbe for SubprocessProbe {
    #[instrument(skip(self))]
    async fn probe_duration_seconds(&self, source_blob_url: &str) -> Result<f64, StitcherError> {
        let payload = source_blob_url.as_bytes();

        let mut child = Command::new(&self.transcoder_binary_path)
            .arg("--probe")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(StitcherError::SpawnFault)?;

        {
            let stdin = child.stdin.as_mut().expect("stdin was piped");
            stdin
                .write_all(&(payload.len() as u32).to_be_bytes())
                .await
                .map_err(StitcherError::StdinFault)?;
            stdin.write_all(payload).await.map_err(StitcherError::StdinFault)?;
            stdin.shutdown().await.map_err(StitcherError::StdinFault)?;
        }

        let output = child.wait_with_output().await.map_err(StitcherError::SpawnFault)?;

        if !output.status.success() {
            return Err(StitcherError::ProcessFault {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        if output.stdout.len() < FRAME_PREFIX_LEN + 8 {
            return Err(StitcherError::ProcessFault {
                status: output.status.to_string(),
                stderr: "sub-process produced a truncated duration frame".to_string(),
            });
        }

        let duration_bytes: [u8; 8] = output.stdout[FRAME_PREFIX_LEN..FRAME_PREFIX_LEN + 8]
            .try_into()
            .expect("8-byte slice");
        Ok(f64::from_be_bytes(duration_bytes))
    }
}

/// Variante de prueba: devuelve una duración fija sin invocar ningún
/// sub-proceso, para ejercitar la admisión y el Planner en pruebas.
pub struct FixedDurationProbe {
    pub duration_seconds: f64,
}

#[async_trait::async_trait]
impl MediaProbe for FixedDurationProbe {
    async fn probe_duration_seconds(&self, _source_blob_url: &str) -> Result<f64, StitcherError> {
        Ok(self.duration_seconds)
    }
}
