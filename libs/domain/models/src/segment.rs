// [libs/domain/models/src/segment.rs]
/*!
 * APARATO: ENTIDAD SOBERANA DE SEGMENTO (V1.0)
 * CLASIFICACIÓN: DOMAIN MODEL (ESTRATO L2)
 * RESPONSABILIDAD: MODELAR UNA UNIDAD DE NARRACIÓN PLANIFICADA
 *
 * Un Segment nace junto con el plan completo (ver narrata-domain-planner) y
 * nunca se agrega después; su índice es denso y su orden estable. El campo
 * `fingerprint` es la única llave de idempotencia que el Segment Worker Pool
 * y la recuperación de fallas necesitan.
 */

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::job::JobId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SegmentStatus {
    Planned,
    Describing,
    Synthesizing,
    Aligning,
    Done,
    Failed,
}

/// Hash estable de `{jobId, index, start, end, scriptParagraphHash?}`. Dos
/// invocaciones del Planner sobre la misma entrada deben producir el mismo
/// fingerprint byte a byte; esto es lo que hace expresable la recuperación
/// ante caídas (§4.I "Lease and recovery").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentFingerprint(pub [u8; 32]);

impl SegmentFingerprint {
    pub fn compute(job_id: JobId, index: u32, start: f64, end: f64, script_paragraph_hash: Option<&str>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(job_id.0.as_bytes());
        hasher.update(index.to_be_bytes());
        hasher.update(start.to_be_bytes());
        hasher.update(end.to_be_bytes());
        if let Some(paragraph_hash) = script_paragraph_hash {
            hasher.update(paragraph_hash.as_bytes());
        }
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentError {
    pub kind: crate::error_kind::ErrorKind,
    pub message: String,
}

/// Resultado de la etapa Align: la narración quedó sellada junto con su
/// factor de velocidad de reproducción.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentOutcome {
    pub narration_text: String,
    pub narration_audio: crate::job::BlobHandle,
    pub speed_factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub job_id: JobId,
    pub index: u32,
    pub start: f64,
    pub end: f64,
    pub fingerprint: SegmentFingerprint,
    pub status: SegmentStatus,
    pub outcome: Option<SegmentOutcome>,
    pub error: Option<SegmentError>,
}

impl Segment {
    pub fn planned(job_id: JobId, index: u32, start: f64, end: f64, script_paragraph_hash: Option<&str>) -> Self {
        assert!(end > start, "a segment's end must be strictly after its start");
        Self {
            job_id,
            index,
            start,
            end,
            fingerprint: SegmentFingerprint::compute(job_id, index, start, end, script_paragraph_hash),
            status: SegmentStatus::Planned,
            outcome: None,
            error: None,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}
