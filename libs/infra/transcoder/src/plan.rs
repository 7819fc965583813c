// [libs/infra/transcoder/src/plan.rs]
/*!
 * APARATO: PLAN DE ENSAMBLADO (V1.0)
 * CLASIFICACIÓN: DOMAIN MODEL (ESTRATO L3)
 * RESPONSABILIDAD: DESCRIBIR, SIN DECODIFICAR NADA, QUÉ DEBE ARMAR EL
 *                   SUB-PROCESO TRANSCODIFICADOR
 *
 * El Stitcher nunca decodifica ni re-codifica medio; arma este plan y lo
 * entrega íntegro al sub-proceso, que es el único componente que toca los
 * bytes del video y del audio.
 */

use narrata_domain_models::BlobHandle;
use serde::{Deserialize, Serialize};

/// Un tramo del video fuente, renarrado por exactamente un segmento, en el
/// orden final en el que debe aparecer en el recap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssemblyStep {
    pub source_start: f64,
    pub source_end: f64,
    pub narration_audio: BlobHandle,
    pub speed_factor: f64,
}

/// Todo lo que el sub-proceso transcodificador necesita para producir un
/// único blob de salida: el medio fuente, la secuencia ordenada de tramos, y
/// dónde debe escribir el resultado.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssemblyPlan {
    pub job_id: String,
    pub source_blob: BlobHandle,
    pub steps: Vec<AssemblyStep>,
}

impl AssemblyPlan {
    pub fn new(job_id: String, source_blob: BlobHandle, steps: Vec<AssemblyStep>) -> Self {
        Self { job_id, source_blob, steps }
    }
}

/// Lo que el sub-proceso reporta por stdout una vez terminado: el handle del
/// blob de salida ya subido y la duración medida del recap ensamblado.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssemblyResult {
    pub output_blob: BlobHandle,
    pub output_duration_seconds: f64,
}
