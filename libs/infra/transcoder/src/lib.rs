// [libs/infra/transcoder/src/lib.rs]
/*!
 * =================================================================
 * APARATO: NARRATA TRANSCODER BRIDGE (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: ARMAR EL PLAN DE ENSAMBLADO Y ENTREGARLO AL SUB-PROCESO
 *                   TRANSCODIFICADOR DE MEDIOS
 * =================================================================
 */

mod errors;
mod plan;
mod probe;
mod stitcher;

pub use errors::StitcherError;
pub use plan::{AssemblyPlan, AssemblyResult, AssemblyStep};
pub use probe::{FixedDurationProbe, MediaProbe, SubprocessProbe};
pub use stitcher::{EchoStitcher, StitchEngine, Stitcher};
