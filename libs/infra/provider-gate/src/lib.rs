// [libs/infra/provider-gate/src/lib.rs]
/*!
 * =================================================================
 * APARATO: EXTERNAL CALL GATE LIBRARY BARREL (V1.0 - GOLD MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE LIB (ESTRATO L3)
 * RESPONSABILIDAD: EXPOSICIÓN PÚBLICA DEL GATE Y LOS CLIENTES DE PROVEEDORES
 * =================================================================
 */

pub mod backoff;
pub mod clients;
pub mod errors;
pub mod gate;
pub mod token_bucket;

pub use clients::{ChapterProvider, HttpChapterProvider, HttpTtsProvider, HttpVisionProvider, TtsProvider, VisionProvider};
pub use errors::{AttemptOutcome, GateError};
pub use gate::ExternalCallGate;
