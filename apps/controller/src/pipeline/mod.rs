// [apps/controller/src/pipeline/mod.rs]
/*!
 * APARATO: PIPELINE MODULE ROOT (V1.0)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L1)
 * RESPONSABILIDAD: AGRUPAR LOS COMPONENTES SIN SUPERFICIE DE LIBRERÍA PROPIA
 *
 * Progress Bus, Segment Worker Pool, Pipeline Controller y el barrido de
 * recuperación no tienen una superficie reutilizable fuera de este binario
 * — viven aquí como módulos de aplicación, igual que `event_bus` y el bucle
 * de ejecución de etapas del vecino viven dentro de su propia app.
 */

mod billing_sink;
mod controller;
mod progress_bus;
mod recovery;
mod segment_worker;

pub use billing_sink::WebhookBillingSink;
pub use controller::{ControllerConfig, ControllerError, PipelineController};
pub use progress_bus::{envelope_for_event, ProgressBus, ProgressBusError, ProgressSubscription};
pub use recovery::spawn_recovery_sweep;
pub use segment_worker::{SegmentWorkerError, SegmentWorkerPool, TTS_PROVIDER_ID, VISION_PROVIDER_ID};
