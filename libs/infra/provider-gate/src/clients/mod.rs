// [libs/infra/provider-gate/src/clients/mod.rs]
//! Contratos y adaptadores HTTP para los tres proveedores externos de IA que
//! el Segment Worker Pool y el Segment Planner consultan a través del Gate.
//! Los prompts, IDs de voz y elección de modelo permanecen opacos a este
//! estrato: cada trait expone sólo la forma de la solicitud/respuesta que el
//! motor necesita para avanzar el pipeline.

pub mod chapters;
pub mod tts;
pub mod vision;

pub use chapters::{ChapterProvider, HttpChapterProvider, SourceChapter};
pub use tts::{HttpTtsProvider, SynthesizedAudio, TtsProvider};
pub use vision::{DescribedSegment, HttpVisionProvider, VisionProvider};

/// Whether the Gate's retry policy for this provider marks `status` transient.
/// Shared by the three HTTP clients so `ProviderConfig.retriable_statuses`
/// governs the `Retriable`/`Permanent` split instead of a hardcoded guess.
pub(crate) fn is_retriable_status(status: reqwest::StatusCode, retriable_statuses: &[u16]) -> bool {
    retriable_statuses.contains(&status.as_u16())
}
