// [libs/domain/planner/src/lib.rs]
/*!
 * =================================================================
 * APARATO: NARRATA SEGMENT PLANNER (V1.0)
 * CLASIFICACIÓN: DOMAIN SERVICE (ESTRATO L2)
 * RESPONSABILIDAD: DIVIDIR EL VIDEO FUENTE EN SEGMENTOS DE NARRACIÓN
 *                   ORDENADOS Y DETERMINISTAS
 * =================================================================
 */

mod chapter_subdivider;
mod errors;
mod interval;
mod planner;
mod script_matcher;
mod short_clip_splitter;
mod target_selector;

pub use errors::PlannerError;
pub use interval::PlannedInterval;
pub use planner::{SegmentPlanner, CHAPTER_PROVIDER_ID};
pub use script_matcher::match_script_to_intervals;
pub use target_selector::select_by_target_duration;
