// [libs/domain/planner/src/planner.rs]
/*!
 * APARATO: SEGMENT PLANNER (V1.0)
 * CLASIFICACIÓN: DOMAIN SERVICE (ESTRATO L2)
 * RESPONSABILIDAD: ORQUESTAR LAS CUATRO PASADAS DE §4.F EN UNA SOLA LISTA
 *                   DE SEGMENTOS ORDENADOS Y DETERMINISTAS
 *
 * El Planner nunca reintenta por sí mismo: delega la única llamada externa
 * (el servicio de capítulos) al Gate, que ya trae su propia política de
 * reintento, y cualquier falla que sobreviva a esa política se reporta como
 * `PlanUnrealizable` — nunca como transitoria.
 */

use std::sync::Arc;

use narrata_domain_models::job::JobId;
use narrata_domain_models::segment::Segment;
use narrata_domain_models::{JobConfig, PlanLimits, SegmentConfig};
use narrata_infra_provider_gate::clients::chapters::ChapterProvider;
use narrata_infra_provider_gate::ExternalCallGate;
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::chapter_subdivider::subdivide_chapters;
use crate::errors::PlannerError;
use crate::interval::PlannedInterval;
use crate::script_matcher::match_script_to_intervals;
use crate::short_clip_splitter::split_for_short_clip_mode;
use crate::target_selector::select_by_target_duration;

/// Identificador de proveedor bajo el que el servicio de capítulos se
/// registra en el Gate; compartido con la configuración de arranque.
pub const CHAPTER_PROVIDER_ID: &str = "chapters";

pub struct SegmentPlanner {
    gate: Arc<ExternalCallGate>,
    chapter_provider: Arc<dyn ChapterProvider>,
}

impl SegmentPlanner {
    pub fn new(gate: Arc<ExternalCallGate>, chapter_provider: Arc<dyn ChapterProvider>) -> Self {
        Self { gate, chapter_provider }
    }

    #[instrument(skip(self, config, segment_config, plan_limits, cancellation), fields(job_id = %job_id))]
    pub async fn plan(
        &self,
        job_id: JobId,
        source_duration_seconds: f64,
        source_blob_url: &str,
        config: &JobConfig,
        segment_config: &SegmentConfig,
        plan_limits: &PlanLimits,
        cancellation: CancellationToken,
    ) -> Result<Vec<Segment>, PlannerError> {
        if source_duration_seconds <= 0.0 {
            return Err(PlannerError::ZeroDuration(source_duration_seconds));
        }

        let mut intervals = match &config.override_script {
            Some(script) => match_script_to_intervals(script, source_duration_seconds)?,
            None => {
                let chapters = self
                    .gate
                    .call(CHAPTER_PROVIDER_ID, cancellation.clone(), || {
                        let chapter_provider = Arc::clone(&self.chapter_provider);
                        let source_blob_url = source_blob_url.to_string();
                        async move { chapter_provider.coarse_chapters(&source_blob_url).await }
                    })
                    .await?;

                if chapters.is_empty() {
                    return Err(PlannerError::NoChapters);
                }
                subdivide_chapters(&chapters, segment_config)
            }
        };

        if config.feature_toggles.short_clip_mode {
            intervals = split_for_short_clip_mode(intervals, segment_config.short_clip_max_seconds);
        }

        if let Some(target_minutes) = config.target_duration_minutes {
            intervals = select_by_target_duration(
                intervals,
                target_minutes * 60.0,
                plan_limits.target_overrun_factor,
            );
        }

        // Cumulative float rounding in the script matcher, or a zero-length
        // chapter surviving the subdivider, can leave a degenerate interval
        // whose start equals its end. `Segment::planned` would panic on one;
        // dropping it here keeps that failure inside `PlanUnrealizable`
        // instead of aborting the worker.
        intervals.retain(|interval| interval.end > interval.start);

        if intervals.is_empty() {
            return Err(PlannerError::Unrealizable);
        }

        let segments = intervals
            .into_iter()
            .enumerate()
            .map(|(index, interval)| build_segment(job_id, index as u32, interval))
            .collect::<Vec<_>>();

        info!(segment_count = segments.len(), "plan produced");
        Ok(segments)
    }
}

fn build_segment(job_id: JobId, index: u32, interval: PlannedInterval) -> Segment {
    let paragraph_hash = interval.script_paragraph.as_deref().map(hash_paragraph);
    Segment::planned(job_id, index, interval.start, interval.end, paragraph_hash.as_deref())
}

fn hash_paragraph(paragraph: &str) -> String {
    let digest = Sha256::digest(paragraph.as_bytes());
    hex::encode(digest)
}
