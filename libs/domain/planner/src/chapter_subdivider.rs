// [libs/domain/planner/src/chapter_subdivider.rs]
/*!
 * APARATO: SUBDIVISOR DE CAPÍTULOS (V1.0)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: CONVERTIR CAPÍTULOS GRUESOS EN SEGMENTOS DENTRO DE
 *                   [minSeg, maxSeg] CUANDO NO HAY GUION (§4.F.2)
 *
 * Cada capítulo largo se reparte en la menor cantidad de piezas iguales que
 * satisface `maxSeg`; capítulos ya cortos se dejan intactos salvo que caigan
 * por debajo de `minSeg`, en cuyo caso se fusionan con el siguiente.
 */

use crate::interval::PlannedInterval;
use narrata_domain_models::SegmentConfig;
use narrata_infra_provider_gate::clients::chapters::SourceChapter;

pub fn subdivide_chapters(chapters: &[SourceChapter], segment_config: &SegmentConfig) -> Vec<PlannedInterval> {
    let merged = merge_short_chapters(chapters, segment_config.min_segment_seconds);

    let mut intervals = Vec::new();
    for chapter in merged {
        let duration = chapter.end_seconds - chapter.start_seconds;
        if duration <= segment_config.max_segment_seconds {
            intervals.push(PlannedInterval {
                start: chapter.start_seconds,
                end: chapter.end_seconds,
                script_paragraph: None,
                importance_score: chapter.importance_score,
            });
            continue;
        }

        let piece_count = (duration / segment_config.max_segment_seconds).ceil() as u32;
        let piece_duration = duration / piece_count as f64;
        for piece_index in 0..piece_count {
            let start = chapter.start_seconds + piece_index as f64 * piece_duration;
            let end = if piece_index + 1 == piece_count {
                chapter.end_seconds
            } else {
                start + piece_duration
            };
            intervals.push(PlannedInterval {
                start,
                end,
                script_paragraph: None,
                importance_score: chapter.importance_score,
            });
        }
    }
    intervals
}

/// Fusiona capítulos consecutivos mientras el primero quede por debajo de
/// `min_segment_seconds`, tomando el score de importancia máximo del par.
fn merge_short_chapters(chapters: &[SourceChapter], min_segment_seconds: f64) -> Vec<SourceChapter> {
    let mut merged: Vec<SourceChapter> = Vec::with_capacity(chapters.len());
    for chapter in chapters {
        let should_merge_into_previous = merged
            .last()
            .map(|previous| previous.end_seconds - previous.start_seconds < min_segment_seconds)
            .unwrap_or(false);

        if should_merge_into_previous {
            let previous = merged.last_mut().expect("checked above");
            previous.end_seconds = chapter.end_seconds;
            previous.importance_score = previous.importance_score.max(chapter.importance_score);
        } else {
            merged.push(chapter.clone());
        }
    }
    merged
}
