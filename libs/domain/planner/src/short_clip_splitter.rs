// [libs/domain/planner/src/short_clip_splitter.rs]
/*!
 * APARATO: DIVISOR DE MODO CLIP CORTO (V1.0)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: GARANTIZAR QUE NINGÚN INTERVALO EXCEDA `shortClipMax`
 *                   CUANDO EL TOGGLE DE MODO CLIP CORTO ESTÁ ACTIVO (§4.F.3)
 *
 * La división es puramente aritmética y determinista: cada intervalo que
 * excede el máximo se reparte en la menor cantidad de piezas de igual
 * duración que lo satisface. El texto de guion, si existe, viaja intacto
 * con cada pieza resultante (el Worker Pool renarra por tramo de tiempo,
 * no por oración).
 */

use crate::interval::PlannedInterval;

pub fn split_for_short_clip_mode(intervals: Vec<PlannedInterval>, short_clip_max_seconds: f64) -> Vec<PlannedInterval> {
    intervals
        .into_iter()
        .flat_map(|interval| split_one(interval, short_clip_max_seconds))
        .collect()
}

fn split_one(interval: PlannedInterval, short_clip_max_seconds: f64) -> Vec<PlannedInterval> {
    let duration = interval.duration();
    if duration <= short_clip_max_seconds {
        return vec![interval];
    }

    let piece_count = (duration / short_clip_max_seconds).ceil() as u32;
    let piece_duration = duration / piece_count as f64;

    (0..piece_count)
        .map(|piece_index| {
            let start = interval.start + piece_index as f64 * piece_duration;
            let end = if piece_index + 1 == piece_count { interval.end } else { start + piece_duration };
            PlannedInterval {
                start,
                end,
                script_paragraph: interval.script_paragraph.clone(),
                importance_score: interval.importance_score,
            }
        })
        .collect()
}
