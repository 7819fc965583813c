// [libs/domain/planner/src/target_selector.rs]
/*!
 * APARATO: SELECTOR GREEDY POR DURACIÓN OBJETIVO (V1.0)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: RECORTAR LA LISTA DE INTERVALOS A LA DURACIÓN OBJETIVO
 *                   CON EL FACTOR DE SOBREPASO CONFIGURADO (§4.F.4)
 *
 * Ordena los intervalos por `importance_score` descendente (con el índice
 * original como desempate estable) y los acumula en ese orden hasta
 * alcanzar `target_seconds * overrun_factor`; el resto se descarta. El
 * orden temporal original se restaura antes de devolver el resultado: el
 * Segment Worker Pool y el Stitcher dependen de que los segmentos queden en
 * orden de aparición en el video fuente, nunca en orden de importancia.
 */

use crate::interval::PlannedInterval;

pub fn select_by_target_duration(
    intervals: Vec<PlannedInterval>,
    target_seconds: f64,
    overrun_factor: f64,
) -> Vec<PlannedInterval> {
    let budget = target_seconds * overrun_factor;

    let mut indexed: Vec<(usize, PlannedInterval)> = intervals.into_iter().enumerate().collect();
    indexed.sort_by(|(index_a, a), (index_b, b)| {
        b.importance_score
            .partial_cmp(&a.importance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(index_a.cmp(index_b))
    });

    let mut cumulative = 0.0f64;
    let mut selected: Vec<(usize, PlannedInterval)> = Vec::new();
    for (original_index, interval) in indexed {
        if cumulative >= budget {
            break;
        }
        cumulative += interval.duration();
        selected.push((original_index, interval));
    }

    selected.sort_by_key(|(original_index, _)| *original_index);
    selected.into_iter().map(|(_, interval)| interval).collect()
}
