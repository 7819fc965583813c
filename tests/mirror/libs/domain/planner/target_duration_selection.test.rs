// [tests/mirror/libs/domain/planner/target_duration_selection.test.rs]
//! Cuando se provee una duración objetivo, la selección greedy por
//! importancia acumula en orden de importancia descendente hasta que la
//! suma alcanza `target * overrunFactor`, y restaura el orden temporal
//! original antes de devolver el resultado.

use narrata_domain_planner::{select_by_target_duration, PlannedInterval};

fn interval(start: f64, end: f64, importance: f64) -> PlannedInterval {
    PlannedInterval { start, end, script_paragraph: None, importance_score: importance }
}

#[test]
fn least_important_interval_is_dropped_once_budget_is_reached() {
    // budget = 20 * 1.10 = 22s. The two most important intervals (15s + 10s
    // = 25s) already reach that budget, so the least important is dropped.
    let intervals = vec![
        interval(0.0, 15.0, 0.95),
        interval(15.0, 25.0, 0.90),
        interval(25.0, 35.0, 0.10),
    ];
    let result = select_by_target_duration(intervals, 20.0, 1.10);
    assert_eq!(result.len(), 2);
    assert!(result.iter().all(|iv| iv.importance_score >= 0.90));
}

#[test]
fn selected_segments_remain_in_source_temporal_order() {
    let intervals = vec![
        interval(0.0, 5.0, 0.20),
        interval(5.0, 20.0, 0.95),
        interval(20.0, 30.0, 0.80),
    ];
    let result = select_by_target_duration(intervals, 20.0, 1.10);
    assert_eq!(result.len(), 2);
    assert!(result[0].start < result[1].start);
    assert_eq!(result[0].start, 5.0);
    assert_eq!(result[1].start, 20.0);
}

#[test]
fn a_single_segment_at_the_overrun_budget_is_kept() {
    let intervals = vec![interval(0.0, 22.0, 1.0)];
    let result = select_by_target_duration(intervals, 20.0, 1.10);
    assert_eq!(result.len(), 1, "a single segment exactly at the overrun budget must still be kept");
}

#[test]
fn zero_target_duration_drops_everything() {
    let intervals = vec![interval(0.0, 5.0, 1.0), interval(5.0, 10.0, 1.0)];
    let result = select_by_target_duration(intervals, 0.0, 1.10);
    assert!(result.is_empty());
}
