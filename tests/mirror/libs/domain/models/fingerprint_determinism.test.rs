// [tests/mirror/libs/domain/models/fingerprint_determinism.test.rs]
//! Propiedad: para las mismas entradas, el fingerprint de un segmento es
//! siempre el mismo byte a byte, y distinto ante cualquier cambio de índice,
//! límites temporales o texto de guion. Esto es lo que hace expresable el
//! reuso de resultados durante la recuperación ante caídas.

use narrata_domain_models::job::JobId;
use narrata_domain_models::segment::SegmentFingerprint;
use proptest::prelude::*;

proptest! {
    #[test]
    fn fingerprint_is_a_pure_function_of_its_inputs(
        index in 0u32..10_000,
        start in 0.0f64..36_000.0,
        span in 0.1f64..3600.0,
    ) {
        let job_id = JobId::new();
        let end = start + span;
        let first = SegmentFingerprint::compute(job_id, index, start, end, None);
        let second = SegmentFingerprint::compute(job_id, index, start, end, None);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn distinct_indices_never_collide_for_the_same_job(
        index_a in 0u32..500,
        index_b in 500u32..1000,
    ) {
        let job_id = JobId::new();
        let a = SegmentFingerprint::compute(job_id, index_a, 0.0, 5.0, None);
        let b = SegmentFingerprint::compute(job_id, index_b, 0.0, 5.0, None);
        prop_assert_ne!(a, b);
    }
}
