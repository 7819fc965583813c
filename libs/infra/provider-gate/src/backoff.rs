// [libs/infra/provider-gate/src/backoff.rs]
/*!
 * APARATO: RESPALDO EXPONENCIAL CON JITTER COMPLETO (V1.0)
 * RESPONSABILIDAD: CALCULAR EL RETRASO ENTRE REINTENTOS DE UN PROVEEDOR
 *
 * Implementación de "Full Jitter" (Marc Brooker, AWS Architecture Blog):
 * `delay = random(0, min(max_delay, base_delay * 2^attempt))`. Distribuye
 * los reintentos de un enjambre de jobs concurrentes en lugar de
 * sincronizarlos en manadas (thundering herd).
 */

use std::time::Duration;

use rand::Rng;

pub fn full_jitter_delay(attempt: u32, base_delay: Duration, max_delay: Duration) -> Duration {
    let exponential = base_delay.as_millis().saturating_mul(1u128 << attempt.min(31));
    let capped = exponential.min(max_delay.as_millis());
    if capped == 0 {
        return Duration::ZERO;
    }
    let jittered = rand::thread_rng().gen_range(0..=capped);
    Duration::from_millis(jittered as u64)
}
