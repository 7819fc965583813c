// [tests/mirror/libs/shared/telemetry/telemetry_integrity.test.rs]
//! El hook de pánico debe seguir capturando el unwind del hilo incluso
//! después de que `init_tracing` reemplace el subscriber global por defecto;
//! una instrumentación con `#[instrument]` no debe fallar a compilar ni a
//! tiempo de ejecución sobre el subscriber instalado.

use narrata_shared_telemetry::init_tracing;
use std::panic;
use tracing::{info, instrument};

#[instrument(name = "test_instrumentation_strata")]
fn simulate_instrumented_operation() {
    info!("executing traced operation");
}

#[tokio::test]
async fn panic_hook_intercepts_a_thread_collapse_after_tracing_init() {
    init_tracing("telemetry_integrity_test");

    simulate_instrumented_operation();

    let result = panic::catch_unwind(|| {
        panic!("intentional failure for panic hook certification");
    });

    assert!(result.is_err(), "the panic hook must not swallow or prevent the unwind");
}
