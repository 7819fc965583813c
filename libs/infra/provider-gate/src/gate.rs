// [libs/infra/provider-gate/src/gate.rs]
/*!
 * =================================================================
 * APARATO: EXTERNAL CALL GATE (V1.0 - GOLD MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: ACOTAR CONCURRENCIA Y TASA HACIA CADA PROVEEDOR EXTERNO
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. UN CUBO POR PROVEEDOR: ningún proveedor compite por el cupo de otro;
 *    `call` nunca serializa solicitudes que no comparten `provider_id`.
 * 2. RETRY CONSOLIDADO: el reintento con respaldo exponencial y jitter
 *    completo vive aquí una sola vez, en lugar de en cada llamador.
 * 3. CANCELACIÓN COOPERATIVA: cada punto de suspensión (adquisición de
 *    cupo, intento, espera de respaldo) revisa el token de cancelación.
 * =================================================================
 */

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use narrata_domain_models::ProviderConfig;
use tokio::sync::{RwLock, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::backoff::full_jitter_delay;
use crate::errors::{AttemptOutcome, GateError};
use crate::token_bucket::TokenBucket;

struct ProviderGateState {
    config: ProviderConfig,
    bucket: TokenBucket,
    concurrency: Semaphore,
}

/// Envoltura soberana de toda llamada saliente a un proveedor externo.
pub struct ExternalCallGate {
    providers: RwLock<HashMap<String, Arc<ProviderGateState>>>,
}

impl ExternalCallGate {
    pub fn new(configs: Vec<ProviderConfig>) -> Self {
        let mut providers = HashMap::with_capacity(configs.len());
        for config in configs {
            let provider_id = config.provider_id.clone();
            let state = ProviderGateState {
                bucket: TokenBucket::new(config.requests_per_second),
                concurrency: Semaphore::new(config.max_in_flight),
                config,
            };
            providers.insert(provider_id, Arc::new(state));
        }
        Self {
            providers: RwLock::new(providers),
        }
    }

    /// Registra o reemplaza la configuración de un proveedor en caliente.
    /// Usado al arranque cuando los proveedores se descubren desde la
    /// configuración del proceso (§6).
    pub async fn register_provider(&self, config: ProviderConfig) {
        let provider_id = config.provider_id.clone();
        let state = ProviderGateState {
            bucket: TokenBucket::new(config.requests_per_second),
            concurrency: Semaphore::new(config.max_in_flight),
            config,
        };
        self.providers.write().await.insert(provider_id, Arc::new(state));
    }

    /// Ejecuta `attempt` bajo el cubo de tokens, el semáforo de concurrencia
    /// y la política de reintento del proveedor `provider_id`. `attempt` se
    /// invoca de nuevo en cada reintento; debe ser idempotente o segura de
    /// repetir (el llamador decide, el Gate sólo orquesta el cuándo).
    #[instrument(skip(self, cancellation, attempt))]
    pub async fn call<F, Fut, T>(
        &self,
        provider_id: &str,
        cancellation: CancellationToken,
        mut attempt: F,
    ) -> Result<T, GateError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AttemptOutcome<T>>,
    {
        let state = {
            let providers = self.providers.read().await;
            providers
                .get(provider_id)
                .cloned()
                .ok_or_else(|| GateError::UnknownProvider(provider_id.to_string()))?
        };

        let mut last_message = String::new();

        for attempt_number in 0..state.config.max_attempts {
            if cancellation.is_cancelled() {
                return Err(GateError::Cancelled(provider_id.to_string()));
            }

            state.bucket.acquire().await;

            let _permit = tokio::select! {
                permit = state.concurrency.acquire() => permit.expect("gate semaphore is never closed"),
                _ = cancellation.cancelled() => return Err(GateError::Cancelled(provider_id.to_string())),
            };

            let attempt_future = attempt();
            let timed_result = tokio::select! {
                result = tokio::time::timeout(state.config.per_attempt_timeout, attempt_future) => result,
                _ = cancellation.cancelled() => return Err(GateError::Cancelled(provider_id.to_string())),
            };

            let outcome = match timed_result {
                Err(_elapsed) => {
                    last_message = "per-attempt timeout elapsed".to_string();
                    debug!(provider_id, attempt_number, "⏱️ [GATE_TIMEOUT]: attempt timed out");
                    None
                }
                Ok(AttemptOutcome::Success(value)) => return Ok(value),
                Ok(AttemptOutcome::Permanent { message }) => {
                    warn!(provider_id, "🛑 [GATE_PERMANENT]: {}", message);
                    return Err(GateError::Permanent {
                        provider_id: provider_id.to_string(),
                        message,
                    });
                }
                Ok(AttemptOutcome::Retriable { message, .. }) => {
                    last_message = message;
                    None
                }
            };
            let _ = outcome;

            let is_last_attempt = attempt_number + 1 == state.config.max_attempts;
            if is_last_attempt {
                return Err(GateError::RetriesExhausted {
                    provider_id: provider_id.to_string(),
                    attempts: state.config.max_attempts,
                    last_message,
                });
            }

            let delay = full_jitter_delay(attempt_number, state.config.base_delay, state.config.max_delay);
            debug!(provider_id, attempt_number, ?delay, "🔁 [GATE_RETRY]: backing off before next attempt");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancellation.cancelled() => return Err(GateError::Cancelled(provider_id.to_string())),
            }
        }

        unreachable!("loop always returns via Ok, Err, or the is_last_attempt branch")
    }
}
