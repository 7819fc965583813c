// [libs/infra/provider-gate/src/token_bucket.rs]
/*!
 * APARATO: CUBO DE TOKENS POR PROVEEDOR (V1.0)
 * RESPONSABILIDAD: ACOTAR LA TASA DE SOLICITUDES HACIA UN ÚNICO PROVEEDOR
 *
 * Un cubo de tokens clásico, rellenado perezosamente en cada admisión en
 * lugar de con una tarea de fondo: más barato para cientos de jobs
 * concurrentes compartiendo el mismo proveedor.
 */

use std::time::Instant;

use tokio::sync::Mutex;

struct TokenBucketState {
    tokens: f64,
    last_refill: Instant,
}

pub struct TokenBucket {
    capacity: f64,
    refill_per_second: f64,
    state: Mutex<TokenBucketState>,
}

impl TokenBucket {
    pub fn new(requests_per_second: f64) -> Self {
        let capacity = requests_per_second.max(1.0);
        Self {
            capacity,
            refill_per_second: requests_per_second,
            state: Mutex::new(TokenBucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Bloquea hasta que haya un token disponible, consumiéndolo.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let elapsed = state.last_refill.elapsed().as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.refill_per_second).min(self.capacity);
                state.last_refill = Instant::now();

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    None
                } else {
                    let deficit = 1.0 - state.tokens;
                    Some(std::time::Duration::from_secs_f64(deficit / self.refill_per_second))
                }
            };

            match wait {
                None => return,
                Some(duration) => tokio::time::sleep(duration).await,
            }
        }
    }
}
