// [libs/domain/billing/src/ledger.rs]
/*!
 * APARATO: CONTRATO DEL LIBRO MAYOR DE CUOTAS (V1.0)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: DEFINIR LAS CUATRO OPERACIONES ATÓMICAS DEL LEDGER
 *
 * `narrata-infra-job-store` provee la implementación respaldada por libSQL;
 * esta crate sólo conoce el contrato y las reglas de negocio puras
 * (`QuotaAccount::plan_deduction`). Ningún llamador del Pipeline Controller
 * debe conocer el motor de persistencia concreto.
 */

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::LedgerError;
use crate::quota::BillingPeriod;

#[async_trait]
pub trait QuotaLedger: Send + Sync {
    /// Verifica que `available ≥ estimate_minutes` y, de ser así, abre una
    /// reserva sin deducir nada todavía. Idempotente por una clave de
    /// reserva derivada de `job_id` — reintentar `reserve` para el mismo job
    /// devuelve la misma reserva.
    async fn reserve(&self, user_id: &str, job_id: Uuid, estimate_minutes: f64) -> Result<Uuid, LedgerError>;

    /// Deduce `actual_minutes` aplicando primero la suscripción y luego los
    /// top-ups más antiguos, e inserta el Usage Record dentro del mismo paso
    /// atómico. Si ya existe un Usage Record para `(job_id, billing_period)`
    /// no deduce nada y retorna éxito: exactamente-una-vez por construcción.
    async fn commit(
        &self,
        reservation_id: Uuid,
        actual_minutes: f64,
        job_id: Uuid,
        billing_period: BillingPeriod,
    ) -> Result<(), LedgerError>;

    /// Libera una reserva sin deducir. Es un no-op seguro si la reserva ya
    /// fue liberada o comprometida.
    async fn release(&self, reservation_id: Uuid) -> Result<(), LedgerError>;

    /// Acredita minutos de top-up, idempotente por `external_reference`.
    async fn top_up(&self, user_id: &str, minutes: f64, external_reference: &str) -> Result<(), LedgerError>;

    /// Snapshot de cuota para el endpoint de consulta (§6 "Quota query").
    async fn get_quota_snapshot(&self, user_id: &str) -> Result<QuotaSnapshot, LedgerError>;
}

#[derive(Debug, Clone)]
pub struct QuotaSnapshot {
    pub subscription_minutes_limit: f64,
    pub subscription_minutes_used: f64,
    pub top_up_minutes_remaining: f64,
    pub total_available_minutes: f64,
    pub billing_period: BillingPeriod,
}
