// [libs/domain/billing/src/sink.rs]
/*!
 * APARATO: BILLING COMPLETION SINK (V1.0)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DE NOTIFICACIÓN AL SISTEMA DE FACTURACIÓN EXTERNO
 *
 * Cuando un job llega a `Completed` el Pipeline Controller emite una señal
 * firmada `{jobId, userId, billedMinutes, billingPeriod}` hacia este sumidero
 * (§6 "Billing completion notice"). El sumidero se asume idempotente; la
 * implementación concreta (HTTP, cola, log) vive fuera de esta crate, igual
 * que `QuotaLedger` sólo define el contrato y deja la persistencia a
 * `narrata-infra-job-store`.
 */

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::quota::BillingPeriod;

#[derive(Debug, Clone, Serialize)]
pub struct BillingCompletionNotice {
    pub job_id: Uuid,
    pub user_id: String,
    pub billed_minutes: f64,
    pub billing_period: BillingPeriod,
}

#[async_trait]
pub trait BillingSink: Send + Sync {
    async fn notify_completion(&self, notice: BillingCompletionNotice);
}

/// Sumidero de respaldo: registra la notificación en el rastro de trazas sin
/// reenviarla a ningún sistema externo. Útil para despliegues sin un
/// procesador de facturación todavía conectado, y para pruebas.
pub struct LoggingBillingSink;

#[async_trait]
impl BillingSink for LoggingBillingSink {
    async fn notify_completion(&self, notice: BillingCompletionNotice) {
        tracing::info!(
            job_id = %notice.job_id,
            user_id = %notice.user_id,
            billed_minutes = notice.billed_minutes,
            billing_period = %notice.billing_period.0,
            "billing completion notice"
        );
    }
}
