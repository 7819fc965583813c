// [libs/domain/billing/src/quota.rs]
/*!
 * APARATO: ENTIDADES DE CUOTA Y CRÉDITO (V1.0)
 * CLASIFICACIÓN: DOMAIN MODEL (ESTRATO L2)
 * RESPONSABILIDAD: MODELAR LA CUENTA DE CUOTA, SUS TOP-UPS Y LOS REGISTROS DE USO
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Período de facturación mensual, representado como `YYYY-MM` para que la
/// unicidad de `(jobId, billingPeriod)` sea estable sin depender de zonas
/// horarias en el límite del mes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BillingPeriod(pub String);

impl BillingPeriod {
    pub fn current() -> Self {
        Self::of(Utc::now())
    }

    pub fn of(timestamp: DateTime<Utc>) -> Self {
        Self(timestamp.format("%Y-%m").to_string())
    }
}

/// Un bloque de minutos comprado fuera de la suscripción. Los top-ups se
/// consumen en orden de creación (el más antiguo primero) sólo después de
/// agotar los minutos de suscripción del período.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopUpCredit {
    pub id: Uuid,
    /// Clave de idempotencia provista por el llamador (p. ej. el
    /// identificador de la transacción de pago que originó el top-up).
    pub external_reference: String,
    pub purchased_minutes: f64,
    pub remaining_minutes: f64,
    pub created_at: DateTime<Utc>,
}

/// Cuenta de cuota de un usuario para el período de facturación vigente.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaAccount {
    pub user_id: String,
    pub billing_period: BillingPeriod,
    pub subscription_minutes_limit: f64,
    pub subscription_minutes_used: f64,
    pub top_ups: Vec<TopUpCredit>,
}

impl QuotaAccount {
    pub fn subscription_minutes_remaining(&self) -> f64 {
        (self.subscription_minutes_limit - self.subscription_minutes_used).max(0.0)
    }

    pub fn top_up_minutes_remaining(&self) -> f64 {
        self.top_ups.iter().map(|top_up| top_up.remaining_minutes).sum()
    }

    pub fn total_available_minutes(&self) -> f64 {
        self.subscription_minutes_remaining() + self.top_up_minutes_remaining()
    }
}

/// Un registro de consumo: exactamente uno por `(jobId, billingPeriod)`. La
/// restricción de unicidad sobre ese par es el ancla de exactamente-una-vez
/// del sistema completo (§8 invariante 4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub job_id: Uuid,
    pub billing_period: BillingPeriod,
    pub minutes_billed: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Un marcador de intención de facturar, vivo desde la admisión del job
/// hasta su `commit` (o liberado si el job falla o se cancela).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: String,
    pub estimate_minutes: f64,
    pub released: bool,
}

/// El plan de deducción puro: cuánto se descuenta de la suscripción y
/// cuánto de cada top-up, en el orden en que deben aplicarse. Separado del
/// efecto de escribirlo para que sea trivialmente comprobable sin una base
/// de datos.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeductionPlan {
    pub from_subscription: f64,
    /// `(top_up_id, minutes_taken_from_this_top_up)` en orden de aplicación.
    pub from_top_ups: Vec<(Uuid, f64)>,
}

impl QuotaAccount {
    /// Calcula, sin mutar nada, cómo se repartirían `actual_minutes` entre
    /// la suscripción y los top-ups (más antiguo primero). El llamador
    /// aplica el plan de forma atómica junto con la inserción del Usage
    /// Record.
    pub fn plan_deduction(&self, actual_minutes: f64) -> DeductionPlan {
        let mut remaining_to_bill = actual_minutes;
        let mut plan = DeductionPlan::default();

        let subscription_headroom = self.subscription_minutes_remaining();
        let from_subscription = subscription_headroom.min(remaining_to_bill);
        plan.from_subscription = from_subscription;
        remaining_to_bill -= from_subscription;

        let mut ordered_top_ups = self.top_ups.clone();
        ordered_top_ups.sort_by_key(|top_up| top_up.created_at);

        for top_up in ordered_top_ups {
            if remaining_to_bill <= 0.0 {
                break;
            }
            let taken = top_up.remaining_minutes.min(remaining_to_bill);
            if taken > 0.0 {
                plan.from_top_ups.push((top_up.id, taken));
                remaining_to_bill -= taken;
            }
        }

        plan
    }
}
