// [libs/domain/billing/src/lib.rs]
/*!
 * =================================================================
 * APARATO: QUOTA LEDGER CORE ENGINE (V1.0 - GOLD MASTER)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: GOBERNANZA FINANCIERA Y CUOTA DE MINUTOS POR USUARIO
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. RESERVE -> COMMIT/RELEASE: el control de flujo dirigido por excepciones
 *    del sistema original se reemplaza por un protocolo explícito con
 *    resultados tipados (`LedgerError`).
 * 2. EXACTAMENTE-UNA-VEZ: `QuotaAccount::plan_deduction` es pura y
 *    comprobable sin base de datos; la implementación concreta del Ledger
 *    (en `narrata-infra-job-store`) sólo la aplica dentro de una
 *    transacción que también inserta el Usage Record.
 * 3. NOMINAL PURITY: erradicación total de abreviaciones.
 * =================================================================
 */

pub mod errors;
pub mod ledger;
pub mod quota;
pub mod sink;

pub use errors::LedgerError;
pub use ledger::{QuotaLedger, QuotaSnapshot};
pub use quota::{BillingPeriod, DeductionPlan, QuotaAccount, Reservation, TopUpCredit, UsageRecord};
pub use sink::{BillingCompletionNotice, BillingSink, LoggingBillingSink};
