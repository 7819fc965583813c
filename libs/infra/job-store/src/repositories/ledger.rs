// [libs/infra/job-store/src/repositories/ledger.rs]
/*!
 * APARATO: LEDGER DE CUOTA RESPALDADO POR LIBSQL (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: IMPLEMENTAR `QuotaLedger` SOBRE LA MISMA CONEXIÓN QUE EL
 *                   JOB STORE, CON `reserve`/`commit`/`release`/`topUp` ATÓMICOS
 *
 * `reserve` es idempotente mediante una clave determinista derivada del
 * `jobId` (UUID v5): reintentar `reserve` durante la recuperación de un job
 * devuelve exactamente la misma reserva sin re-verificar la cuota. `commit`
 * es exactamente-una-vez gracias a la restricción de unicidad de
 * `(jobId, billingPeriod)` sobre `usage_records`.
 */

use async_trait::async_trait;
use chrono::Utc;
use libsql::params;
use narrata_domain_billing::{BillingPeriod, LedgerError, QuotaAccount, QuotaLedger, QuotaSnapshot, TopUpCredit};
use uuid::Uuid;

use crate::client::JobStoreClient;
use crate::errors::DbError;

/// Espacio de nombres fijo bajo el que se derivan los UUID v5 de reserva;
/// arbitrario pero estable entre reinicios del proceso.
const RESERVATION_NAMESPACE: Uuid = Uuid::from_bytes([
    0x4e, 0x61, 0x72, 0x72, 0x61, 0x74, 0x61, 0x00, 0x52, 0x65, 0x73, 0x65, 0x72, 0x76, 0x65, 0x00,
]);

fn reservation_id_for(job_id: Uuid) -> Uuid {
    Uuid::new_v5(&RESERVATION_NAMESPACE, job_id.as_bytes())
}

pub struct SqlQuotaLedger {
    client: JobStoreClient,
    /// Límite de suscripción con el que se crea la primera cuenta de un
    /// usuario si no hay un período de facturación anterior del que heredar.
    default_subscription_minutes: f64,
}

impl SqlQuotaLedger {
    pub fn new(client: JobStoreClient, default_subscription_minutes: f64) -> Self {
        Self { client, default_subscription_minutes }
    }

    async fn load_account(
        &self,
        connection: &libsql::Connection,
        user_id: &str,
        billing_period: &BillingPeriod,
    ) -> Result<QuotaAccount, DbError> {
        let mut rows = connection
            .query(
                "SELECT subscription_minutes_limit, subscription_minutes_used FROM quota_accounts WHERE user_id = ? AND billing_period = ?",
                params![user_id.to_string(), billing_period.0.clone()],
            )
            .await?;

        let (limit, used) = if let Some(row) = rows.next().await? {
            let limit: f64 = row.get(0).map_err(|e| DbError::MappingError(e.to_string()))?;
            let used: f64 = row.get(1).map_err(|e| DbError::MappingError(e.to_string()))?;
            (limit, used)
        } else {
            let inherited_limit = self.most_recent_prior_limit(connection, user_id).await?;
            let limit = inherited_limit.unwrap_or(self.default_subscription_minutes);
            connection
                .execute(
                    "INSERT INTO quota_accounts (user_id, billing_period, subscription_minutes_limit, subscription_minutes_used) VALUES (?, ?, ?, 0)",
                    params![user_id.to_string(), billing_period.0.clone(), limit],
                )
                .await?;
            (limit, 0.0)
        };

        let top_ups = self.load_top_ups(connection, user_id).await?;

        Ok(QuotaAccount {
            user_id: user_id.to_string(),
            billing_period: billing_period.clone(),
            subscription_minutes_limit: limit,
            subscription_minutes_used: used,
            top_ups,
        })
    }

    async fn most_recent_prior_limit(&self, connection: &libsql::Connection, user_id: &str) -> Result<Option<f64>, DbError> {
        let mut rows = connection
            .query(
                "SELECT subscription_minutes_limit FROM quota_accounts WHERE user_id = ? ORDER BY billing_period DESC LIMIT 1",
                params![user_id.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row.get(0).map_err(|e| DbError::MappingError(e.to_string()))?)),
            None => Ok(None),
        }
    }

    async fn load_top_ups(&self, connection: &libsql::Connection, user_id: &str) -> Result<Vec<TopUpCredit>, DbError> {
        let mut rows = connection
            .query(
                "SELECT id, external_reference, purchased_minutes, remaining_minutes, created_at FROM top_up_credits WHERE user_id = ? AND remaining_minutes > 0 ORDER BY created_at ASC",
                params![user_id.to_string()],
            )
            .await?;
        let mut top_ups = Vec::new();
        while let Some(row) = rows.next().await? {
            let id_text: String = row.get(0).map_err(|e| DbError::MappingError(e.to_string()))?;
            let external_reference: String = row.get(1).map_err(|e| DbError::MappingError(e.to_string()))?;
            let purchased_minutes: f64 = row.get(2).map_err(|e| DbError::MappingError(e.to_string()))?;
            let remaining_minutes: f64 = row.get(3).map_err(|e| DbError::MappingError(e.to_string()))?;
            let created_at: String = row.get(4).map_err(|e| DbError::MappingError(e.to_string()))?;
            top_ups.push(TopUpCredit {
                id: Uuid::parse_str(&id_text).map_err(|e| DbError::MappingError(e.to_string()))?,
                external_reference,
                purchased_minutes,
                remaining_minutes,
                created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
                    .map_err(|e| DbError::MappingError(e.to_string()))?
                    .with_timezone(&Utc),
            });
        }
        Ok(top_ups)
    }
}

fn map_db_error(error: DbError) -> LedgerError {
    LedgerError::Storage(error.to_string())
}

#[async_trait]
impl QuotaLedger for SqlQuotaLedger {
    async fn reserve(&self, user_id: &str, job_id: Uuid, estimate_minutes: f64) -> Result<Uuid, LedgerError> {
        let reservation_id = reservation_id_for(job_id);
        let connection = self.client.get_connection().map_err(map_db_error)?;

        let mut existing = connection
            .query("SELECT id FROM reservations WHERE id = ?", params![reservation_id.to_string()])
            .await
            .map_err(|e| map_db_error(DbError::QueryError(e)))?;
        if existing.next().await.map_err(|e| map_db_error(DbError::QueryError(e)))?.is_some() {
            return Ok(reservation_id);
        }

        let billing_period = BillingPeriod::current();
        let account = self.load_account(&connection, user_id, &billing_period).await.map_err(map_db_error)?;
        let available = account.total_available_minutes();
        if available < estimate_minutes {
            return Err(LedgerError::QuotaExceeded { user_id: user_id.to_string(), requested: estimate_minutes, available });
        }

        connection
            .execute(
                "INSERT INTO reservations (id, job_id, user_id, estimate_minutes, released) VALUES (?, ?, ?, ?, 0)",
                params![reservation_id.to_string(), job_id.to_string(), user_id.to_string(), estimate_minutes],
            )
            .await
            .map_err(|e| map_db_error(DbError::QueryError(e)))?;

        Ok(reservation_id)
    }

    async fn commit(
        &self,
        reservation_id: Uuid,
        actual_minutes: f64,
        job_id: Uuid,
        billing_period: BillingPeriod,
    ) -> Result<(), LedgerError> {
        let connection = self.client.get_connection().map_err(map_db_error)?;

        let mut existing_usage = connection
            .query(
                "SELECT 1 FROM usage_records WHERE job_id = ? AND billing_period = ?",
                params![job_id.to_string(), billing_period.0.clone()],
            )
            .await
            .map_err(|e| map_db_error(DbError::QueryError(e)))?;
        if existing_usage.next().await.map_err(|e| map_db_error(DbError::QueryError(e)))?.is_some() {
            return Ok(());
        }

        let mut reservation_rows = connection
            .query("SELECT user_id FROM reservations WHERE id = ?", params![reservation_id.to_string()])
            .await
            .map_err(|e| map_db_error(DbError::QueryError(e)))?;
        let reservation_row = reservation_rows
            .next()
            .await
            .map_err(|e| map_db_error(DbError::QueryError(e)))?
            .ok_or(LedgerError::ReservationNotFound(reservation_id))?;
        let user_id: String = reservation_row.get(0).map_err(|e| map_db_error(DbError::MappingError(e.to_string())))?;

        let account = self.load_account(&connection, &user_id, &billing_period).await.map_err(map_db_error)?;
        let plan = account.plan_deduction(actual_minutes);

        connection
            .execute("BEGIN IMMEDIATE", ())
            .await
            .map_err(|e| map_db_error(DbError::QueryError(e)))?;

        let commit_result: Result<(), DbError> = async {
            connection
                .execute(
                    "UPDATE quota_accounts SET subscription_minutes_used = subscription_minutes_used + ? WHERE user_id = ? AND billing_period = ?",
                    params![plan.from_subscription, user_id.clone(), billing_period.0.clone()],
                )
                .await?;

            for (top_up_id, minutes_taken) in &plan.from_top_ups {
                connection
                    .execute(
                        "UPDATE top_up_credits SET remaining_minutes = remaining_minutes - ? WHERE id = ?",
                        params![*minutes_taken, top_up_id.to_string()],
                    )
                    .await?;
            }

            connection
                .execute(
                    "INSERT INTO usage_records (job_id, billing_period, minutes_billed, recorded_at) VALUES (?, ?, ?, ?)",
                    params![job_id.to_string(), billing_period.0.clone(), actual_minutes, Utc::now().to_rfc3339()],
                )
                .await?;

            connection
                .execute("UPDATE reservations SET released = 1 WHERE id = ?", params![reservation_id.to_string()])
                .await?;

            Ok(())
        }
        .await;

        match commit_result {
            Ok(()) => {
                connection.execute("COMMIT", ()).await.map_err(|e| map_db_error(DbError::QueryError(e)))?;
                Ok(())
            }
            Err(fault) => {
                let _ = connection.execute("ROLLBACK", ()).await;
                Err(map_db_error(fault))
            }
        }
    }

    async fn release(&self, reservation_id: Uuid) -> Result<(), LedgerError> {
        let connection = self.client.get_connection().map_err(map_db_error)?;
        connection
            .execute("UPDATE reservations SET released = 1 WHERE id = ?", params![reservation_id.to_string()])
            .await
            .map_err(|e| map_db_error(DbError::QueryError(e)))?;
        Ok(())
    }

    async fn top_up(&self, user_id: &str, minutes: f64, external_reference: &str) -> Result<(), LedgerError> {
        let connection = self.client.get_connection().map_err(map_db_error)?;
        connection
            .execute(
                "INSERT OR IGNORE INTO top_up_credits (id, user_id, external_reference, purchased_minutes, remaining_minutes, created_at) VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    Uuid::new_v4().to_string(),
                    user_id.to_string(),
                    external_reference.to_string(),
                    minutes,
                    minutes,
                    Utc::now().to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| map_db_error(DbError::QueryError(e)))?;
        Ok(())
    }

    async fn get_quota_snapshot(&self, user_id: &str) -> Result<QuotaSnapshot, LedgerError> {
        let connection = self.client.get_connection().map_err(map_db_error)?;
        let billing_period = BillingPeriod::current();
        let account = self.load_account(&connection, user_id, &billing_period).await.map_err(map_db_error)?;
        Ok(QuotaSnapshot {
            subscription_minutes_limit: account.subscription_minutes_limit,
            subscription_minutes_used: account.subscription_minutes_used,
            top_up_minutes_remaining: account.top_up_minutes_remaining(),
            total_available_minutes: account.total_available_minutes(),
            billing_period: account.billing_period,
        })
    }
}
