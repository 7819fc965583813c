// [libs/infra/job-store/src/schema.rs]
/*!
 * APARATO: ESQUEMA SOBERANO DE PERSISTENCIA (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: DEFINIR Y APLICAR EL LAYOUT DE TABLAS DEL JOB STORE Y EL LEDGER
 *
 * Cuatro tablas: `jobs`, `segments`, `job_progress_ring` (alta marca de agua
 * por job, ver §6 "Persisted state layout"), y el trío de cuota
 * (`quota_accounts`, `top_up_credits`, `usage_records`). Todas viven en la
 * misma conexión libSQL; el Ledger y el Job Store comparten el motor pero no
 * el dominio de tipos.
 */

use libsql::Connection;

use crate::errors::DbError;

pub async fn apply_full_sovereign_schema(connection: &Connection) -> Result<(), DbError> {
    connection
        .execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id                      TEXT PRIMARY KEY,
                owner_id                TEXT NOT NULL,
                created_at              TEXT NOT NULL,
                updated_at              TEXT NOT NULL,
                stage                   TEXT NOT NULL,
                progress                INTEGER NOT NULL,
                current_step            TEXT NOT NULL,
                segments_planned        INTEGER NOT NULL DEFAULT 0,
                segments_completed      INTEGER NOT NULL DEFAULT 0,
                source_blob             TEXT NOT NULL,
                config_json             TEXT NOT NULL,
                output_blob             TEXT,
                output_duration_seconds REAL,
                terminal_error_json     TEXT,
                terminal_committed      INTEGER NOT NULL DEFAULT 0,
                revision                INTEGER NOT NULL DEFAULT 0,
                reservation_id          TEXT,
                lease_worker_id         TEXT,
                lease_expires_at        TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_jobs_owner ON jobs (owner_id);
            CREATE INDEX IF NOT EXISTS idx_jobs_recovery ON jobs (stage, lease_expires_at);

            CREATE TABLE IF NOT EXISTS segments (
                job_id         TEXT NOT NULL,
                idx            INTEGER NOT NULL,
                start_seconds  REAL NOT NULL,
                end_seconds    REAL NOT NULL,
                fingerprint    TEXT NOT NULL,
                status         TEXT NOT NULL,
                outcome_json   TEXT,
                error_json     TEXT,
                PRIMARY KEY (job_id, idx)
            );

            CREATE INDEX IF NOT EXISTS idx_segments_fingerprint ON segments (fingerprint);

            CREATE TABLE IF NOT EXISTS job_progress_ring (
                job_id            TEXT NOT NULL,
                sequence          INTEGER NOT NULL,
                event_json        TEXT NOT NULL,
                PRIMARY KEY (job_id, sequence)
            );

            CREATE TABLE IF NOT EXISTS quota_accounts (
                user_id                    TEXT NOT NULL,
                billing_period             TEXT NOT NULL,
                subscription_minutes_limit REAL NOT NULL,
                subscription_minutes_used  REAL NOT NULL DEFAULT 0,
                PRIMARY KEY (user_id, billing_period)
            );

            CREATE TABLE IF NOT EXISTS top_up_credits (
                id                 TEXT PRIMARY KEY,
                user_id            TEXT NOT NULL,
                external_reference TEXT NOT NULL,
                purchased_minutes  REAL NOT NULL,
                remaining_minutes  REAL NOT NULL,
                created_at         TEXT NOT NULL,
                UNIQUE (user_id, external_reference)
            );

            CREATE INDEX IF NOT EXISTS idx_top_ups_user ON top_up_credits (user_id, created_at);

            CREATE TABLE IF NOT EXISTS usage_records (
                job_id          TEXT NOT NULL,
                billing_period  TEXT NOT NULL,
                minutes_billed  REAL NOT NULL,
                recorded_at     TEXT NOT NULL,
                PRIMARY KEY (job_id, billing_period)
            );

            CREATE TABLE IF NOT EXISTS reservations (
                id               TEXT PRIMARY KEY,
                job_id           TEXT NOT NULL,
                user_id          TEXT NOT NULL,
                estimate_minutes REAL NOT NULL,
                released         INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_reservations_job ON reservations (job_id);
            "#,
        )
        .await?;

    Ok(())
}
