// [libs/infra/job-store/src/repositories/job.rs]
/*!
 * APARATO: REPOSITORIO SOBERANO DE JOBS (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: IMPLEMENTAR LAS OCHO OPERACIONES DEL JOB STORE (§4.A)
 *
 * Toda escritura pasa por concurrencia optimista `(job_id, revision)`: un
 * `update` cuyo `WHERE revision = ?` no afecta ninguna fila retorna
 * `DbError::RevisionConflict` en lugar de aplicar un cambio silencioso sobre
 * un snapshot obsoleto.
 */

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use libsql::params;
use narrata_domain_models::{BlobHandle, Job, JobConfig, JobId, SegmentCounters, Stage, TerminalError};
use uuid::Uuid;

use crate::client::JobStoreClient;
use crate::errors::DbError;

pub struct JobRepository {
    client: JobStoreClient,
}

impl JobRepository {
    pub fn new(client: JobStoreClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, job: &Job) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                r#"INSERT INTO jobs (
                    id, owner_id, created_at, updated_at, stage, progress, current_step,
                    segments_planned, segments_completed, source_blob, config_json,
                    output_blob, output_duration_seconds, terminal_error_json,
                    terminal_committed, revision, reservation_id,
                    lease_worker_id, lease_expires_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, NULL)"#,
                params![
                    job.id.to_string(),
                    job.owner_id.clone(),
                    job.created_at.to_rfc3339(),
                    job.updated_at.to_rfc3339(),
                    stage_to_str(job.stage).to_string(),
                    job.progress as i64,
                    job.current_step.clone(),
                    job.segments.planned as i64,
                    job.segments.completed as i64,
                    job.source_blob.0.clone(),
                    serde_json::to_string(&job.config).map_err(|e| DbError::MappingError(e.to_string()))?,
                    job.output_blob.as_ref().map(|handle| handle.0.clone()),
                    job.output_duration_seconds,
                    job.terminal_error
                        .as_ref()
                        .map(|error| serde_json::to_string(error))
                        .transpose()
                        .map_err(|e| DbError::MappingError(e.to_string()))?,
                    job.terminal_committed as i64,
                    job.revision as i64,
                    job.reservation_id.map(|id| id.to_string()),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn get_snapshot(&self, job_id: JobId) -> Result<Job, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection.query("SELECT * FROM jobs WHERE id = ?", params![job_id.to_string()]).await?;
        let row = rows.next().await?.ok_or(DbError::JobNotFound)?;
        row_to_job(&row)
    }

    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Job>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query("SELECT * FROM jobs WHERE owner_id = ? ORDER BY created_at DESC", params![owner_id.to_string()])
            .await?;
        let mut jobs = Vec::new();
        while let Some(row) = rows.next().await? {
            jobs.push(row_to_job(&row)?);
        }
        Ok(jobs)
    }

    /// Reclama un job para `worker_id` con un arrendamiento de `lease_seconds`.
    /// Falla con `LeaseConflict` si otro worker sostiene un arrendamiento vigente.
    pub async fn claim(&self, job_id: JobId, worker_id: &str, lease_seconds: i64) -> Result<Job, DbError> {
        let connection = self.client.get_connection()?;
        let now = Utc::now();
        let expires_at = now + ChronoDuration::seconds(lease_seconds);

        let affected = connection
            .execute(
                r#"UPDATE jobs SET lease_worker_id = ?, lease_expires_at = ?, updated_at = ?
                   WHERE id = ? AND (lease_worker_id IS NULL OR lease_expires_at < ? OR lease_worker_id = ?)"#,
                params![
                    worker_id.to_string(),
                    expires_at.to_rfc3339(),
                    now.to_rfc3339(),
                    job_id.to_string(),
                    now.to_rfc3339(),
                    worker_id.to_string(),
                ],
            )
            .await?;

        if affected == 0 {
            return Err(DbError::LeaseConflict);
        }
        self.get_snapshot(job_id).await
    }

    pub async fn renew_lease(&self, job_id: JobId, worker_id: &str, lease_seconds: i64) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        let expires_at = Utc::now() + ChronoDuration::seconds(lease_seconds);
        let affected = connection
            .execute(
                "UPDATE jobs SET lease_expires_at = ? WHERE id = ? AND lease_worker_id = ?",
                params![expires_at.to_rfc3339(), job_id.to_string(), worker_id.to_string()],
            )
            .await?;
        if affected == 0 {
            return Err(DbError::LeaseConflict);
        }
        Ok(())
    }

    /// Aplica `job` (con su `revision` aún en el valor leído) como la nueva
    /// versión, siempre que ninguna otra escritura la haya adelantado. La
    /// revisión retornada ya está incrementada.
    pub async fn update(&self, job: &Job) -> Result<Job, DbError> {
        let connection = self.client.get_connection()?;
        let now = Utc::now();
        let next_revision = job.revision + 1;

        let affected = connection
            .execute(
                r#"UPDATE jobs SET
                    updated_at = ?, stage = ?, progress = ?, current_step = ?,
                    segments_planned = ?, segments_completed = ?,
                    output_blob = ?, output_duration_seconds = ?, terminal_error_json = ?,
                    terminal_committed = ?, reservation_id = ?, revision = ?
                   WHERE id = ? AND revision = ?"#,
                params![
                    now.to_rfc3339(),
                    stage_to_str(job.stage).to_string(),
                    job.progress as i64,
                    job.current_step.clone(),
                    job.segments.planned as i64,
                    job.segments.completed as i64,
                    job.output_blob.as_ref().map(|handle| handle.0.clone()),
                    job.output_duration_seconds,
                    job.terminal_error
                        .as_ref()
                        .map(|error| serde_json::to_string(error))
                        .transpose()
                        .map_err(|e| DbError::MappingError(e.to_string()))?,
                    job.terminal_committed as i64,
                    job.reservation_id.map(|id| id.to_string()),
                    next_revision as i64,
                    job.id.to_string(),
                    job.revision as i64,
                ],
            )
            .await?;

        if affected == 0 {
            return Err(DbError::RevisionConflict);
        }
        self.get_snapshot(job.id).await
    }

    /// Conveniencia sobre `update` que exige que el `stage` entrante sea
    /// terminal; el Pipeline Controller nunca debe usar esta ruta para
    /// escrituras intermedias.
    pub async fn mark_terminal(&self, job: &Job) -> Result<Job, DbError> {
        debug_assert!(job.stage.is_terminal(), "mark_terminal called with a non-terminal stage");
        self.update(job).await
    }

    /// Jobs no terminales cuyo arrendamiento expiró antes de `now` — candidatos
    /// al barrido de recuperación al arranque (§4.I "Lease and recovery").
    pub async fn list_pending_for_recovery(&self, now: DateTime<Utc>) -> Result<Vec<Job>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                r#"SELECT * FROM jobs
                   WHERE stage NOT IN ('completed', 'failed', 'cancelled')
                     AND (lease_expires_at IS NULL OR lease_expires_at < ?)"#,
                params![now.to_rfc3339()],
            )
            .await?;
        let mut jobs = Vec::new();
        while let Some(row) = rows.next().await? {
            jobs.push(row_to_job(&row)?);
        }
        Ok(jobs)
    }
}

fn stage_to_str(stage: Stage) -> &'static str {
    match stage {
        Stage::Pending => "pending",
        Stage::Reserving => "reserving",
        Stage::Ingesting => "ingesting",
        Stage::Planning => "planning",
        Stage::SegmentProcessing => "segmentProcessing",
        Stage::Stitching => "stitching",
        Stage::Committing => "committing",
        Stage::Completed => "completed",
        Stage::Failed => "failed",
        Stage::Cancelled => "cancelled",
    }
}

fn str_to_stage(value: &str) -> Result<Stage, DbError> {
    Ok(match value {
        "pending" => Stage::Pending,
        "reserving" => Stage::Reserving,
        "ingesting" => Stage::Ingesting,
        "planning" => Stage::Planning,
        "segmentProcessing" => Stage::SegmentProcessing,
        "stitching" => Stage::Stitching,
        "committing" => Stage::Committing,
        "completed" => Stage::Completed,
        "failed" => Stage::Failed,
        "cancelled" => Stage::Cancelled,
        other => return Err(DbError::MappingError(format!("unknown stage discriminant: {other}"))),
    })
}

fn row_to_job(row: &libsql::Row) -> Result<Job, DbError> {
    let id_text: String = row.get(0).map_err(|e| DbError::MappingError(e.to_string()))?;
    let owner_id: String = row.get(1).map_err(|e| DbError::MappingError(e.to_string()))?;
    let created_at: String = row.get(2).map_err(|e| DbError::MappingError(e.to_string()))?;
    let updated_at: String = row.get(3).map_err(|e| DbError::MappingError(e.to_string()))?;
    let stage: String = row.get(4).map_err(|e| DbError::MappingError(e.to_string()))?;
    let progress: i64 = row.get(5).map_err(|e| DbError::MappingError(e.to_string()))?;
    let current_step: String = row.get(6).map_err(|e| DbError::MappingError(e.to_string()))?;
    let segments_planned: i64 = row.get(7).map_err(|e| DbError::MappingError(e.to_string()))?;
    let segments_completed: i64 = row.get(8).map_err(|e| DbError::MappingError(e.to_string()))?;
    let source_blob: String = row.get(9).map_err(|e| DbError::MappingError(e.to_string()))?;
    let config_json: String = row.get(10).map_err(|e| DbError::MappingError(e.to_string()))?;
    let output_blob: Option<String> = row.get(11).map_err(|e| DbError::MappingError(e.to_string()))?;
    let output_duration_seconds: Option<f64> = row.get(12).map_err(|e| DbError::MappingError(e.to_string()))?;
    let terminal_error_json: Option<String> = row.get(13).map_err(|e| DbError::MappingError(e.to_string()))?;
    let terminal_committed: i64 = row.get(14).map_err(|e| DbError::MappingError(e.to_string()))?;
    let revision: i64 = row.get(15).map_err(|e| DbError::MappingError(e.to_string()))?;
    let reservation_id: Option<String> = row.get(16).map_err(|e| DbError::MappingError(e.to_string()))?;

    let config: JobConfig = serde_json::from_str(&config_json).map_err(|e| DbError::MappingError(e.to_string()))?;
    let terminal_error: Option<TerminalError> = terminal_error_json
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|e| DbError::MappingError(e.to_string()))?;

    Ok(Job {
        id: JobId(Uuid::parse_str(&id_text).map_err(|e| DbError::MappingError(e.to_string()))?),
        owner_id,
        created_at: DateTime::parse_from_rfc3339(&created_at).map_err(|e| DbError::MappingError(e.to_string()))?.with_timezone(&Utc),
        updated_at: DateTime::parse_from_rfc3339(&updated_at).map_err(|e| DbError::MappingError(e.to_string()))?.with_timezone(&Utc),
        stage: str_to_stage(&stage)?,
        progress: progress as u8,
        current_step,
        segments: SegmentCounters { planned: segments_planned as u32, completed: segments_completed as u32 },
        source_blob: BlobHandle(source_blob),
        config,
        output_blob: output_blob.map(BlobHandle),
        output_duration_seconds,
        terminal_error,
        terminal_committed: terminal_committed != 0,
        revision: revision as u64,
        reservation_id: reservation_id
            .map(|raw| Uuid::parse_str(&raw))
            .transpose()
            .map_err(|e| DbError::MappingError(e.to_string()))?,
    })
}
