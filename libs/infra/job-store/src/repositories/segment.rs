// [libs/infra/job-store/src/repositories/segment.rs]
/*!
 * APARATO: REPOSITORIO SOBERANO DE SEGMENTOS (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTIR EL PLAN DE SEGMENTOS Y SU PROGRESO INDIVIDUAL
 *
 * Cada segmento vive bajo la llave primaria `(job_id, idx)` y lleva además su
 * `fingerprint` indexado: el Segment Worker Pool consulta por fingerprint al
 * reanudar un job tras una caída para saltarse el trabajo ya completado
 * (§4.I "SegmentProcessing").
 */

use libsql::params;
use narrata_domain_models::{JobId, Segment, SegmentError, SegmentFingerprint, SegmentOutcome, SegmentStatus};

use crate::client::JobStoreClient;
use crate::errors::DbError;

pub struct SegmentRepository {
    client: JobStoreClient,
}

impl SegmentRepository {
    pub fn new(client: JobStoreClient) -> Self {
        Self { client }
    }

    /// Inserta el plan completo de un job de una sola vez; llamar dos veces
    /// sobre el mismo `job_id` falla por violación de llave primaria, lo cual
    /// es intencional — un job sólo se planifica una vez (§4.F "Planning").
    pub async fn insert_plan(&self, segments: &[Segment]) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        for segment in segments {
            connection
                .execute(
                    r#"INSERT INTO segments (job_id, idx, start_seconds, end_seconds, fingerprint, status, outcome_json, error_json)
                       VALUES (?, ?, ?, ?, ?, ?, NULL, NULL)"#,
                    params![
                        segment.job_id.to_string(),
                        segment.index as i64,
                        segment.start,
                        segment.end,
                        segment.fingerprint.to_hex(),
                        status_to_str(segment.status).to_string(),
                    ],
                )
                .await?;
        }
        Ok(())
    }

    pub async fn list_for_job(&self, job_id: JobId) -> Result<Vec<Segment>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query("SELECT * FROM segments WHERE job_id = ? ORDER BY idx ASC", params![job_id.to_string()])
            .await?;
        let mut segments = Vec::new();
        while let Some(row) = rows.next().await? {
            segments.push(row_to_segment(&row)?);
        }
        Ok(segments)
    }

    pub async fn get(&self, job_id: JobId, index: u32) -> Result<Segment, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT * FROM segments WHERE job_id = ? AND idx = ?",
                params![job_id.to_string(), index as i64],
            )
            .await?;
        let row = rows.next().await?.ok_or(DbError::SegmentNotFound)?;
        row_to_segment(&row)
    }

    /// Busca un segmento ya completado por su fingerprint, sin importar a
    /// qué job haya pertenecido originalmente la planificación — es lo que
    /// permite a la recuperación tras caída saltar trabajo idéntico.
    pub async fn find_completed_by_fingerprint(&self, fingerprint: SegmentFingerprint) -> Result<Option<Segment>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT * FROM segments WHERE fingerprint = ? AND status = 'done' LIMIT 1",
                params![fingerprint.to_hex()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_segment(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn mark_in_progress(&self, job_id: JobId, index: u32, status: SegmentStatus) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        let affected = connection
            .execute(
                "UPDATE segments SET status = ? WHERE job_id = ? AND idx = ?",
                params![status_to_str(status).to_string(), job_id.to_string(), index as i64],
            )
            .await?;
        if affected == 0 {
            return Err(DbError::SegmentNotFound);
        }
        Ok(())
    }

    pub async fn mark_done(&self, job_id: JobId, index: u32, outcome: &SegmentOutcome) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        let outcome_json = serde_json::to_string(outcome).map_err(|e| DbError::MappingError(e.to_string()))?;
        let affected = connection
            .execute(
                "UPDATE segments SET status = 'done', outcome_json = ?, error_json = NULL WHERE job_id = ? AND idx = ?",
                params![outcome_json, job_id.to_string(), index as i64],
            )
            .await?;
        if affected == 0 {
            return Err(DbError::SegmentNotFound);
        }
        Ok(())
    }

    pub async fn mark_failed(&self, job_id: JobId, index: u32, error: &SegmentError) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        let error_json = serde_json::to_string(error).map_err(|e| DbError::MappingError(e.to_string()))?;
        let affected = connection
            .execute(
                "UPDATE segments SET status = 'failed', error_json = ? WHERE job_id = ? AND idx = ?",
                params![error_json, job_id.to_string(), index as i64],
            )
            .await?;
        if affected == 0 {
            return Err(DbError::SegmentNotFound);
        }
        Ok(())
    }
}

fn status_to_str(status: SegmentStatus) -> &'static str {
    match status {
        SegmentStatus::Planned => "planned",
        SegmentStatus::Describing => "describing",
        SegmentStatus::Synthesizing => "synthesizing",
        SegmentStatus::Aligning => "aligning",
        SegmentStatus::Done => "done",
        SegmentStatus::Failed => "failed",
    }
}

fn str_to_status(value: &str) -> Result<SegmentStatus, DbError> {
    Ok(match value {
        "planned" => SegmentStatus::Planned,
        "describing" => SegmentStatus::Describing,
        "synthesizing" => SegmentStatus::Synthesizing,
        "aligning" => SegmentStatus::Aligning,
        "done" => SegmentStatus::Done,
        "failed" => SegmentStatus::Failed,
        other => return Err(DbError::MappingError(format!("unknown segment status discriminant: {other}"))),
    })
}

fn row_to_segment(row: &libsql::Row) -> Result<Segment, DbError> {
    let job_id_text: String = row.get(0).map_err(|e| DbError::MappingError(e.to_string()))?;
    let index: i64 = row.get(1).map_err(|e| DbError::MappingError(e.to_string()))?;
    let start_seconds: f64 = row.get(2).map_err(|e| DbError::MappingError(e.to_string()))?;
    let end_seconds: f64 = row.get(3).map_err(|e| DbError::MappingError(e.to_string()))?;
    let fingerprint_hex: String = row.get(4).map_err(|e| DbError::MappingError(e.to_string()))?;
    let status: String = row.get(5).map_err(|e| DbError::MappingError(e.to_string()))?;
    let outcome_json: Option<String> = row.get(6).map_err(|e| DbError::MappingError(e.to_string()))?;
    let error_json: Option<String> = row.get(7).map_err(|e| DbError::MappingError(e.to_string()))?;

    let job_id = JobId(uuid::Uuid::parse_str(&job_id_text).map_err(|e| DbError::MappingError(e.to_string()))?);
    let fingerprint_bytes = hex::decode(&fingerprint_hex).map_err(|e| DbError::MappingError(e.to_string()))?;
    let mut fingerprint_array = [0u8; 32];
    if fingerprint_bytes.len() != 32 {
        return Err(DbError::MappingError("fingerprint column did not decode to 32 bytes".to_string()));
    }
    fingerprint_array.copy_from_slice(&fingerprint_bytes);

    let outcome: Option<SegmentOutcome> =
        outcome_json.map(|raw| serde_json::from_str(&raw)).transpose().map_err(|e| DbError::MappingError(e.to_string()))?;
    let error: Option<SegmentError> =
        error_json.map(|raw| serde_json::from_str(&raw)).transpose().map_err(|e| DbError::MappingError(e.to_string()))?;

    Ok(Segment {
        job_id,
        index: index as u32,
        start: start_seconds,
        end: end_seconds,
        fingerprint: SegmentFingerprint(fingerprint_array),
        status: str_to_status(&status)?,
        outcome,
        error,
    })
}
