// [libs/infra/job-store/src/repositories/progress.rs]
/*!
 * APARATO: ANILLO DE PROGRESO PERSISTIDO (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: RETENER LA COLA DE EVENTOS DE PROGRESO DE UN JOB
 *
 * Un nuevo suscriptor a la Live Subscription que llega después de que el job
 * ya emitió eventos necesita reconstruir el `sequence` exacto en el que se
 * quedó — el anillo persistido es lo que el Progress Bus consulta para
 * fabricar el snapshot inicial (§6 "Live Subscription").
 */

use libsql::params;
use narrata_domain_models::{JobId, ProgressEvent};

use crate::client::JobStoreClient;
use crate::errors::DbError;

pub struct ProgressRingRepository {
    client: JobStoreClient,
}

impl ProgressRingRepository {
    pub fn new(client: JobStoreClient) -> Self {
        Self { client }
    }

    pub async fn append(&self, event: &ProgressEvent) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        let event_json = serde_json::to_string(event).map_err(|e| DbError::MappingError(e.to_string()))?;
        connection
            .execute(
                "INSERT OR REPLACE INTO job_progress_ring (job_id, sequence, event_json) VALUES (?, ?, ?)",
                params![event.job_id.to_string(), event.sequence as i64, event_json],
            )
            .await?;
        Ok(())
    }

    /// Devuelve el evento de mayor `sequence` registrado para el job, si lo hay.
    pub async fn latest(&self, job_id: JobId) -> Result<Option<ProgressEvent>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT event_json FROM job_progress_ring WHERE job_id = ? ORDER BY sequence DESC LIMIT 1",
                params![job_id.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => {
                let event_json: String = row.get(0).map_err(|e| DbError::MappingError(e.to_string()))?;
                Ok(Some(serde_json::from_str(&event_json).map_err(|e| DbError::MappingError(e.to_string()))?))
            }
            None => Ok(None),
        }
    }

    /// Recupera todos los eventos con `sequence` estrictamente posterior a
    /// `after_sequence`, en orden creciente, útil para rellenar el hueco de
    /// un suscriptor que reconecta a mitad de la transmisión.
    pub async fn since(&self, job_id: JobId, after_sequence: u64) -> Result<Vec<ProgressEvent>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT event_json FROM job_progress_ring WHERE job_id = ? AND sequence > ? ORDER BY sequence ASC",
                params![job_id.to_string(), after_sequence as i64],
            )
            .await?;
        let mut events = Vec::new();
        while let Some(row) = rows.next().await? {
            let event_json: String = row.get(0).map_err(|e| DbError::MappingError(e.to_string()))?;
            events.push(serde_json::from_str(&event_json).map_err(|e| DbError::MappingError(e.to_string()))?);
        }
        Ok(events)
    }
}
