// [libs/infra/job-store/src/ports.rs]
/*!
 * APARATO: PUERTOS SOBERANOS DEL JOB STORE (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE PORT (ESTRATO L3)
 * RESPONSABILIDAD: DESACOPLAR EL PIPELINE CONTROLLER DE LIBSQL
 *
 * El Pipeline Controller y el Segment Worker Pool dependen únicamente de
 * `JobStore`/`SegmentStore`, nunca de `JobRepository`/`SegmentRepository`
 * directamente — el mismo patrón que `BlobStore` en narrata-infra-blob-store
 * y `VisionProvider`/`TtsProvider`/`ChapterProvider` en
 * narrata-infra-provider-gate, donde la crate infra es dueña tanto del
 * puerto como del adaptador por defecto.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use narrata_domain_models::{Job, JobId, Segment, SegmentError, SegmentFingerprint, SegmentOutcome, SegmentStatus};

use crate::errors::DbError;
use crate::repositories::{JobRepository, SegmentRepository};

/// Las ocho operaciones del Job Store (§4.A), vistas desde el Pipeline
/// Controller como un puerto abstracto.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, job: &Job) -> Result<(), DbError>;
    async fn get_snapshot(&self, job_id: JobId) -> Result<Job, DbError>;
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Job>, DbError>;
    async fn claim(&self, job_id: JobId, worker_id: &str, lease_seconds: i64) -> Result<Job, DbError>;
    async fn renew_lease(&self, job_id: JobId, worker_id: &str, lease_seconds: i64) -> Result<(), DbError>;
    async fn update(&self, job: &Job) -> Result<Job, DbError>;
    async fn mark_terminal(&self, job: &Job) -> Result<Job, DbError>;
    async fn list_pending_for_recovery(&self, now: DateTime<Utc>) -> Result<Vec<Job>, DbError>;
}

#[async_trait]
impl JobStore for JobRepository {
    async fn create(&self, job: &Job) -> Result<(), DbError> {
        JobRepository::create(self, job).await
    }

    async fn get_snapshot(&self, job_id: JobId) -> Result<Job, DbError> {
        JobRepository::get_snapshot(self, job_id).await
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Job>, DbError> {
        JobRepository::list_by_owner(self, owner_id).await
    }

    async fn claim(&self, job_id: JobId, worker_id: &str, lease_seconds: i64) -> Result<Job, DbError> {
        JobRepository::claim(self, job_id, worker_id, lease_seconds).await
    }

    async fn renew_lease(&self, job_id: JobId, worker_id: &str, lease_seconds: i64) -> Result<(), DbError> {
        JobRepository::renew_lease(self, job_id, worker_id, lease_seconds).await
    }

    async fn update(&self, job: &Job) -> Result<Job, DbError> {
        JobRepository::update(self, job).await
    }

    async fn mark_terminal(&self, job: &Job) -> Result<Job, DbError> {
        JobRepository::mark_terminal(self, job).await
    }

    async fn list_pending_for_recovery(&self, now: DateTime<Utc>) -> Result<Vec<Job>, DbError> {
        JobRepository::list_pending_for_recovery(self, now).await
    }
}

/// Las operaciones de persistencia de segmentos usadas por el Segment
/// Worker Pool, abstraídas detrás de un puerto por la misma razón que
/// `JobStore` arriba.
#[async_trait]
pub trait SegmentStore: Send + Sync {
    async fn insert_plan(&self, segments: &[Segment]) -> Result<(), DbError>;
    async fn list_for_job(&self, job_id: JobId) -> Result<Vec<Segment>, DbError>;
    async fn get(&self, job_id: JobId, index: u32) -> Result<Segment, DbError>;
    async fn find_completed_by_fingerprint(&self, fingerprint: SegmentFingerprint) -> Result<Option<Segment>, DbError>;
    async fn mark_in_progress(&self, job_id: JobId, index: u32, status: SegmentStatus) -> Result<(), DbError>;
    async fn mark_done(&self, job_id: JobId, index: u32, outcome: &SegmentOutcome) -> Result<(), DbError>;
    async fn mark_failed(&self, job_id: JobId, index: u32, error: &SegmentError) -> Result<(), DbError>;
}

#[async_trait]
impl SegmentStore for SegmentRepository {
    async fn insert_plan(&self, segments: &[Segment]) -> Result<(), DbError> {
        SegmentRepository::insert_plan(self, segments).await
    }

    async fn list_for_job(&self, job_id: JobId) -> Result<Vec<Segment>, DbError> {
        SegmentRepository::list_for_job(self, job_id).await
    }

    async fn get(&self, job_id: JobId, index: u32) -> Result<Segment, DbError> {
        SegmentRepository::get(self, job_id, index).await
    }

    async fn find_completed_by_fingerprint(&self, fingerprint: SegmentFingerprint) -> Result<Option<Segment>, DbError> {
        SegmentRepository::find_completed_by_fingerprint(self, fingerprint).await
    }

    async fn mark_in_progress(&self, job_id: JobId, index: u32, status: SegmentStatus) -> Result<(), DbError> {
        SegmentRepository::mark_in_progress(self, job_id, index, status).await
    }

    async fn mark_done(&self, job_id: JobId, index: u32, outcome: &SegmentOutcome) -> Result<(), DbError> {
        SegmentRepository::mark_done(self, job_id, index, outcome).await
    }

    async fn mark_failed(&self, job_id: JobId, index: u32, error: &SegmentError) -> Result<(), DbError> {
        SegmentRepository::mark_failed(self, job_id, index, error).await
    }
}
