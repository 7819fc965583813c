// [apps/controller/src/handlers/status.rs]
/*!
 * APARATO: STATUS HANDLER (V1.0)
 * CLASIFICACIÓN: API ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: GET /api/v1/jobs/:jobId
 *
 * `DbError::to_error_kind` colapsa `JobNotFound` a `Internal` porque desde
 * la perspectiva del Job Store un registro ausente no es distinto de
 * cualquier otro fallo interno de persistencia; este handler es el único
 * lugar que debe distinguirlo, para devolver 404 en lugar de 500.
 */

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use narrata_domain_models::{Job, JobId};
use narrata_infra_job_store::DbError;
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::OwnerIdentity;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JobStatusResponse {
    job_id: String,
    owner_id: String,
    stage: narrata_domain_models::Stage,
    progress: u8,
    current_step: String,
    segments_planned: u32,
    segments_completed: u32,
    output_blob: Option<String>,
    output_duration_seconds: Option<f64>,
    terminal_error: Option<narrata_domain_models::TerminalError>,
}

impl From<Job> for JobStatusResponse {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id.to_string(),
            owner_id: job.owner_id,
            stage: job.stage,
            progress: job.progress,
            current_step: job.current_step,
            segments_planned: job.segments.planned,
            segments_completed: job.segments.completed,
            output_blob: job.output_blob.map(|handle| handle.0),
            output_duration_seconds: job.output_duration_seconds,
            terminal_error: job.terminal_error,
        }
    }
}

pub async fn get_job_status(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerIdentity>,
    Path(job_id): Path<Uuid>,
) -> Response {
    let job_id = JobId(job_id);
    let job = match state.job_store.get_snapshot(job_id).await {
        Ok(job) => job,
        Err(DbError::JobNotFound) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorBody { error: "jobNotFound".to_string(), message: "no such job".to_string() }),
            )
                .into_response();
        }
        Err(fault) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody { error: "internal".to_string(), message: fault.to_string() }),
            )
                .into_response();
        }
    };

    if job.owner_id != owner.owner_id {
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorBody { error: "forbidden".to_string(), message: "job belongs to a different owner".to_string() }),
        )
            .into_response();
    }

    Json(JobStatusResponse::from(job)).into_response()
}
