// [apps/controller/src/handlers/cancel.rs]
/*!
 * APARATO: CANCEL HANDLER (V1.0)
 * CLASIFICACIÓN: API ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: POST /api/v1/jobs/:jobId/cancel
 *
 * Idempotente: cancelar un job ya terminal simplemente devuelve su estado
 * actual sin error.
 */

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use narrata_domain_models::JobId;
use narrata_infra_job_store::DbError;
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::OwnerIdentity;
use crate::pipeline::ControllerError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CancelResponse {
    job_id: String,
    stage: narrata_domain_models::Stage,
}

pub async fn cancel_job(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerIdentity>,
    Path(job_id): Path<Uuid>,
) -> Response {
    let job_id = JobId(job_id);

    let preflight = match state.job_store.get_snapshot(job_id).await {
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

    if preflight.owner_id != owner.owner_id {
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorBody { error: "forbidden".to_string(), message: "job belongs to a different owner".to_string() }),
        )
            .into_response();
    }

    match state.pipeline_controller.cancel_job_on_request(job_id).await {
        Ok(job) => Json(CancelResponse { job_id: job.id.to_string(), stage: job.stage }).into_response(),
        Err(ControllerError::Storage(DbError::JobNotFound)) => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody { error: "jobNotFound".to_string(), message: "no such job".to_string() }),
        )
            .into_response(),
        Err(fault) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody { error: "internal".to_string(), message: fault.to_string() }),
        )
            .into_response(),
    }
}
