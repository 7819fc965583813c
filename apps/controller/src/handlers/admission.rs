// [apps/controller/src/handlers/admission.rs]
/*!
 * APARATO: ADMISSION HANDLER (V1.0)
 * CLASIFICACIÓN: API ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: POST /api/v1/jobs
 *
 * Sondea la duración del blob fuente, construye un `Job` en `Pending` y lo
 * persiste, luego dispara `drive_job` en una tarea desacoplada de la
 * respuesta HTTP — el llamador recibe el identificador del job de
 * inmediato, no el resultado del pipeline completo.
 */

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use narrata_domain_models::{BlobHandle, FeatureToggles, Job, JobConfig};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::middleware::OwnerIdentity;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AdmissionRequest {
    /// Handle of an already-uploaded source blob.
    pub source_blob_handle: Option<String>,
    /// Alias for `source_blob_handle` accepted from direct-upload clients;
    /// the upload protocol itself is out of scope here (see DESIGN.md).
    pub upload_token: Option<String>,
    pub override_script: Option<String>,
    pub target_duration_minutes: Option<f64>,
    pub series_id: Option<String>,
    #[serde(default)]
    pub feature_toggles: FeatureToggles,
    pub character_guide_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdmissionResponse {
    pub job_id: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

/// Validates the two constrained optional fields of an admission payload.
/// Returns the human-readable fault message when the request is malformed.
fn validate_admission_request(request: &AdmissionRequest) -> Option<String> {
    if let Some(target_duration_minutes) = request.target_duration_minutes {
        if !(target_duration_minutes > 0.0) {
            return Some("targetDurationMinutes must be positive".to_string());
        }
    }

    if let Some(series_id) = &request.series_id {
        let length_in_range = (1..=64).contains(&series_id.len());
        let charset_valid = !series_id.is_empty()
            && series_id.chars().all(|character| character.is_ascii_lowercase() || character.is_ascii_digit() || character == '-');
        if !length_in_range || !charset_valid {
            return Some("seriesId must be lowercase alphanumeric with hyphens, 1-64 characters".to_string());
        }
    }

    None
}

pub async fn admit_job(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerIdentity>,
    Json(request): Json<AdmissionRequest>,
) -> Response {
    let source_handle = match request.source_blob_handle.or(request.upload_token) {
        Some(handle) if !handle.is_empty() => BlobHandle(handle),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    error: "invalidInput".to_string(),
                    message: "either sourceBlobHandle or uploadToken is required".to_string(),
                }),
            )
                .into_response();
        }
    };

    if let Some(fault) = validate_admission_request(&request) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody { error: "invalidInput".to_string(), message: fault }),
        )
            .into_response();
    }

    let source_blob_url = match state.blob_store.presign_get(&source_handle, std::time::Duration::from_secs(3600)).await {
        Ok(url) => url,
        Err(fault) => {
            warn!(%fault, "admission could not presign source blob");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody { error: "invalidInput".to_string(), message: fault.to_string() }),
            )
                .into_response();
        }
    };

    let source_duration_seconds = match state.probe.probe_duration_seconds(&source_blob_url).await {
        Ok(duration) => duration,
        Err(fault) => {
            warn!(%fault, "admission could not probe source duration");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody { error: "invalidInput".to_string(), message: fault.to_string() }),
            )
                .into_response();
        }
    };

    let config = JobConfig {
        override_script: request.override_script,
        target_duration_minutes: request.target_duration_minutes,
        series_id: request.series_id,
        feature_toggles: request.feature_toggles,
        character_guide_text: request.character_guide_text,
        source_duration_seconds,
    };

    let job = Job::new_pending(owner.owner_id, source_handle, config);
    if let Err(fault) = state.job_store.create(&job).await {
        error!(%fault, "failed to persist admitted job");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody { error: "internal".to_string(), message: fault.to_string() }),
        )
            .into_response();
    }

    let job_id = job.id;
    let controller = Arc::clone(&state.pipeline_controller);
    let admission_semaphore = Arc::clone(&state.admission_semaphore);
    tokio::spawn(async move {
        let Ok(permit) = admission_semaphore.acquire_owned().await else {
            error!(%job_id, "admission semaphore closed, job left pending for recovery sweep");
            return;
        };
        if let Err(fault) = controller.drive_job(job_id).await {
            warn!(%job_id, %fault, "job failed to reach a terminal state");
        }
        drop(permit);
    });

    (StatusCode::ACCEPTED, Json(AdmissionResponse { job_id: job_id.to_string() })).into_response()
}
