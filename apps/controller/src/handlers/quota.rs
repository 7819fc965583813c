// [apps/controller/src/handlers/quota.rs]
/*!
 * APARATO: QUOTA HANDLER (V1.0)
 * CLASIFICACIÓN: API ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: GET /api/v1/users/:userId/quota
 *
 * El propietario sólo puede consultar su propia cuota; no hay un concepto
 * de rol administrativo en esta superficie (ver DESIGN.md).
 */

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Serialize;

use crate::middleware::OwnerIdentity;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuotaResponse {
    subscription_minutes_limit: f64,
    subscription_minutes_used: f64,
    top_up_minutes_remaining: f64,
    total_available_minutes: f64,
    billing_period: String,
}

pub async fn get_user_quota(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerIdentity>,
    Path(user_id): Path<String>,
) -> Response {
    if user_id != owner.owner_id {
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorBody { error: "forbidden".to_string(), message: "cannot query another user's quota".to_string() }),
        )
            .into_response();
    }

    match state.ledger.get_quota_snapshot(&user_id).await {
        Ok(snapshot) => Json(QuotaResponse {
            subscription_minutes_limit: snapshot.subscription_minutes_limit,
            subscription_minutes_used: snapshot.subscription_minutes_used,
            top_up_minutes_remaining: snapshot.top_up_minutes_remaining,
            total_available_minutes: snapshot.total_available_minutes,
            billing_period: snapshot.billing_period.0,
        })
        .into_response(),
        Err(fault) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody { error: "internal".to_string(), message: fault.to_string() }),
        )
            .into_response(),
    }
}
