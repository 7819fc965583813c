// [apps/controller/src/routes.rs]
/*!
 * APARATO: ROUTING MATRIX (V1.0)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: TOPOLOGÍA DE LAS CINCO RUTAS EXTERNAS
 */

use std::time::Duration;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::{admission, cancel, quota, status, stream};
use crate::middleware::owner_guard;
use crate::state::AppState;

pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    let api = Router::new()
        .route("/jobs", post(admission::admit_job))
        .route("/jobs/:jobId", get(status::get_job_status))
        .route("/jobs/:jobId/stream", get(stream::stream_job_progress))
        .route("/jobs/:jobId/cancel", post(cancel::cancel_job))
        .route("/users/:userId/quota", get(quota::get_user_quota))
        .layer(middleware::from_fn(owner_guard));

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/api/v1", api)
        .layer(cors)
        .with_state(app_state)
}
