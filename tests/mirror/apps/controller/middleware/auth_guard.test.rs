// [tests/mirror/apps/controller/middleware/auth_guard.test.rs]
//! `owner_guard` debe rechazar con 401 cuando falta la cabecera de
//! propietario (o está vacía) y, en caso contrario, inyectar `OwnerIdentity`
//! como extensión de la petición para que los handlers aguas abajo la vean.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::{middleware, Extension, Router};
use narrata_controller::middleware::{owner_guard, OwnerIdentity, OWNER_HEADER_NAME};
use tower::ServiceExt;

fn test_router() -> Router {
    Router::new()
        .route(
            "/whoami",
            get(|Extension(owner): Extension<OwnerIdentity>| async move { owner.owner_id }),
        )
        .layer(middleware::from_fn(owner_guard))
}

#[tokio::test]
async fn a_request_without_the_owner_header_is_unauthorized() {
    let response = test_router()
        .oneshot(Request::get("/whoami").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn a_request_with_an_empty_owner_header_is_unauthorized() {
    let response = test_router()
        .oneshot(Request::get("/whoami").header(OWNER_HEADER_NAME, "").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn a_request_with_the_owner_header_injects_the_identity_downstream() {
    use http_body_util::BodyExt;

    let response = test_router()
        .oneshot(Request::get("/whoami").header(OWNER_HEADER_NAME, "owner-42").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"owner-42");
}
