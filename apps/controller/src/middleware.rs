// [apps/controller/src/middleware.rs]
/*!
 * APARATO: OWNER IDENTITY GUARD (V1.0)
 * CLASIFICACIÓN: SECURITY STRATUM (ESTRATO L4)
 * RESPONSABILIDAD: EXTRACCIÓN DE IDENTIDAD YA AUTENTICADA AGUAS ARRIBA
 *
 * Simplificación deliberada de la doble ciudadanía del vecino (token de
 * worker XOR JWT de Supabase decodificado sin verificar firma): aquí la
 * autenticación de verdad ya ocurrió en un proxy/gateway aguas arriba, que
 * garantiza `X-Narrata-Owner-Id` en cada petición admitida. Esta guardia
 * sólo extrae esa cabecera y la inyecta como extensión — ver DESIGN.md
 * para la resolución de la pregunta abierta correspondiente.
 */

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};

pub const OWNER_HEADER_NAME: &str = "X-Narrata-Owner-Id";

/// Identidad del propietario de la petición, inyectada por `owner_guard`.
#[derive(Debug, Clone)]
pub struct OwnerIdentity {
    pub owner_id: String,
}

/// Extrae `X-Narrata-Owner-Id` y la inyecta como extensión de la petición.
/// Rechaza con 401 cuando la cabecera falta o está vacía.
pub async fn owner_guard(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let owner_id = req
        .headers()
        .get(OWNER_HEADER_NAME)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(OwnerIdentity { owner_id });
    Ok(next.run(req).await)
}
