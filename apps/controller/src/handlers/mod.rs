// [apps/controller/src/handlers/mod.rs]
/*!
 * APARATO: ADAPTADORES HTTP (V1.0)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: AGRUPAR LOS CINCO PUNTOS DE ENTRADA DE LA API EXTERNA
 *
 * - admission: POST /api/v1/jobs
 * - status:    GET  /api/v1/jobs/:jobId
 * - stream:    GET  /api/v1/jobs/:jobId/stream (WebSocket)
 * - cancel:    POST /api/v1/jobs/:jobId/cancel
 * - quota:     GET  /api/v1/users/:userId/quota
 */

pub mod admission;
pub mod cancel;
pub mod quota;
pub mod status;
pub mod stream;
