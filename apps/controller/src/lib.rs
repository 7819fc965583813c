// [apps/controller/src/lib.rs]
/*!
 * APARATO: CONTROLLER LIBRARY ROOT (V1.0)
 * CLASIFICACIÓN: CRATE ROOT (ESTRATO L3)
 * RESPONSABILIDAD: DEFINICIÓN DEL ÁRBOL DE MÓDULOS
 */

/// Componentes de la máquina de estados del job: controlador, bus de
/// progreso, pool de workers de segmentos y el barrido de recuperación.
/// Sin superficie de librería propia fuera de este binario.
pub mod pipeline;

/// Estado compartido de la aplicación.
pub mod state;

/// Adaptadores de entrada HTTP y WebSocket.
pub mod handlers;

/// Núcleo de composición: ignición y arranque de servicios.
pub mod kernel;

/// Topología de rutas HTTP.
pub mod routes;

/// Guardianes perimetrales: identidad del propietario.
pub mod middleware;

pub mod prelude {
    pub use crate::kernel::ControllerKernel;
    pub use crate::state::AppState;
}
