// [libs/domain/models/src/config.rs]
/*!
 * APARATO: CONTRATOS DE CONFIGURACIÓN SOBERANA (V1.0)
 * CLASIFICACIÓN: DOMAIN MODEL (ESTRATO L2)
 * RESPONSABILIDAD: TIPAR EL "ESTADO DE PROCESO S" LEÍDO UNA SOLA VEZ AL ARRANQUE
 *
 * Estos tipos son compartidos por el Gate, el Planner y el Controller para
 * que todos lean la misma forma de configuración en lugar de que cada
 * llamador reinvente sus propios defaults.
 */

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Política de reintento y admisión para un único proveedor externo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider_id: String,
    /// Solicitudes por segundo permitidas al cubo de tokens de este proveedor.
    pub requests_per_second: f64,
    /// Máximo de llamadas concurrentes en vuelo para este proveedor.
    pub max_in_flight: usize,
    pub per_attempt_timeout: Duration,
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Códigos de estado HTTP que el Gate trata como transitorios.
    pub retriable_statuses: Vec<u16>,
}

impl ProviderConfig {
    pub fn default_for(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            requests_per_second: 5.0,
            max_in_flight: 8,
            per_attempt_timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            retriable_statuses: vec![408, 429, 500, 502, 503, 504],
        }
    }
}

/// Límites de segmentación por defecto (§6 `segment`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentConfig {
    pub min_segment_seconds: f64,
    pub max_segment_seconds: f64,
    pub short_clip_max_seconds: f64,
    pub speed_min: f64,
    pub speed_max: f64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            min_segment_seconds: 2.0,
            max_segment_seconds: 30.0,
            short_clip_max_seconds: 3.0,
            speed_min: 0.5,
            speed_max: 2.0,
        }
    }
}

/// Presupuestos de tiempo total por etapa (§6 `stageTimeouts`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StageTimeouts {
    pub segment_processing: Duration,
    pub stitching: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            segment_processing: Duration::from_secs(20 * 60),
            stitching: Duration::from_secs(10 * 60),
        }
    }
}

/// Límites de planificación (§6 `planLimits`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlanLimits {
    pub target_overrun_factor: f64,
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self { target_overrun_factor: 1.10 }
    }
}
