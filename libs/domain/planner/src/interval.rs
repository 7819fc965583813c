// [libs/domain/planner/src/interval.rs]
/*!
 * APARATO: INTERVALO PLANIFICADO (V1.0)
 * CLASIFICACIÓN: DOMAIN MODEL (ESTRATO L2, INTERNO AL PLANNER)
 *
 * Representación de trabajo intermedia antes de convertirse en `Segment`.
 * Cada paso del pipeline del Planner (guion, capítulos, modo clip corto,
 * selección por duración objetivo) consume y produce una lista de estos
 * intervalos en orden estable.
 */

/// Un tramo candidato del video fuente, todavía sin fingerprint.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedInterval {
    pub start: f64,
    pub end: f64,
    /// Texto de guion asociado, si el intervalo proviene de un párrafo.
    pub script_paragraph: Option<String>,
    /// Peso usado únicamente por la selección greedy por duración objetivo
    /// (§4.F paso 4); no tiene significado fuera de ese paso.
    pub importance_score: f64,
}

impl PlannedInterval {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}
