// [libs/domain/planner/src/script_matcher.rs]
/*!
 * APARATO: EMPAREJADOR DE GUION EN DOS PASADAS (V1.0)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: DERIVAR INTERVALOS DEL VIDEO FUENTE A PARTIR DE LOS
 *                   PÁRRAFOS DE UN GUION PROVISTO (§4.F.1)
 *
 * Primera pasada: reparte la duración total proporcionalmente al conteo de
 * palabras de cada párrafo, que es la única señal disponible sin invocar un
 * proveedor externo. Segunda pasada: corrige los límites resultantes para
 * que ningún intervalo quede fuera de `[0, sourceDuration]` por errores de
 * redondeo acumulados, y asegura que los límites sean estrictamente
 * crecientes. El resultado es puramente determinista: las mismas entradas
 * producen siempre los mismos límites.
 */

use crate::errors::PlannerError;
use crate::interval::PlannedInterval;

/// Divide `script` en párrafos no vacíos, separados por una o más líneas en
/// blanco, preservando el orden de aparición.
fn split_into_paragraphs(script: &str) -> Vec<&str> {
    script
        .split("\n\n")
        .flat_map(|block| block.split('\n'))
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .collect()
}

fn word_count(paragraph: &str) -> usize {
    paragraph.split_whitespace().count().max(1)
}

/// Produce un intervalo por párrafo, en el mismo orden del guion, cuya
/// duración es proporcional a su peso en palabras dentro del total.
pub fn match_script_to_intervals(
    script: &str,
    source_duration_seconds: f64,
) -> Result<Vec<PlannedInterval>, PlannerError> {
    let paragraphs = split_into_paragraphs(script);
    if paragraphs.is_empty() {
        return Err(PlannerError::EmptyScript);
    }

    let word_counts: Vec<usize> = paragraphs.iter().map(|p| word_count(p)).collect();
    let total_words: usize = word_counts.iter().sum();

    // Primera pasada: límites proporcionales, en punto flotante sin ajustar.
    let mut cursor = 0.0f64;
    let mut raw_bounds: Vec<(f64, f64)> = Vec::with_capacity(paragraphs.len());
    for words in &word_counts {
        let share = (*words as f64 / total_words as f64) * source_duration_seconds;
        let end = (cursor + share).min(source_duration_seconds);
        raw_bounds.push((cursor, end));
        cursor = end;
    }

    // Segunda pasada: el último límite debe cerrar exactamente en la
    // duración total, y cada intervalo debe mantenerse estrictamente
    // creciente incluso si el redondeo de punto flotante degeneró uno a
    // longitud cero.
    if let Some(last) = raw_bounds.last_mut() {
        last.1 = source_duration_seconds;
    }
    for index in 0..raw_bounds.len() {
        let min_end = raw_bounds[index].0 + f64::EPSILON.max(1e-6);
        if raw_bounds[index].1 <= raw_bounds[index].0 {
            raw_bounds[index].1 = min_end.min(source_duration_seconds);
            if index + 1 < raw_bounds.len() {
                raw_bounds[index + 1].0 = raw_bounds[index].1;
            }
        }
    }

    let total_words_f64 = total_words as f64;
    let intervals = paragraphs
        .into_iter()
        .zip(word_counts)
        .zip(raw_bounds)
        .map(|((paragraph, words), (start, end))| PlannedInterval {
            start,
            end,
            script_paragraph: Some(paragraph.to_string()),
            importance_score: words as f64 / total_words_f64,
        })
        .collect();

    Ok(intervals)
}
