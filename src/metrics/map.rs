//! Mean Average Precision (mAP) aggregation.

use crate::error::{EvalError, Result};
use crate::registry::ClassRegistry;
use crate::types::{ApMethod, ApResult, MapReport};

/// Calculate the mean of AP values.
///
/// # Example
///
/// ```
/// use map_eval::metrics::map::calculate_map;
///
/// let class_aps = vec![0.8, 0.9, 0.75, 0.85];
/// let map = calculate_map(&class_aps);
/// assert!((map - 0.825).abs() < 1e-10);
/// ```
pub fn calculate_map(class_aps: &[f64]) -> f64 {
    if class_aps.is_empty() {
        return 0.0;
    }

    class_aps.iter().sum::<f64>() / class_aps.len() as f64
}

/// Assemble the report for every registry class.
///
/// Classes missing from `results` are listed with an undefined AP and zero
/// counts. Only classes with a defined AP enter the mean; the rest stay in
/// `per_class` so the total can be audited.
///
/// # Errors
///
/// Returns `ClassMismatch` if a result names a class outside the registry.
pub fn aggregate(
    results: Vec<ApResult>,
    registry: &ClassRegistry,
    iou_threshold: f64,
    ap_method: ApMethod,
) -> Result<MapReport> {
    let mut slots: Vec<Option<ApResult>> = vec![None; registry.len()];
    for result in results {
        let slot = slots.get_mut(result.class_id).ok_or(EvalError::ClassMismatch {
            class_id: result.class_id,
            num_classes: registry.len(),
            context: "AP results".to_string(),
        })?;
        *slot = Some(result);
    }

    let per_class: Vec<ApResult> = registry
        .iter()
        .zip(slots)
        .map(|(label, slot)| {
            slot.unwrap_or_else(|| ApResult {
                class_id: label.id,
                class_name: label.name.clone(),
                ap: None,
                gt_count: 0,
                detection_count: 0,
                true_positives: 0,
                precision: 0.0,
                recall: 0.0,
            })
        })
        .collect();

    let defined: Vec<f64> = per_class.iter().filter_map(|r| r.ap).collect();

    Ok(MapReport {
        mean: calculate_map(&defined),
        evaluated_classes: defined.len(),
        per_class,
        iou_threshold,
        ap_method,
    })
}
