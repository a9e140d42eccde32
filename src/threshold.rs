//! Confidence score and IoU threshold utilities.

use crate::error::{EvalError, Result};
use crate::types::Detection;

/// Keep detections whose score is strictly above `threshold`.
///
/// Scores may be unbounded confidences, so any finite threshold is accepted.
///
/// # Errors
///
/// Returns an error if the threshold is not finite.
///
/// # Example
///
/// ```
/// use map_eval::threshold::filter_by_score;
/// use map_eval::types::{BoundingBox, Detection};
///
/// let bbox = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
/// let detections = vec![
///     Detection::new("a.jpg", 0, bbox, 0.9),
///     Detection::new("a.jpg", 0, bbox, 0.3),
/// ];
///
/// let filtered = filter_by_score(&detections, 0.5).unwrap();
/// assert_eq!(filtered.len(), 1);
/// ```
pub fn filter_by_score(detections: &[Detection], threshold: f64) -> Result<Vec<Detection>> {
    validate_score_threshold(threshold)?;

    Ok(detections
        .iter()
        .filter(|det| det.score > threshold)
        .cloned()
        .collect())
}

/// Validate a score threshold.
pub fn validate_score_threshold(threshold: f64) -> Result<()> {
    if !threshold.is_finite() {
        return Err(EvalError::InvalidThreshold(format!(
            "Score threshold must be finite, got {}",
            threshold
        )));
    }
    Ok(())
}

/// Validate that an IoU threshold is in (0.0, 1.0].
///
/// Zero is rejected: it would let a detection claim a ground truth it does
/// not overlap at all.
pub fn validate_iou_threshold(threshold: f64) -> Result<()> {
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(EvalError::InvalidThreshold(format!(
            "IoU threshold must be in (0.0, 1.0], got {}",
            threshold
        )));
    }
    Ok(())
}
