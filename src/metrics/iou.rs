//! Intersection over Union (IoU) for corner-format boxes.

use crate::types::BoundingBox;

/// Overlap of two boxes as intersection area over union area.
///
/// Boxes that only touch along an edge have zero intersection. When the
/// union is empty (both boxes degenerate) the result is 0.0, so such boxes
/// never match anything.
///
/// # Example
///
/// ```
/// use map_eval::metrics::iou::calculate_iou;
/// use map_eval::types::BoundingBox;
///
/// let gt = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
/// let det = BoundingBox::new(0.0, 0.0, 10.0, 5.0);
/// assert_eq!(calculate_iou(&gt, &det), 0.5);
/// ```
pub fn calculate_iou(a: &BoundingBox, b: &BoundingBox) -> f64 {
    let overlap_w = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let overlap_h = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let intersection = overlap_w * overlap_h;

    let union = a.area() + b.area() - intersection;
    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}
