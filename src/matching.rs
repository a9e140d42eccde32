//! Detection matching utilities for evaluating predictions against ground truth.

use crate::error::{EvalError, Result};
use crate::loader::Annotations;
use crate::metrics::iou::calculate_iou;
use crate::threshold::validate_iou_threshold;
use crate::types::{Detection, GroundTruthBox, MatchOutcome};
use std::collections::HashMap;
use tracing::trace;

/// Sort detections by score, highest first.
///
/// The sort is stable: detections with equal scores keep their input order.
pub fn sort_by_score(detections: &mut [Detection]) {
    detections.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Match one class's detections to that class's ground truth.
///
/// Greedy matching: detections are visited in the given order (which must be
/// descending score, see [`sort_by_score`]) and each one claims the unclaimed
/// ground truth of the same image with the highest IoU. Equal IoUs go to the
/// lowest ground-truth index. A claim succeeds only if that IoU is at least
/// `iou_threshold`; otherwise the detection is a false positive and nothing
/// is claimed.
///
/// Claimed state lives only for the duration of this call.
///
/// # Arguments
///
/// * `detections` - Detections of one class, sorted by score descending
/// * `ground_truths` - Ground truth of the same class, across all images
/// * `iou_threshold` - Minimum IoU to consider a match, in (0, 1]
///
/// # Returns
///
/// One outcome per detection, in input order.
pub fn match_detections(
    detections: &[Detection],
    ground_truths: &[GroundTruthBox],
    iou_threshold: f64,
) -> Result<Vec<MatchOutcome>> {
    validate_iou_threshold(iou_threshold)?;

    // Candidate ground truths per image, in ascending index order
    let mut by_image: HashMap<&str, Vec<usize>> = HashMap::new();
    for (gt_idx, gt) in ground_truths.iter().enumerate() {
        by_image.entry(gt.image_id.as_str()).or_default().push(gt_idx);
    }

    let mut matched = vec![false; ground_truths.len()];
    let mut outcomes = Vec::with_capacity(detections.len());

    for det in detections {
        let mut best: Option<(usize, f64)> = None;

        if let Some(candidates) = by_image.get(det.image_id.as_str()) {
            for &gt_idx in candidates {
                if matched[gt_idx] {
                    continue;
                }
                let iou = calculate_iou(&det.bbox, &ground_truths[gt_idx].bbox);
                // Strict comparison keeps the lowest index on ties
                if best.map_or(true, |(_, best_iou)| iou > best_iou) {
                    best = Some((gt_idx, iou));
                }
            }
        }

        let outcome = match best {
            Some((gt_idx, iou)) if iou >= iou_threshold => {
                matched[gt_idx] = true;
                MatchOutcome::TruePositive {
                    gt_index: gt_idx,
                    iou,
                }
            }
            Some((_, iou)) => MatchOutcome::FalsePositive { best_iou: iou },
            None => MatchOutcome::FalsePositive { best_iou: 0.0 },
        };

        trace!(
            image = %det.image_id,
            score = det.score,
            iou = outcome.iou(),
            tp = outcome.is_true_positive(),
            "matched detection"
        );
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

/// Split ground truth into one list per class, each in file order.
pub fn group_ground_truth(
    annotations: &Annotations,
    num_classes: usize,
) -> Result<Vec<Vec<GroundTruthBox>>> {
    let mut groups = vec![Vec::new(); num_classes];
    for gt in annotations.boxes() {
        let group = groups.get_mut(gt.class_id).ok_or_else(|| EvalError::ClassMismatch {
            class_id: gt.class_id,
            num_classes,
            context: format!("ground truth for {}", gt.image_id),
        })?;
        group.push(gt.clone());
    }
    Ok(groups)
}

/// Split detections into one list per class, each in input order.
pub fn group_detections(detections: &[Detection], num_classes: usize) -> Result<Vec<Vec<Detection>>> {
    let mut groups = vec![Vec::new(); num_classes];
    for det in detections {
        let group = groups.get_mut(det.class_id).ok_or_else(|| EvalError::ClassMismatch {
            class_id: det.class_id,
            num_classes,
            context: format!("detections for {}", det.image_id),
        })?;
        group.push(det.clone());
    }
    Ok(groups)
}

/// Number of true positives among match outcomes.
pub fn count_true_positives(outcomes: &[MatchOutcome]) -> usize {
    outcomes.iter().filter(|m| m.is_true_positive()).count()
}
