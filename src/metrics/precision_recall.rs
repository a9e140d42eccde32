//! Precision and Recall calculation.

use crate::types::{MatchOutcome, PrecisionRecallPoint};

/// Final counts of one class with the precision and recall they imply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecisionRecall {
    pub precision: f64,
    pub recall: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

/// Precision `tp / (tp + fp)` and recall `tp / (tp + fn)`; an empty
/// denominator gives 0.0.
///
/// # Example
///
/// ```
/// use map_eval::metrics::precision_recall::calculate_precision_recall;
///
/// let pr = calculate_precision_recall(3, 1, 2);
/// assert_eq!(pr.precision, 0.75);
/// assert_eq!(pr.recall, 0.6);
/// ```
pub fn calculate_precision_recall(
    true_positives: usize,
    false_positives: usize,
    false_negatives: usize,
) -> PrecisionRecall {
    PrecisionRecall {
        precision: ratio(true_positives, true_positives + false_positives),
        recall: ratio(true_positives, true_positives + false_negatives),
        true_positives,
        false_positives,
        false_negatives,
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Build the precision-recall curve of one class.
///
/// `outcomes` must be in rank order (descending score). Point `k` (1-indexed)
/// has `precision = TP_k / k` and `recall = TP_k / total_gt`, where `TP_k` is
/// the number of true positives among the first `k` outcomes.
///
/// Returns `None` when `total_gt` is zero: recall is undefined for a class
/// without ground truth.
///
/// # Example
///
/// ```
/// use map_eval::metrics::precision_recall::build_pr_curve;
/// use map_eval::types::MatchOutcome;
///
/// let outcomes = [
///     MatchOutcome::TruePositive { gt_index: 0, iou: 0.9 },
///     MatchOutcome::FalsePositive { best_iou: 0.1 },
/// ];
/// let curve = build_pr_curve(&outcomes, 2).unwrap();
/// assert_eq!(curve[1].precision, 0.5);
/// assert_eq!(curve[1].recall, 0.5);
/// ```
pub fn build_pr_curve(outcomes: &[MatchOutcome], total_gt: usize) -> Option<Vec<PrecisionRecallPoint>> {
    if total_gt == 0 {
        return None;
    }

    let mut tp = 0;
    let curve = outcomes
        .iter()
        .zip(1..)
        .map(|(outcome, rank)| {
            tp += usize::from(outcome.is_true_positive());
            PrecisionRecallPoint::new(ratio(tp, total_gt), ratio(tp, rank))
        })
        .collect();

    Some(curve)
}
