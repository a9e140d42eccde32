//! Main evaluation orchestrator for detection mAP.

use crate::error::{EvalError, Result};
use crate::loader::Annotations;
use crate::matching::{count_true_positives, group_detections, group_ground_truth, match_detections, sort_by_score};
use crate::metrics::ap::integrate;
use crate::metrics::map::aggregate;
use crate::metrics::precision_recall::{build_pr_curve, calculate_precision_recall};
use crate::registry::ClassRegistry;
use crate::threshold::{filter_by_score, validate_iou_threshold, validate_score_threshold};
use crate::types::{ApMethod, ApResult, Detection, GroundTruthBox, MapReport, MatchOutcome, PrecisionRecallPoint};
use rayon::prelude::*;
use std::borrow::Cow;
use tracing::{debug, info, warn};

/// Parameters that affect the metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalOptions {
    /// Minimum IoU for a detection to claim a ground truth, in (0, 1]
    pub iou_threshold: f64,
    /// Drop detections scoring at or below this value before matching
    pub score_threshold: Option<f64>,
    pub ap_method: ApMethod,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            iou_threshold: 0.5,
            score_threshold: None,
            ap_method: ApMethod::Envelope,
        }
    }
}

impl EvalOptions {
    pub fn with_iou_threshold(mut self, iou_threshold: f64) -> Self {
        self.iou_threshold = iou_threshold;
        self
    }

    pub fn with_score_threshold(mut self, score_threshold: f64) -> Self {
        self.score_threshold = Some(score_threshold);
        self
    }

    pub fn with_ap_method(mut self, ap_method: ApMethod) -> Self {
        self.ap_method = ap_method;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_iou_threshold(self.iou_threshold)?;
        if let Some(threshold) = self.score_threshold {
            validate_score_threshold(threshold)?;
        }
        Ok(())
    }
}

/// Full evaluation of one class.
#[derive(Debug, Clone)]
pub struct ClassEvaluation {
    pub class_id: usize,
    /// Detections in rank order
    pub detections: Vec<Detection>,
    /// One outcome per ranked detection
    pub outcomes: Vec<MatchOutcome>,
    /// `None` when the class has no ground truth
    pub curve: Option<Vec<PrecisionRecallPoint>>,
    pub ap: Option<f64>,
    pub gt_count: usize,
}

impl ClassEvaluation {
    pub fn true_positives(&self) -> usize {
        count_true_positives(&self.outcomes)
    }
}

/// Evaluate detections against ground truth and build the mAP report.
///
/// Every class is evaluated independently (in parallel); the report lists
/// all registry classes in id order. The result depends only on the inputs
/// and `options`: nothing carries over between calls.
///
/// # Arguments
///
/// * `registry` - Class registry the ids refer to
/// * `annotations` - Ground truth
/// * `detections` - Detections in collection order (image order, then
///   detector order); this order breaks score ties
/// * `options` - IoU threshold, score threshold and AP method
///
/// # Errors
///
/// All input problems are reported before any matching starts:
/// `InvalidThreshold` for bad thresholds, `ClassMismatch` for class ids the
/// registry does not know and `InvalidDetection` for non-finite scores or
/// malformed boxes.
///
/// Detections on images that have no annotation line are dropped with a
/// warning, the same as when they come through a detector adapter.
pub fn evaluate(
    registry: &ClassRegistry,
    annotations: &Annotations,
    detections: &[Detection],
    options: &EvalOptions,
) -> Result<MapReport> {
    options.validate()?;
    let detections = retain_annotated(detections, annotations);
    validate_detections(&detections, registry)?;

    let detections: Cow<[Detection]> = match options.score_threshold {
        Some(threshold) => Cow::Owned(filter_by_score(&detections, threshold)?),
        None => detections,
    };

    let gt_groups = group_ground_truth(annotations, registry.len())?;
    let det_groups = group_detections(&detections, registry.len())?;

    let results: Vec<ApResult> = gt_groups
        .par_iter()
        .zip(det_groups.par_iter())
        .enumerate()
        .map(|(class_id, (gts, dets))| -> Result<ApResult> {
            let evaluation = evaluate_class(class_id, dets, gts, options)?;
            Ok(to_ap_result(&evaluation, registry))
        })
        .collect::<Result<Vec<_>>>()?;

    let report = aggregate(results, registry, options.iou_threshold, options.ap_method)?;
    info!(
        map = report.mean,
        evaluated_classes = report.evaluated_classes,
        excluded_classes = report.excluded().count(),
        iou_threshold = options.iou_threshold,
        "evaluation finished"
    );
    Ok(report)
}

/// Evaluate a single class: rank, match, build the curve, integrate.
///
/// `detections` may be in any order; they are ranked by score with ties kept
/// in input order.
pub fn evaluate_class(
    class_id: usize,
    detections: &[Detection],
    ground_truths: &[GroundTruthBox],
    options: &EvalOptions,
) -> Result<ClassEvaluation> {
    let mut ranked = detections.to_vec();
    sort_by_score(&mut ranked);

    let outcomes = match_detections(&ranked, ground_truths, options.iou_threshold)?;
    let curve = build_pr_curve(&outcomes, ground_truths.len());
    let ap = curve.as_deref().map(|c| integrate(c, options.ap_method));

    debug!(
        class_id,
        detections = ranked.len(),
        ground_truth = ground_truths.len(),
        tp = count_true_positives(&outcomes),
        ap = ?ap,
        "evaluated class"
    );

    Ok(ClassEvaluation {
        class_id,
        detections: ranked,
        outcomes,
        curve,
        ap,
        gt_count: ground_truths.len(),
    })
}

/// Evaluate at a specific IoU threshold and return the mean AP.
pub fn evaluate_at_iou(
    registry: &ClassRegistry,
    annotations: &Annotations,
    detections: &[Detection],
    iou_threshold: f64,
) -> Result<f64> {
    let options = EvalOptions::default().with_iou_threshold(iou_threshold);
    Ok(evaluate(registry, annotations, detections, &options)?.mean)
}

fn validate_detections(detections: &[Detection], registry: &ClassRegistry) -> Result<()> {
    for det in detections {
        registry.check(det.class_id, || format!("detections for {}", det.image_id))?;
        if !det.score.is_finite() {
            return Err(EvalError::InvalidDetection(format!(
                "non-finite score {} on {}",
                det.score, det.image_id
            )));
        }
        if !det.bbox.is_valid() {
            return Err(EvalError::InvalidDetection(format!(
                "malformed box {:?} on {}",
                det.bbox, det.image_id
            )));
        }
    }
    Ok(())
}

/// Drop detections on images without an annotation line. A detector adapter
/// is never asked about such images, so they cannot affect the metric.
fn retain_annotated<'a>(detections: &'a [Detection], annotations: &Annotations) -> Cow<'a, [Detection]> {
    if detections.iter().all(|det| annotations.contains_image(&det.image_id)) {
        return Cow::Borrowed(detections);
    }

    let kept: Vec<Detection> = detections
        .iter()
        .filter(|det| annotations.contains_image(&det.image_id))
        .cloned()
        .collect();
    warn!(
        ignored = detections.len() - kept.len(),
        "detections for images without annotations are ignored"
    );
    Cow::Owned(kept)
}

fn to_ap_result(evaluation: &ClassEvaluation, registry: &ClassRegistry) -> ApResult {
    let tp = evaluation.true_positives();
    let fp = evaluation.outcomes.len() - tp;
    let pr = calculate_precision_recall(tp, fp, evaluation.gt_count - tp);

    ApResult {
        class_id: evaluation.class_id,
        class_name: registry
            .name(evaluation.class_id)
            .unwrap_or_default()
            .to_string(),
        ap: evaluation.ap,
        gt_count: evaluation.gt_count,
        detection_count: evaluation.outcomes.len(),
        true_positives: tp,
        precision: pr.precision,
        recall: pr.recall,
    }
}
