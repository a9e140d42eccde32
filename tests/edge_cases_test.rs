//! Edge case and boundary condition tests.

use map_eval::evaluator::{evaluate, evaluate_class, EvalOptions};
use map_eval::loader::parse_annotations;
use map_eval::matching::{match_detections, sort_by_score};
use map_eval::metrics::ap::integrate;
use map_eval::metrics::iou::calculate_iou;
use map_eval::metrics::precision_recall::build_pr_curve;
use map_eval::registry::ClassRegistry;
use map_eval::types::{ApMethod, BoundingBox, Detection, GroundTruthBox, MatchOutcome, PrecisionRecallPoint};

fn gt(image_id: &str, bbox: [f64; 4]) -> GroundTruthBox {
    GroundTruthBox {
        image_id: image_id.to_string(),
        class_id: 0,
        bbox: BoundingBox::new(bbox[0], bbox[1], bbox[2], bbox[3]),
    }
}

fn det(image_id: &str, bbox: [f64; 4], score: f64) -> Detection {
    Detection::new(image_id, 0, BoundingBox::new(bbox[0], bbox[1], bbox[2], bbox[3]), score)
}

// ============================================================================
// MATCHING EDGE CASES
// ============================================================================

#[test]
fn test_no_detections() {
    let outcomes = match_detections(&[], &[gt("a", [0.0, 0.0, 10.0, 10.0])], 0.5).unwrap();
    assert!(outcomes.is_empty());
}

#[test]
fn test_no_ground_truth() {
    let dets = vec![det("a", [0.0, 0.0, 10.0, 10.0], 0.9)];
    let outcomes = match_detections(&dets, &[], 0.5).unwrap();
    assert_eq!(outcomes, vec![MatchOutcome::FalsePositive { best_iou: 0.0 }]);
}

#[test]
fn test_iou_exactly_at_threshold_is_match() {
    // intersection 50, union 100
    let gts = vec![gt("a", [0.0, 0.0, 10.0, 10.0])];
    let dets = vec![det("a", [0.0, 0.0, 10.0, 5.0], 0.9)];
    let outcomes = match_detections(&dets, &gts, 0.5).unwrap();
    assert!(outcomes[0].is_true_positive());
}

#[test]
fn test_iou_just_below_threshold_is_miss() {
    let gts = vec![gt("a", [0.0, 0.0, 10.0, 10.0])];
    let dets = vec![det("a", [0.0, 0.0, 10.0, 5.0], 0.9)];
    let outcomes = match_detections(&dets, &gts, 0.51).unwrap();
    assert!(!outcomes[0].is_true_positive());
    assert!((outcomes[0].iou() - 0.5).abs() < 1e-12);
}

#[test]
fn test_best_candidate_below_threshold_is_miss() {
    let gts = vec![gt("a", [0.0, 0.0, 10.0, 10.0]), gt("a", [0.0, 0.0, 10.0, 20.0])];
    let dets = vec![det("a", [0.0, 0.0, 10.0, 6.0], 0.9)];
    let outcomes = match_detections(&dets, &gts, 0.7).unwrap();
    assert_eq!(outcomes[0], MatchOutcome::FalsePositive { best_iou: 0.6 });
}

#[test]
fn test_claimed_ground_truth_skipped() {
    let gts = vec![gt("a", [0.0, 0.0, 10.0, 10.0]), gt("a", [0.0, 0.0, 10.0, 12.0])];
    let dets = vec![
        det("a", [0.0, 0.0, 10.0, 10.0], 0.9),
        det("a", [0.0, 0.0, 10.0, 10.0], 0.8),
    ];
    let outcomes = match_detections(&dets, &gts, 0.5).unwrap();
    assert_eq!(outcomes[0].gt_index(), Some(0));
    assert_eq!(outcomes[1].gt_index(), Some(1));
}

#[test]
fn test_equal_iou_goes_to_lowest_index() {
    // identical ground truths
    let gts = vec![gt("a", [0.0, 0.0, 10.0, 10.0]), gt("a", [0.0, 0.0, 10.0, 10.0])];
    let dets = vec![det("a", [0.0, 0.0, 10.0, 10.0], 0.9)];
    let outcomes = match_detections(&dets, &gts, 0.5).unwrap();
    assert_eq!(outcomes[0].gt_index(), Some(0));
}

#[test]
fn test_same_box_other_image_never_matches() {
    let gts = vec![gt("a", [0.0, 0.0, 10.0, 10.0])];
    let dets = vec![det("b", [0.0, 0.0, 10.0, 10.0], 0.9)];
    let outcomes = match_detections(&dets, &gts, 0.5).unwrap();
    assert!(!outcomes[0].is_true_positive());
}

#[test]
fn test_equal_scores_keep_input_order() {
    let mut dets = vec![
        det("first", [0.0, 0.0, 1.0, 1.0], 0.5),
        det("second", [0.0, 0.0, 1.0, 1.0], 0.5),
        det("top", [0.0, 0.0, 1.0, 1.0], 0.7),
        det("third", [0.0, 0.0, 1.0, 1.0], 0.5),
    ];
    sort_by_score(&mut dets);
    let order: Vec<&str> = dets.iter().map(|d| d.image_id.as_str()).collect();
    assert_eq!(order, vec!["top", "first", "second", "third"]);
}

#[test]
fn test_tie_order_decides_which_detection_matches() {
    let gts = vec![gt("a", [0.0, 0.0, 10.0, 10.0])];
    let loose = det("a", [0.0, 0.0, 10.0, 6.0], 0.5);
    let tight = det("a", [0.0, 0.0, 10.0, 10.0], 0.5);

    let eval = evaluate_class(0, &[loose.clone(), tight.clone()], &gts, &EvalOptions::default()).unwrap();
    assert_eq!(eval.outcomes[0].gt_index(), Some(0));
    assert!(!eval.outcomes[1].is_true_positive());

    let eval = evaluate_class(0, &[tight, loose], &gts, &EvalOptions::default()).unwrap();
    assert!((eval.outcomes[0].iou() - 1.0).abs() < 1e-12);
}

#[test]
fn test_zero_area_boxes() {
    let point = BoundingBox::new(5.0, 5.0, 5.0, 5.0);
    assert_eq!(calculate_iou(&point, &point), 0.0);

    let gts = vec![gt("a", [5.0, 5.0, 5.0, 5.0])];
    let dets = vec![det("a", [5.0, 5.0, 5.0, 5.0], 0.9)];
    let outcomes = match_detections(&dets, &gts, 0.5).unwrap();
    assert!(!outcomes[0].is_true_positive());
}

#[test]
fn test_touching_boxes_do_not_overlap() {
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BoundingBox::new(10.0, 0.0, 20.0, 10.0);
    assert_eq!(calculate_iou(&a, &b), 0.0);
}

// ============================================================================
// PR CURVE AND AP EDGE CASES
// ============================================================================

#[test]
fn test_curve_without_ground_truth_is_none() {
    let outcomes = [MatchOutcome::FalsePositive { best_iou: 0.0 }];
    assert!(build_pr_curve(&outcomes, 0).is_none());
}

#[test]
fn test_curve_with_no_detections_is_empty() {
    let curve = build_pr_curve(&[], 3).unwrap();
    assert!(curve.is_empty());
    assert_eq!(integrate(&curve, ApMethod::Envelope), 0.0);
}

#[test]
fn test_all_false_positives_give_zero_ap() {
    let outcomes = vec![MatchOutcome::FalsePositive { best_iou: 0.2 }; 5];
    let curve = build_pr_curve(&outcomes, 2).unwrap();
    assert_eq!(integrate(&curve, ApMethod::Envelope), 0.0);
    assert_eq!(integrate(&curve, ApMethod::Interpolated101), 0.0);
}

#[test]
fn test_partial_recall() {
    // one of two ground truths found, first rank
    let curve = vec![PrecisionRecallPoint::new(0.5, 1.0)];
    assert!((integrate(&curve, ApMethod::Envelope) - 0.5).abs() < 1e-12);
    // levels 0.00..=0.50 see precision 1.0
    assert!((integrate(&curve, ApMethod::Interpolated101) - 51.0 / 101.0).abs() < 1e-12);
}

#[test]
fn test_curve_order_does_not_matter_for_integration() {
    let sorted = vec![
        PrecisionRecallPoint::new(0.25, 1.0),
        PrecisionRecallPoint::new(0.5, 0.5),
        PrecisionRecallPoint::new(1.0, 0.4),
    ];
    let mut shuffled = sorted.clone();
    shuffled.reverse();
    assert_eq!(
        integrate(&sorted, ApMethod::Envelope),
        integrate(&shuffled, ApMethod::Envelope)
    );
}

// ============================================================================
// EVALUATION EDGE CASES
// ============================================================================

#[test]
fn test_no_class_has_ground_truth() {
    let registry = ClassRegistry::parse("dock\nrobot").unwrap();
    let annotations = parse_annotations("a.jpg\nb.jpg\n", &registry).unwrap();
    let detections = vec![Detection::new("a.jpg", 1, BoundingBox::new(0.0, 0.0, 1.0, 1.0), 0.9)];

    let report = evaluate(&registry, &annotations, &detections, &EvalOptions::default()).unwrap();
    assert_eq!(report.evaluated_classes, 0);
    assert_eq!(report.mean, 0.0);
    assert!(report.per_class.iter().all(|r| r.is_excluded()));
}

#[test]
fn test_repeated_image_line_merges_boxes() {
    let registry = ClassRegistry::parse("dock").unwrap();
    let annotations = parse_annotations("a.jpg 0,0,10,10,0\na.jpg 20,20,30,30,0\n", &registry).unwrap();
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations.gt_count(0), 2);

    let detections = vec![
        Detection::new("a.jpg", 0, BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0.9),
        Detection::new("a.jpg", 0, BoundingBox::new(20.0, 20.0, 30.0, 30.0), 0.8),
    ];
    let report = evaluate(&registry, &annotations, &detections, &EvalOptions::default()).unwrap();
    assert_eq!(report.ap(0), Some(1.0));
}

#[test]
fn test_score_threshold_is_strict() {
    let registry = ClassRegistry::parse("dock").unwrap();
    let annotations = parse_annotations("a.jpg 0,0,10,10,0\n", &registry).unwrap();
    let detections = vec![Detection::new("a.jpg", 0, BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0.5)];

    let options = EvalOptions::default().with_score_threshold(0.5);
    let report = evaluate(&registry, &annotations, &detections, &options).unwrap();
    assert_eq!(report.class(0).unwrap().detection_count, 0);
    assert_eq!(report.ap(0), Some(0.0));
}

#[test]
fn test_unbounded_scores_accepted() {
    let registry = ClassRegistry::parse("dock").unwrap();
    let annotations = parse_annotations("a.jpg 0,0,10,10,0\n", &registry).unwrap();
    let detections = vec![
        Detection::new("a.jpg", 0, BoundingBox::new(0.0, 0.0, 10.0, 10.0), 42.0),
        Detection::new("a.jpg", 0, BoundingBox::new(50.0, 50.0, 60.0, 60.0), -3.0),
    ];
    let report = evaluate(&registry, &annotations, &detections, &EvalOptions::default()).unwrap();
    assert_eq!(report.ap(0), Some(1.0));
}

#[test]
fn test_iou_threshold_of_one() {
    let registry = ClassRegistry::parse("dock").unwrap();
    let annotations = parse_annotations("a.jpg 0,0,10,10,0\n", &registry).unwrap();
    let detections = vec![Detection::new("a.jpg", 0, BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0.9)];
    let options = EvalOptions::default().with_iou_threshold(1.0);
    let report = evaluate(&registry, &annotations, &detections, &options).unwrap();
    assert_eq!(report.ap(0), Some(1.0));
}
