//! Core data types for annotations, detections and evaluation results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An axis-aligned bounding box in corner format (x1, y1, x2, y2).
///
/// Coordinates are in image pixel space where:
/// - (x1, y1): top-left corner
/// - (x2, y2): bottom-right corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    /// Create a new bounding box from its corners.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Box width (x2 - x1).
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Box height (y2 - y1).
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Get the area of the bounding box.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Check that corners are finite and ordered (zero-area boxes allowed).
    pub fn is_valid(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2]
            .iter()
            .all(|v| v.is_finite())
            && self.x2 >= self.x1
            && self.y2 >= self.y1
    }
}

/// A class from the registry. Ids are dense and follow file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLabel {
    pub id: usize,
    pub name: String,
}

/// A reference-labeled box for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthBox {
    pub image_id: String,
    pub class_id: usize,
    pub bbox: BoundingBox,
}

/// A predicted box with its class and confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub image_id: String,
    pub class_id: usize,
    pub bbox: BoundingBox,
    pub score: f64,
}

impl Detection {
    pub fn new(image_id: impl Into<String>, class_id: usize, bbox: BoundingBox, score: f64) -> Self {
        Self {
            image_id: image_id.into(),
            class_id,
            bbox,
            score,
        }
    }
}

/// One (class, box, score) triple returned by a detector for an image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub class_id: usize,
    pub bbox: BoundingBox,
    pub score: f64,
}

impl Prediction {
    pub fn new(class_id: usize, bbox: BoundingBox, score: f64) -> Self {
        Self {
            class_id,
            bbox,
            score,
        }
    }

    /// Attach the image this prediction was made on.
    pub fn into_detection(self, image_id: &str) -> Detection {
        Detection::new(image_id, self.class_id, self.bbox, self.score)
    }
}

/// Outcome of matching one detection against its class's ground truth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchOutcome {
    /// Claimed the ground-truth box at `gt_index` (index into the class's
    /// ground-truth list).
    TruePositive { gt_index: usize, iou: f64 },
    /// No unclaimed ground truth reached the IoU threshold.
    FalsePositive { best_iou: f64 },
}

impl MatchOutcome {
    pub fn is_true_positive(&self) -> bool {
        matches!(self, MatchOutcome::TruePositive { .. })
    }

    /// Index of the claimed ground truth, if any.
    pub fn gt_index(&self) -> Option<usize> {
        match self {
            MatchOutcome::TruePositive { gt_index, .. } => Some(*gt_index),
            MatchOutcome::FalsePositive { .. } => None,
        }
    }

    /// Best IoU seen while matching.
    pub fn iou(&self) -> f64 {
        match self {
            MatchOutcome::TruePositive { iou, .. } => *iou,
            MatchOutcome::FalsePositive { best_iou } => *best_iou,
        }
    }
}

/// Precision-Recall curve point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrecisionRecallPoint {
    pub recall: f64,
    pub precision: f64,
}

impl PrecisionRecallPoint {
    pub fn new(recall: f64, precision: f64) -> Self {
        Self { recall, precision }
    }
}

/// How a precision-recall curve is integrated into AP.
///
/// The method is fixed for a run and recorded in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApMethod {
    /// Area under the monotone precision envelope, trapezoid rule over
    /// distinct recall values.
    #[default]
    Envelope,
    /// Mean envelope precision sampled at recall 0.00, 0.01, ..., 1.00.
    Interpolated101,
}

impl fmt::Display for ApMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApMethod::Envelope => write!(f, "envelope"),
            ApMethod::Interpolated101 => write!(f, "interpolated101"),
        }
    }
}

impl FromStr for ApMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "envelope" => Ok(ApMethod::Envelope),
            "interpolated101" | "101" => Ok(ApMethod::Interpolated101),
            other => Err(format!(
                "unknown AP method '{}', expected 'envelope' or 'interpolated101'",
                other
            )),
        }
    }
}

/// Average Precision for one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApResult {
    pub class_id: usize,
    pub class_name: String,
    /// `None` when the class has no ground truth; such classes are excluded
    /// from the mean.
    pub ap: Option<f64>,
    /// Number of ground-truth boxes of this class
    pub gt_count: usize,
    /// Number of detections of this class that were evaluated
    pub detection_count: usize,
    /// Detections labeled true positive
    pub true_positives: usize,
    /// Precision over all detections of the class
    pub precision: f64,
    /// Recall over all detections of the class
    pub recall: f64,
}

impl ApResult {
    /// Whether the class is left out of the mean.
    pub fn is_excluded(&self) -> bool {
        self.ap.is_none()
    }
}

/// Per-class AP values and their mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapReport {
    /// One entry per registry class, in id order
    pub per_class: Vec<ApResult>,
    /// Mean AP over classes with a defined AP
    pub mean: f64,
    /// Number of classes that contributed to the mean
    pub evaluated_classes: usize,
    pub iou_threshold: f64,
    pub ap_method: ApMethod,
}

impl MapReport {
    /// Result for one class.
    pub fn class(&self, class_id: usize) -> Option<&ApResult> {
        self.per_class.iter().find(|r| r.class_id == class_id)
    }

    /// AP for one class, `None` if the class is unknown or excluded.
    pub fn ap(&self, class_id: usize) -> Option<f64> {
        self.class(class_id).and_then(|r| r.ap)
    }

    /// Classes left out of the mean because they have no ground truth.
    pub fn excluded(&self) -> impl Iterator<Item = &ApResult> {
        self.per_class.iter().filter(|r| r.is_excluded())
    }
}
