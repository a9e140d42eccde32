//! Metrics calculation modules for detection evaluation.

pub mod iou;
pub mod precision_recall;
pub mod ap;
pub mod map;

pub use iou::calculate_iou;
pub use precision_recall::{build_pr_curve, calculate_precision_recall, PrecisionRecall};
pub use ap::{integrate, interpolate_precision, precision_envelope};
pub use map::{aggregate, calculate_map};
