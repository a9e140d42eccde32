//! # map-eval
//!
//! A Rust library for evaluating object detectors with mean Average Precision
//! (mAP) against ground-truth annotations stored as plain text.
//!
//! The evaluation pipeline:
//! - **Class registry**: class names, one per line; line order gives the id
//! - **Annotation loader**: ground-truth boxes per image
//! - **Detector adapter**: supplies predictions per image (inference itself
//!   is outside this crate)
//! - **Matcher**: greedy per-class assignment of detections to ground truth
//! - **PR curve, AP, mAP**: precision-recall per rank, area under the
//!   precision envelope, mean over classes that have ground truth
//!
//! ## Quick Start
//!
//! ```rust
//! use map_eval::detector::{collect_detections, AdapterOptions, DetectionFile};
//! use map_eval::evaluator::{evaluate, EvalOptions};
//! use map_eval::loader::parse_annotations;
//! use map_eval::registry::ClassRegistry;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ClassRegistry::parse("dock\nrobot\n")?;
//! let annotations = parse_annotations("img1.jpg 0,0,10,10,1\n", &registry)?;
//! let mut detector = DetectionFile::parse("img1.jpg 0,0,10,10,1,0.9\n", AdapterOptions::default())?;
//!
//! let detections = collect_detections(&mut detector, &annotations, &registry)?;
//! let report = evaluate(&registry, &annotations, &detections, &EvalOptions::default())?;
//!
//! assert_eq!(report.ap(1), Some(1.0));
//! assert_eq!(report.ap(0), None); // no ground truth: excluded from the mean
//! assert_eq!(report.mean, 1.0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Annotation Format
//!
//! One line per image, boxes in corner format followed by the class id:
//!
//! ```text
//! path/to/img1.jpg 50,100,150,200,0 30,50,200,120,3
//! path/to/img2.jpg 120,300,250,600,2
//! ```
//!
//! Detection files use the same layout with a trailing score per box.

pub mod error;
pub mod types;
pub mod registry;
pub mod loader;
pub mod detector;
pub mod threshold;
pub mod metrics;
pub mod matching;
pub mod stats;
pub mod evaluator;
pub mod config;
pub mod report;

// Re-export commonly used types and functions
pub use error::{EvalError, Result};
pub use types::{
    ApMethod, ApResult, BoundingBox, ClassLabel, Detection, GroundTruthBox, MapReport,
    MatchOutcome, Prediction, PrecisionRecallPoint,
};
pub use registry::ClassRegistry;
pub use loader::{load_annotations, parse_annotations, Annotations};
pub use detector::{collect_detections, AdapterOptions, DetectionFile, DetectorAdapter};
pub use evaluator::{evaluate, EvalOptions};
pub use config::EvalConfig;
pub use report::{render_table, ResultWriter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_compiles() {
        // Basic smoke test to ensure the library compiles
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(bbox.is_valid());
    }
}
