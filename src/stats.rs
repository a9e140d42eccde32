//! Dataset statistics for an evaluation run
//!
//! Counts of images, ground-truth boxes and detections, overall and per
//! class, gathered before matching.

use crate::loader::Annotations;
use crate::registry::ClassRegistry;
use crate::types::Detection;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

/// Counts describing the evaluated inputs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    /// Number of annotated images
    pub images: usize,

    /// Images with no ground-truth boxes
    pub images_without_ground_truth: usize,

    /// Images on which the detector found nothing
    pub images_without_detections: usize,

    /// Total ground-truth boxes
    pub ground_truth_boxes: usize,

    /// Total detections evaluated
    pub detections: usize,

    /// Ground-truth boxes per class id
    pub ground_truth_per_class: Vec<usize>,

    /// Detections per class id
    pub detections_per_class: Vec<usize>,
}

impl DatasetStats {
    /// Create a new `DatasetStats` with all counters at zero
    pub fn new(num_classes: usize) -> Self {
        Self {
            ground_truth_per_class: vec![0; num_classes],
            detections_per_class: vec![0; num_classes],
            ..Self::default()
        }
    }

    /// Gather counts from loaded annotations and collected detections
    ///
    /// Class ids out of the registry's range are not counted; they are
    /// rejected before stats are gathered.
    pub fn collect(annotations: &Annotations, detections: &[Detection], registry: &ClassRegistry) -> Self {
        let mut stats = Self::new(registry.len());

        stats.images = annotations.len();
        for image in annotations.images() {
            if image.boxes.is_empty() {
                stats.images_without_ground_truth += 1;
            }
            for gt in &image.boxes {
                stats.add_ground_truth(gt.class_id);
            }
        }

        let detected: HashSet<&str> = detections.iter().map(|d| d.image_id.as_str()).collect();
        stats.images_without_detections = annotations
            .images()
            .iter()
            .filter(|img| !detected.contains(img.image_id.as_str()))
            .count();

        for det in detections {
            stats.add_detection(det.class_id);
        }

        stats
    }

    /// Record one ground-truth box
    pub fn add_ground_truth(&mut self, class_id: usize) {
        self.ground_truth_boxes += 1;
        if let Some(count) = self.ground_truth_per_class.get_mut(class_id) {
            *count += 1;
        }
    }

    /// Record one detection
    pub fn add_detection(&mut self, class_id: usize) {
        self.detections += 1;
        if let Some(count) = self.detections_per_class.get_mut(class_id) {
            *count += 1;
        }
    }

    pub fn gt_count(&self, class_id: usize) -> usize {
        self.ground_truth_per_class.get(class_id).copied().unwrap_or(0)
    }

    pub fn detection_count(&self, class_id: usize) -> usize {
        self.detections_per_class.get(class_id).copied().unwrap_or(0)
    }

    /// Number of classes with at least one ground-truth box
    pub fn classes_with_ground_truth(&self) -> usize {
        self.ground_truth_per_class.iter().filter(|&&c| c > 0).count()
    }

    /// Number of classes with at least one detection
    pub fn detected_classes(&self) -> usize {
        self.detections_per_class.iter().filter(|&&c| c > 0).count()
    }

    /// Emit the summary through the log
    pub fn log_summary(&self) {
        info!(
            images = self.images,
            ground_truth = self.ground_truth_boxes,
            detections = self.detections,
            classes_with_ground_truth = self.classes_with_ground_truth(),
            detected_classes = self.detected_classes(),
            "dataset summary"
        );
    }

    /// Get a formatted string summary of the statistics
    pub fn summary_string(&self) -> String {
        format!(
            "DatasetStats {{ images: {}, ground_truth: {}, detections: {}, classes_with_ground_truth: {}, detected_classes: {} }}",
            self.images,
            self.ground_truth_boxes,
            self.detections,
            self.classes_with_ground_truth(),
            self.detected_classes()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_annotations;
    use crate::types::BoundingBox;

    #[test]
    fn test_new_stats_are_zero() {
        let stats = DatasetStats::new(3);
        assert_eq!(stats.ground_truth_boxes, 0);
        assert_eq!(stats.ground_truth_per_class, vec![0, 0, 0]);
        assert_eq!(stats.classes_with_ground_truth(), 0);
    }

    #[test]
    fn test_collect() {
        let registry = ClassRegistry::parse("dock\nrobot").unwrap();
        let annotations =
            parse_annotations("a.jpg 0,0,1,1,1 0,0,2,2,1\nb.jpg\nc.jpg 0,0,1,1,0\n", &registry)
                .unwrap();
        let detections = vec![
            Detection::new("a.jpg", 1, BoundingBox::new(0.0, 0.0, 1.0, 1.0), 0.9),
            Detection::new("b.jpg", 1, BoundingBox::new(0.0, 0.0, 1.0, 1.0), 0.4),
        ];

        let stats = DatasetStats::collect(&annotations, &detections, &registry);
        assert_eq!(stats.images, 3);
        assert_eq!(stats.images_without_ground_truth, 1);
        assert_eq!(stats.images_without_detections, 1);
        assert_eq!(stats.gt_count(1), 2);
        assert_eq!(stats.gt_count(0), 1);
        assert_eq!(stats.detection_count(1), 2);
        assert_eq!(stats.detected_classes(), 1);
        assert_eq!(stats.classes_with_ground_truth(), 2);
    }

    #[test]
    fn test_out_of_range_class_ignored() {
        let mut stats = DatasetStats::new(1);
        stats.add_detection(4);
        assert_eq!(stats.detections, 1);
        assert_eq!(stats.detection_count(4), 0);
    }

    #[test]
    fn test_summary_string() {
        let mut stats = DatasetStats::new(2);
        stats.images = 10;
        stats.add_ground_truth(0);

        let summary = stats.summary_string();
        assert!(summary.contains("images: 10"));
        assert!(summary.contains("ground_truth: 1"));
    }
}
