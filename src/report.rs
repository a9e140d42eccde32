//! Result rendering and persistence.

use crate::error::{EvalError, Result};
use crate::types::{Detection, MapReport, Prediction};
use serde::Serialize;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the JSON report inside the result directory.
pub const REPORT_FILE: &str = "map_report.json";

/// File name of the text table inside the result directory.
pub const TABLE_FILE: &str = "map_report.txt";

/// File name of the raw detections inside the result directory.
pub const DETECTIONS_FILE: &str = "detections.json";

/// Render the report as a text table.
///
/// Classes without ground truth show `excluded` instead of an AP.
///
/// # Example
///
/// ```
/// use map_eval::report::render_table;
/// use map_eval::types::{ApMethod, ApResult, MapReport};
///
/// let report = MapReport {
///     per_class: vec![ApResult {
///         class_id: 0,
///         class_name: "dock".to_string(),
///         ap: None,
///         gt_count: 0,
///         detection_count: 0,
///         true_positives: 0,
///         precision: 0.0,
///         recall: 0.0,
///     }],
///     mean: 0.0,
///     evaluated_classes: 0,
///     iou_threshold: 0.5,
///     ap_method: ApMethod::Envelope,
/// };
/// assert!(render_table(&report).contains("excluded"));
/// ```
pub fn render_table(report: &MapReport) -> String {
    let name_width = report
        .per_class
        .iter()
        .map(|r| r.class_name.chars().count())
        .max()
        .unwrap_or(0)
        .max(5);

    let mut out = String::new();
    out.push_str(&format!(
        "{:<w$} {:>6} {:>6} {:>6} {:>9} {:>9} {:>9}\n",
        "Class",
        "GT",
        "Det",
        "TP",
        "Precision",
        "Recall",
        "AP",
        w = name_width
    ));

    for r in &report.per_class {
        let ap = match r.ap {
            Some(ap) => format!("{:.4}", ap),
            None => "excluded".to_string(),
        };
        out.push_str(&format!(
            "{:<w$} {:>6} {:>6} {:>6} {:>9.4} {:>9.4} {:>9}\n",
            r.class_name,
            r.gt_count,
            r.detection_count,
            r.true_positives,
            r.precision,
            r.recall,
            ap,
            w = name_width
        ));
    }

    out.push_str(&"-".repeat(name_width + 50));
    out.push('\n');
    out.push_str(&format!(
        "mAP@{:.2} ({}): {:.4} over {} of {} classes\n",
        report.iou_threshold,
        report.ap_method,
        report.mean,
        report.evaluated_classes,
        report.per_class.len()
    ));
    out
}

impl fmt::Display for MapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_table(self))
    }
}

/// Detections of one image, in collection order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageDetections {
    pub image_id: String,
    pub detections: Vec<Prediction>,
}

/// Group detections by image, keeping first-seen image order.
pub fn group_by_image(detections: &[Detection]) -> Vec<ImageDetections> {
    let mut groups: Vec<ImageDetections> = Vec::new();
    for det in detections {
        let prediction = Prediction::new(det.class_id, det.bbox, det.score);
        match groups.iter_mut().rev().find(|g| g.image_id == det.image_id) {
            Some(group) => group.detections.push(prediction),
            None => groups.push(ImageDetections {
                image_id: det.image_id.clone(),
                detections: vec![prediction],
            }),
        }
    }
    groups
}

/// Writes results under a directory, creating it on first write.
#[derive(Debug, Clone)]
pub struct ResultWriter {
    dir: PathBuf,
}

impl ResultWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the report as JSON and as a text table. Returns the JSON path.
    pub fn write_report(&self, report: &MapReport) -> Result<PathBuf> {
        let json_path = self.write_json(REPORT_FILE, report)?;

        let table_path = self.dir.join(TABLE_FILE);
        fs::write(&table_path, render_table(report)).map_err(|e| EvalError::io(&table_path, e))?;

        info!(path = %json_path.display(), "saved report");
        Ok(json_path)
    }

    /// Write the raw detections grouped by image.
    pub fn write_detections(&self, detections: &[Detection]) -> Result<PathBuf> {
        let path = self.write_json(DETECTIONS_FILE, &group_by_image(detections))?;
        info!(path = %path.display(), count = detections.len(), "saved detections");
        Ok(path)
    }

    fn write_json<T: Serialize + ?Sized>(&self, file_name: &str, value: &T) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| EvalError::io(&self.dir, e))?;

        let path = self.dir.join(file_name);
        let file = File::create(&path).map_err(|e| EvalError::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush().map_err(|e| EvalError::io(&path, e))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ApMethod, ApResult, BoundingBox};

    fn report() -> MapReport {
        MapReport {
            per_class: vec![
                ApResult {
                    class_id: 0,
                    class_name: "dock".to_string(),
                    ap: None,
                    gt_count: 0,
                    detection_count: 2,
                    true_positives: 0,
                    precision: 0.0,
                    recall: 0.0,
                },
                ApResult {
                    class_id: 1,
                    class_name: "robot".to_string(),
                    ap: Some(1.0),
                    gt_count: 1,
                    detection_count: 1,
                    true_positives: 1,
                    precision: 1.0,
                    recall: 1.0,
                },
            ],
            mean: 1.0,
            evaluated_classes: 1,
            iou_threshold: 0.5,
            ap_method: ApMethod::Envelope,
        }
    }

    #[test]
    fn test_render_table() {
        let table = render_table(&report());
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[1].starts_with("dock"));
        assert!(lines[1].ends_with("excluded"));
        assert!(lines[2].ends_with("1.0000"));
        assert!(table.contains("mAP@0.50 (envelope): 1.0000 over 1 of 2 classes"));
    }

    #[test]
    fn test_display_matches_table() {
        let report = report();
        assert_eq!(report.to_string(), render_table(&report));
    }

    #[test]
    fn test_report_json_keeps_excluded_marking() {
        let json = serde_json::to_value(report()).unwrap();
        assert!(json["per_class"][0]["ap"].is_null());
        assert_eq!(json["per_class"][1]["ap"], 1.0);
        assert_eq!(json["ap_method"], "envelope");
    }

    #[test]
    fn test_group_by_image() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let detections = vec![
            Detection::new("b.jpg", 0, bbox, 0.1),
            Detection::new("a.jpg", 1, bbox, 0.2),
            Detection::new("b.jpg", 1, bbox, 0.3),
        ];
        let groups = group_by_image(&detections);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].image_id, "b.jpg");
        assert_eq!(groups[0].detections.len(), 2);
        assert_eq!(groups[1].detections[0].score, 0.2);
    }

    #[test]
    fn test_table_aligns_non_ascii_names() {
        let mut report = report();
        report.per_class[0].class_name = "chaise-longue-été".to_string();
        report.per_class[1].class_name = "робот".to_string();

        let table = render_table(&report);
        let widths: Vec<usize> = table.lines().take(3).map(|l| l.chars().count()).collect();
        assert_eq!(widths[0], widths[1]);
        assert_eq!(widths[1], widths[2]);
    }
}
