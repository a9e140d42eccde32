//! Detector adapters: the boundary between inference and evaluation.
//!
//! The evaluation core never runs a model. It asks a [`DetectorAdapter`] for
//! the predictions on each annotated image and evaluates whatever comes back.

use crate::error::{EvalError, Result};
use crate::loader::{Annotations, BoxGroup};
use crate::registry::ClassRegistry;
use crate::types::{Detection, Prediction};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Source of predictions for one image at a time.
pub trait DetectorAdapter {
    /// Predictions for `image_id`. An empty list means nothing was detected.
    fn detect(&mut self, image_id: &str) -> Result<Vec<Prediction>>;
}

impl<F> DetectorAdapter for F
where
    F: FnMut(&str) -> Result<Vec<Prediction>>,
{
    fn detect(&mut self, image_id: &str) -> Result<Vec<Prediction>> {
        self(image_id)
    }
}

/// Construction options for detector adapters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdapterOptions {
    /// Reuse a previously trained artifact instead of starting fresh. Has no
    /// effect on evaluation math.
    pub resume: bool,
}

/// Precomputed detections read from a text file.
///
/// Same layout as the annotation file with a trailing score per group:
///
/// ```text
/// images/000001.jpg 94,115,203,232,0,0.98 82,64,154,128,1,0.41
/// ```
#[derive(Debug, Clone, Default)]
pub struct DetectionFile {
    by_image: HashMap<String, Vec<Prediction>>,
    options: AdapterOptions,
}

impl DetectionFile {
    /// Read detections from a file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read and `Parse` for a malformed
    /// group or a non-finite score.
    pub fn open<P: AsRef<Path>>(path: P, options: AdapterOptions) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
        let file = Self::parse_with_path(&text, path, options)?;
        info!(
            path = %path.display(),
            images = file.by_image.len(),
            detections = file.len(),
            resume = options.resume,
            "loaded detections"
        );
        Ok(file)
    }

    /// Parse detections from a string.
    ///
    /// # Example
    ///
    /// ```
    /// use map_eval::detector::{AdapterOptions, DetectionFile, DetectorAdapter};
    ///
    /// let mut file = DetectionFile::parse("a.jpg 0,0,10,10,1,0.9\n", AdapterOptions::default()).unwrap();
    /// assert_eq!(file.detect("a.jpg").unwrap().len(), 1);
    /// assert!(file.detect("b.jpg").unwrap().is_empty());
    /// ```
    pub fn parse(text: &str, options: AdapterOptions) -> Result<Self> {
        Self::parse_with_path(text, Path::new("<memory>"), options)
    }

    fn parse_with_path(text: &str, path: &Path, options: AdapterOptions) -> Result<Self> {
        let mut by_image: HashMap<String, Vec<Prediction>> = HashMap::new();

        for (idx, line) in text.lines().enumerate() {
            let mut tokens = line.split_whitespace();
            let Some(image_id) = tokens.next() else {
                continue;
            };

            let predictions = by_image.entry(image_id.to_string()).or_default();
            for group in tokens {
                let fields = BoxGroup::parse(group, 6, path, idx + 1)?;
                let score = fields.score.ok_or_else(|| EvalError::Parse {
                    path: PathBuf::from(path),
                    line: idx + 1,
                    reason: format!("missing score in '{}'", group),
                })?;
                predictions.push(Prediction::new(fields.class_id, fields.bbox, score));
            }
        }

        Ok(Self { by_image, options })
    }

    /// Total number of detections in the file.
    pub fn len(&self) -> usize {
        self.by_image.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn options(&self) -> AdapterOptions {
        self.options
    }

    /// Images that have detections but no annotation line; these are never
    /// queried and do not affect the metric.
    pub fn orphan_images(&self, annotations: &Annotations) -> Vec<String> {
        let mut orphans: Vec<String> = self
            .by_image
            .keys()
            .filter(|id| !annotations.contains_image(id))
            .cloned()
            .collect();
        orphans.sort();
        orphans
    }
}

impl DetectorAdapter for DetectionFile {
    fn detect(&mut self, image_id: &str) -> Result<Vec<Prediction>> {
        Ok(self.by_image.get(image_id).cloned().unwrap_or_default())
    }
}

/// Run `adapter` over every annotated image in file order and collect the
/// detections.
///
/// The output order (image order, then adapter order) is the tie-break order
/// for detections with equal scores.
///
/// # Errors
///
/// Propagates adapter errors, and returns `ClassMismatch` for a prediction
/// whose class id is not in the registry and `InvalidDetection` for a
/// non-finite score or malformed box.
pub fn collect_detections<A: DetectorAdapter + ?Sized>(
    adapter: &mut A,
    annotations: &Annotations,
    registry: &ClassRegistry,
) -> Result<Vec<Detection>> {
    let mut detections = Vec::new();

    for image in annotations.images() {
        let predictions = adapter.detect(&image.image_id)?;
        debug!(image = %image.image_id, count = predictions.len(), "found boxes");

        for prediction in predictions {
            registry.check(prediction.class_id, || {
                format!("detections for {}", image.image_id)
            })?;
            validate_prediction(&prediction, &image.image_id)?;
            detections.push(prediction.into_detection(&image.image_id));
        }
    }

    Ok(detections)
}

fn validate_prediction(prediction: &Prediction, image_id: &str) -> Result<()> {
    if !prediction.score.is_finite() {
        return Err(EvalError::InvalidDetection(format!(
            "non-finite score {} on {}",
            prediction.score, image_id
        )));
    }
    if !prediction.bbox.is_valid() {
        return Err(EvalError::InvalidDetection(format!(
            "malformed box {:?} on {}",
            prediction.bbox, image_id
        )));
    }
    Ok(())
}
