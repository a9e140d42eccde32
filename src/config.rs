//! Evaluation configuration.
//!
//! Loaded from a TOML file, then overridden by command-line flags:
//!
//! ```toml
//! classes_path = "model_data/classes.txt"
//! annotation_file = "data/test.txt"
//! detections_file = "result/detections.txt"
//! iou_threshold = 0.5
//! score_threshold = 0.1
//! ap_method = "envelope"
//! save_result = true
//! ```

use crate::detector::AdapterOptions;
use crate::error::{EvalError, Result};
use crate::evaluator::EvalOptions;
use crate::types::ApMethod;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default location of the classes file.
pub const DEFAULT_CLASSES_PATH: &str = "model_data/voc_classes.txt";

/// Default directory for saved results.
pub const DEFAULT_RESULT_DIR: &str = "result";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvalConfig {
    pub iou_threshold: f64,
    pub score_threshold: Option<f64>,
    pub ap_method: ApMethod,
    pub classes_path: PathBuf,
    pub annotation_file: Option<PathBuf>,
    pub detections_file: Option<PathBuf>,
    /// Passed to the detector adapter; no effect on the metric
    pub resume: bool,
    /// Write the report and raw detections to `result_dir`
    pub save_result: bool,
    pub result_dir: PathBuf,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.5,
            score_threshold: None,
            ap_method: ApMethod::default(),
            classes_path: PathBuf::from(DEFAULT_CLASSES_PATH),
            annotation_file: None,
            detections_file: None,
            resume: false,
            save_result: false,
            result_dir: PathBuf::from(DEFAULT_RESULT_DIR),
        }
    }
}

impl EvalConfig {
    /// Load configuration from a TOML file. Missing keys take defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
        Self::from_toml_str(&text)
            .map_err(|e| EvalError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| EvalError::Config(e.to_string()))
    }

    /// Check thresholds and that every required input path is set.
    pub fn validate(&self) -> Result<()> {
        self.eval_options().validate()?;
        self.annotation_path()?;
        self.detections_path()?;
        Ok(())
    }

    pub fn annotation_path(&self) -> Result<&Path> {
        self.annotation_file
            .as_deref()
            .ok_or_else(|| EvalError::Config("annotation_file is not specified".to_string()))
    }

    pub fn detections_path(&self) -> Result<&Path> {
        self.detections_file
            .as_deref()
            .ok_or_else(|| EvalError::Config("detections_file is not specified".to_string()))
    }

    pub fn eval_options(&self) -> EvalOptions {
        EvalOptions {
            iou_threshold: self.iou_threshold,
            score_threshold: self.score_threshold,
            ap_method: self.ap_method,
        }
    }

    pub fn adapter_options(&self) -> AdapterOptions {
        AdapterOptions {
            resume: self.resume,
        }
    }
}
