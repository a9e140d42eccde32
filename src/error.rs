//! Error types for the map-eval library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for map-eval operations.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Error types that can occur while loading inputs or evaluating detections.
///
/// Every variant is fatal to an evaluation run: inputs are validated before
/// any matching happens, so a run either produces a full report or nothing.
#[derive(Error, Debug)]
pub enum EvalError {
    /// Error during I/O operations on an input or output file.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during JSON serialization of results.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed or empty classes file, or a duplicate class name.
    #[error("Format error in {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    /// Malformed annotation or detection line.
    #[error("Parse error in {} at line {line}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// A class id outside the registry's range.
    #[error("Class mismatch: class id {class_id} is outside the registry (0..{num_classes}) in {context}")]
    ClassMismatch {
        class_id: usize,
        num_classes: usize,
        context: String,
    },

    /// A detection with a non-finite score or malformed box.
    #[error("Invalid detection: {0}")]
    InvalidDetection(String),

    /// Annotation input produced zero images.
    #[error("Empty dataset: {} contains no images", .0.display())]
    EmptyDataset(PathBuf),

    /// Invalid IoU or score threshold.
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// Invalid or incomplete configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EvalError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EvalError::Io {
            path: path.into(),
            source,
        }
    }

    /// Line number for parse errors, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            EvalError::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}
