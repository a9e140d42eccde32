//! Class registry loaded from a classes file.
//!
//! One class name per line; the position among non-empty lines is the id.

use crate::error::{EvalError, Result};
use crate::types::ClassLabel;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Ordered, read-only set of class labels.
#[derive(Debug, Clone)]
pub struct ClassRegistry {
    labels: Vec<ClassLabel>,
    by_name: HashMap<String, usize>,
}

impl ClassRegistry {
    /// Load the registry from a classes file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, and `Format` if it holds no
    /// class names or repeats one.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use map_eval::registry::ClassRegistry;
    ///
    /// let registry = ClassRegistry::load("model_data/classes.txt").unwrap();
    /// println!("{} classes", registry.len());
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
        let registry = Self::parse_with_path(&text, path)?;
        info!(path = %path.display(), classes = registry.len(), "loaded class registry");
        Ok(registry)
    }

    /// Build the registry from the contents of a classes file.
    ///
    /// # Example
    ///
    /// ```
    /// use map_eval::registry::ClassRegistry;
    ///
    /// let registry = ClassRegistry::parse("dock\nrobot\n").unwrap();
    /// assert_eq!(registry.id_of("robot"), Some(1));
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with_path(text, Path::new("<memory>"))
    }

    fn parse_with_path(text: &str, path: &Path) -> Result<Self> {
        let mut labels = Vec::new();
        let mut by_name = HashMap::new();

        for name in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let id = labels.len();
            if by_name.insert(name.to_string(), id).is_some() {
                return Err(EvalError::Format {
                    path: PathBuf::from(path),
                    reason: format!("duplicate class name '{}'", name),
                });
            }
            labels.push(ClassLabel {
                id,
                name: name.to_string(),
            });
        }

        if labels.is_empty() {
            return Err(EvalError::Format {
                path: PathBuf::from(path),
                reason: "no class names found".to_string(),
            });
        }

        Ok(Self { labels, by_name })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&ClassLabel> {
        self.labels.get(id)
    }

    pub fn name(&self, id: usize) -> Option<&str> {
        self.labels.get(id).map(|l| l.name.as_str())
    }

    pub fn id_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn contains(&self, id: usize) -> bool {
        id < self.labels.len()
    }

    /// Labels in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ClassLabel> {
        self.labels.iter()
    }

    /// Fail with `ClassMismatch` if `id` is not a registered class.
    pub fn check(&self, id: usize, context: impl FnOnce() -> String) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(EvalError::ClassMismatch {
                class_id: id,
                num_classes: self.len(),
                context: context(),
            })
        }
    }
}
