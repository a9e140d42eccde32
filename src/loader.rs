//! Text loading utilities for ground-truth annotation files.
//!
//! Each line holds one image followed by its boxes:
//!
//! ```text
//! images/000001.jpg 100,120,200,235,0 85,63,156,128,1
//! images/000002.jpg
//! ```

use crate::error::{EvalError, Result};
use crate::registry::ClassRegistry;
use crate::types::{BoundingBox, GroundTruthBox};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Ground truth for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub image_id: String,
    pub boxes: Vec<GroundTruthBox>,
}

/// Parsed annotation file. Images keep file order.
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    images: Vec<ImageRecord>,
    index: HashMap<String, usize>,
}

impl Annotations {
    /// Images in file order.
    pub fn images(&self) -> &[ImageRecord] {
        &self.images
    }

    pub fn image(&self, image_id: &str) -> Option<&ImageRecord> {
        self.index.get(image_id).map(|&i| &self.images[i])
    }

    pub fn contains_image(&self, image_id: &str) -> bool {
        self.index.contains_key(image_id)
    }

    /// Number of images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Total number of ground-truth boxes across images.
    pub fn total_boxes(&self) -> usize {
        self.images.iter().map(|img| img.boxes.len()).sum()
    }

    /// All boxes in file order.
    pub fn boxes(&self) -> impl Iterator<Item = &GroundTruthBox> {
        self.images.iter().flat_map(|img| img.boxes.iter())
    }

    /// Boxes of one class in file order. The position in the returned list is
    /// the box's index for matching tie-breaks.
    pub fn boxes_for_class(&self, class_id: usize) -> Vec<GroundTruthBox> {
        self.boxes()
            .filter(|b| b.class_id == class_id)
            .cloned()
            .collect()
    }

    /// Number of ground-truth boxes of one class.
    pub fn gt_count(&self, class_id: usize) -> usize {
        self.boxes().filter(|b| b.class_id == class_id).count()
    }

    fn push(&mut self, record: ImageRecord) {
        match self.index.get(&record.image_id) {
            Some(&i) => {
                warn!(image = %record.image_id, "image listed more than once, merging its boxes");
                self.images[i].boxes.extend(record.boxes);
            }
            None => {
                self.index.insert(record.image_id.clone(), self.images.len());
                self.images.push(record);
            }
        }
    }
}

/// Load ground-truth annotations from a file.
///
/// # Errors
///
/// Returns `Io` if the file cannot be read, `Parse` for a malformed box
/// group, `ClassMismatch` for a class id the registry does not know, and
/// `EmptyDataset` if the file lists no images.
///
/// # Example
///
/// ```no_run
/// use map_eval::loader::load_annotations;
/// use map_eval::registry::ClassRegistry;
///
/// let registry = ClassRegistry::load("classes.txt").unwrap();
/// let annotations = load_annotations("test_annotations.txt", &registry).unwrap();
/// println!("Loaded {} images", annotations.len());
/// ```
pub fn load_annotations<P: AsRef<Path>>(path: P, registry: &ClassRegistry) -> Result<Annotations> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
    let annotations = parse_annotations_with_path(&text, registry, path)?;
    info!(
        path = %path.display(),
        images = annotations.len(),
        boxes = annotations.total_boxes(),
        "loaded annotations"
    );
    Ok(annotations)
}

/// Parse ground-truth annotations from a string.
///
/// # Example
///
/// ```
/// use map_eval::loader::parse_annotations;
/// use map_eval::registry::ClassRegistry;
///
/// let registry = ClassRegistry::parse("dock\nrobot").unwrap();
/// let annotations = parse_annotations("img1.jpg 0,0,10,10,1\nimg2.jpg\n", &registry).unwrap();
/// assert_eq!(annotations.len(), 2);
/// assert_eq!(annotations.gt_count(1), 1);
/// ```
pub fn parse_annotations(text: &str, registry: &ClassRegistry) -> Result<Annotations> {
    parse_annotations_with_path(text, registry, Path::new("<memory>"))
}

fn parse_annotations_with_path(
    text: &str,
    registry: &ClassRegistry,
    path: &Path,
) -> Result<Annotations> {
    let mut annotations = Annotations::default();

    for (idx, line) in text.lines().enumerate() {
        let line_number = idx + 1;
        let mut tokens = line.split_whitespace();
        let Some(image_id) = tokens.next() else {
            continue;
        };

        let mut boxes = Vec::new();
        for group in tokens {
            let fields = BoxGroup::parse(group, 5, path, line_number)?;
            registry.check(fields.class_id, || {
                format!("{} line {}", path.display(), line_number)
            })?;
            boxes.push(GroundTruthBox {
                image_id: image_id.to_string(),
                class_id: fields.class_id,
                bbox: fields.bbox,
            });
        }

        annotations.push(ImageRecord {
            image_id: image_id.to_string(),
            boxes,
        });
    }

    if annotations.is_empty() {
        return Err(EvalError::EmptyDataset(PathBuf::from(path)));
    }

    Ok(annotations)
}

/// One `x1,y1,x2,y2,cls[,score]` group.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BoxGroup {
    pub bbox: BoundingBox,
    pub class_id: usize,
    pub score: Option<f64>,
}

impl BoxGroup {
    /// Parse a group with `expected` fields: 5 for ground truth, 6 when a
    /// trailing score is present.
    pub(crate) fn parse(group: &str, expected: usize, path: &Path, line: usize) -> Result<Self> {
        let parse_err = |reason: String| EvalError::Parse {
            path: PathBuf::from(path),
            line,
            reason,
        };

        let fields: Vec<&str> = group.split(',').collect();
        if fields.len() != expected {
            return Err(parse_err(format!(
                "box group '{}' has {} fields, expected {}",
                group,
                fields.len(),
                expected
            )));
        }

        let mut coords = [0.0f64; 4];
        for (slot, raw) in coords.iter_mut().zip(&fields[..4]) {
            *slot = raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| parse_err(format!("bad coordinate '{}' in '{}'", raw, group)))?;
        }

        let bbox = BoundingBox::new(coords[0], coords[1], coords[2], coords[3]);
        if !bbox.is_valid() {
            return Err(parse_err(format!(
                "box '{}' has x2 < x1 or y2 < y1",
                group
            )));
        }

        let class_id = fields[4]
            .parse::<usize>()
            .map_err(|_| parse_err(format!("bad class id '{}' in '{}'", fields[4], group)))?;

        let score = match fields.get(5) {
            Some(raw) => Some(
                raw.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| parse_err(format!("bad score '{}' in '{}'", raw, group)))?,
            ),
            None => None,
        };

        Ok(Self {
            bbox,
            class_id,
            score,
        })
    }
}
