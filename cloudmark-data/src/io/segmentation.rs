//! Per-point segmentation label files.

use crate::error::{DataError, Result};
use crate::types::LabelIndex;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Label value given to points of a freshly created segmentation.
pub const BACKGROUND_LABEL: LabelIndex = 0;

/// Reads and writes one segmentation label format.
pub trait SegmentationHandler {
    fn extensions(&self) -> &[&'static str];

    fn read_labels(&self, path: &Path) -> Result<Vec<LabelIndex>>;

    fn write_labels(&self, path: &Path, labels: &[LabelIndex]) -> Result<()>;

    /// Read the labels of a cloud with `num_points` points, or start an
    /// all-background segmentation when no label file exists yet.
    fn read_or_create_labels(&self, path: &Path, num_points: usize) -> Result<Vec<LabelIndex>> {
        if !path.exists() {
            info!(
                "No segmentation at {}, starting with background labels",
                path.display()
            );
            return Ok(vec![BACKGROUND_LABEL; num_points]);
        }

        let labels = self.read_labels(path)?;
        if labels.len() != num_points {
            return Err(DataError::ShapeMismatch {
                what: "segmentation labels",
                expected: num_points,
                actual: labels.len(),
            });
        }
        Ok(labels)
    }
}

/// Raw `int8` label arrays, one byte per point.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinSegmentationHandler;

impl SegmentationHandler for BinSegmentationHandler {
    fn extensions(&self) -> &[&'static str] {
        &["bin"]
    }

    fn read_labels(&self, path: &Path) -> Result<Vec<LabelIndex>> {
        let bytes = fs::read(path)?;
        bytes
            .into_iter()
            .enumerate()
            .map(|(point, byte)| {
                let value = byte as i8;
                if value < 0 {
                    warn!("Negative label {} at point {}", value, point);
                    return Err(DataError::parse(
                        path,
                        format!("negative label {value} at point {point}"),
                    ));
                }
                Ok(value as LabelIndex)
            })
            .collect()
    }

    fn write_labels(&self, path: &Path, labels: &[LabelIndex]) -> Result<()> {
        let bytes = labels
            .iter()
            .enumerate()
            .map(|(point, &label)| {
                i8::try_from(label).map(|v| v as u8).map_err(|_| {
                    DataError::parse(path, format!("label {label} at point {point} exceeds int8"))
                })
            })
            .collect::<Result<Vec<u8>>>()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        info!("Wrote {} labels to {}", labels.len(), path.display());
        Ok(())
    }
}
