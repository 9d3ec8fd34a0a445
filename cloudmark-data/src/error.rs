//! Error types shared by the data layer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while validating, deriving or reading point cloud data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("{what} has {actual} entries but the cloud has {expected} points")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Point {point} carries label {label} which is not a defined class")]
    UnknownLabelIndex { point: usize, label: u32 },

    #[error("Label colour mix ratio must be finite, got {0}")]
    InvalidMixRatio(f32),

    #[error("Point cloud has no points")]
    EmptyCloud,

    #[error("No handler registered for file suffix {0:?}")]
    UnsupportedFormat(String),

    #[error("Invalid label definition: {0}")]
    InvalidLabelDefinition(String),

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DataError {
    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        DataError::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T, E = DataError> = std::result::Result<T, E>;
