use cloudmark_data::{LabelDefinition, LabelIndex, Perspective};
use glam::Vec3;
use std::path::PathBuf;

/// Raw arrays and metadata a [`PointCloud`](crate::PointCloud) is built from.
#[derive(Debug, Clone, Default)]
pub struct CloudInput {
    pub path: PathBuf,
    pub points: Vec<Vec3>,
    pub colors: Option<Vec<Vec3>>,
    pub labels: Option<Vec<LabelIndex>>,
    pub label_definition: LabelDefinition,
    pub perspective: Option<Perspective>,
}

impl CloudInput {
    pub fn new(path: impl Into<PathBuf>, points: Vec<Vec3>) -> Self {
        Self {
            path: path.into(),
            points,
            ..Default::default()
        }
    }

    pub fn with_colors(mut self, colors: Vec<Vec3>) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn with_labels(mut self, labels: Vec<LabelIndex>) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn with_label_definition(mut self, definition: LabelDefinition) -> Self {
        self.label_definition = definition;
        self
    }

    /// Start from a stored pose instead of the computed one.
    pub fn with_perspective(mut self, perspective: Perspective) -> Self {
        self.perspective = Some(perspective);
        self
    }
}
