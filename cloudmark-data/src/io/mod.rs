//! File handlers for point clouds and segmentation labels, selected by suffix.

mod kitti;
mod ply;
mod segmentation;
mod xyz;

pub use kitti::KittiBinHandler;
pub use ply::PlyHandler;
pub use segmentation::{BinSegmentationHandler, SegmentationHandler};
pub use xyz::XyzHandler;

use crate::error::{DataError, Result};
use crate::types::{CloudData, RawCloud};
use std::path::Path;

/// Reads and writes one family of point cloud formats.
pub trait PointCloudHandler {
    /// Lower-case suffixes without the dot, e.g. `["ply"]`.
    fn extensions(&self) -> &[&'static str];

    /// Read positions and, if the file has them, colours in [0, 1].
    fn read_point_cloud(&self, path: &Path) -> Result<RawCloud>;

    /// Persist the cloud as given; formats without colour or label fields
    /// drop them.
    fn write_point_cloud(&self, path: &Path, cloud: CloudData<'_>) -> Result<()>;
}

/// Lower-case suffix of a path, without the dot.
pub fn suffix_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// Registered handlers, looked up by file suffix.
pub struct HandlerRegistry {
    point_clouds: Vec<Box<dyn PointCloudHandler>>,
    segmentations: Vec<Box<dyn SegmentationHandler>>,
}

impl HandlerRegistry {
    /// A registry without handlers.
    pub fn empty() -> Self {
        Self {
            point_clouds: Vec::new(),
            segmentations: Vec::new(),
        }
    }

    pub fn register_point_cloud(&mut self, handler: impl PointCloudHandler + 'static) {
        self.point_clouds.push(Box::new(handler));
    }

    pub fn register_segmentation(&mut self, handler: impl SegmentationHandler + 'static) {
        self.segmentations.push(Box::new(handler));
    }

    /// Handler for the suffix of `path`; later registrations win.
    pub fn point_cloud_handler(&self, path: &Path) -> Result<&dyn PointCloudHandler> {
        let suffix = suffix_of(path);
        self.point_clouds
            .iter()
            .rev()
            .find(|h| h.extensions().contains(&suffix.as_str()))
            .map(|h| h.as_ref())
            .ok_or(DataError::UnsupportedFormat(suffix))
    }

    pub fn segmentation_handler(&self, path: &Path) -> Result<&dyn SegmentationHandler> {
        let suffix = suffix_of(path);
        self.segmentations
            .iter()
            .rev()
            .find(|h| h.extensions().contains(&suffix.as_str()))
            .map(|h| h.as_ref())
            .ok_or(DataError::UnsupportedFormat(suffix))
    }

    /// All point cloud suffixes that can be opened.
    pub fn point_cloud_extensions(&self) -> Vec<&'static str> {
        self.point_clouds
            .iter()
            .flat_map(|h| h.extensions().iter().copied())
            .collect()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register_point_cloud(PlyHandler);
        registry.register_point_cloud(KittiBinHandler);
        registry.register_point_cloud(XyzHandler);
        registry.register_segmentation(BinSegmentationHandler);
        registry
    }
}
