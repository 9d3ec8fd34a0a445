//! Cloudmark Data Crate
//!
//! Point cloud data for the annotation model: derived geometry, colour
//! blending, the pose state, label definitions, configuration and file
//! handlers. This crate is GPU-agnostic.

pub mod color;
pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod labels;
pub mod transform;
pub mod types;

pub use config::{CloudConfig, ConfigProvider};
pub use error::{DataError, Result};
pub use io::{HandlerRegistry, PointCloudHandler, SegmentationHandler};
pub use labels::{LabelDefinition, read_label_definition};
pub use transform::{Axis, Pose, TransformState};
pub use types::{CloudData, ColorSource, DisplayMode, LabelIndex, Perspective, RawCloud};
