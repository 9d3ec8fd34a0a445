//! Cloudmark Core
//!
//! The point cloud model of the annotation tool: loads a cloud and its
//! segmentation, derives geometry and the initial pose, keeps the label
//! colour cache and drives the GPU buffers that draw it.

pub mod error;
pub mod input;
pub mod point_cloud;
pub mod summary;

pub use error::PointCloudError;
pub use input::CloudInput;
pub use point_cloud::{PointCloud, Segmentation};
pub use summary::CloudSummary;
