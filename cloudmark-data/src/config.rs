//! Configuration options read by the point cloud model.
//!
//! The model only depends on [`ConfigProvider`]; [`CloudConfig`] is the JSON
//! backed implementation used by the application.

use crate::error::Result;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

/// Named options consulted while loading and drawing a point cloud.
pub trait ConfigProvider {
    /// Distance of the far clipping plane; caps the initial zoom.
    fn far_plane(&self) -> f32;
    /// Rasterised point diameter in pixels.
    fn point_size(&self) -> f32;
    /// Weight of the label colour when blending, in [0, 1].
    fn label_color_mix_ratio(&self) -> f32;
    /// Display mode switch, read every frame.
    fn color_with_label(&self) -> bool;
    /// Colourless clouds: height ramp (true) or flat colour (false).
    fn colorless_colorize(&self) -> bool;
    /// Flat colour for colourless clouds.
    fn colorless_color(&self) -> Vec3;
    /// Enables the segmentation label pipeline.
    fn segmentation(&self) -> bool;
    /// Base directory of label definition and segmentation files.
    fn label_folder(&self) -> &Path;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInterfaceConfig {
    pub far_plane: f32,
}

impl Default for UserInterfaceConfig {
    fn default() -> Self {
        Self { far_plane: 300.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointCloudConfig {
    pub point_size: f32,
    pub label_color_mix_ratio: f32,
    pub color_with_label: bool,
    pub colorless_colorize: bool,
    pub colorless_color: [f32; 3],
}

impl Default for PointCloudConfig {
    fn default() -> Self {
        Self {
            point_size: 4.0,
            label_color_mix_ratio: 0.5,
            color_with_label: true,
            colorless_colorize: true,
            colorless_color: [0.9, 0.9, 0.9],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeConfig {
    pub segmentation: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub label_folder: PathBuf,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            label_folder: PathBuf::from("labels"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    pub user_interface: UserInterfaceConfig,
    pub pointcloud: PointCloudConfig,
    pub mode: ModeConfig,
    pub file: FileConfig,
}

impl CloudConfig {
    /// Load from a JSON file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config = serde_json::from_reader(reader)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Write as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

impl ConfigProvider for CloudConfig {
    fn far_plane(&self) -> f32 {
        self.user_interface.far_plane
    }

    fn point_size(&self) -> f32 {
        self.pointcloud.point_size
    }

    fn label_color_mix_ratio(&self) -> f32 {
        self.pointcloud.label_color_mix_ratio
    }

    fn color_with_label(&self) -> bool {
        self.pointcloud.color_with_label
    }

    fn colorless_colorize(&self) -> bool {
        self.pointcloud.colorless_colorize
    }

    fn colorless_color(&self) -> Vec3 {
        Vec3::from_array(self.pointcloud.colorless_color)
    }

    fn segmentation(&self) -> bool {
        self.mode.segmentation
    }

    fn label_folder(&self) -> &Path {
        &self.file.label_folder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CloudConfig::default();
        assert_eq!(config.far_plane(), 300.0);
        assert_eq!(config.label_color_mix_ratio(), 0.5);
        assert!(!config.segmentation());
        assert_eq!(config.colorless_color(), Vec3::splat(0.9));
        assert_eq!(config.label_folder(), Path::new("labels"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"mode": {{"segmentation": true}}, "pointcloud": {{"point_size": 2.5}}}}"#
        )
        .unwrap();
        let config = CloudConfig::from_file(file.path()).unwrap();
        assert!(config.segmentation());
        assert_eq!(config.point_size(), 2.5);
        assert!(config.colorless_colorize());
        assert_eq!(config.far_plane(), 300.0);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = CloudConfig::default();
        config.pointcloud.colorless_colorize = false;
        config.pointcloud.colorless_color = [0.5, 0.5, 0.5];
        config.save(&path).unwrap();
        assert_eq!(CloudConfig::from_file(&path).unwrap(), config);
    }
}
