//! Core data types shared between the model, the handlers and the renderer.
//!
//! These are CPU-side representations. GPU-specific types with bytemuck
//! derive live in cloudmark-gpu.

use glam::Vec3;

/// Class index attached to a point.
pub type LabelIndex = u32;

/// Where the colours of a loaded cloud came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSource {
    /// Colours were read from the point cloud file.
    File,
    /// The cloud was colourless; colours follow the height ramp.
    HeightRamp,
    /// The cloud was colourless; every point got the configured flat colour.
    Flat,
}

impl ColorSource {
    /// True if the colours were synthesised rather than read.
    pub fn is_colorless(&self) -> bool {
        !matches!(self, ColorSource::File)
    }
}

/// Which colour buffer feeds the draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Base colours (from file or synthesised).
    #[default]
    BaseColor,
    /// Base colours blended with the label palette.
    ColorByLabel,
}

impl DisplayMode {
    pub fn from_color_with_label(color_with_label: bool) -> Self {
        if color_with_label {
            DisplayMode::ColorByLabel
        } else {
            DisplayMode::BaseColor
        }
    }
}

/// Camera-relative placement supplied by the host when a cloud is opened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perspective {
    /// Translation (x, y, z).
    pub translation: Vec3,
    /// Euler rotation in degrees (x, y, z).
    pub rotation: Vec3,
}

impl Perspective {
    pub fn new(translation: Vec3, rotation: Vec3) -> Self {
        Self {
            translation,
            rotation,
        }
    }
}

/// Borrowed view of everything a format handler may persist.
#[derive(Debug, Clone, Copy)]
pub struct CloudData<'a> {
    pub points: &'a [Vec3],
    pub colors: Option<&'a [Vec3]>,
    pub labels: Option<&'a [LabelIndex]>,
}

impl<'a> CloudData<'a> {
    pub fn new(points: &'a [Vec3]) -> Self {
        Self {
            points,
            colors: None,
            labels: None,
        }
    }

    pub fn with_colors(mut self, colors: &'a [Vec3]) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn with_labels(mut self, labels: &'a [LabelIndex]) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Points and optional colours as produced by a point cloud reader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCloud {
    pub points: Vec<Vec3>,
    pub colors: Option<Vec<Vec3>>,
}

impl RawCloud {
    pub fn new(points: Vec<Vec3>, colors: Option<Vec<Vec3>>) -> Self {
        Self { points, colors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_source_colorless() {
        assert!(!ColorSource::File.is_colorless());
        assert!(ColorSource::HeightRamp.is_colorless());
        assert!(ColorSource::Flat.is_colorless());
    }

    #[test]
    fn test_display_mode_from_flag() {
        assert_eq!(DisplayMode::from_color_with_label(true), DisplayMode::ColorByLabel);
        assert_eq!(DisplayMode::from_color_with_label(false), DisplayMode::BaseColor);
    }

    #[test]
    fn test_cloud_data_builder() {
        let points = [Vec3::ZERO, Vec3::ONE];
        let colors = [Vec3::X, Vec3::Y];
        let data = CloudData::new(&points).with_colors(&colors);
        assert_eq!(data.len(), 2);
        assert_eq!(data.colors, Some(&colors[..]));
        assert!(data.labels.is_none());
    }
}
