use cloudmark_data::ColorSource;
use glam::Vec3;
use std::fmt;
use std::path::PathBuf;

/// Load report of a point cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudSummary {
    pub path: PathBuf,
    pub point_count: usize,
    pub color_count: usize,
    pub color_source: ColorSource,
    pub center: Vec3,
    pub mins: Vec3,
    pub maxs: Vec3,
    pub init_translation: Vec3,
}

struct Rounded(Vec3);

impl fmt::Display for Rounded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.0.x, self.0.y, self.0.z)
    }
}

impl fmt::Display for CloudSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.color_source {
            ColorSource::File => "file",
            ColorSource::HeightRamp => "height ramp",
            ColorSource::Flat => "flat",
        };
        writeln!(f, "Point cloud: {}", self.path.display())?;
        writeln!(f, "  points:           {}", self.point_count)?;
        writeln!(f, "  colors:           {} ({source})", self.color_count)?;
        writeln!(f, "  center:           {}", Rounded(self.center))?;
        writeln!(f, "  mins:             {}", Rounded(self.mins))?;
        writeln!(f, "  maxs:             {}", Rounded(self.maxs))?;
        write!(f, "  init translation: {}", Rounded(self.init_translation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_rounds() {
        let summary = CloudSummary {
            path: PathBuf::from("scan.ply"),
            point_count: 4,
            color_count: 4,
            color_source: ColorSource::HeightRamp,
            center: Vec3::new(0.5, 0.5, 0.5),
            mins: Vec3::ZERO,
            maxs: Vec3::ONE,
            init_translation: Vec3::new(-0.5, -0.5, -2.232_050_8),
        };
        let text = summary.to_string();
        assert!(text.contains("points:           4"));
        assert!(text.contains("(height ramp)"));
        assert!(text.contains("(-0.50, -0.50, -2.23)"));
    }
}
