//! Whitespace separated ASCII point lists: `x y z` or `x y z r g b`.

use super::PointCloudHandler;
use crate::error::{DataError, Result};
use crate::types::{CloudData, RawCloud};
use glam::Vec3;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct XyzHandler;

impl PointCloudHandler for XyzHandler {
    fn extensions(&self) -> &[&'static str] {
        &["xyz", "xyzrgb", "txt"]
    }

    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    fn read_point_cloud(&self, path: &Path) -> Result<RawCloud> {
        let reader = BufReader::new(File::open(path)?);
        let mut points = Vec::new();
        let mut colors = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let values = line
                .split_whitespace()
                .map(str::parse::<f32>)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| DataError::parse(path, format!("line {}: {e}", line_no + 1)))?;

            match values.as_slice() {
                [x, y, z] if colors.is_empty() => points.push(Vec3::new(*x, *y, *z)),
                [x, y, z, r, g, b] if colors.len() == points.len() => {
                    points.push(Vec3::new(*x, *y, *z));
                    colors.push(Vec3::new(*r, *g, *b));
                }
                _ => {
                    return Err(DataError::parse(
                        path,
                        format!(
                            "line {}: expected 3 or 6 values consistently, got {}",
                            line_no + 1,
                            values.len()
                        ),
                    ));
                }
            }
        }

        let colors = if colors.is_empty() {
            None
        } else {
            // 0-255 colours are detected by any channel above 1
            let byte_range = colors.iter().any(|c| c.max_element() > 1.0);
            Some(if byte_range {
                colors.into_iter().map(|c| c / 255.0).collect()
            } else {
                colors
            })
        };

        info!("Read {} points", points.len());
        Ok(RawCloud::new(points, colors))
    }

    fn write_point_cloud(&self, path: &Path, cloud: CloudData<'_>) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        for (i, p) in cloud.points.iter().enumerate() {
            match cloud.colors {
                Some(colors) => {
                    let c = colors[i];
                    writeln!(out, "{} {} {} {} {} {}", p.x, p.y, p.z, c.x, c.y, c.z)?
                }
                None => writeln!(out, "{} {} {}", p.x, p.y, p.z)?,
            }
        }
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_read_byte_colors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud.xyzrgb");
        fs::write(&path, "# comment\n0 0 0 255 0 0\n\n1 2 3 0 255 51\n").unwrap();

        let cloud = XyzHandler.read_point_cloud(&path).unwrap();
        assert_eq!(cloud.points, [Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0)]);
        let colors = cloud.colors.unwrap();
        assert_eq!(colors[0], Vec3::new(1.0, 0.0, 0.0));
        assert!((colors[1] - Vec3::new(0.0, 1.0, 0.2)).abs().max_element() < 1e-6);
    }

    #[test]
    fn test_roundtrip_unit_colors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud.xyz");
        let points = [Vec3::new(0.5, -1.0, 2.0)];
        let colors = [Vec3::new(0.25, 0.5, 0.75)];
        XyzHandler
            .write_point_cloud(&path, CloudData::new(&points).with_colors(&colors))
            .unwrap();
        let cloud = XyzHandler.read_point_cloud(&path).unwrap();
        assert_eq!(cloud.points, points);
        assert_eq!(cloud.colors.unwrap(), colors);
    }

    #[test]
    fn test_mixed_rows_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.xyz");
        fs::write(&path, "0 0 0\n1 1 1 0.5 0.5 0.5\n").unwrap();
        assert!(matches!(
            XyzHandler.read_point_cloud(&path),
            Err(DataError::Parse { .. })
        ));
    }
}
