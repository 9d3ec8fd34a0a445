//! PLY point clouds: serde-ply reader, ASCII writer.

use super::PointCloudHandler;
use crate::error::{DataError, Result};
use crate::types::{CloudData, RawCloud};
use glam::Vec3;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

// serde_ply needs map rows for files with arbitrary vertex properties
#[derive(Deserialize, Debug)]
struct PlyFile {
    #[serde(rename = "vertex")]
    vertex: Vec<HashMap<String, JsonValue>>,
}

/// `.ply` files with `x y z` and optional `red green blue` (or `r g b`).
#[derive(Debug, Clone, Copy, Default)]
pub struct PlyHandler;

fn get_f32(prop: Option<&JsonValue>) -> Option<f32> {
    prop.and_then(|v| match v {
        JsonValue::Number(n) => n.as_f64().map(|f| f as f32),
        _ => None,
    })
}

/// Colour channel in [0, 1]: integer properties are 0-255, float ones are
/// taken as already normalised.
fn get_channel(prop: Option<&JsonValue>) -> Option<f32> {
    match prop? {
        JsonValue::Number(n) if n.is_f64() => n.as_f64().map(|f| f as f32),
        JsonValue::Number(n) => n.as_f64().map(|f| f as f32 / 255.0),
        _ => None,
    }
}

fn get_color(vertex: &HashMap<String, JsonValue>) -> Option<Vec3> {
    let channels = |r: &str, g: &str, b: &str| {
        Some(Vec3::new(
            get_channel(vertex.get(r))?,
            get_channel(vertex.get(g))?,
            get_channel(vertex.get(b))?,
        ))
    };
    channels("red", "green", "blue").or_else(|| channels("r", "g", "b"))
}

impl PointCloudHandler for PlyHandler {
    fn extensions(&self) -> &[&'static str] {
        &["ply"]
    }

    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    fn read_point_cloud(&self, path: &Path) -> Result<RawCloud> {
        debug!("Loading PLY vertices");
        let reader = BufReader::new(File::open(path)?);

        let ply_data: PlyFile = serde_ply::from_reader(reader).map_err(|e| {
            warn!("Failed to parse PLY file: {}", e);
            DataError::parse(path, e)
        })?;

        let has_colors = ply_data.vertex.first().and_then(get_color).is_some();
        let mut points = Vec::with_capacity(ply_data.vertex.len());
        let mut colors = Vec::with_capacity(if has_colors { ply_data.vertex.len() } else { 0 });

        for (i, vertex) in ply_data.vertex.iter().enumerate() {
            let coord = |name: &str| {
                get_f32(vertex.get(name))
                    .ok_or_else(|| DataError::parse(path, format!("missing '{name}' at vertex {i}")))
            };
            points.push(Vec3::new(coord("x")?, coord("y")?, coord("z")?));

            if has_colors {
                let color = get_color(vertex)
                    .ok_or_else(|| DataError::parse(path, format!("missing colour at vertex {i}")))?;
                colors.push(color);
            }
        }

        info!(
            "PLY file parsed: {} vertices, colours: {}",
            points.len(),
            has_colors
        );
        Ok(RawCloud::new(points, has_colors.then_some(colors)))
    }

    #[tracing::instrument(skip_all, fields(path = %path.display(), points = cloud.len()))]
    fn write_point_cloud(&self, path: &Path, cloud: CloudData<'_>) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);

        writeln!(out, "ply")?;
        writeln!(out, "format ascii 1.0")?;
        writeln!(out, "element vertex {}", cloud.len())?;
        writeln!(out, "property float x")?;
        writeln!(out, "property float y")?;
        writeln!(out, "property float z")?;
        if cloud.colors.is_some() {
            writeln!(out, "property uchar red")?;
            writeln!(out, "property uchar green")?;
            writeln!(out, "property uchar blue")?;
        }
        if cloud.labels.is_some() {
            writeln!(out, "property uint label")?;
        }
        writeln!(out, "end_header")?;

        for (i, p) in cloud.points.iter().enumerate() {
            write!(out, "{} {} {}", p.x, p.y, p.z)?;
            if let Some(colors) = cloud.colors {
                let c = (colors[i].clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
                write!(out, " {} {} {}", c.x as u8, c.y as u8, c.z as u8)?;
            }
            if let Some(labels) = cloud.labels {
                write!(out, " {}", labels[i])?;
            }
            writeln!(out)?;
        }
        out.flush()?;

        info!("Wrote PLY file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud.ply");
        let points = [Vec3::new(1.0, 2.0, 3.0), Vec3::new(-1.5, 0.0, 4.25)];
        let colors = [Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.5, 1.0)];
        let labels = [0, 2];
        PlyHandler
            .write_point_cloud(
                &path,
                CloudData::new(&points).with_colors(&colors).with_labels(&labels),
            )
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("ply\nformat ascii 1.0\nelement vertex 2\n"));
        assert!(text.contains("property uchar red\n"));
        assert!(text.contains("property uint label\n"));
        let rows: Vec<&str> = text.split("end_header\n").nth(1).unwrap().lines().collect();
        assert_eq!(rows, ["1 2 3 255 0 0 0", "-1.5 0 4.25 0 128 255 2"]);
    }

    #[test]
    fn test_roundtrip_with_colors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud.ply");
        let points = [Vec3::new(0.5, 1.0, -2.0), Vec3::new(3.0, 4.0, 5.0)];
        let colors = [Vec3::ONE, Vec3::ZERO];
        PlyHandler
            .write_point_cloud(&path, CloudData::new(&points).with_colors(&colors))
            .unwrap();

        let cloud = PlyHandler.read_point_cloud(&path).unwrap();
        assert_eq!(cloud.points, points);
        assert_eq!(cloud.colors.unwrap(), colors);
    }

    #[test]
    fn test_float_colors_not_rescaled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.ply");
        std::fs::write(
            &path,
            "ply\nformat ascii 1.0\nelement vertex 2\n\
             property float x\nproperty float y\nproperty float z\n\
             property float red\nproperty float green\nproperty float blue\n\
             end_header\n0 0 0 1.0 0.5 0.25\n1 1 1 0.0 0.0 1.0\n",
        )
        .unwrap();

        let cloud = PlyHandler.read_point_cloud(&path).unwrap();
        let colors = cloud.colors.unwrap();
        assert_eq!(colors[0], Vec3::new(1.0, 0.5, 0.25));
        assert_eq!(colors[1], Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_colorless_ply() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.ply");
        let points = [Vec3::new(1.0, 1.0, 1.0)];
        PlyHandler
            .write_point_cloud(&path, CloudData::new(&points))
            .unwrap();

        let cloud = PlyHandler.read_point_cloud(&path).unwrap();
        assert_eq!(cloud.points, points);
        assert!(cloud.colors.is_none());
    }
}
