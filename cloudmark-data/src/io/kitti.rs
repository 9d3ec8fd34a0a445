//! KITTI velodyne scans: flat little-endian `f32` records of x, y, z, intensity.

use super::PointCloudHandler;
use crate::error::{DataError, Result};
use crate::types::{CloudData, RawCloud};
use glam::Vec3;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const FLOATS_PER_POINT: usize = 4;
const RECORD_BYTES: usize = FLOATS_PER_POINT * std::mem::size_of::<f32>();

/// `.bin` scans. The format has no colour; intensity is dropped on read and
/// written as zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct KittiBinHandler;

impl PointCloudHandler for KittiBinHandler {
    fn extensions(&self) -> &[&'static str] {
        &["bin"]
    }

    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    fn read_point_cloud(&self, path: &Path) -> Result<RawCloud> {
        let bytes = fs::read(path)?;
        if bytes.len() % RECORD_BYTES != 0 {
            return Err(DataError::parse(
                path,
                format!(
                    "{} bytes is not a multiple of the {RECORD_BYTES}-byte point record",
                    bytes.len()
                ),
            ));
        }

        let points: Vec<Vec3> = bytes
            .chunks_exact(RECORD_BYTES)
            .map(|record| {
                let mut xyz = [0.0f32; 3];
                for (value, raw) in xyz.iter_mut().zip(record.chunks_exact(4)) {
                    *value = f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
                }
                Vec3::from_array(xyz)
            })
            .collect();

        info!("Read {} points from KITTI scan", points.len());
        Ok(RawCloud::new(points, None))
    }

    fn write_point_cloud(&self, path: &Path, cloud: CloudData<'_>) -> Result<()> {
        if cloud.colors.is_some() {
            debug!("KITTI scans carry no colour; colours are not written");
        }

        let mut bytes = Vec::with_capacity(cloud.len() * RECORD_BYTES);
        for p in cloud.points {
            for value in [p.x, p.y, p.z, 0.0] {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
        fs::write(path, bytes)?;
        Ok(())
    }
}
