//! GPU-resident vertex streams of one point cloud.
//!
//! Position, base colour and label colour are three separate buffers of
//! tightly packed `vec3<f32>` (12 bytes per point). They are allocated
//! together and released together; the label buffer is the only one that is
//! rewritten after allocation.

use crate::builder::{BufferBuilder, BufferUsage};
use crate::error::GpuError;
use cloudmark_data::DisplayMode;
use glam::Vec3;
use tracing::{debug, info};

/// Bytes per point in each stream.
pub const POINT_STRIDE: wgpu::BufferAddress = std::mem::size_of::<Vec3>() as wgpu::BufferAddress;

/// The three vertex buffers of a cloud. Dropping the value releases them.
#[derive(Debug)]
pub struct PointCloudBuffers {
    position: wgpu::Buffer,
    color: wgpu::Buffer,
    label_color: wgpu::Buffer,
    point_count: u32,
}

impl PointCloudBuffers {
    /// Create all three buffers initialised with the given arrays, or none.
    pub fn allocate_and_upload(
        device: &wgpu::Device,
        positions: &[Vec3],
        colors: &[Vec3],
        label_colors: &[Vec3],
    ) -> Result<Self, GpuError> {
        for (what, len) in [("colors", colors.len()), ("label colors", label_colors.len())] {
            if len != positions.len() {
                return Err(GpuError::ShapeMismatch {
                    what,
                    expected: positions.len(),
                    actual: len,
                });
            }
        }
        let point_count = u32::try_from(positions.len()).map_err(|_| GpuError::ShapeMismatch {
            what: "points",
            expected: u32::MAX as usize,
            actual: positions.len(),
        })?;

        // An early return drops the buffers built so far
        let position = BufferBuilder::new(device)
            .label("Point Positions")
            .with_pod_data(positions)
            .usage(BufferUsage::DynamicVertex)
            .build_buffer()?;
        let color = BufferBuilder::new(device)
            .label("Point Colors")
            .with_pod_data(colors)
            .usage(BufferUsage::DynamicVertex)
            .build_buffer()?;
        let label_color = BufferBuilder::new(device)
            .label("Point Label Colors")
            .with_pod_data(label_colors)
            .usage(BufferUsage::DynamicVertex)
            .build_buffer()?;

        info!(
            "Uploaded {} points ({} bytes per buffer)",
            point_count,
            position.size()
        );

        Ok(Self {
            position,
            color,
            label_color,
            point_count,
        })
    }

    /// Re-upload the label colour stream. The length must match the cloud.
    pub fn write_label_colors(
        &self,
        queue: &wgpu::Queue,
        label_colors: &[Vec3],
    ) -> Result<(), GpuError> {
        if label_colors.len() != self.point_count as usize {
            return Err(GpuError::ShapeMismatch {
                what: "label colors",
                expected: self.point_count as usize,
                actual: label_colors.len(),
            });
        }
        queue.write_buffer(&self.label_color, 0, bytemuck::cast_slice(label_colors));
        debug!("Rewrote label colors for {} points", self.point_count);
        Ok(())
    }

    /// The colour stream drawn in `mode`.
    pub fn select_active_color_buffer(&self, mode: DisplayMode) -> &wgpu::Buffer {
        match mode {
            DisplayMode::ColorByLabel => &self.label_color,
            DisplayMode::BaseColor => &self.color,
        }
    }

    pub fn position_buffer(&self) -> &wgpu::Buffer {
        &self.position
    }

    pub fn point_count(&self) -> u32 {
        self.point_count
    }

    /// Destroy the GPU memory now instead of waiting for the drop.
    pub fn release(self) {
        self.position.destroy();
        self.color.destroy();
        self.label_color.destroy();
        debug!("Released buffers of {} points", self.point_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_device;

    fn sample() -> (Vec<Vec3>, Vec<Vec3>, Vec<Vec3>) {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let colors = vec![Vec3::splat(0.5); 3];
        let label_colors = vec![Vec3::new(1.0, 0.0, 0.0); 3];
        (positions, colors, label_colors)
    }

    #[test]
    fn test_stride() {
        assert_eq!(POINT_STRIDE, 12);
    }

    #[test]
    fn test_allocate_sizes() {
        let Some((device, _queue)) = test_device() else {
            return;
        };
        let (positions, colors, label_colors) = sample();
        let buffers =
            PointCloudBuffers::allocate_and_upload(&device, &positions, &colors, &label_colors)
                .unwrap();

        assert_eq!(buffers.point_count(), 3);
        assert_eq!(buffers.position_buffer().size(), 36);
        assert_eq!(buffers.select_active_color_buffer(DisplayMode::BaseColor).size(), 36);
        assert_eq!(buffers.select_active_color_buffer(DisplayMode::ColorByLabel).size(), 36);
    }

    #[test]
    fn test_select_active_color_buffer() {
        let Some((device, _queue)) = test_device() else {
            return;
        };
        let (positions, colors, label_colors) = sample();
        let buffers =
            PointCloudBuffers::allocate_and_upload(&device, &positions, &colors, &label_colors)
                .unwrap();

        let base = buffers.select_active_color_buffer(DisplayMode::BaseColor);
        let label = buffers.select_active_color_buffer(DisplayMode::ColorByLabel);
        assert_eq!(base, &buffers.color);
        assert_eq!(label, &buffers.label_color);
        assert_ne!(base, label);
    }

    #[test]
    fn test_mismatched_lengths_allocate_nothing() {
        let Some((device, _queue)) = test_device() else {
            return;
        };
        let (positions, colors, _) = sample();
        let result =
            PointCloudBuffers::allocate_and_upload(&device, &positions, &colors, &[Vec3::ONE]);
        assert!(matches!(
            result,
            Err(GpuError::ShapeMismatch { what: "label colors", expected: 3, actual: 1 })
        ));
    }

    #[test]
    fn test_write_label_colors_checks_length() {
        let Some((device, queue)) = test_device() else {
            return;
        };
        let (positions, colors, label_colors) = sample();
        let buffers =
            PointCloudBuffers::allocate_and_upload(&device, &positions, &colors, &label_colors)
                .unwrap();

        assert!(buffers.write_label_colors(&queue, &[Vec3::ONE; 3]).is_ok());
        assert!(matches!(
            buffers.write_label_colors(&queue, &[Vec3::ONE; 2]),
            Err(GpuError::ShapeMismatch { expected: 3, actual: 2, .. })
        ));
    }
}
