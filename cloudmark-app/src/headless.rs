//! Offscreen rendering of a single frame to a PNG file.

use cloudmark_core::{PointCloud, PointCloudError};
use cloudmark_data::ConfigProvider;
use cloudmark_gpu::{BufferUsage, PointRenderer, Renderer, ResourceRegistry};
use glam::{Mat4, Vec2};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const BYTES_PER_PIXEL: u32 = 4;
const FIELD_OF_VIEW_DEGREES: f32 = 45.0;
const NEAR_PLANE: f32 = 0.1;
const MAP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum HeadlessError {
    #[error(transparent)]
    PointCloud(#[from] PointCloudError),
    #[error("Buffer error: {0}")]
    Buffer(#[from] cloudmark_gpu::BufferBuildError),
    #[error("GPU error: {0}")]
    Gpu(#[from] cloudmark_gpu::GpuError),
    #[error("Mapping readback buffer failed: {0}")]
    Map(#[from] wgpu::BufferAsyncError),
    #[error("Timeout waiting for buffer mapping")]
    MapTimeout,
    #[error("PNG encoding error: {0}")]
    Png(#[from] png::EncodingError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Frame size {width}x{height} outside 1..={max}")]
    InvalidSize { width: u32, height: u32, max: u32 },
}

/// Size of the offscreen frame in pixels.
#[derive(Debug, Clone, Copy)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    /// Both sides must be non-zero and within the device texture limit.
    fn validate(&self, max: u32) -> Result<(), HeadlessError> {
        let in_range = |side: u32| (1..=max).contains(&side);
        if in_range(self.width) && in_range(self.height) {
            Ok(())
        } else {
            Err(HeadlessError::InvalidSize {
                width: self.width,
                height: self.height,
                max,
            })
        }
    }

    fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Row pitch of the readback buffer, rounded up to the copy alignment.
    fn padded_bytes_per_row(&self) -> u32 {
        let unpadded = self.width * BYTES_PER_PIXEL;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        unpadded.div_ceil(align) * align
    }
}

/// Render `cloud` as seen from the origin looking down -z and write the
/// frame to `output`.
#[tracing::instrument(skip_all, fields(output = %output.display()))]
pub fn render_to_png(
    renderer: &Renderer,
    cloud: &mut PointCloud,
    config: &impl ConfigProvider,
    size: FrameSize,
    output: &Path,
) -> Result<(), HeadlessError> {
    let device = renderer.device();
    let queue = renderer.queue();
    size.validate(device.limits().max_texture_dimension_2d)?;

    let mut registry = ResourceRegistry::new();
    let points = PointRenderer::create(renderer, &mut registry, COLOR_FORMAT, Some(DEPTH_FORMAT))?;
    if !cloud.has_buffers() {
        cloud.create_buffers(renderer)?;
    }

    let extent = wgpu::Extent3d {
        width: size.width,
        height: size.height,
        depth_or_array_layers: 1,
    };
    let color_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Color"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: COLOR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Depth"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor::default());
    let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

    let projection = Mat4::perspective_rh(
        FIELD_OF_VIEW_DEGREES.to_radians(),
        size.aspect(),
        NEAR_PLANE,
        config.far_plane(),
    );
    cloud.prepare(
        queue,
        &points,
        &registry,
        projection,
        Vec2::new(size.width as f32, size.height as f32),
        config,
    )?;

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Offscreen Encoder"),
    });
    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Point Cloud Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.02,
                        g: 0.02,
                        b: 0.025,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        cloud.draw(&mut pass, &points, &registry, config)?;
    }

    let padded_bytes_per_row = size.padded_bytes_per_row();
    let readback = renderer
        .create_buffer()
        .label("Offscreen Readback")
        .size(padded_bytes_per_row as u64 * size.height as u64)
        .usage(BufferUsage::Readback)
        .build_buffer()?;

    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &color_texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &readback,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(size.height),
            },
        },
        extent,
    );
    queue.submit(Some(encoder.finish()));

    let pixels = read_back(device, &readback, size)?;
    write_png(output, size, &pixels)?;
    info!("Wrote {}x{} frame", size.width, size.height);
    Ok(())
}

/// Map the readback buffer and strip the row padding.
fn read_back(
    device: &wgpu::Device,
    buffer: &wgpu::Buffer,
    size: FrameSize,
) -> Result<Vec<u8>, HeadlessError> {
    let slice = buffer.slice(..);
    let (sender, receiver) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        // The receiver only disappears after a timeout
        let _ = sender.send(result);
    });

    let start = Instant::now();
    loop {
        let _ = device.poll(wgpu::PollType::Poll);
        if let Ok(result) = receiver.try_recv() {
            result?;
            break;
        }
        if start.elapsed() > MAP_TIMEOUT {
            return Err(HeadlessError::MapTimeout);
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    debug!("Readback mapped after {:?}", start.elapsed());

    let unpadded = (size.width * BYTES_PER_PIXEL) as usize;
    let padded = size.padded_bytes_per_row() as usize;
    let pixels = {
        let mapped = slice.get_mapped_range();
        mapped
            .chunks(padded)
            .take(size.height as usize)
            .flat_map(|row| &row[..unpadded])
            .copied()
            .collect()
    };
    buffer.unmap();
    Ok(pixels)
}

fn write_png(path: &Path, size: FrameSize, pixels: &[u8]) -> Result<(), HeadlessError> {
    let file = BufWriter::new(File::create(path)?);
    let mut encoder = png::Encoder::new(file, size.width, size.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(pixels)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_rows() {
        let size = FrameSize {
            width: 100,
            height: 10,
        };
        assert_eq!(size.padded_bytes_per_row(), 512);
        let aligned = FrameSize {
            width: 64,
            height: 1,
        };
        assert_eq!(aligned.padded_bytes_per_row(), 256);
    }

    #[test]
    fn test_frame_size_limits() {
        let ok = FrameSize {
            width: 8192,
            height: 1,
        };
        assert!(ok.validate(8192).is_ok());
        for (width, height) in [(0, 720), (1280, 0), (8193, 720), (1280, 9000)] {
            let size = FrameSize { width, height };
            assert!(matches!(
                size.validate(8192),
                Err(HeadlessError::InvalidSize { max: 8192, .. })
            ));
        }
    }

    #[test]
    fn test_render_rejects_empty_frame() {
        let Ok(renderer) = pollster::block_on(Renderer::new()) else {
            return;
        };
        let input = cloudmark_core::CloudInput::new("scan.bin", vec![glam::Vec3::ZERO]);
        let config = cloudmark_data::CloudConfig::default();
        let mut cloud = PointCloud::load(input, &config).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("frame.png");

        let size = FrameSize {
            width: 0,
            height: 0,
        };
        let result = render_to_png(&renderer, &mut cloud, &config, size, &output);
        assert!(matches!(result, Err(HeadlessError::InvalidSize { .. })));
        assert!(!cloud.has_buffers());
        assert!(!output.exists());
    }

    #[test]
    fn test_write_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let size = FrameSize {
            width: 2,
            height: 1,
        };
        write_png(&path, size, &[255, 0, 0, 255, 0, 255, 0, 255]).unwrap();

        let decoder = png::Decoder::new(File::open(&path).unwrap());
        let reader = decoder.read_info().unwrap();
        assert_eq!(reader.info().width, 2);
        assert_eq!(reader.info().height, 1);
    }
}
