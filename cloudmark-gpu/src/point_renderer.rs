//! Point sprite renderer.
//!
//! Holds the pipeline, the per-frame uniform buffer and its bind group in a
//! [`ResourceRegistry`]. Vertex streams are not owned here; the caller binds
//! whichever position and colour buffers it wants drawn.

use crate::buffers::POINT_STRIDE;
use crate::error::GpuError;
use crate::handle::Handle;
use crate::pipeline::RenderPipelineBuilder;
use crate::resource_registry::ResourceRegistry;
use crate::shaders;
use crate::types::PointUniforms;
use crate::{BufferUsage, Renderer};
use tracing::{debug, info};

/// Vertices per point sprite (two triangles).
pub const SPRITE_VERTICES: u32 = 6;

const POSITION_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: POINT_STRIDE,
    step_mode: wgpu::VertexStepMode::Instance,
    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
};

const COLOR_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: POINT_STRIDE,
    step_mode: wgpu::VertexStepMode::Instance,
    attributes: &wgpu::vertex_attr_array![1 => Float32x3],
};

pub struct PointRenderer {
    uniform_buffer_handle: Handle<wgpu::Buffer>,
    bind_group_handle: Handle<wgpu::BindGroup>,
    pipeline_handle: Handle<wgpu::RenderPipeline>,
}

impl PointRenderer {
    /// Build the pipeline for a colour target of `color_format`, with depth
    /// testing when `depth_format` is given.
    pub fn create(
        renderer: &Renderer,
        registry: &mut ResourceRegistry,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Result<Self, GpuError> {
        let device = renderer.device();

        let uniform_buffer_handle = renderer
            .create_buffer()
            .label("Point Uniforms")
            .with_pod_data(&[PointUniforms::default()])
            .usage(BufferUsage::Uniform)
            .build(registry)?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Point Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<PointUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let uniform_buffer = registry
            .get(uniform_buffer_handle)
            .ok_or(GpuError::MissingResource("point uniform buffer"))?;
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Point Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        let bind_group_handle = registry.insert(bind_group);
        let bind_group_layout_handle = registry.insert(bind_group_layout);

        let shader = renderer.create_shader(registry, "point_sprite", shaders::POINT_SPRITE);

        let mut builder = RenderPipelineBuilder::new(device)
            .with_label("Point Cloud Pipeline")
            .with_vertex_shader(shader)
            .with_fragment_shader(shader)
            .with_bind_group_layout(bind_group_layout_handle)
            .with_vertex_buffer(POSITION_LAYOUT)
            .with_vertex_buffer(COLOR_LAYOUT)
            .with_primitive(wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            })
            .with_fragment_target(Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            }));
        if let Some(format) = depth_format {
            builder = builder.with_depth_stencil(wgpu::DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            });
        }
        let pipeline_handle = builder.build(registry)?;

        info!("Created point pipeline for {:?}", color_format);

        Ok(Self {
            uniform_buffer_handle,
            bind_group_handle,
            pipeline_handle,
        })
    }

    /// Write this frame's uniforms.
    pub fn update(
        &self,
        queue: &wgpu::Queue,
        registry: &ResourceRegistry,
        uniforms: &PointUniforms,
    ) -> Result<(), GpuError> {
        let buffer = registry
            .get(self.uniform_buffer_handle)
            .ok_or(GpuError::MissingResource("point uniform buffer"))?;
        queue.write_buffer(buffer, 0, bytemuck::bytes_of(uniforms));
        Ok(())
    }

    /// Record one instanced draw of `point_count` sprites. Position and colour
    /// are bound as two parallel per-instance streams.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        registry: &ResourceRegistry,
        position: &wgpu::Buffer,
        color: &wgpu::Buffer,
        point_count: u32,
    ) -> Result<(), GpuError> {
        if point_count == 0 {
            return Ok(());
        }
        let pipeline = registry
            .get(self.pipeline_handle)
            .ok_or(GpuError::MissingResource("point pipeline"))?;
        let bind_group = registry
            .get(self.bind_group_handle)
            .ok_or(GpuError::MissingResource("point bind group"))?;

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.set_vertex_buffer(0, position.slice(..));
        pass.set_vertex_buffer(1, color.slice(..));
        pass.draw(0..SPRITE_VERTICES, 0..point_count);
        debug!("Recorded draw of {} points", point_count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_device;

    #[test]
    fn test_stream_layouts() {
        assert_eq!(POSITION_LAYOUT.array_stride, 12);
        assert_eq!(COLOR_LAYOUT.array_stride, 12);
        assert_eq!(POSITION_LAYOUT.attributes[0].shader_location, 0);
        assert_eq!(COLOR_LAYOUT.attributes[0].shader_location, 1);
        assert_eq!(POSITION_LAYOUT.step_mode, wgpu::VertexStepMode::Instance);
    }

    #[test]
    fn test_create_registers_resources() {
        let Some((device, queue)) = test_device() else {
            return;
        };
        let renderer = Renderer::from_parts(device, queue);
        let mut registry = ResourceRegistry::default();

        let points = PointRenderer::create(
            &renderer,
            &mut registry,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            Some(wgpu::TextureFormat::Depth32Float),
        )
        .unwrap();

        assert!(registry.contains(points.pipeline_handle));
        assert!(registry.contains(points.bind_group_handle));
        points
            .update(renderer.queue(), &registry, &PointUniforms::default())
            .unwrap();
    }
}
