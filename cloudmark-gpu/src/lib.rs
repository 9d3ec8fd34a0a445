//! GPU side of cloudmark: device setup, typed resource handles, buffer and
//! pipeline builders, the per-cloud vertex buffers and the point sprite
//! renderer.

use tracing::{info, instrument};
use wgpu::Instance;

pub mod buffers;
pub mod builder;
pub mod error;
pub mod handle;
pub mod pipeline;
pub mod point_renderer;
pub mod resource_registry;
pub mod shaders;
pub mod type_map;
pub mod types;

pub use buffers::PointCloudBuffers;
pub use builder::{BufferBuildError, BufferBuilder, BufferUsage};
pub use error::GpuError;
pub use handle::{Handle, ResourceType};
pub use pipeline::{PipelineBuildError, RenderPipelineBuilder};
pub use point_renderer::PointRenderer;
pub use resource_registry::ResourceRegistry;
pub use types::PointUniforms;

// Re-export wgpu so hosts build passes against the same version
pub use wgpu;

#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("Request Adapter Error: {0}")]
    RequestAdapterError(#[from] wgpu::RequestAdapterError),
    #[error("Request Device Error: {0}")]
    RequestDeviceError(#[from] wgpu::RequestDeviceError),
}

/// Owns the wgpu device and queue used by every cloud and renderer.
pub struct Renderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl Renderer {
    /// Request an adapter and device without a presentation surface.
    #[instrument(level = "info", skip_all)]
    pub async fn new() -> Result<Self, RendererError> {
        let instance = Instance::new(&wgpu::InstanceDescriptor::from_env_or_default());

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await?;
        info!("Using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Renderer"),
                ..Default::default()
            })
            .await?;

        Ok(Self::from_parts(device, queue))
    }

    /// Wrap a device created by the host, e.g. alongside a window surface.
    pub fn from_parts(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Start a buffer on this renderer's device.
    pub fn create_buffer(&self) -> BufferBuilder<'_> {
        BufferBuilder::new(&self.device)
    }

    /// Register a WGSL module in `registry`.
    pub fn create_shader(
        &self,
        registry: &mut ResourceRegistry,
        label: &str,
        source: &str,
    ) -> Handle<wgpu::ShaderModule> {
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        registry.insert(module)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    /// Headless device for tests, `None` when the machine has no adapter.
    pub fn test_device() -> Option<(wgpu::Device, wgpu::Queue)> {
        let renderer = pollster::block_on(crate::Renderer::new()).ok()?;
        Some((renderer.device, renderer.queue))
    }
}
