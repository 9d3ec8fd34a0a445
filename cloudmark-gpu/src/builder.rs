//! Builder API for GPU buffers.
//!
//! Buffer creation runs inside device error scopes, so allocation and
//! validation failures come back as errors instead of surfacing later through
//! the uncaptured-error handler.

use crate::handle::Handle;
use crate::resource_registry::ResourceRegistry;
use tracing::{debug, warn};

/// Buffer usage flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Vertex buffer written once at creation
    Vertex,
    /// Vertex buffer that can be rewritten with `Queue::write_buffer`
    DynamicVertex,
    /// Uniform buffer, rewritten every frame
    Uniform,
    /// Staging buffer for GPU → CPU readback
    Readback,
}

impl BufferUsage {
    fn to_wgpu(&self) -> wgpu::BufferUsages {
        match self {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::DynamicVertex => wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            BufferUsage::Uniform => wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            BufferUsage::Readback => wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        }
    }
}

/// Builder for creating GPU buffers
pub struct BufferBuilder<'a> {
    device: &'a wgpu::Device,
    label: Option<String>,
    size: Option<u64>,
    data: Option<&'a [u8]>,
    usage: BufferUsage,
}

impl<'a> BufferBuilder<'a> {
    pub fn new(device: &'a wgpu::Device) -> Self {
        Self {
            device,
            label: None,
            size: None,
            data: None,
            usage: BufferUsage::Vertex,
        }
    }

    /// Set the buffer label
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set buffer size (for empty buffers)
    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Set buffer data from a slice of Pod types
    pub fn with_pod_data<T: bytemuck::Pod>(mut self, data: &'a [T]) -> Self {
        self.data = Some(bytemuck::cast_slice(data));
        self
    }

    /// Set buffer usage
    pub fn usage(mut self, usage: BufferUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Build the buffer and hand ownership to the caller
    pub fn build_buffer(self) -> Result<wgpu::Buffer, BufferBuildError> {
        use wgpu::util::DeviceExt;

        if self.data.is_none() && self.size.is_none() {
            return Err(BufferBuildError::MissingSizeOrData);
        }

        let label = self.label.clone().unwrap_or_else(|| "unnamed".to_string());
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let buffer = match self.data {
            Some(data) => self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: self.label.as_deref(),
                contents: data,
                usage: self.usage.to_wgpu(),
            }),
            None => self.device.create_buffer(&wgpu::BufferDescriptor {
                label: self.label.as_deref(),
                size: self.size.unwrap_or_default(),
                usage: self.usage.to_wgpu(),
                mapped_at_creation: false,
            }),
        };

        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        if let Some(error) = validation.or(out_of_memory) {
            warn!("Creating buffer {} failed: {}", label, error);
            buffer.destroy();
            return Err(BufferBuildError::Gpu {
                label,
                message: error.to_string(),
            });
        }

        debug!("Created buffer {} ({} bytes)", label, buffer.size());
        Ok(buffer)
    }

    /// Build the buffer and register it in the registry
    pub fn build(
        self,
        registry: &mut ResourceRegistry,
    ) -> Result<Handle<wgpu::Buffer>, BufferBuildError> {
        Ok(registry.insert(self.build_buffer()?))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BufferBuildError {
    #[error("Buffer must have either size or data")]
    MissingSizeOrData,
    #[error("GPU rejected buffer {label}: {message}")]
    Gpu { label: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_device;

    #[test]
    fn test_buffer_builder_with_pod_data() {
        let Some((device, _queue)) = test_device() else {
            return;
        };
        let mut registry = ResourceRegistry::default();

        let positions = [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let handle = BufferBuilder::new(&device)
            .label("positions")
            .with_pod_data(&positions)
            .usage(BufferUsage::DynamicVertex)
            .build(&mut registry)
            .expect("Failed to build buffer");

        let buffer = registry.get(handle).expect("Buffer not found");
        assert_eq!(buffer.size(), 36);
        assert!(buffer.usage().contains(wgpu::BufferUsages::COPY_DST));
    }

    #[test]
    fn test_buffer_builder_with_size() {
        let Some((device, _queue)) = test_device() else {
            return;
        };

        let buffer = BufferBuilder::new(&device)
            .label("uniforms")
            .size(256)
            .usage(BufferUsage::Uniform)
            .build_buffer()
            .expect("Failed to build buffer");
        assert_eq!(buffer.size(), 256);
    }

    #[test]
    fn test_buffer_builder_missing_size_or_data() {
        let Some((device, _queue)) = test_device() else {
            return;
        };

        let result = BufferBuilder::new(&device).build_buffer();
        assert!(matches!(result, Err(BufferBuildError::MissingSizeOrData)));
    }

    #[test]
    fn test_buffer_usage_conversion() {
        assert_eq!(BufferUsage::Vertex.to_wgpu(), wgpu::BufferUsages::VERTEX);
        assert!(BufferUsage::DynamicVertex.to_wgpu().contains(wgpu::BufferUsages::VERTEX));
        assert!(BufferUsage::DynamicVertex.to_wgpu().contains(wgpu::BufferUsages::COPY_DST));
        assert!(BufferUsage::Uniform.to_wgpu().contains(wgpu::BufferUsages::UNIFORM));
        assert!(BufferUsage::Readback.to_wgpu().contains(wgpu::BufferUsages::MAP_READ));
    }
}
