use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

/// Type-safe handle to a GPU object stored in a [`ResourceRegistry`](crate::ResourceRegistry).
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Handle<T> {
    pub id: u64,
    _phantom: PhantomData<fn() -> T>,
}

// Manual impls: derives would require `T: Clone`.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> Handle<T> {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    /// A handle with a fresh, process-unique id.
    pub fn next() -> Self {
        Self::new(next_handle_id())
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// GPU object types the registry can hold.
pub trait ResourceType: 'static {}

impl ResourceType for wgpu::Buffer {}
impl ResourceType for wgpu::BindGroup {}
impl ResourceType for wgpu::BindGroupLayout {}
impl ResourceType for wgpu::RenderPipeline {}
impl ResourceType for wgpu::ShaderModule {}
impl ResourceType for wgpu::Texture {}
impl ResourceType for wgpu::TextureView {}

static HANDLE_ID: AtomicU64 = AtomicU64::new(1);

pub fn next_handle_id() -> u64 {
    HANDLE_ID.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_unique() {
        let a = Handle::<wgpu::Buffer>::next();
        let b = Handle::<wgpu::Buffer>::next();
        assert_ne!(a.id(), b.id());
        let c = a;
        assert_eq!(a, c);
    }
}
