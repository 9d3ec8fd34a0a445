use crate::handle::{Handle, ResourceType};
use crate::type_map::TypeMap;
use std::collections::HashMap;

type Slots<T> = HashMap<u64, T>;

/// Registry mapping handles to the wgpu objects they name.
/// One id → object map per resource type.
#[derive(Default)]
pub struct ResourceRegistry {
    resources: TypeMap,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a resource and return its handle.
    pub fn insert<T: ResourceType>(&mut self, resource: T) -> Handle<T> {
        let handle = Handle::next();
        self.resources
            .get_or_default::<Slots<T>>()
            .insert(handle.id, resource);
        handle
    }

    pub fn get<T: ResourceType>(&self, handle: Handle<T>) -> Option<&T> {
        self.resources.get::<Slots<T>>()?.get(&handle.id)
    }

    /// Remove a resource; dropping the returned value releases it.
    pub fn remove<T: ResourceType>(&mut self, handle: Handle<T>) -> Option<T> {
        self.resources.get_mut::<Slots<T>>()?.remove(&handle.id)
    }

    pub fn contains<T: ResourceType>(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    /// Number of live resources of type `T`.
    pub fn count<T: ResourceType>(&self) -> usize {
        self.resources.get::<Slots<T>>().map_or(0, HashMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct FakeBuffer(usize);
    impl ResourceType for FakeBuffer {}

    #[derive(Debug, PartialEq)]
    struct FakePipeline;
    impl ResourceType for FakePipeline {}

    #[test]
    fn test_insert_get_remove() {
        let mut registry = ResourceRegistry::new();
        let a = registry.insert(FakeBuffer(12));
        let b = registry.insert(FakeBuffer(24));
        let p = registry.insert(FakePipeline);

        assert_eq!(registry.get(a), Some(&FakeBuffer(12)));
        assert_eq!(registry.count::<FakeBuffer>(), 2);
        assert_eq!(registry.count::<FakePipeline>(), 1);

        assert_eq!(registry.remove(a), Some(FakeBuffer(12)));
        assert!(!registry.contains(a));
        assert!(registry.contains(b));
        assert!(registry.contains(p));
        assert_eq!(registry.remove(a), None);
    }

    #[test]
    fn test_unknown_handle() {
        let registry = ResourceRegistry::new();
        assert!(registry.get(Handle::<FakeBuffer>::next()).is_none());
        assert_eq!(registry.count::<FakeBuffer>(), 0);
    }
}
