use std::{
    any::{Any, TypeId},
    collections::{HashMap, hash_map::Entry},
};

/// Heterogeneous map holding at most one value per type.
#[derive(Default)]
pub struct TypeMap {
    inner: HashMap<TypeId, Box<dyn Any>>,
}

impl TypeMap {
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.inner
            .get(&TypeId::of::<T>())
            .and_then(|b| b.downcast_ref())
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.inner
            .get_mut(&TypeId::of::<T>())
            .and_then(|b| b.downcast_mut())
    }

    /// Value for `T`, inserting `T::default()` first if absent.
    pub fn get_or_default<T: 'static + Default>(&mut self) -> &mut T {
        let slot = match self.inner.entry(TypeId::of::<T>()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(Box::new(T::default())),
        };
        // keyed by TypeId::of::<T>, so the downcast cannot fail
        match slot.downcast_mut() {
            Some(value) => value,
            None => unreachable!("TypeMap entry stored under the wrong TypeId"),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_value_per_type() {
        let mut map = TypeMap::default();
        *map.get_or_default::<u32>() += 3;
        *map.get_or_default::<u32>() += 4;
        map.get_or_default::<String>().push_str("points");

        assert_eq!(map.get::<u32>(), Some(&7));
        assert_eq!(map.get::<String>().map(String::as_str), Some("points"));
        assert_eq!(map.get::<u64>(), None);
        assert_eq!(map.len(), 2);
    }
}
