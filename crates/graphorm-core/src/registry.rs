//! Descriptor cache keyed by record type.

use std::any::TypeId;
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::Result;
use crate::record::Record;
use crate::schema::SchemaDescriptor;

/// Concurrent cache of schema descriptors.
///
/// Owned by the client and shared through `Arc`. Two callers racing on the
/// same type may both build a descriptor; the first insert wins and both get
/// the cached one back.
#[derive(Debug, Default)]
pub struct Registry {
    descriptors: DashMap<TypeId, Arc<SchemaDescriptor>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached descriptor for `T`, building it on first use.
    pub fn get_or_build<T: Record>(&self) -> Result<Arc<SchemaDescriptor>> {
        let key = TypeId::of::<T>();
        if let Some(found) = self.descriptors.get(&key) {
            return Ok(Arc::clone(found.value()));
        }

        // Build outside the map's shard lock.
        let built = Arc::new(SchemaDescriptor::build::<T>()?);
        let entry = self.descriptors.entry(key).or_insert(built);
        Ok(Arc::clone(entry.value()))
    }

    pub fn contains<T: Record>(&self) -> bool {
        self.descriptors.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
