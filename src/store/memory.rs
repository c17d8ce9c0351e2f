//! In-memory blob store used as a test double

use async_trait::async_trait;
use std::collections::HashMap;

use super::{BlobObject, Lookup, ObjectStore, StoreError};

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: HashMap<String, BlobObject>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_object(mut self, key: &str, object: BlobObject) -> Self {
        self.objects.insert(key.to_string(), object);
        self
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, key: &str) -> Result<Lookup, StoreError> {
        Ok(self
            .objects
            .get(key)
            .cloned()
            .map_or(Lookup::NotFound, Lookup::Found))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
