use anonsignals_types::Bytes32;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Registered verifying-key hashes by slug, shared by every `RelayerClient`
/// cloned from the same cache. Lives for the process.
#[derive(Clone, Default)]
pub struct VkCache {
    inner: Arc<RwLock<HashMap<String, Bytes32>>>,
}

impl VkCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slug: &str) -> Option<Bytes32> {
        self.inner.read().get(slug).copied()
    }

    /// Upsert. Registering the same key twice yields the same hash, so a
    /// racing writer can only store an equal value.
    pub fn insert(&self, slug: &str, hash: Bytes32) {
        self.inner.write().insert(slug.to_string(), hash);
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
