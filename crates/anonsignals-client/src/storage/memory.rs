use anonsignals_types::AnonResult;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::{IdentityStore, StoredIdentity};

#[derive(Default)]
pub struct MemoryIdentityStore {
    records: RwLock<HashMap<String, StoredIdentity>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&self, user_id: &str) -> AnonResult<Option<StoredIdentity>> {
        Ok(self.records.read().get(user_id).cloned())
    }

    fn store(&self, user_id: &str, record: &StoredIdentity) -> AnonResult<()> {
        self.records.write().insert(user_id.to_string(), record.clone());
        Ok(())
    }

    fn remove(&self, user_id: &str) -> AnonResult<bool> {
        Ok(self.records.write().remove(user_id).is_some())
    }
}
