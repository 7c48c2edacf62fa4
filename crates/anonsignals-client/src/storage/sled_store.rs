use anonsignals_types::{AnonError, AnonResult};
use sled::{Db, Tree};
use std::path::Path;
use tracing::{debug, info};

use super::{IdentityStore, StoredIdentity};

const IDENTITY_TREE: &str = "identities";

pub struct SledIdentityStore {
    db: Db,
    identities: Tree,
}

impl SledIdentityStore {
    pub fn open(path: impl AsRef<Path>) -> AnonResult<Self> {
        let path = path.as_ref();
        info!("Opening identity store at {:?}", path);

        let db = sled::Config::new()
            .path(path)
            .open()
            .map_err(|e| AnonError::Storage(format!("Failed to open database: {}", e)))?;
        Self::from_db(db)
    }

    /// Backed by a temporary database removed on drop.
    pub fn temporary() -> AnonResult<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| AnonError::Storage(format!("Failed to open temporary database: {}", e)))?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> AnonResult<Self> {
        let identities = db
            .open_tree(IDENTITY_TREE)
            .map_err(|e| AnonError::Storage(format!("Failed to open tree {}: {}", IDENTITY_TREE, e)))?;
        Ok(Self { db, identities })
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    fn flush(&self) -> AnonResult<()> {
        self.db
            .flush()
            .map_err(|e| AnonError::Storage(format!("Flush error: {}", e)))?;
        Ok(())
    }
}

impl IdentityStore for SledIdentityStore {
    fn load(&self, user_id: &str) -> AnonResult<Option<StoredIdentity>> {
        match self
            .identities
            .get(user_id.as_bytes())
            .map_err(|e| AnonError::Storage(format!("Failed to load identity: {}", e)))?
        {
            Some(bytes) => StoredIdentity::from_bytes(&bytes).map(Some),
            None => Ok(None),
        }
    }

    fn store(&self, user_id: &str, record: &StoredIdentity) -> AnonResult<()> {
        self.identities
            .insert(user_id.as_bytes(), record.to_bytes()?)
            .map_err(|e| AnonError::Storage(format!("Failed to store identity: {}", e)))?;
        self.flush()?;
        debug!("Stored identity record");
        Ok(())
    }

    fn remove(&self, user_id: &str) -> AnonResult<bool> {
        let existed = self
            .identities
            .remove(user_id.as_bytes())
            .map_err(|e| AnonError::Storage(format!("Failed to remove identity: {}", e)))?
            .is_some();
        self.flush()?;
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anonsignals_types::FieldElement;

    fn record(n: u64) -> StoredIdentity {
        StoredIdentity {
            commitment: FieldElement::from_u64(n),
            encrypted_secret: format!("cipher-{}", n),
        }
    }

    #[test]
    fn test_store_load_remove() {
        let store = SledIdentityStore::temporary().unwrap();
        assert!(store.load("anon_1").unwrap().is_none());

        store.store("anon_1", &record(1)).unwrap();
        store.store("anon_2", &record(2)).unwrap();
        assert_eq!(store.load("anon_1").unwrap(), Some(record(1)));
        assert_eq!(store.len(), 2);

        store.store("anon_1", &record(3)).unwrap();
        assert_eq!(store.load("anon_1").unwrap(), Some(record(3)));

        assert!(store.remove("anon_1").unwrap());
        assert!(!store.remove("anon_1").unwrap());
        assert!(store.load("anon_1").unwrap().is_none());
    }

    #[test]
    fn test_reopen_keeps_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identities.db");
        {
            let store = SledIdentityStore::open(&path).unwrap();
            store.store("anon_abc123", &record(7)).unwrap();
        }
        let store = SledIdentityStore::open(&path).unwrap();
        assert_eq!(store.load("anon_abc123").unwrap(), Some(record(7)));
    }

    #[test]
    fn test_corrupt_record_reported() {
        let store = SledIdentityStore::temporary().unwrap();
        store.identities.insert("anon_x", b"not json".to_vec()).unwrap();
        assert!(matches!(store.load("anon_x"), Err(AnonError::Serialization(_))));
    }
}
