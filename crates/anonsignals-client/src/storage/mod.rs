mod memory;
mod sled_store;

pub use memory::MemoryIdentityStore;
pub use sled_store::SledIdentityStore;

use anonsignals_types::{AnonError, AnonResult, FieldElement};
use serde::{Deserialize, Serialize};

/// What is persisted per user: the commitment in clear, the secret only
/// in obfuscated form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredIdentity {
    pub commitment: FieldElement,
    pub encrypted_secret: String,
}

impl StoredIdentity {
    pub fn to_bytes(&self) -> AnonResult<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| AnonError::Serialization(format!("Failed to encode identity record: {}", e)))
    }

    pub fn from_bytes(bytes: &[u8]) -> AnonResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| AnonError::Serialization(format!("Failed to decode identity record: {}", e)))
    }
}

/// Per-user identity records keyed by the anonymous user id.
pub trait IdentityStore: Send + Sync {
    fn load(&self, user_id: &str) -> AnonResult<Option<StoredIdentity>>;

    fn store(&self, user_id: &str, record: &StoredIdentity) -> AnonResult<()>;

    /// Returns whether a record existed.
    fn remove(&self, user_id: &str) -> AnonResult<bool>;
}
