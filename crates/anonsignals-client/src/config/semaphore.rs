use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_SEMAPHORE_VK_HASH: &str =
    "0x34dbbf93056bcae972f337f57a8283fce5f71cfd97de4241e0645c914a3e635f";

/// Registered verifying-key hashes for the membership circuit.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SemaphoreConfig {
    pub default_vk_hash: Option<String>,
    /// Per-depth overrides, keyed by tree depth.
    pub vk_hashes: BTreeMap<String, String>,
}

impl Default for SemaphoreConfig {
    fn default() -> Self {
        Self {
            default_vk_hash: Some(DEFAULT_SEMAPHORE_VK_HASH.to_string()),
            vk_hashes: BTreeMap::new(),
        }
    }
}
