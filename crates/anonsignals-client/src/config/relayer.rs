use serde::{Deserialize, Serialize};

pub const DEFAULT_RELAYER_URL: &str = "https://relayer-api.horizenlabs.io/api/v1";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayerConfig {
    pub url: String,
    pub api_key: String,
    /// Target chain for aggregation; `None` asks for standalone verification.
    pub chain_id: Option<u64>,
    pub request_timeout_secs: u64,
    /// Optional proxy for relayer traffic, e.g. `socks5h://127.0.0.1:9050`.
    pub proxy: Option<String>,
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_RELAYER_URL.to_string(),
            api_key: String::new(),
            chain_id: None,
            request_timeout_secs: 30,
            proxy: None,
        }
    }
}
