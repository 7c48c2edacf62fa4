use anonsignals_types::{AnonError, AnonResult, Bytes32};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::aggregation::AggregationConfig;
use super::logging::LoggingConfig;
use super::polling::PollingConfig;
use super::relayer::RelayerConfig;
use super::semaphore::SemaphoreConfig;
use super::storage::StorageConfig;
use super::types::LogLevel;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub relayer: RelayerConfig,
    pub polling: PollingConfig,
    pub aggregation: AggregationConfig,
    pub semaphore: SemaphoreConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl ClientConfig {
    pub fn load(path: impl AsRef<Path>) -> AnonResult<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| AnonError::Config(format!("Failed to read config: {}", e)))?;

            toml::from_str(&contents)
                .map_err(|e| AnonError::Config(format!("Failed to parse config: {}", e)))?
        } else {
            info!("Config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> AnonResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| AnonError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AnonError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path.as_ref(), contents)
            .map_err(|e| AnonError::Config(format!("Failed to write config: {}", e)))?;

        info!("Configuration saved to {:?}", path.as_ref());
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("ANONSIGNALS_RELAYER_URL") {
            self.relayer.url = url;
        }

        if let Ok(key) = std::env::var("ANONSIGNALS_API_KEY") {
            self.relayer.api_key = key;
        }

        if let Ok(chain) = std::env::var("ANONSIGNALS_CHAIN_ID") {
            match chain.parse() {
                Ok(id) => self.relayer.chain_id = Some(id),
                Err(_) => warn!("Ignoring non-numeric ANONSIGNALS_CHAIN_ID: {}", chain),
            }
        }

        if let Ok(rpc) = std::env::var("ANONSIGNALS_RPC_URL") {
            self.aggregation.rpc_url = Some(rpc);
        }

        if let Ok(address) = std::env::var("ANONSIGNALS_AGGREGATION_CONTRACT") {
            self.aggregation.contract_address = Some(address);
        }

        if let Ok(dir) = std::env::var("ANONSIGNALS_DATA_DIR") {
            self.storage.path = PathBuf::from(dir).join("identities.db");
        }

        if let Ok(level) = std::env::var("ANONSIGNALS_LOG_LEVEL") {
            self.logging.level = LogLevel::parse(&level).unwrap_or(LogLevel::Info);
        }
    }

    pub fn validate(&self) -> AnonResult<()> {
        let url = reqwest::Url::parse(self.relayer.url.trim())
            .map_err(|e| AnonError::Config(format!("Invalid relayer URL {:?}: {}", self.relayer.url, e)))?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(AnonError::Config(format!(
                "Relayer URL must be http(s): {:?}",
                self.relayer.url
            )));
        }

        if self.polling.max_attempts == 0 {
            return Err(AnonError::Config("polling.max_attempts must be at least 1".into()));
        }

        if let Some(address) = &self.aggregation.contract_address {
            address
                .parse::<Address>()
                .map_err(|e| AnonError::Config(format!("Invalid aggregation contract address: {}", e)))?;
        }

        if let Some(hash) = &self.semaphore.default_vk_hash {
            Bytes32::from_hex(hash)
                .map_err(|e| AnonError::Config(format!("Invalid default vk hash: {}", e)))?;
        }

        for (depth, hash) in &self.semaphore.vk_hashes {
            depth
                .parse::<usize>()
                .map_err(|_| AnonError::Config(format!("vk_hashes key is not a depth: {:?}", depth)))?;
            Bytes32::from_hex(hash)
                .map_err(|e| AnonError::Config(format!("Invalid vk hash for depth {}: {}", depth, e)))?;
        }

        if self.aggregation.rpc_url.is_some() != self.aggregation.contract_address.is_some() {
            warn!("On-chain verification needs both aggregation.rpc_url and aggregation.contract_address");
        }

        Ok(())
    }

    /// The API key is only required by commands that talk to the relayer.
    pub fn require_api_key(&self) -> AnonResult<&str> {
        let key = self.relayer.api_key.trim();
        if key.is_empty() {
            return Err(AnonError::Config(
                "Relayer API key not set. Set ANONSIGNALS_API_KEY or relayer.api_key.".into(),
            ));
        }
        Ok(key)
    }

    /// Verifying-key hash registered for the circuit at `depth`: a per-depth
    /// override, else the default.
    pub fn vk_hash_for_depth(&self, depth: usize) -> AnonResult<Bytes32> {
        let hash = self
            .semaphore
            .vk_hashes
            .iter()
            .find(|(d, _)| d.parse::<usize>().ok() == Some(depth))
            .map(|(_, h)| h)
            .or(self.semaphore.default_vk_hash.as_ref())
            .ok_or_else(|| {
                AnonError::Config(format!("No verifying key hash configured for depth {}", depth))
            })?;
        Bytes32::from_hex(hash)
    }

    pub fn redacted(&self) -> RedactedConfig {
        RedactedConfig {
            relayer_url: self.relayer.url.clone(),
            api_key_set: !self.relayer.api_key.is_empty(),
            chain_id: self.relayer.chain_id,
            proxy: self.relayer.proxy.is_some(),
            max_attempts: self.polling.max_attempts,
            interval_ms: self.polling.interval_ms,
            on_chain_verification: self.aggregation.on_chain_enabled(),
            domain_id: self.aggregation.domain_id,
            vk_hash_overrides: self.semaphore.vk_hashes.len(),
            storage_path: self.storage.path.clone(),
            log_level: self.logging.level,
        }
    }
}

#[derive(Debug)]
pub struct RedactedConfig {
    pub relayer_url: String,
    pub api_key_set: bool,
    pub chain_id: Option<u64>,
    pub proxy: bool,
    pub max_attempts: u32,
    pub interval_ms: u64,
    pub on_chain_verification: bool,
    pub domain_id: Option<u64>,
    pub vk_hash_overrides: usize,
    pub storage_path: PathBuf,
    pub log_level: LogLevel,
}

impl std::fmt::Display for RedactedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "AnonSignals Client Configuration")?;
        writeln!(f, "================================")?;
        writeln!(f, "Relayer: {}", self.relayer_url)?;
        writeln!(f, "API key: {}", if self.api_key_set { "<redacted>" } else { "<not set>" })?;
        match self.chain_id {
            Some(id) => writeln!(f, "Chain: {} (aggregation)", id)?,
            None => writeln!(f, "Chain: none (standalone verification)")?,
        }
        writeln!(f, "Proxy: {}", if self.proxy { "enabled" } else { "disabled" })?;
        writeln!(f, "Polling: {} attempts every {}ms", self.max_attempts, self.interval_ms)?;
        writeln!(
            f,
            "On-chain verification: {}",
            if self.on_chain_verification { "enabled" } else { "disabled" }
        )?;
        if let Some(domain) = self.domain_id {
            writeln!(f, "Domain: {}", domain)?;
        }
        writeln!(f, "VK hash overrides: {}", self.vk_hash_overrides)?;
        writeln!(f, "Storage: {:?}", self.storage_path)?;
        writeln!(f, "Log level: {}", self.log_level)
    }
}
