mod aggregation;
mod client;
mod logging;
mod polling;
mod relayer;
mod semaphore;
mod storage;
mod types;

pub use aggregation::AggregationConfig;
pub use client::{ClientConfig, RedactedConfig};
pub use logging::LoggingConfig;
pub use polling::PollingConfig;
pub use relayer::{RelayerConfig, DEFAULT_RELAYER_URL};
pub use semaphore::{SemaphoreConfig, DEFAULT_SEMAPHORE_VK_HASH};
pub use storage::{default_data_dir, StorageConfig};
pub use types::*;
