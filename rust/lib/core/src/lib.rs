pub mod config;
pub mod types;

pub use config::{ConfigError, DumpConfig, StorageConfig, StoreConfig};
pub use types::{new_id, now_utc};
