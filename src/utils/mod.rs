//! Utility modules: configuration and memory sampling.

mod config;
mod memory;

pub use config::{AgentConfig, AppConfig, EnvironmentConfig, StorageConfig, TrainingConfig};
pub use memory::{MemoryMonitor, MemoryUsage, MEMORY_ABORT_FRACTION};
