//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Environment selection
    pub environment: EnvironmentConfig,
    /// Training loop configuration
    pub training: TrainingConfig,
    /// Agent hyperparameters
    pub agent: AgentConfig,
    /// Filesystem roots for checkpoints and telemetry
    pub storage: StorageConfig,
}

/// Environment selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Environment identifier resolved through the registry
    pub id: String,
}

/// Training loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of training episodes
    pub num_episodes: usize,
    /// Maximum steps per episode
    pub max_steps_per_episode: usize,
    /// Run one learning update every Nth environment step
    pub train_stride: usize,
    /// Save a checkpoint every Nth episode
    pub checkpoint_interval: usize,
    /// Emit a report every Nth episode
    pub report_interval: usize,
    /// Episodes in the reward moving-average window
    pub moving_avg_window: usize,
}

/// Agent hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Learning rate
    pub learning_rate: f64,
    /// Momentum coefficient of the optimizer
    pub momentum: f64,
    /// Discount factor (gamma)
    pub gamma: f64,
    /// Initial exploration rate (epsilon)
    pub epsilon_start: f64,
    /// Final exploration rate
    pub epsilon_end: f64,
    /// Step scale of the exponential epsilon decay
    pub epsilon_decay: f64,
    /// Replay buffer capacity
    pub replay_capacity: usize,
    /// Batch size for learning updates
    pub batch_size: usize,
    /// Target network update frequency (in learning steps)
    pub target_update_freq: usize,
    /// Soft update coefficient (tau)
    pub tau: f64,
    /// Hidden layer sizes
    pub hidden_layers: Vec<usize>,
}

/// Filesystem roots for checkpoints and telemetry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for per-run checkpoint directories
    pub models_root: String,
    /// Root directory for per-run TensorBoard event directories
    pub logs_root: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: EnvironmentConfig {
                id: "cartpole".to_string(),
            },
            training: TrainingConfig {
                num_episodes: 200,
                max_steps_per_episode: 1000,
                train_stride: 4,
                checkpoint_interval: 10,
                report_interval: 1,
                moving_avg_window: 5,
            },
            agent: AgentConfig {
                learning_rate: 0.001,
                momentum: 0.9,
                gamma: 0.99,
                epsilon_start: 0.9,
                epsilon_end: 0.05,
                epsilon_decay: 1000.0,
                replay_capacity: 10_000,
                batch_size: 32,
                target_update_freq: 100,
                tau: 0.005,
                hidden_layers: vec![128, 64],
            },
            storage: StorageConfig {
                models_root: "models".to_string(),
                logs_root: "logs".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Defaults overridden from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(id) = std::env::var("DQN_ENV_ID") {
            config.environment.id = id;
        }
        if let Ok(episodes) = std::env::var("DQN_EPISODES") {
            if let Ok(episodes) = episodes.parse() {
                config.training.num_episodes = episodes;
            }
        }
        if let Ok(root) = std::env::var("DQN_MODELS_ROOT") {
            config.storage.models_root = root;
        }
        if let Ok(root) = std::env::var("DQN_LOGS_ROOT") {
            config.storage.logs_root = root;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.environment.id, "cartpole");
        assert_eq!(config.training.num_episodes, 200);
        assert_eq!(config.training.train_stride, 4);
        assert_eq!(config.agent.batch_size, 32);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let loaded: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config.environment.id, loaded.environment.id);
        assert_eq!(config.training.num_episodes, loaded.training.num_episodes);
        assert_eq!(config.agent.hidden_layers, loaded.agent.hidden_layers);
    }

    #[test]
    fn test_config_file_roundtrip() {
        let config = AppConfig::default();
        let file = NamedTempFile::new().unwrap();

        config.to_file(file.path()).unwrap();
        let loaded = AppConfig::from_file(file.path()).unwrap();

        assert_eq!(loaded.storage.models_root, config.storage.models_root);
        assert_eq!(loaded.training.checkpoint_interval, 10);
    }
}
