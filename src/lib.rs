//! # Rust DQN Trainer
//!
//! A Deep Q-Network training loop for gym-style episodic environments, with
//! experience replay, episodic metrics aggregation, TensorBoard telemetry and
//! atomic checkpointing.
//!
//! ## Modules
//!
//! - `agent` - the DQN agent, its replay buffer and Q-network
//! - `environment` - episodic environments behind a gym-like interface
//! - `training` - metrics, checkpointing, reporting and the episode loop
//! - `utils` - configuration and memory sampling
//! - `error` - crate-wide error type

pub mod agent;
pub mod environment;
pub mod error;
pub mod training;
pub mod utils;

pub use agent::{Agent, DQNAgent, DQNConfig};
pub use environment::{make_env, CartPole, Environment};
pub use error::TrainError;
pub use training::{Checkpoint, CheckpointStore, MetricsAggregator, Reporter, TrainingLoop};
pub use utils::AppConfig;
