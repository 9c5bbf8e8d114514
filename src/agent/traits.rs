//! Agent trait definition.

use crate::agent::Experience;
use crate::environment::Observation;
use crate::error::TrainError;
use serde::{Deserialize, Serialize};

/// Serialized agent state carried by checkpoints. The model and optimizer
/// blobs are opaque to everything but the agent that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub model: Vec<u8>,
    pub optimizer: Vec<u8>,
    /// Exploration rate at capture time
    pub exploration_rate: f64,
}

/// Trait for value-based RL agents driven by the training loop
pub trait Agent {
    /// Select an action for the current observation (exploratory during training)
    fn select_action(&mut self, observation: &Observation) -> usize;

    /// Greedy action for evaluation
    fn greedy_action(&self, observation: &Observation) -> usize;

    /// Store an experience in the replay buffer
    fn remember(&mut self, experience: Experience);

    /// Run one learning update; returns the batch loss, or `None` while the
    /// buffer cannot fill a batch
    fn train_step(&mut self) -> Option<f64>;

    /// Current exploration rate in [0, 1]
    fn exploration_rate(&self) -> f64;

    /// Capture model and optimizer state for checkpointing
    fn snapshot(&self) -> Result<AgentSnapshot, TrainError>;

    /// Restore model and optimizer state from a checkpoint
    fn restore(&mut self, snapshot: &AgentSnapshot) -> Result<(), TrainError>;

    /// Get agent name
    fn name(&self) -> &str;
}
