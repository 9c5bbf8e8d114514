//! RL agent module: the DQN agent, its replay buffer and Q-network.

mod dqn_agent;
mod experience_replay;
mod neural_network;
mod traits;

pub use dqn_agent::{DQNAgent, DQNConfig};
pub use experience_replay::{Experience, ReplayBuffer};
pub use neural_network::{Gradients, MomentumSgd, NeuralNetwork};
pub use traits::{Agent, AgentSnapshot};
