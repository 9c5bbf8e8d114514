//! Deep Q-Network (DQN) agent implementation.

use crate::agent::{Agent, AgentSnapshot, Experience, Gradients, MomentumSgd, NeuralNetwork, ReplayBuffer};
use crate::environment::Observation;
use crate::error::TrainError;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// DQN agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DQNConfig {
    /// Learning rate
    pub learning_rate: f64,
    /// Momentum coefficient of the optimizer
    pub momentum: f64,
    /// Discount factor
    pub gamma: f64,
    /// Initial epsilon for exploration
    pub epsilon_start: f64,
    /// Final epsilon
    pub epsilon_end: f64,
    /// Step scale of the exponential epsilon decay
    pub epsilon_decay: f64,
    /// Replay buffer capacity
    pub replay_capacity: usize,
    /// Batch size for training
    pub batch_size: usize,
    /// Target network update frequency (in learning steps)
    pub target_update_freq: usize,
    /// Soft update coefficient (tau)
    pub tau: f64,
    /// Hidden layer sizes
    pub hidden_layers: Vec<usize>,
}

impl Default for DQNConfig {
    fn default() -> Self {
        Self {
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
        }
    }
}

/// Deep Q-Network agent
pub struct DQNAgent {
    /// Q-network (policy network)
    q_network: NeuralNetwork,
    /// Target network
    target_network: NeuralNetwork,
    /// Optimizer over the Q-network
    optimizer: MomentumSgd,
    /// Experience replay buffer
    replay_buffer: ReplayBuffer,
    /// Configuration
    config: DQNConfig,
    /// Action space size
    action_size: usize,
    /// Environment steps seen, drives the epsilon decay
    steps_done: usize,
    /// Learning steps taken, drives the target refresh
    train_steps: usize,
}

impl DQNAgent {
    /// Create a new DQN agent
    pub fn new(state_size: usize, action_size: usize, config: DQNConfig) -> Self {
        assert!(config.epsilon_decay > 0.0, "epsilon_decay must be positive");

        let mut layer_sizes = vec![state_size];
        layer_sizes.extend(&config.hidden_layers);
        layer_sizes.push(action_size);

        let q_network = NeuralNetwork::new(&layer_sizes);
        let mut target_network = NeuralNetwork::new(&layer_sizes);
        target_network.copy_from(&q_network);

        let optimizer = MomentumSgd::new(config.learning_rate, config.momentum);
        let replay_buffer = ReplayBuffer::new(config.replay_capacity);

        Self {
            q_network,
            target_network,
            optimizer,
            replay_buffer,
            config,
            action_size,
            steps_done: 0,
            train_steps: 0,
        }
    }

    /// Exploration rate after `steps_done` environment steps
    fn epsilon(&self) -> f64 {
        let cfg = &self.config;
        cfg.epsilon_end
            + (cfg.epsilon_start - cfg.epsilon_end)
                * (-(self.steps_done as f64) / cfg.epsilon_decay).exp()
    }

    /// Invert the decay curve so a restored agent continues exploring where
    /// the checkpoint left off
    fn steps_for_epsilon(&self, epsilon: f64) -> usize {
        let cfg = &self.config;
        let span = cfg.epsilon_start - cfg.epsilon_end;
        if span <= 0.0 {
            return 0;
        }
        let ratio = ((epsilon - cfg.epsilon_end) / span).clamp(1e-12, 1.0);
        (-cfg.epsilon_decay * ratio.ln()).round() as usize
    }

    /// Get current replay buffer size
    pub fn buffer_len(&self) -> usize {
        self.replay_buffer.len()
    }

    /// Check if ready to train
    pub fn can_train(&self) -> bool {
        self.replay_buffer.can_sample(self.config.batch_size)
    }

    /// Get Q-values for a state
    pub fn q_values(&self, state: &Observation) -> Vec<f64> {
        self.q_network.predict(state).to_vec()
    }
}

impl Agent for DQNAgent {
    fn select_action(&mut self, observation: &Observation) -> usize {
        let epsilon = self.epsilon();
        self.steps_done += 1;

        let mut rng = rand::thread_rng();
        if rng.gen::<f64>() < epsilon {
            rng.gen_range(0..self.action_size)
        } else {
            self.q_network.best_action(observation)
        }
    }

    fn greedy_action(&self, observation: &Observation) -> usize {
        self.q_network.best_action(observation)
    }

    fn remember(&mut self, experience: Experience) {
        self.replay_buffer.push(experience);
    }

    fn train_step(&mut self) -> Option<f64> {
        if !self.can_train() {
            return None;
        }

        let batch = self.replay_buffer.sample(self.config.batch_size);
        let mut grads = Gradients::zeros_like(&self.q_network);
        let mut total_loss = 0.0;

        for experience in &batch {
            // Target Q-value from the frozen network
            let target = if experience.done {
                experience.reward
            } else {
                let next_q = self.target_network.predict(&experience.next_state);
                let max_next_q = next_q.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                experience.reward + self.config.gamma * max_next_q
            };

            let (sample_grads, loss) =
                self.q_network
                    .backward(&experience.state, experience.action, target);
            grads.accumulate(&sample_grads);
            total_loss += loss;
        }

        let batch_len = batch.len() as f64;
        grads.scale(1.0 / batch_len);
        self.optimizer.step(&mut self.q_network, &grads);

        self.train_steps += 1;
        if self.train_steps % self.config.target_update_freq == 0 {
            self.target_network.soft_update(&self.q_network, self.config.tau);
        }

        Some(total_loss / batch_len)
    }

    fn exploration_rate(&self) -> f64 {
        self.epsilon()
    }

    fn snapshot(&self) -> Result<AgentSnapshot, TrainError> {
        Ok(AgentSnapshot {
            model: serde_json::to_vec(&self.q_network)?,
            optimizer: serde_json::to_vec(&self.optimizer)?,
            exploration_rate: self.epsilon(),
        })
    }

    fn restore(&mut self, snapshot: &AgentSnapshot) -> Result<(), TrainError> {
        self.q_network = serde_json::from_slice(&snapshot.model)?;
        self.target_network = self.q_network.clone();
        self.optimizer = serde_json::from_slice(&snapshot.optimizer)?;
        self.steps_done = self.steps_for_epsilon(snapshot.exploration_rate);
        Ok(())
    }

    fn name(&self) -> &str {
        "DQN"
    }
}
