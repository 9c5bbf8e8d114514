//! Episodic environment module implementing an OpenAI Gym-like interface.

mod cartpole;

pub use cartpole::CartPole;

use crate::error::TrainError;
use ndarray::Array1;

/// Observation vector handed to the agent
pub type Observation = Array1<f64>;

/// Step result returned by the environment
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Next state observation
    pub state: Observation,
    /// Reward for the action
    pub reward: f64,
    /// Whether episode is done
    pub done: bool,
}

/// Episodic environment with a discrete action space
pub trait Environment: std::fmt::Debug {
    /// Reset the environment for a new episode and return the initial observation
    fn reset(&mut self) -> Observation;

    /// Take a step in the environment
    fn step(&mut self, action: usize) -> StepResult;

    /// Get the state size
    fn state_size(&self) -> usize;

    /// Get the action size
    fn action_size(&self) -> usize;

    /// Environment identifier
    fn id(&self) -> &str;
}

/// Construct an environment from its identifier
pub fn make_env(id: &str) -> Result<Box<dyn Environment>, TrainError> {
    match id {
        "cartpole" | "CartPole-v1" => Ok(Box::new(CartPole::new())),
        other => Err(TrainError::UnknownEnvironment(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_env_cartpole() {
        let env = make_env("cartpole").unwrap();
        assert_eq!(env.state_size(), 4);
        assert_eq!(env.action_size(), 2);
    }

    #[test]
    fn test_make_env_unknown_id() {
        let err = make_env("pong").unwrap_err();
        assert!(matches!(err, TrainError::UnknownEnvironment(_)));
    }
}
