//! Cart-pole balancing environment.
//!
//! Classic control task: a pole is hinged to a cart moving along a
//! frictionless track, and the agent pushes the cart left or right to keep
//! the pole upright. Reward is +1 per step; the episode ends once the pole
//! tips past its angle limit or the cart leaves the track.

use super::{Environment, Observation, StepResult};
use ndarray::Array1;
use rand::Rng;

const GRAVITY: f64 = 9.8;
const CART_MASS: f64 = 1.0;
const POLE_MASS: f64 = 0.1;
const POLE_HALF_LENGTH: f64 = 0.5;
const FORCE_MAG: f64 = 10.0;
/// Integration time step in seconds
const TAU: f64 = 0.02;
const THETA_LIMIT: f64 = 12.0 * std::f64::consts::PI / 180.0;
const X_LIMIT: f64 = 2.4;
/// Initial state components are drawn uniformly from this range
const INIT_RANGE: f64 = 0.05;

/// Cart-pole environment state: cart position/velocity and pole angle/angular velocity
#[derive(Debug)]
pub struct CartPole {
    x: f64,
    x_dot: f64,
    theta: f64,
    theta_dot: f64,
}

impl CartPole {
    /// Create a new environment; call [`reset`](Environment::reset) before stepping
    pub fn new() -> Self {
        Self {
            x: 0.0,
            x_dot: 0.0,
            theta: 0.0,
            theta_dot: 0.0,
        }
    }

    fn observation(&self) -> Observation {
        Array1::from_vec(vec![self.x, self.x_dot, self.theta, self.theta_dot])
    }

    fn terminal(&self) -> bool {
        self.x.abs() > X_LIMIT || self.theta.abs() > THETA_LIMIT
    }
}

impl Default for CartPole {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for CartPole {
    fn reset(&mut self) -> Observation {
        let mut rng = rand::thread_rng();
        self.x = rng.gen_range(-INIT_RANGE..INIT_RANGE);
        self.x_dot = rng.gen_range(-INIT_RANGE..INIT_RANGE);
        self.theta = rng.gen_range(-INIT_RANGE..INIT_RANGE);
        self.theta_dot = rng.gen_range(-INIT_RANGE..INIT_RANGE);
        self.observation()
    }

    fn step(&mut self, action: usize) -> StepResult {
        let force = if action == 1 { FORCE_MAG } else { -FORCE_MAG };

        let total_mass = CART_MASS + POLE_MASS;
        let pole_mass_length = POLE_MASS * POLE_HALF_LENGTH;
        let cos_theta = self.theta.cos();
        let sin_theta = self.theta.sin();

        // Euler integration of the cart-pole dynamics
        let temp = (force + pole_mass_length * self.theta_dot.powi(2) * sin_theta) / total_mass;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (POLE_HALF_LENGTH * (4.0 / 3.0 - POLE_MASS * cos_theta * cos_theta / total_mass));
        let x_acc = temp - pole_mass_length * theta_acc * cos_theta / total_mass;

        self.x += TAU * self.x_dot;
        self.x_dot += TAU * x_acc;
        self.theta += TAU * self.theta_dot;
        self.theta_dot += TAU * theta_acc;

        StepResult {
            state: self.observation(),
            reward: 1.0,
            done: self.terminal(),
        }
    }

    fn state_size(&self) -> usize {
        4
    }

    fn action_size(&self) -> usize {
        2
    }

    fn id(&self) -> &str {
        "cartpole"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_starts_near_upright() {
        let mut env = CartPole::new();
        let obs = env.reset();

        assert_eq!(obs.len(), 4);
        for value in obs.iter() {
            assert!(value.abs() < INIT_RANGE);
        }
    }

    #[test]
    fn test_constant_push_topples_pole() {
        let mut env = CartPole::new();
        env.reset();

        let mut done = false;
        let mut steps = 0;

        while !done {
            let result = env.step(0);
            done = result.done;
            steps += 1;

            if steps > 500 {
                panic!("pole did not fall under a constant push");
            }
        }

        // A pole pushed one way every step cannot balance for long
        assert!(steps < 200);
    }

    #[test]
    fn test_step_returns_unit_reward() {
        let mut env = CartPole::new();
        env.reset();

        let result = env.step(1);
        assert_eq!(result.reward, 1.0);
        assert_eq!(result.state.len(), 4);
    }
}
