//! Experience replay buffer for DQN.

use crate::environment::Observation;
use rand::seq::SliceRandom;
use rand::thread_rng;
use std::collections::VecDeque;

/// Single experience tuple
#[derive(Debug, Clone)]
pub struct Experience {
    pub state: Observation,
    pub action: usize,
    pub reward: f64,
    pub next_state: Observation,
    pub done: bool,
}

impl Experience {
    pub fn new(
        state: Observation,
        action: usize,
        reward: f64,
        next_state: Observation,
        done: bool,
    ) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }
}

/// Fixed-capacity buffer for storing and sampling experiences
pub struct ReplayBuffer {
    buffer: VecDeque<Experience>,
    capacity: usize,
}

impl ReplayBuffer {
    /// Create a new replay buffer with given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add an experience, evicting the oldest once at capacity
    pub fn push(&mut self, experience: Experience) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(experience);
    }

    /// Sample a batch of experiences randomly
    pub fn sample(&self, batch_size: usize) -> Vec<Experience> {
        let mut rng = thread_rng();
        let mut indices: Vec<usize> = (0..self.buffer.len()).collect();
        indices.shuffle(&mut rng);

        indices
            .into_iter()
            .take(batch_size.min(self.buffer.len()))
            .map(|i| self.buffer[i].clone())
            .collect()
    }

    /// Get the current size of the buffer
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Check if buffer has enough samples for training
    pub fn can_sample(&self, batch_size: usize) -> bool {
        self.buffer.len() >= batch_size
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    fn dummy_experience(tag: f64) -> Experience {
        Experience::new(
            Array1::from_vec(vec![tag; 4]),
            0,
            0.5,
            Array1::from_vec(vec![tag + 1.0; 4]),
            false,
        )
    }

    #[test]
    fn test_push_and_sample() {
        let mut buffer = ReplayBuffer::new(100);

        for i in 0..50 {
            buffer.push(dummy_experience(i as f64));
        }

        assert_eq!(buffer.len(), 50);
        assert!(buffer.can_sample(32));

        let samples = buffer.sample(32);
        assert_eq!(samples.len(), 32);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut buffer = ReplayBuffer::new(10);

        for i in 0..20 {
            buffer.push(dummy_experience(i as f64));
        }

        assert_eq!(buffer.len(), 10);
        // The first ten experiences were evicted
        for experience in buffer.sample(10) {
            assert!(experience.state[0] >= 10.0);
        }
    }

    #[test]
    fn test_cannot_sample_more_than_stored() {
        let mut buffer = ReplayBuffer::new(10);
        buffer.push(dummy_experience(0.0));

        assert!(!buffer.can_sample(2));
        assert_eq!(buffer.sample(5).len(), 1);
    }
}
