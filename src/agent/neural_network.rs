//! Simple neural network and optimizer for Q-value approximation.

use ndarray::{Array1, Array2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use serde::{Deserialize, Serialize};

/// Activation function types
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Activation {
    ReLU,
    Tanh,
    Sigmoid,
    Linear,
}

impl Activation {
    fn apply(&self, x: f64) -> f64 {
        match self {
            Activation::ReLU => x.max(0.0),
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Linear => x,
        }
    }

    /// Derivative expressed in terms of the activation output
    fn derivative_from_output(&self, y: f64) -> f64 {
        match self {
            Activation::ReLU => {
                if y > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Tanh => 1.0 - y * y,
            Activation::Sigmoid => y * (1.0 - y),
            Activation::Linear => 1.0,
        }
    }
}

/// A single layer in the neural network
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Layer {
    weights: Array2<f64>,
    biases: Array1<f64>,
    activation: Activation,
}

impl Layer {
    fn new(input_size: usize, output_size: usize, activation: Activation) -> Self {
        // Xavier initialization
        let scale = (2.0 / (input_size + output_size) as f64).sqrt();
        let weights = Array2::random((input_size, output_size), Uniform::new(-scale, scale));
        let biases = Array1::zeros(output_size);

        Self {
            weights,
            biases,
            activation,
        }
    }

    fn forward(&self, input: &Array1<f64>) -> Array1<f64> {
        let z = input.dot(&self.weights) + &self.biases;
        z.mapv(|x| self.activation.apply(x))
    }
}

/// Per-layer weight and bias gradients produced by one backward pass
#[derive(Debug, Clone)]
pub struct Gradients {
    weights: Vec<Array2<f64>>,
    biases: Vec<Array1<f64>>,
}

impl Gradients {
    /// Zero gradients shaped like `network`
    pub fn zeros_like(network: &NeuralNetwork) -> Self {
        Self {
            weights: network
                .layers
                .iter()
                .map(|l| Array2::zeros(l.weights.raw_dim()))
                .collect(),
            biases: network
                .layers
                .iter()
                .map(|l| Array1::zeros(l.biases.raw_dim()))
                .collect(),
        }
    }

    /// Add another set of gradients elementwise
    pub fn accumulate(&mut self, other: &Gradients) {
        for (acc, grad) in self.weights.iter_mut().zip(&other.weights) {
            *acc += grad;
        }
        for (acc, grad) in self.biases.iter_mut().zip(&other.biases) {
            *acc += grad;
        }
    }

    /// Scale all gradients, e.g. for batch averaging
    pub fn scale(&mut self, factor: f64) {
        for grad in &mut self.weights {
            *grad *= factor;
        }
        for grad in &mut self.biases {
            *grad *= factor;
        }
    }
}

/// Neural network for Q-value approximation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuralNetwork {
    layers: Vec<Layer>,
}

impl NeuralNetwork {
    /// Create a new network; hidden layers use ReLU, the output layer is linear
    pub fn new(layer_sizes: &[usize]) -> Self {
        assert!(
            layer_sizes.len() >= 2,
            "Need at least input and output layers"
        );

        let mut layers = Vec::new();

        for i in 0..layer_sizes.len() - 1 {
            let activation = if i == layer_sizes.len() - 2 {
                Activation::Linear
            } else {
                Activation::ReLU
            };

            layers.push(Layer::new(layer_sizes[i], layer_sizes[i + 1], activation));
        }

        Self { layers }
    }

    /// Forward pass
    pub fn forward(&self, input: &Array1<f64>) -> Array1<f64> {
        let mut output = input.clone();
        for layer in &self.layers {
            output = layer.forward(&output);
        }
        output
    }

    /// Predict Q-values for all actions
    pub fn predict(&self, state: &Array1<f64>) -> Array1<f64> {
        self.forward(state)
    }

    /// Get the best action (argmax of Q-values)
    pub fn best_action(&self, state: &Array1<f64>) -> usize {
        let q_values = self.predict(state);
        q_values
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Backpropagate the squared TD error of one (state, action, target)
    /// sample. Returns the per-layer gradients and the squared error.
    pub fn backward(&self, state: &Array1<f64>, action: usize, target: f64) -> (Gradients, f64) {
        // Forward pass, keeping every layer's output
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        activations.push(state.clone());
        for layer in &self.layers {
            let output = layer.forward(activations.last().unwrap());
            activations.push(output);
        }

        let output = activations.last().unwrap();
        let error = output[action] - target;
        let loss = error * error;

        // Only the trained action carries error at the output
        let mut delta = Array1::zeros(output.len());
        delta[action] = error;

        let mut grads = Gradients::zeros_like(self);
        for i in (0..self.layers.len()).rev() {
            let input = &activations[i];
            grads.weights[i] = input
                .view()
                .insert_axis(Axis(1))
                .dot(&delta.view().insert_axis(Axis(0)));
            grads.biases[i] = delta.clone();

            if i > 0 {
                let upstream = self.layers[i].weights.dot(&delta);
                let prev_output = &activations[i];
                delta = upstream
                    .iter()
                    .zip(prev_output.iter())
                    .map(|(&g, &y)| g * self.layers[i - 1].activation.derivative_from_output(y))
                    .collect::<Array1<f64>>();
            }
        }

        (grads, loss)
    }

    /// Copy weights from another network
    pub fn copy_from(&mut self, other: &NeuralNetwork) {
        for (self_layer, other_layer) in self.layers.iter_mut().zip(other.layers.iter()) {
            self_layer.weights.assign(&other_layer.weights);
            self_layer.biases.assign(&other_layer.biases);
        }
    }

    /// Soft update weights from another network (for target network)
    pub fn soft_update(&mut self, other: &NeuralNetwork, tau: f64) {
        for (self_layer, other_layer) in self.layers.iter_mut().zip(other.layers.iter()) {
            self_layer
                .weights
                .zip_mut_with(&other_layer.weights, |w, &o| *w = tau * o + (1.0 - tau) * *w);
            self_layer
                .biases
                .zip_mut_with(&other_layer.biases, |b, &o| *b = tau * o + (1.0 - tau) * *b);
        }
    }
}

/// SGD with classical momentum. The velocity buffers are the optimizer
/// state persisted in checkpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumSgd {
    learning_rate: f64,
    momentum: f64,
    velocity_weights: Vec<Array2<f64>>,
    velocity_biases: Vec<Array1<f64>>,
}

impl MomentumSgd {
    /// Create an optimizer; velocity buffers are sized lazily on first step
    pub fn new(learning_rate: f64, momentum: f64) -> Self {
        Self {
            learning_rate,
            momentum,
            velocity_weights: Vec::new(),
            velocity_biases: Vec::new(),
        }
    }

    fn ensure_shapes(&mut self, network: &NeuralNetwork) {
        if self.velocity_weights.len() != network.layers.len() {
            self.velocity_weights = network
                .layers
                .iter()
                .map(|l| Array2::zeros(l.weights.raw_dim()))
                .collect();
            self.velocity_biases = network
                .layers
                .iter()
                .map(|l| Array1::zeros(l.biases.raw_dim()))
                .collect();
        }
    }

    /// Apply one descent step to `network`
    pub fn step(&mut self, network: &mut NeuralNetwork, grads: &Gradients) {
        self.ensure_shapes(network);

        for i in 0..network.layers.len() {
            let velocity_w = &self.velocity_weights[i] * self.momentum + &grads.weights[i];
            let velocity_b = &self.velocity_biases[i] * self.momentum + &grads.biases[i];

            network.layers[i].weights -= &(&velocity_w * self.learning_rate);
            network.layers[i].biases -= &(&velocity_b * self.learning_rate);

            self.velocity_weights[i] = velocity_w;
            self.velocity_biases[i] = velocity_b;
        }
    }

    /// Get learning rate
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_creation() {
        let network = NeuralNetwork::new(&[10, 64, 32, 3]);
        assert_eq!(network.layers.len(), 3);
    }

    #[test]
    fn test_forward_pass() {
        let network = NeuralNetwork::new(&[10, 64, 32, 3]);
        let input = Array1::from_vec(vec![0.1; 10]);
        let output = network.forward(&input);
        assert_eq!(output.len(), 3);
    }

    #[test]
    fn test_best_action() {
        let network = NeuralNetwork::new(&[10, 32, 3]);
        let input = Array1::from_vec(vec![0.1; 10]);
        let action = network.best_action(&input);
        assert!(action < 3);
    }

    #[test]
    fn test_soft_update_moves_weights() {
        let mut network1 = NeuralNetwork::new(&[10, 32, 3]);
        let network2 = NeuralNetwork::new(&[10, 32, 3]);

        let input = Array1::from_vec(vec![0.1; 10]);
        let before = network1.forward(&input);

        network1.soft_update(&network2, 0.5);

        let after = network1.forward(&input);
        assert!(before != after);
    }

    #[test]
    fn test_training_reduces_error() {
        let mut network = NeuralNetwork::new(&[4, 16, 2]);
        let mut optimizer = MomentumSgd::new(0.01, 0.9);
        let state = Array1::from_vec(vec![0.5, -0.2, 0.1, 0.0]);
        let target = 1.0;

        let (_, initial_loss) = network.backward(&state, 0, target);

        for _ in 0..50 {
            let (grads, _) = network.backward(&state, 0, target);
            optimizer.step(&mut network, &grads);
        }

        let (_, final_loss) = network.backward(&state, 0, target);
        assert!(final_loss < initial_loss);
    }

    #[test]
    fn test_serialization_roundtrip_preserves_predictions() {
        let network = NeuralNetwork::new(&[4, 8, 2]);
        let bytes = serde_json::to_vec(&network).unwrap();
        let loaded: NeuralNetwork = serde_json::from_slice(&bytes).unwrap();

        let input = Array1::from_vec(vec![0.3, -0.1, 0.7, 0.2]);
        assert_eq!(network.forward(&input), loaded.forward(&input));
    }
}
