//! The policy network: a fixed two-layer perceptron mapping an observation to an action
//! probability. Its flat parameter vector is the genotype the genetic algorithm works on.

use crate::config::Architecture;
use rand::Rng;
use rand_distr::StandardNormal;
use rulinalg::matrix::{BaseMatrix, BaseMatrixMut, Matrix};

pub mod activate {
    use crate::constants::NEUROFLAP_SIGMOID_CLIP;

    /// Logistic function; the argument is clipped so `exp` can never overflow.
    pub fn sigmoid(x: f64) -> f64 {
        let x = x.clamp(-NEUROFLAP_SIGMOID_CLIP, NEUROFLAP_SIGMOID_CLIP);
        1. / (1. + (-x).exp())
    }

    pub fn relu(x: f64) -> f64 {
        if x < 0. {
            0.
        } else {
            x
        }
    }
}

use activate::{relu, sigmoid};

/// Input → hidden (ReLU) → output (sigmoid).
///
/// Weight matrices are stored `[from, to]`, so a forward pass is a row vector times each
/// matrix in turn. Biases are `1 × n` rows. Every clone is a deep copy of all four blocks.
#[derive(Debug, Clone)]
pub struct PolicyNetwork {
    architecture: Architecture,
    weights_input_hidden: Matrix<f64>,
    bias_hidden: Matrix<f64>,
    weights_hidden_output: Matrix<f64>,
    bias_output: Matrix<f64>,
}

impl PolicyNetwork {
    /// He-initialized weights, zero biases.
    pub fn random<R: Rng + ?Sized>(architecture: Architecture, rng: &mut R) -> Self {
        let Architecture {
            input_size,
            hidden_size,
            output_size,
        } = architecture;

        Self {
            architecture,
            weights_input_hidden: he_matrix(input_size, hidden_size, rng),
            bias_hidden: Matrix::zeros(1, hidden_size),
            weights_hidden_output: he_matrix(hidden_size, output_size, rng),
            bias_output: Matrix::zeros(1, output_size),
        }
    }

    pub fn zeros(architecture: Architecture) -> Self {
        let Architecture {
            input_size,
            hidden_size,
            output_size,
        } = architecture;

        Self {
            architecture,
            weights_input_hidden: Matrix::zeros(input_size, hidden_size),
            bias_hidden: Matrix::zeros(1, hidden_size),
            weights_hidden_output: Matrix::zeros(hidden_size, output_size),
            bias_output: Matrix::zeros(1, output_size),
        }
    }

    /// Build a network from its flat encoding, see [PolicyNetwork::parameters].
    pub fn from_parameters(architecture: Architecture, parameters: &[f64]) -> Self {
        let mut network = Self::zeros(architecture);
        network.set_parameters(parameters);
        network
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    /// Output activations, each in (0, 1).
    ///
    /// Panics if `observation` is not exactly `input_size` long; that is a bug in the
    /// caller, not a runtime condition.
    pub fn forward(&self, observation: &[f64]) -> Vec<f64> {
        assert_eq!(
            observation.len(),
            self.architecture.input_size,
            "observation length does not match network input size"
        );

        let x = Matrix::new(1, observation.len(), observation.to_vec());
        let hidden = (&x * &self.weights_input_hidden + &self.bias_hidden).apply(&relu);
        (&hidden * &self.weights_hidden_output + &self.bias_output)
            .apply(&sigmoid)
            .into_vec()
    }

    /// Flat genotype: `weights_input_hidden`, `weights_hidden_output`, `bias_hidden`,
    /// `bias_output`, each row-major.
    pub fn parameters(&self) -> Vec<f64> {
        let mut flat = Vec::with_capacity(self.architecture.parameter_count());
        for block in [
            &self.weights_input_hidden,
            &self.weights_hidden_output,
            &self.bias_hidden,
            &self.bias_output,
        ] {
            flat.extend_from_slice(block.data());
        }
        flat
    }

    /// Inverse of [PolicyNetwork::parameters]. A length mismatch means two different
    /// architectures were mixed, which is a configuration error and panics.
    pub fn set_parameters(&mut self, parameters: &[f64]) {
        assert_eq!(
            parameters.len(),
            self.architecture.parameter_count(),
            "parameter vector length does not match network architecture"
        );

        let mut rest = parameters;
        for block in [
            &mut self.weights_input_hidden,
            &mut self.weights_hidden_output,
            &mut self.bias_hidden,
            &mut self.bias_output,
        ] {
            let (head, tail) = rest.split_at(block.data().len());
            block.mut_data().copy_from_slice(head);
            rest = tail;
        }
    }

    pub fn weights_input_hidden(&self) -> &Matrix<f64> {
        &self.weights_input_hidden
    }

    pub fn bias_hidden(&self) -> &Matrix<f64> {
        &self.bias_hidden
    }

    pub fn weights_hidden_output(&self) -> &Matrix<f64> {
        &self.weights_hidden_output
    }

    pub fn bias_output(&self) -> &Matrix<f64> {
        &self.bias_output
    }
}

fn he_matrix<R: Rng + ?Sized>(fan_in: usize, fan_out: usize, rng: &mut R) -> Matrix<f64> {
    let scale = (2. / fan_in as f64).sqrt();
    let data = (0..fan_in * fan_out)
        .map(|_| rng.sample::<f64, _>(StandardNormal) * scale)
        .collect::<Vec<_>>();
    Matrix::new(fan_in, fan_out, data)
}
