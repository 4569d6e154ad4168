//! One fully connected layer of the controller network.

use ndarray::{Array1, Array2};
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;
use rand::Rng;

/// Logistic sigmoid, maps ℝ onto `(0, 1)` with `sigmoid(0) = 0.5`.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// A weight matrix plus bias vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    /// Weight matrix (`input_size` × `output_size`); column `j` feeds output `j`.
    pub weights: Array2<f32>,
    /// Bias vector (`output_size`).
    pub biases: Array1<f32>,
}

impl Level {
    /// Creates a level with weights and biases drawn uniformly from `[-scale, scale)`.
    pub fn new_random(input_size: usize, output_size: usize, scale: f32) -> Self {
        Self {
            weights: Array2::random((input_size, output_size), Uniform::new(-scale, scale)),
            biases: Array1::random(output_size, Uniform::new(-scale, scale)),
        }
    }

    /// Same as [`Level::new_random`], drawing from `rng`.
    pub fn random_using<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        scale: f32,
        rng: &mut R,
    ) -> Self {
        let weights =
            Array2::from_shape_fn((input_size, output_size), |_| rng.random_range(-scale..scale));
        let biases = Array1::from_shape_fn(output_size, |_| rng.random_range(-scale..scale));
        Self { weights, biases }
    }

    /// Creates a level with every parameter set to zero.
    pub fn zeros(input_size: usize, output_size: usize) -> Self {
        Self {
            weights: Array2::zeros((input_size, output_size)),
            biases: Array1::zeros(output_size),
        }
    }

    /// Number of inputs this level consumes.
    pub fn input_size(&self) -> usize {
        self.weights.nrows()
    }

    /// Number of outputs this level produces.
    pub fn output_size(&self) -> usize {
        self.weights.ncols()
    }

    /// Computes `sigmoid(inputs · W + b)`.
    #[inline]
    pub fn forward(&self, inputs: &Array1<f32>) -> Array1<f32> {
        debug_assert_eq!(inputs.len(), self.input_size());
        let mut output = inputs.dot(&self.weights);
        output += &self.biases;
        output.mapv_inplace(sigmoid);
        output
    }

    /// Perturbs each parameter with probability `rate` by `uniform(-1, 1) · magnitude`.
    ///
    /// Weights are visited in row-major order, then biases, so a given
    /// random stream always produces the same result.
    pub fn mutate<R: Rng + ?Sized>(&mut self, rate: f32, magnitude: f32, rng: &mut R) {
        let rate = if rate.is_nan() {
            0.0
        } else {
            f64::from(rate.clamp(0.0, 1.0))
        };

        for value in self.weights.iter_mut().chain(self.biases.iter_mut()) {
            if rng.random_bool(rate) {
                *value += rng.random_range(-1.0_f32..1.0) * magnitude;
            }
        }
    }
}
