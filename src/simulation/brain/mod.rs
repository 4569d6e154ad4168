//! Feedforward controller network.
//!
//! Maps sensor-derived inputs to the four control outputs (forward, left,
//! right, reverse) and supports the mutation operator used by the trainer.
//! Networks are plain values: cloning one never shares parameters with the
//! original.

use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub mod level;
pub mod record;

pub use level::{Level, sigmoid};
pub use record::{LevelRecord, NetworkError, NetworkRecord, SCHEMA_VERSION};

/// Number of control outputs.
pub const CONTROL_OUTPUTS: usize = 4;

/// Initial biases of the output level, in control order.
///
/// Forward starts strongly on and reverse strongly off; left and right need
/// some input before they pass the steering threshold.
pub const OUTPUT_BIAS_SEED: [f32; CONTROL_OUTPUTS] = [2.0, -0.5, -0.5, -2.0];

/// A layered feedforward network with sigmoid activations.
///
/// Serializes through [`NetworkRecord`], so deserialization rejects
/// inconsistent dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "NetworkRecord", try_from = "NetworkRecord")]
pub struct Network {
    /// Ordered levels from input to output.
    pub levels: Vec<Level>,
}

impl Network {
    /// Creates a network with uniform random parameters in `[-scale, scale)`
    /// from the thread-local generator.
    pub fn new(layer_sizes: &[usize], scale: f32) -> Self {
        let levels = layer_sizes
            .windows(2)
            .map(|pair| Level::new_random(pair[0], pair[1], scale))
            .collect();

        Self { levels }
    }

    /// Same as [`Network::new`], drawing every parameter from `rng`.
    pub fn random<R: Rng + ?Sized>(layer_sizes: &[usize], scale: f32, rng: &mut R) -> Self {
        let levels = layer_sizes
            .windows(2)
            .map(|pair| Level::random_using(pair[0], pair[1], scale, rng))
            .collect();

        Self { levels }
    }

    /// Creates the driving controller: `[input_size, hidden_size, 4]`,
    /// parameters in `[-1, 1)`, output biases seeded with [`OUTPUT_BIAS_SEED`].
    pub fn for_controls<R: Rng + ?Sized>(
        input_size: usize,
        hidden_size: usize,
        rng: &mut R,
    ) -> Self {
        let mut network = Self::random(&[input_size, hidden_size, CONTROL_OUTPUTS], 1.0, rng);
        network.seed_output_biases();
        network
    }

    /// Builds a network from levels, checking level-to-level dimensions.
    pub fn from_levels(levels: Vec<Level>) -> Result<Self, NetworkError> {
        Self::try_from(NetworkRecord::from(&Self { levels }))
    }

    /// Overwrites the output level's biases with [`OUTPUT_BIAS_SEED`].
    pub fn seed_output_biases(&mut self) {
        if let Some(output) = self.levels.last_mut() {
            if output.biases.len() == CONTROL_OUTPUTS {
                output.biases.assign(&Array1::from_vec(OUTPUT_BIAS_SEED.to_vec()));
            }
        }
    }

    /// Runs a forward pass through all levels.
    #[inline]
    pub fn think(&self, inputs: &Array1<f32>) -> Array1<f32> {
        let mut output = inputs.clone();
        for level in &self.levels {
            output = level.forward(&output);
        }
        output
    }

    /// Layer sizes, input width first.
    pub fn shape(&self) -> Vec<usize> {
        let mut shape: Vec<usize> = self
            .levels
            .first()
            .map(Level::input_size)
            .into_iter()
            .collect();
        shape.extend(self.levels.iter().map(Level::output_size));
        shape
    }

    /// Number of inputs the first level consumes.
    pub fn input_size(&self) -> usize {
        self.levels.first().map_or(0, Level::input_size)
    }

    /// Number of outputs the last level produces.
    pub fn output_size(&self) -> usize {
        self.levels.last().map_or(0, Level::output_size)
    }

    /// Checks that the network consumes `inputs` values and emits `outputs`.
    pub fn check_io(&self, inputs: usize, outputs: usize) -> Result<(), NetworkError> {
        if self.input_size() == inputs && self.output_size() == outputs {
            Ok(())
        } else {
            Err(NetworkError::Shape {
                expected_inputs: inputs,
                expected_outputs: outputs,
                actual: self.shape(),
            })
        }
    }

    /// Mutates every level, see [`Level::mutate`]. Topology never changes.
    ///
    /// `rate` is clamped to `[0, 1]`; NaN mutates nothing.
    pub fn mutate<R: Rng + ?Sized>(&mut self, rate: f32, magnitude: f32, rng: &mut R) {
        for level in &mut self.levels {
            level.mutate(rate, magnitude, rng);
        }
    }

    /// Euclidean distance between the parameter vectors of two networks.
    ///
    /// Networks of different shape are infinitely far apart.
    pub fn distance(a: &Network, b: &Network) -> f32 {
        if a.shape() != b.shape() {
            return f32::INFINITY;
        }
        let mut sum_sq = 0.0;
        for (la, lb) in a.levels.iter().zip(&b.levels) {
            for (wa, wb) in la.weights.iter().zip(lb.weights.iter()) {
                sum_sq += (wa - wb).powi(2);
            }
            for (ba, bb) in la.biases.iter().zip(lb.biases.iter()) {
                sum_sq += (ba - bb).powi(2);
            }
        }
        sum_sq.sqrt()
    }

    /// Serializes to pretty JSON in the [`NetworkRecord`] schema.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&NetworkRecord::from(self))
    }

    /// Parses and validates a network from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
