//! Versioned exchange format for trained networks.
//!
//! A [`NetworkRecord`] is what gets written to disk. Loading goes through
//! [`NetworkRecord::validate`] once, so a [`Network`] built from a record
//! always has consistent dimensions.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Level, Network};

/// Current schema version written by [`NetworkRecord::from`].
pub const SCHEMA_VERSION: u32 = 1;

/// Errors raised when a record does not describe a usable network.
#[derive(Debug, Error, PartialEq)]
pub enum NetworkError {
    /// Record was written by an unknown schema.
    #[error("unsupported network schema version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the record.
        found: u32,
        /// Version this build understands.
        expected: u32,
    },
    /// A network needs at least one level.
    #[error("network must contain at least one level")]
    NoLevels,
    /// A level declares zero inputs or outputs.
    #[error("level {index} has zero-sized dimensions")]
    ZeroSizedLevel {
        /// Offending level.
        index: usize,
    },
    /// Weight matrix row count differs from the declared input count.
    #[error("level {index} has {actual} weight rows, expected {expected}")]
    WeightRows {
        /// Offending level.
        index: usize,
        /// Declared input count.
        expected: usize,
        /// Rows present.
        actual: usize,
    },
    /// A weight row's length differs from the declared output count.
    #[error("level {index} weight row {row} has {actual} columns, expected {expected}")]
    WeightColumns {
        /// Offending level.
        index: usize,
        /// Offending row.
        row: usize,
        /// Declared output count.
        expected: usize,
        /// Columns present.
        actual: usize,
    },
    /// Bias vector length differs from the declared output count.
    #[error("level {index} has {actual} biases, expected {expected}")]
    BiasLength {
        /// Offending level.
        index: usize,
        /// Declared output count.
        expected: usize,
        /// Biases present.
        actual: usize,
    },
    /// A level's input count does not match the previous level's outputs.
    #[error("level {index} input {actual} does not match previous output {expected}")]
    MismatchedTopology {
        /// Offending level.
        index: usize,
        /// Previous level's output count.
        expected: usize,
        /// This level's input count.
        actual: usize,
    },
    /// A weight or bias is NaN or infinite.
    #[error("level {index} contains a non-finite parameter")]
    NonFinite {
        /// Offending level.
        index: usize,
    },
    /// The network's input or output width does not fit the caller.
    #[error("network shape {actual:?} does not fit {expected_inputs} inputs and {expected_outputs} outputs")]
    Shape {
        /// Required input width.
        expected_inputs: usize,
        /// Required output width.
        expected_outputs: usize,
        /// Layer sizes of the network.
        actual: Vec<usize>,
    },
}

/// Serialized form of one [`Level`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelRecord {
    /// Number of inputs.
    pub input_count: usize,
    /// Number of outputs.
    pub output_count: usize,
    /// `input_count` rows of `output_count` weights each.
    pub weights: Vec<Vec<f32>>,
    /// `output_count` biases.
    pub biases: Vec<f32>,
}

/// Serialized form of a [`Network`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRecord {
    /// Schema version, see [`SCHEMA_VERSION`].
    pub version: u32,
    /// Levels from input to output.
    pub levels: Vec<LevelRecord>,
}

impl NetworkRecord {
    /// Checks version, per-level dimensions and level-to-level topology.
    pub fn validate(&self) -> Result<(), NetworkError> {
        if self.version != SCHEMA_VERSION {
            return Err(NetworkError::UnsupportedVersion {
                found: self.version,
                expected: SCHEMA_VERSION,
            });
        }
        if self.levels.is_empty() {
            return Err(NetworkError::NoLevels);
        }

        let mut previous_outputs: Option<usize> = None;
        for (index, level) in self.levels.iter().enumerate() {
            if level.input_count == 0 || level.output_count == 0 {
                return Err(NetworkError::ZeroSizedLevel { index });
            }
            if let Some(expected) = previous_outputs {
                if level.input_count != expected {
                    return Err(NetworkError::MismatchedTopology {
                        index,
                        expected,
                        actual: level.input_count,
                    });
                }
            }
            if level.weights.len() != level.input_count {
                return Err(NetworkError::WeightRows {
                    index,
                    expected: level.input_count,
                    actual: level.weights.len(),
                });
            }
            for (row, weights) in level.weights.iter().enumerate() {
                if weights.len() != level.output_count {
                    return Err(NetworkError::WeightColumns {
                        index,
                        row,
                        expected: level.output_count,
                        actual: weights.len(),
                    });
                }
            }
            if level.biases.len() != level.output_count {
                return Err(NetworkError::BiasLength {
                    index,
                    expected: level.output_count,
                    actual: level.biases.len(),
                });
            }
            let finite = level
                .weights
                .iter()
                .flatten()
                .chain(&level.biases)
                .all(|v| v.is_finite());
            if !finite {
                return Err(NetworkError::NonFinite { index });
            }
            previous_outputs = Some(level.output_count);
        }

        Ok(())
    }
}

impl From<&Level> for LevelRecord {
    fn from(level: &Level) -> Self {
        Self {
            input_count: level.input_size(),
            output_count: level.output_size(),
            weights: level.weights.outer_iter().map(|row| row.to_vec()).collect(),
            biases: level.biases.to_vec(),
        }
    }
}

impl From<&Network> for NetworkRecord {
    fn from(network: &Network) -> Self {
        Self {
            version: SCHEMA_VERSION,
            levels: network.levels.iter().map(LevelRecord::from).collect(),
        }
    }
}

impl From<Network> for NetworkRecord {
    fn from(network: Network) -> Self {
        Self::from(&network)
    }
}

impl TryFrom<NetworkRecord> for Network {
    type Error = NetworkError;

    fn try_from(record: NetworkRecord) -> Result<Self, Self::Error> {
        record.validate()?;

        let levels = record
            .levels
            .into_iter()
            .map(|level| {
                let flat: Vec<f32> = level.weights.into_iter().flatten().collect();
                Level {
                    weights: Array2::from_shape_fn(
                        (level.input_count, level.output_count),
                        |(i, j)| flat[i * level.output_count + j],
                    ),
                    biases: Array1::from_vec(level.biases),
                }
            })
            .collect();

        Ok(Network { levels })
    }
}
