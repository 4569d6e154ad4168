//! Simulation parameters.
//!
//! Every record deserializes with defaults for missing fields, so a config
//! file only needs to list what it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a configuration is rejected at the host boundary.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Population must contain at least one car.
    #[error("population size must be positive")]
    EmptyPopulation,
    /// Mutation rate must be a probability.
    #[error("mutation rate {0} must be between 0.0 and 1.0")]
    MutationRate(f32),
    /// Max speed override must be a positive finite number.
    #[error("max speed override {0} must be positive")]
    MaxSpeed(f32),
    /// At least one forward ray is required.
    #[error("sensor needs at least one forward ray")]
    NoForwardRays,
    /// The road needs at least one lane.
    #[error("road needs at least one lane")]
    NoLanes,
    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// Config file is not valid JSON for [`Params`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Road placement and the start line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadParams {
    /// Horizontal centre of the road.
    pub center_x: f32,
    /// Total road width, border to border.
    pub width: f32,
    /// Number of lanes.
    pub lane_count: usize,
    /// Vertical position where training cars start.
    pub start_y: f32,
}

impl Default for RoadParams {
    fn default() -> Self {
        Self {
            center_x: 100.0,
            width: 180.0,
            lane_count: 3,
            start_y: 100.0,
        }
    }
}

/// Body size and kinematic constants shared by every car.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleParams {
    /// Body width.
    pub width: f32,
    /// Body length.
    pub height: f32,
    /// Speed gained per tick at full throttle.
    pub acceleration: f32,
    /// Speed lost per tick to friction.
    pub friction: f32,
    /// Heading change per tick while steering, in radians.
    pub turn_rate: f32,
    /// Steering is ignored at or below this absolute speed.
    pub steer_min_speed: f32,
    /// Default maximum forward speed of training cars.
    pub max_speed: f32,
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            width: 30.0,
            height: 50.0,
            acceleration: 0.2,
            friction: 0.05,
            turn_rate: 0.03,
            steer_min_speed: 0.5,
            max_speed: 2.0,
        }
    }
}

/// Ray fan layout of the range sensor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorParams {
    /// Rays fanned around the heading.
    pub forward_rays: usize,
    /// Rays fanned around the opposite of the heading.
    pub backward_rays: usize,
    /// Length of forward rays.
    pub ray_length: f32,
    /// Total forward fan angle in radians.
    pub forward_spread: f32,
    /// Total backward fan angle in radians.
    pub backward_spread: f32,
    /// Backward ray length as a fraction of `ray_length`.
    pub backward_length_ratio: f32,
    /// Normalized angle reported for every backward ray.
    pub backward_angle_marker: f32,
}

impl Default for SensorParams {
    fn default() -> Self {
        Self {
            forward_rays: 8,
            backward_rays: 4,
            ray_length: 150.0,
            forward_spread: std::f32::consts::PI * 0.75,
            backward_spread: std::f32::consts::PI * 0.5,
            backward_length_ratio: 0.6,
            backward_angle_marker: -1.5,
        }
    }
}

impl SensorParams {
    /// Total number of rays.
    pub fn ray_count(&self) -> usize {
        self.forward_rays + self.backward_rays
    }

    /// Length of the controller input vector (one proximity and one angle per ray).
    pub fn input_size(&self) -> usize {
        2 * self.ray_count()
    }
}

/// Post-processing applied to raw network outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyParams {
    /// Left and right are both "on" above this value and then compete.
    pub steer_threshold: f32,
    /// A forward proximity above this value counts as an obstacle ahead.
    pub obstacle_threshold: f32,
    /// Max speed multiplier while the road ahead is clear.
    pub clear_road_boost: f32,
}

impl Default for PolicyParams {
    fn default() -> Self {
        Self {
            steer_threshold: 0.5,
            obstacle_threshold: 0.5,
            clear_road_boost: 2.0,
        }
    }
}

/// Obstacle traffic spawning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficParams {
    /// Obstacles placed at the start of a generation.
    pub initial_count: usize,
    /// Distance ahead of the start line of the first obstacle.
    pub lead_distance: f32,
    /// Distance between consecutive obstacles.
    pub spacing: f32,
    /// Maximum random extra distance added to each obstacle.
    pub jitter: f32,
    /// Obstacles appended ahead of the furthest one on each refill.
    pub refill_count: usize,
    /// Ticks between refills.
    pub refill_interval: u32,
    /// Obstacles further than this behind the start line are dropped.
    pub prune_distance: f32,
    /// Minimum obstacle cruising speed.
    pub min_speed: f32,
    /// Maximum obstacle cruising speed (exclusive).
    pub max_speed: f32,
}

impl Default for TrafficParams {
    fn default() -> Self {
        Self {
            initial_count: 20,
            lead_distance: 400.0,
            spacing: 200.0,
            jitter: 200.0,
            refill_count: 5,
            refill_interval: 100,
            prune_distance: 400.0,
            min_speed: 1.0,
            max_speed: 2.0,
        }
    }
}

/// Population and genetic search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingParams {
    /// Cars per generation.
    pub population_size: usize,
    /// Probability that each weight and bias is perturbed.
    pub mutation_rate: f32,
    /// Scale of a single perturbation.
    pub mutation_magnitude: f32,
    /// Width of the hidden layer.
    pub hidden_size: usize,
    /// Replaces the vehicle max speed of every training car.
    pub max_speed_override: Option<f32>,
    /// Advance automatically once every car is damaged.
    pub auto_advance: bool,
    /// Hosts persist a generation's best network only above this fitness.
    pub min_save_fitness: f32,
    /// Fitness points per unit of current speed.
    pub speed_reward: f32,
    /// Fitness points per overtaken obstacle.
    pub overtake_reward: f32,
    /// Seed for a reproducible run.
    pub seed: Option<u64>,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            population_size: 20,
            mutation_rate: 0.2,
            mutation_magnitude: 1.0,
            hidden_size: 16,
            max_speed_override: None,
            auto_advance: true,
            min_save_fitness: 50.0,
            speed_reward: 5.0,
            overtake_reward: 20.0,
            seed: None,
        }
    }
}

/// Complete simulation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Road geometry.
    pub road: RoadParams,
    /// Car body and kinematics.
    pub vehicle: VehicleParams,
    /// Range sensor layout.
    pub sensor: SensorParams,
    /// Output post-processing.
    pub policy: PolicyParams,
    /// Obstacle traffic.
    pub traffic: TrafficParams,
    /// Population and mutation.
    pub training: TrainingParams,
}

impl Params {
    /// Loads parameters from a JSON file; absent fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let params = serde_json::from_str(&json)?;
        Ok(params)
    }

    /// Checks the values the core treats as preconditions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let training = &self.training;
        if training.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if !(0.0..=1.0).contains(&training.mutation_rate) {
            return Err(ConfigError::MutationRate(training.mutation_rate));
        }
        if let Some(speed) = training.max_speed_override {
            if !(speed.is_finite() && speed > 0.0) {
                return Err(ConfigError::MaxSpeed(speed));
            }
        }
        if self.sensor.forward_rays == 0 {
            return Err(ConfigError::NoForwardRays);
        }
        if self.road.lane_count == 0 {
            return Err(ConfigError::NoLanes);
        }
        Ok(())
    }

    /// Base max speed of training cars after applying the override.
    pub fn car_max_speed(&self) -> f32 {
        self.training
            .max_speed_override
            .unwrap_or(self.vehicle.max_speed)
    }

    /// Network layer sizes: sensor inputs, hidden layer, four controls.
    pub fn layer_sizes(&self) -> Vec<usize> {
        vec![self.sensor.input_size(), self.training.hidden_size, 4]
    }
}
