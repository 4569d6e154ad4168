//! Control inputs and the sources that produce them.
//!
//! Anything that can fill a [`ControlVector`] once per tick implements
//! [`ControlSource`]: constant cruise control for traffic, host key state for
//! manual driving, or the neural [`Autopilot`]. Post-processing of raw network
//! outputs lives in a [`DrivingPolicy`] so it can be swapped without retraining.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::super::params::PolicyParams;
use super::Car;

/// Four independent analog controls in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlVector {
    /// Throttle.
    pub forward: f32,
    /// Steer left.
    pub left: f32,
    /// Steer right.
    pub right: f32,
    /// Brake / reverse throttle.
    pub reverse: f32,
}

impl ControlVector {
    /// Steering controls count as pressed above this value.
    pub const ACTIVE_THRESHOLD: f32 = 0.5;

    /// Full throttle, no steering.
    pub const FORWARD: Self = Self {
        forward: 1.0,
        left: 0.0,
        right: 0.0,
        reverse: 0.0,
    };

    /// Reads `[forward, left, right, reverse]` from network outputs.
    ///
    /// Missing outputs read as zero.
    pub fn from_outputs(outputs: &Array1<f32>) -> Self {
        let at = |i: usize| outputs.get(i).copied().unwrap_or(0.0);
        Self {
            forward: at(0),
            left: at(1),
            right: at(2),
            reverse: at(3),
        }
    }

    /// Whether the left control is pressed.
    pub fn steers_left(&self) -> bool {
        self.left > Self::ACTIVE_THRESHOLD
    }

    /// Whether the right control is pressed.
    pub fn steers_right(&self) -> bool {
        self.right > Self::ACTIVE_THRESHOLD
    }
}

/// Produces the controls a car applies on its next tick.
pub trait ControlSource {
    /// Controls for the next tick, given the car's latest state and readings.
    fn next_controls(&mut self, car: &Car) -> ControlVector;

    /// Max speed the car should obey on the next tick.
    fn max_speed(&self, car: &Car) -> f32 {
        car.base_max_speed
    }
}

/// Applies the same controls every tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cruise(pub ControlVector);

impl ControlSource for Cruise {
    fn next_controls(&mut self, _car: &Car) -> ControlVector {
        self.0
    }
}

/// A single manual control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Accelerate.
    Forward,
    /// Steer left.
    Left,
    /// Steer right.
    Right,
    /// Brake / reverse.
    Reverse,
}

/// Host-driven controls: key presses map to fully on, releases to off.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualControls {
    state: ControlVector,
}

impl ManualControls {
    /// Creates controls with nothing pressed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a control as pressed.
    pub fn press(&mut self, direction: Direction) {
        *self.slot(direction) = 1.0;
    }

    /// Marks a control as released.
    pub fn release(&mut self, direction: Direction) {
        *self.slot(direction) = 0.0;
    }

    /// Current control state.
    pub fn state(&self) -> ControlVector {
        self.state
    }

    fn slot(&mut self, direction: Direction) -> &mut f32 {
        match direction {
            Direction::Forward => &mut self.state.forward,
            Direction::Left => &mut self.state.left,
            Direction::Right => &mut self.state.right,
            Direction::Reverse => &mut self.state.reverse,
        }
    }
}

impl ControlSource for ManualControls {
    fn next_controls(&mut self, _car: &Car) -> ControlVector {
        self.state
    }
}

/// Turns raw network outputs into applied controls.
pub trait DrivingPolicy {
    /// Post-processes raw outputs.
    fn shape(&self, raw: ControlVector) -> ControlVector;

    /// Max speed given the car's base speed and forward-ray proximities.
    fn max_speed(&self, base_max_speed: f32, forward_proximities: &[f32]) -> f32;
}

/// Passes outputs through untouched and never changes max speed.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawPolicy;

impl DrivingPolicy for RawPolicy {
    fn shape(&self, raw: ControlVector) -> ControlVector {
        raw
    }

    fn max_speed(&self, base_max_speed: f32, _forward_proximities: &[f32]) -> f32 {
        base_max_speed
    }
}

/// Default policy: exclusive steering and a speed boost on a clear road.
#[derive(Debug, Clone, Copy)]
pub struct OvertakePolicy {
    /// Left and right compete when both exceed this value.
    pub steer_threshold: f32,
    /// A forward proximity above this value means an obstacle ahead.
    pub obstacle_threshold: f32,
    /// Max speed multiplier while nothing is ahead.
    pub clear_road_boost: f32,
}

impl Default for OvertakePolicy {
    fn default() -> Self {
        Self::from(&PolicyParams::default())
    }
}

impl From<&PolicyParams> for OvertakePolicy {
    fn from(params: &PolicyParams) -> Self {
        Self {
            steer_threshold: params.steer_threshold,
            obstacle_threshold: params.obstacle_threshold,
            clear_road_boost: params.clear_road_boost,
        }
    }
}

impl DrivingPolicy for OvertakePolicy {
    fn shape(&self, raw: ControlVector) -> ControlVector {
        let mut controls = raw;
        if raw.left > self.steer_threshold && raw.right > self.steer_threshold {
            if raw.left > raw.right {
                controls.right = 0.0;
            } else {
                controls.left = 0.0;
            }
        }
        controls
    }

    fn max_speed(&self, base_max_speed: f32, forward_proximities: &[f32]) -> f32 {
        let obstacle_ahead = forward_proximities
            .iter()
            .any(|&p| p > self.obstacle_threshold);
        if obstacle_ahead {
            base_max_speed
        } else {
            base_max_speed * self.clear_road_boost
        }
    }
}

/// Drives a car with its own network, post-processed by a policy.
///
/// Cars without a network or sensor get zero controls and their base max speed.
#[derive(Debug, Clone, Copy)]
pub struct Autopilot<'p, P: DrivingPolicy + ?Sized> {
    policy: &'p P,
}

impl<'p, P: DrivingPolicy + ?Sized> Autopilot<'p, P> {
    /// Creates an autopilot using `policy`.
    pub fn new(policy: &'p P) -> Self {
        Self { policy }
    }
}

impl<P: DrivingPolicy + ?Sized> ControlSource for Autopilot<'_, P> {
    fn next_controls(&mut self, car: &Car) -> ControlVector {
        match (&car.brain, &car.sensor) {
            (Some(brain), Some(sensor)) => {
                let outputs = brain.think(&sensor.network_inputs());
                self.policy.shape(ControlVector::from_outputs(&outputs))
            }
            _ => ControlVector::default(),
        }
    }

    fn max_speed(&self, car: &Car) -> f32 {
        match &car.sensor {
            Some(sensor) => self
                .policy
                .max_speed(car.base_max_speed, &sensor.forward_proximities()),
            None => car.base_max_speed,
        }
    }
}
