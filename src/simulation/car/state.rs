//! Car state: pose, body, sensor, network and fitness.

use geo::{Coord, Line};
use serde::{Deserialize, Serialize};

use super::super::brain::Network;
use super::super::geometric_utils::Polygon;
use super::super::params::{SensorParams, VehicleParams};
use super::controls::{ControlSource, ControlVector};
use super::dynamics::{Kinematics, assess_damage};
use super::sensor::Sensor;

/// What a car can see and collide with during one tick.
///
/// Obstacle polygons are taken once per tick, before any car of the
/// population moves, so every car senses the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct Surroundings<'a> {
    /// Road border segments.
    pub borders: &'a [Line<f32>],
    /// Outlines of nearby obstacle cars.
    pub obstacles: Vec<&'a Polygon>,
}

/// Summary of a car exposed to hosts for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarSnapshot {
    /// Car identifier.
    pub id: usize,
    /// Pose and speed.
    pub kinematics: Kinematics,
    /// Terminal collision flag.
    pub damaged: bool,
    /// Latest fitness.
    pub fitness: f32,
}

/// A simulated car.
///
/// Training cars carry a [`Sensor`] and a [`Network`]; obstacle traffic carries
/// neither and is driven by a constant [`ControlSource`].
#[derive(Debug, Clone)]
pub struct Car {
    /// Identifier, unique within its population or traffic set.
    pub id: usize,
    /// Body width.
    pub width: f32,
    /// Body length.
    pub height: f32,
    /// Pose and speed.
    pub kinematics: Kinematics,
    /// Max speed before any policy adjustment.
    pub base_max_speed: f32,
    /// `y` at spawn; forward distance is measured from here.
    pub start_y: f32,
    /// Set once on the first collision, never cleared.
    pub damaged: bool,
    /// Body rectangle for the current pose.
    pub polygon: Polygon,
    /// Range sensor, training cars only.
    pub sensor: Option<Sensor>,
    /// Controller network, training cars only. Never shared between cars.
    pub brain: Option<Network>,
    /// Latest fitness, frozen once damaged.
    pub fitness: f32,
}

impl Car {
    /// Creates a sensor-equipped training car at rest at `(x, y)`.
    pub fn trainee(
        id: usize,
        x: f32,
        y: f32,
        vehicle: &VehicleParams,
        sensor: &SensorParams,
        max_speed: f32,
        brain: Network,
    ) -> Self {
        let mut car = Self::traffic(id, x, y, vehicle, max_speed);
        car.sensor = Some(Sensor::new(sensor, car.center(), car.kinematics.angle));
        car.brain = Some(brain);
        car
    }

    /// Creates an obstacle car at rest at `(x, y)`, without sensor or network.
    pub fn traffic(id: usize, x: f32, y: f32, vehicle: &VehicleParams, max_speed: f32) -> Self {
        let kinematics = Kinematics::at_rest(x, y, max_speed);
        Self {
            id,
            width: vehicle.width,
            height: vehicle.height,
            polygon: kinematics.body(vehicle.width, vehicle.height),
            kinematics,
            base_max_speed: max_speed,
            start_y: y,
            damaged: false,
            sensor: None,
            brain: None,
            fitness: 0.0,
        }
    }

    /// Centre of the body.
    pub fn center(&self) -> Coord<f32> {
        self.kinematics.center()
    }

    /// Forward distance covered since spawn.
    pub fn distance(&self) -> f32 {
        self.start_y - self.kinematics.y
    }

    /// Returns `true` until the first collision.
    pub fn is_alive(&self) -> bool {
        !self.damaged
    }

    /// Advances one tick under explicit controls.
    ///
    /// Moves the car, rebuilds its body, checks for damage and then re-reads
    /// the sensor. A damaged car does not change at all.
    pub fn update(
        &mut self,
        controls: &ControlVector,
        vehicle: &VehicleParams,
        surroundings: &Surroundings<'_>,
    ) {
        if self.damaged {
            return;
        }

        self.kinematics = self.kinematics.advance(controls, vehicle);
        self.polygon = self.kinematics.body(self.width, self.height);
        self.damaged = assess_damage(&self.polygon, surroundings.borders, &surroundings.obstacles);

        if let Some(sensor) = &mut self.sensor {
            sensor.update(self.kinematics.center(), self.kinematics.angle, surroundings);
        }
    }

    /// Asks `source` for max speed and controls, then [`Car::update`]s.
    pub fn drive(
        &mut self,
        source: &mut dyn ControlSource,
        vehicle: &VehicleParams,
        surroundings: &Surroundings<'_>,
    ) {
        if self.damaged {
            return;
        }
        self.kinematics.max_speed = source.max_speed(self);
        let controls = source.next_controls(self);
        self.update(&controls, vehicle, surroundings);
    }

    /// Host-facing summary.
    pub fn snapshot(&self) -> CarSnapshot {
        CarSnapshot {
            id: self.id,
            kinematics: self.kinematics,
            damaged: self.damaged,
            fitness: self.fitness,
        }
    }
}
