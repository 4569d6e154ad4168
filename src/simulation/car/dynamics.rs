//! Scalar speed/heading integrator and the body polygon it drives.
//!
//! Heading 0 points towards negative y; positive angles turn clockwise on
//! screen (towards positive x).

use geo::{Coord, Line};
use serde::{Deserialize, Serialize};

use super::super::geometric_utils::{Polygon, polygon_touches_segment, polygons_intersect};
use super::super::params::VehicleParams;
use super::controls::ControlVector;

/// Position, heading and speed of one car.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    /// Centre x.
    pub x: f32,
    /// Centre y; decreases as the car drives forward.
    pub y: f32,
    /// Heading in radians.
    pub angle: f32,
    /// Signed speed; negative while reversing.
    pub speed: f32,
    /// Current forward speed cap; reverse is capped at half of it.
    pub max_speed: f32,
    /// `1` after moving forward, `-1` after moving backward.
    pub flip: f32,
}

impl Kinematics {
    /// A car at rest at `(x, y)` facing forward.
    pub fn at_rest(x: f32, y: f32, max_speed: f32) -> Self {
        Self {
            x,
            y,
            angle: 0.0,
            speed: 0.0,
            max_speed,
            flip: 1.0,
        }
    }

    /// Integrates one tick under `controls`.
    ///
    /// Throttle is analog, so forward and reverse applied together partially
    /// cancel. Steering is inverted while reversing and disabled at or below
    /// `vehicle.steer_min_speed`.
    #[must_use]
    pub fn advance(self, controls: &ControlVector, vehicle: &VehicleParams) -> Self {
        let mut next = self;

        next.speed += vehicle.acceleration * controls.forward;
        next.speed -= vehicle.acceleration * controls.reverse;

        if next.speed > next.max_speed {
            next.speed = next.max_speed;
        }
        if next.speed < -next.max_speed / 2.0 {
            next.speed = -next.max_speed / 2.0;
        }

        if next.speed.abs() > vehicle.friction {
            next.speed -= vehicle.friction * next.speed.signum();
        } else {
            next.speed = 0.0;
        }

        if next.speed > 0.0 {
            next.flip = 1.0;
        } else if next.speed < 0.0 {
            next.flip = -1.0;
        }

        if next.speed.abs() > vehicle.steer_min_speed {
            if controls.steers_left() {
                next.angle -= vehicle.turn_rate * next.flip;
            }
            if controls.steers_right() {
                next.angle += vehicle.turn_rate * next.flip;
            }
        }

        next.x += next.angle.sin() * next.speed;
        next.y -= next.angle.cos() * next.speed;
        next
    }

    /// Centre point.
    pub fn center(&self) -> Coord<f32> {
        Coord {
            x: self.x,
            y: self.y,
        }
    }

    /// Body rectangle of a `width` × `height` car in this pose.
    pub fn body(&self, width: f32, height: f32) -> Polygon {
        body_polygon(self.center(), width, height, self.angle)
    }
}

/// Oriented rectangle around `center`, corners ordered top-left, top-right,
/// bottom-right, bottom-left in the car's frame.
pub fn body_polygon(center: Coord<f32>, width: f32, height: f32, angle: f32) -> Polygon {
    let (sin, cos) = angle.sin_cos();
    let hw = width / 2.0;
    let hh = height / 2.0;
    let corner = |dx: f32, dy: f32| Coord {
        x: center.x + dx * cos - dy * sin,
        y: center.y + dx * sin + dy * cos,
    };

    [
        corner(-hw, -hh),
        corner(hw, -hh),
        corner(hw, hh),
        corner(-hw, hh),
    ]
}

/// Returns `true` if the body crosses a border or any obstacle outline.
pub fn assess_damage(body: &Polygon, borders: &[Line<f32>], obstacles: &[&Polygon]) -> bool {
    borders
        .iter()
        .any(|border| polygon_touches_segment(body, border))
        || obstacles
            .iter()
            .any(|obstacle| polygons_intersect(body, obstacle.as_slice()))
}
