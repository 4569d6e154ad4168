//! Ray-cast range sensor.
//!
//! Casts a forward fan and a shorter backward fan from the car's centre and
//! reports the nearest hit per ray against road borders and obstacle outlines.

use geo::{Coord, Line};
use ndarray::Array1;

use super::super::geometric_utils::{Polygon, Touch, edges, lerp, line_intersection};
use super::super::params::SensorParams;
use super::Surroundings;

/// Nearest hit along a ray; `offset` is the fraction of the ray length.
pub type Reading = Touch;

/// Range sensor with one reading slot per ray.
#[derive(Debug, Clone)]
pub struct Sensor {
    params: SensorParams,
    /// Current rays, forward fan first.
    pub rays: Vec<Line<f32>>,
    /// Normalized angle of each ray as fed to the network.
    pub ray_angles: Vec<f32>,
    /// Nearest hit per ray, `None` when nothing is within range.
    pub readings: Vec<Option<Reading>>,
}

impl Sensor {
    /// Creates a sensor with rays cast from `origin` along `heading` and empty readings.
    pub fn new(params: &SensorParams, origin: Coord<f32>, heading: f32) -> Self {
        let (rays, ray_angles) = cast_rays(params, origin, heading);
        Self {
            params: params.clone(),
            readings: vec![None; rays.len()],
            rays,
            ray_angles,
        }
    }

    /// Number of forward rays; they occupy the first slots.
    pub fn forward_count(&self) -> usize {
        self.params.forward_rays
    }

    /// Recasts every ray from the current pose and reads it.
    pub fn update(&mut self, origin: Coord<f32>, heading: f32, surroundings: &Surroundings<'_>) {
        let (rays, ray_angles) = cast_rays(&self.params, origin, heading);
        self.readings = rays
            .iter()
            .map(|ray| read_ray(ray, surroundings.borders, &surroundings.obstacles))
            .collect();
        self.rays = rays;
        self.ray_angles = ray_angles;
    }

    /// `1 − offset` per ray, or `0` when the ray hits nothing.
    pub fn proximities(&self) -> Vec<f32> {
        self.readings
            .iter()
            .map(|r| r.map_or(0.0, |touch| 1.0 - touch.offset))
            .collect()
    }

    /// Proximities of the forward fan only.
    pub fn forward_proximities(&self) -> Vec<f32> {
        let mut proximities = self.proximities();
        proximities.truncate(self.forward_count());
        proximities
    }

    /// Controller input: every proximity followed by every normalized ray angle.
    pub fn network_inputs(&self) -> Array1<f32> {
        let mut inputs = self.proximities();
        inputs.extend_from_slice(&self.ray_angles);
        Array1::from_vec(inputs)
    }
}

/// Builds the ray fan for a pose.
///
/// Forward ray `i` sits at `lerp(spread/2, −spread/2, i/(n−1))` from the
/// heading (the middle for a single ray) and reports that offset divided by
/// `π/2`. Backward rays fan the same way around the opposite heading, are
/// shortened by `backward_length_ratio` and all report
/// `backward_angle_marker`.
///
/// # Returns
///
/// The rays and their normalized angles, forward fan first.
pub fn cast_rays(
    params: &SensorParams,
    origin: Coord<f32>,
    heading: f32,
) -> (Vec<Line<f32>>, Vec<f32>) {
    let count = params.ray_count();
    let mut rays = Vec::with_capacity(count);
    let mut angles = Vec::with_capacity(count);

    let ray = |angle: f32, length: f32| {
        Line::new(
            origin,
            Coord {
                x: origin.x + angle.sin() * length,
                y: origin.y - angle.cos() * length,
            },
        )
    };

    for i in 0..params.forward_rays {
        let offset = lerp(
            params.forward_spread / 2.0,
            -params.forward_spread / 2.0,
            fan_position(i, params.forward_rays),
        );
        rays.push(ray(heading + offset, params.ray_length));
        angles.push(offset / std::f32::consts::FRAC_PI_2);
    }

    let back_length = params.ray_length * params.backward_length_ratio;
    for i in 0..params.backward_rays {
        let offset = std::f32::consts::PI
            + lerp(
                params.backward_spread / 2.0,
                -params.backward_spread / 2.0,
                fan_position(i, params.backward_rays),
            );
        rays.push(ray(heading + offset, back_length));
        angles.push(params.backward_angle_marker);
    }

    (rays, angles)
}

fn fan_position(i: usize, count: usize) -> f32 {
    if count == 1 {
        0.5
    } else {
        i as f32 / (count - 1) as f32
    }
}

/// Nearest hit of `ray` against border segments and obstacle outlines.
///
/// Ties keep the first hit found, borders before obstacles.
pub fn read_ray(
    ray: &Line<f32>,
    borders: &[Line<f32>],
    obstacles: &[&Polygon],
) -> Option<Reading> {
    let border_hits = borders.iter().filter_map(|border| line_intersection(ray, border));
    let obstacle_hits = obstacles
        .iter()
        .flat_map(|polygon| edges(polygon.as_slice()))
        .filter_map(|edge| line_intersection(ray, &edge));

    border_hits
        .chain(obstacle_hits)
        .fold(None, |nearest: Option<Reading>, touch| match nearest {
            Some(best) if best.offset <= touch.offset => Some(best),
            _ => Some(touch),
        })
}
