#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use std::f32::consts::PI;

use evodrive::simulation::car::{Sensor, Surroundings, body_polygon, cast_rays, read_ray};
use evodrive::simulation::params::SensorParams;
use evodrive::simulation::road::Road;
use geo::{Coord, Line};

fn c(x: f32, y: f32) -> Coord<f32> {
    Coord { x, y }
}

fn single_ray_params() -> SensorParams {
    SensorParams {
        forward_rays: 1,
        backward_rays: 0,
        ray_length: 150.0,
        ..SensorParams::default()
    }
}

#[test]
fn test_ray_hits_border_halfway() {
    let ray = Line::new(c(0.0, 0.0), c(0.0, -150.0));
    let border = Line::new(c(-50.0, -75.0), c(50.0, -75.0));

    let reading = read_ray(&ray, &[border], &[]).expect("border in range");
    assert!((reading.offset - 0.5).abs() < 1e-6);
    assert!((reading.point.y + 75.0).abs() < 1e-4);
}

#[test]
fn test_ray_without_hit_reads_none() {
    let ray = Line::new(c(0.0, 0.0), c(0.0, -150.0));
    let border = Line::new(c(-50.0, -300.0), c(50.0, -300.0));

    assert!(read_ray(&ray, &[border], &[]).is_none());
}

#[test]
fn test_nearest_hit_wins() {
    let ray = Line::new(c(0.0, 0.0), c(0.0, -150.0));
    // Obstacle spans y in [-125, -75]; its near edge is at -75.
    let obstacle = body_polygon(c(0.0, -100.0), 30.0, 50.0, 0.0);
    let far_border = Line::new(c(-50.0, -140.0), c(50.0, -140.0));

    let reading = read_ray(&ray, &[far_border], &[&obstacle]).expect("obstacle in range");
    assert!((reading.offset - 0.5).abs() < 1e-5);
}

#[test]
fn test_default_fan_layout() {
    let params = SensorParams::default();
    let (rays, angles) = cast_rays(&params, c(0.0, 0.0), 0.0);

    assert_eq!(rays.len(), 12);
    assert_eq!(angles.len(), 12);

    // Forward fan runs from +spread/2 to -spread/2, normalized by π/2.
    assert!((angles[0] - 0.75).abs() < 1e-6);
    assert!((angles[7] + 0.75).abs() < 1e-6);
    for angle in &angles[8..] {
        assert_eq!(*angle, -1.5);
    }

    let length = |line: &Line<f32>| (line.end.x - line.start.x).hypot(line.end.y - line.start.y);
    assert!((length(&rays[0]) - 150.0).abs() < 1e-3);
    assert!((length(&rays[8]) - 90.0).abs() < 1e-3);
}

#[test]
fn test_forward_rays_point_ahead_and_backward_rays_behind() {
    let params = SensorParams::default();
    let (rays, _) = cast_rays(&params, c(0.0, 0.0), 0.0);

    for ray in &rays[..8] {
        assert!(ray.end.y < 0.0, "forward ray {ray:?} points backward");
    }
    for ray in &rays[8..] {
        assert!(ray.end.y > 0.0, "backward ray {ray:?} points forward");
    }
}

#[test]
fn test_single_ray_follows_heading() {
    let params = single_ray_params();
    let (rays, angles) = cast_rays(&params, c(0.0, 0.0), PI / 2.0);

    assert_eq!(angles, vec![0.0]);
    assert!((rays[0].end.x - 150.0).abs() < 1e-3);
    assert!(rays[0].end.y.abs() < 1e-3);
}

#[test]
fn test_new_sensor_reads_nothing() {
    let params = SensorParams::default();
    let sensor = Sensor::new(&params, c(100.0, 100.0), 0.0);
    let inputs = sensor.network_inputs();

    assert!(sensor.readings.iter().all(Option::is_none));
    assert_eq!(inputs.len(), params.input_size());
    assert!(inputs.iter().take(12).all(|&v| v == 0.0));
    assert_eq!(inputs[12], sensor.ray_angles[0]);
}

#[test]
fn test_update_reads_obstacle_proximity() {
    let params = single_ray_params();
    let mut sensor = Sensor::new(&params, c(0.0, 0.0), 0.0);
    let obstacle = body_polygon(c(0.0, -100.0), 30.0, 50.0, 0.0);
    let surroundings = Surroundings {
        borders: &[],
        obstacles: vec![&obstacle],
    };

    sensor.update(c(0.0, 0.0), 0.0, &surroundings);

    let proximities = sensor.proximities();
    assert_eq!(proximities.len(), 1);
    assert!((proximities[0] - 0.5).abs() < 1e-5);
    assert_eq!(sensor.forward_proximities(), proximities);
}

#[test]
fn test_centred_car_sees_both_borders() {
    let road = Road::new(100.0, 180.0, 3);
    let params = SensorParams::default();
    let mut sensor = Sensor::new(&params, c(100.0, 100.0), 0.0);
    let surroundings = Surroundings {
        borders: &road.borders,
        obstacles: Vec::new(),
    };

    sensor.update(c(100.0, 100.0), 0.0, &surroundings);

    // Outermost forward rays reach 150·sin(0.375π) ≈ 138.6 sideways; borders are 90 away.
    let first = sensor.readings[0].expect("right border");
    let last = sensor.readings[7].expect("left border");
    assert!((first.point.x - 190.0).abs() < 1e-3);
    assert!((last.point.x - 10.0).abs() < 1e-3);
    assert!((first.offset - last.offset).abs() < 1e-4);
}
