#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use evodrive::simulation::car::{
    Car, ControlVector, Kinematics, Surroundings, assess_damage, body_polygon,
};
use evodrive::simulation::params::VehicleParams;
use evodrive::simulation::road::Road;
use geo::Coord;

fn create_test_vehicle() -> VehicleParams {
    VehicleParams::default()
}

fn controls(forward: f32, left: f32, right: f32, reverse: f32) -> ControlVector {
    ControlVector {
        forward,
        left,
        right,
        reverse,
    }
}

#[test]
fn test_forward_speed_is_capped() {
    let vehicle = create_test_vehicle();
    let mut k = Kinematics::at_rest(0.0, 0.0, 2.0);

    for _ in 0..100 {
        k = k.advance(&ControlVector::FORWARD, &vehicle);
        assert!(k.speed <= 2.0, "speed {} exceeded the cap", k.speed);
    }

    // Clamped to the cap, then friction applies.
    assert!((k.speed - 1.95).abs() < 1e-5);
    assert!(k.y < 0.0);
    assert!(k.x.abs() < 1e-6);
}

#[test]
fn test_first_tick_from_rest() {
    let vehicle = create_test_vehicle();
    let k = Kinematics::at_rest(0.0, 0.0, 2.0).advance(&ControlVector::FORWARD, &vehicle);

    assert!((k.speed - 0.15).abs() < 1e-6);
    assert!((k.y + 0.15).abs() < 1e-6);
    assert_eq!(k.flip, 1.0);
}

#[test]
fn test_reverse_speed_is_half_the_cap() {
    let vehicle = create_test_vehicle();
    let mut k = Kinematics::at_rest(0.0, 0.0, 2.0);

    for _ in 0..100 {
        k = k.advance(&controls(0.0, 0.0, 0.0, 1.0), &vehicle);
        assert!(k.speed >= -1.0, "reverse speed {} exceeded the cap", k.speed);
    }

    assert!((k.speed + 0.95).abs() < 1e-5);
    assert_eq!(k.flip, -1.0);
    assert!(k.y > 0.0);
}

#[test]
fn test_friction_stops_slow_cars() {
    let vehicle = create_test_vehicle();
    let mut k = Kinematics::at_rest(0.0, 0.0, 2.0);
    k.speed = 0.04;

    let k = k.advance(&ControlVector::default(), &vehicle);
    assert_eq!(k.speed, 0.0);
}

#[test]
fn test_no_steering_at_low_speed() {
    let vehicle = create_test_vehicle();
    let k = Kinematics::at_rest(0.0, 0.0, 2.0).advance(&controls(1.0, 1.0, 0.0, 0.0), &vehicle);

    assert_eq!(k.angle, 0.0);
}

#[test]
fn test_steering_above_threshold() {
    let vehicle = create_test_vehicle();
    let mut k = Kinematics::at_rest(0.0, 0.0, 2.0);
    k.speed = 1.0;

    let left = k.advance(&controls(1.0, 1.0, 0.0, 0.0), &vehicle);
    let right = k.advance(&controls(1.0, 0.0, 1.0, 0.0), &vehicle);
    let weak = k.advance(&controls(1.0, 0.4, 0.0, 0.0), &vehicle);

    assert!((left.angle + 0.03).abs() < 1e-6);
    assert!((right.angle - 0.03).abs() < 1e-6);
    assert_eq!(weak.angle, 0.0);
}

#[test]
fn test_steering_inverts_in_reverse() {
    let vehicle = create_test_vehicle();
    let mut k = Kinematics::at_rest(0.0, 0.0, 2.0);
    k.speed = -0.9;
    k.flip = -1.0;

    let k = k.advance(&controls(0.0, 1.0, 0.0, 1.0), &vehicle);
    assert!(k.angle > 0.0);
}

#[test]
fn test_body_polygon_corners() {
    let body = body_polygon(Coord { x: 0.0, y: 0.0 }, 30.0, 50.0, 0.0);

    assert_eq!(body[0], Coord { x: -15.0, y: -25.0 });
    assert_eq!(body[1], Coord { x: 15.0, y: -25.0 });
    assert_eq!(body[2], Coord { x: 15.0, y: 25.0 });
    assert_eq!(body[3], Coord { x: -15.0, y: 25.0 });
}

#[test]
fn test_damage_from_border_and_obstacle() {
    let road = Road::new(100.0, 180.0, 3);
    let centre = body_polygon(Coord { x: 100.0, y: 0.0 }, 30.0, 50.0, 0.0);
    let on_border = body_polygon(Coord { x: 12.0, y: 0.0 }, 30.0, 50.0, 0.0);
    let obstacle = body_polygon(Coord { x: 110.0, y: -30.0 }, 30.0, 50.0, 0.0);

    assert!(!assess_damage(&centre, &road.borders, &[]));
    assert!(assess_damage(&on_border, &road.borders, &[]));
    assert!(assess_damage(&centre, &road.borders, &[&obstacle]));
}

#[test]
fn test_damage_is_terminal() {
    let vehicle = create_test_vehicle();
    let road = Road::new(100.0, 180.0, 3);
    let surroundings = Surroundings {
        borders: &road.borders,
        obstacles: Vec::new(),
    };
    let mut car = Car::traffic(0, 12.0, 0.0, &vehicle, 2.0);

    car.update(&ControlVector::default(), &vehicle, &surroundings);
    assert!(car.damaged);
    let frozen = car.kinematics;

    for _ in 0..10 {
        car.update(&ControlVector::FORWARD, &vehicle, &surroundings);
    }
    assert!(car.damaged);
    assert_eq!(car.kinematics, frozen);
}

#[test]
fn test_car_in_lane_drives_undamaged() {
    let vehicle = create_test_vehicle();
    let road = Road::new(100.0, 180.0, 3);
    let surroundings = Surroundings {
        borders: &road.borders,
        obstacles: Vec::new(),
    };
    let mut car = Car::traffic(0, road.lane_center(1), 100.0, &vehicle, 2.0);

    for _ in 0..50 {
        car.update(&ControlVector::FORWARD, &vehicle, &surroundings);
    }

    assert!(car.is_alive());
    assert!(car.distance() > 0.0);
}
