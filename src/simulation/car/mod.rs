//! Car module containing vehicle state, sensing, dynamics and controls.

mod controls;
mod dynamics;
mod sensor;
mod state;

pub use state::{Car, CarSnapshot, Surroundings};

pub use controls::{
    Autopilot, ControlSource, ControlVector, Cruise, Direction, DrivingPolicy, ManualControls,
    OvertakePolicy, RawPolicy,
};
pub use dynamics::{Kinematics, assess_damage, body_polygon};
pub use sensor::{Reading, Sensor, cast_rays, read_ray};
