//! # Evodrive - Neuroevolution of Self-Driving Cars
//!
//! A population of cars, each steered by its own small neural network, learns
//! to drive up a multi-lane road and overtake slower traffic. Every tick a car
//! casts sensor rays, feeds the readings through its network and applies the
//! resulting controls. When the whole population has crashed, the best network
//! seeds the next generation through mutation.
//!
//! ## Features
//!
//! - Ray-cast range sensor with forward and backward fans
//! - Feedforward network with sigmoid activations and versioned JSON schema
//! - Scalar speed/heading dynamics with friction and reverse capping
//! - Obstacle traffic with a k-d tree spatial index
//! - Generational training with an unmutated elite slot
//! - Network archive on disk
//!
//! ## Core Modules
//!
//! - [`simulation::trainer`] - Population loop and generation transitions
//! - [`simulation::car`] - Car state, sensor, dynamics and controls
//! - [`simulation::brain`] - Neural network implementation
//! - [`simulation::traffic`] - Obstacle cars
//! - [`storage`] - Loading and saving trained networks

/// Core simulation logic and data structures.
pub mod simulation {
    /// Neural network controller.
    pub mod brain;
    /// Cars: state, sensing, dynamics and control sources.
    pub mod car;
    /// Segment and polygon intersection.
    pub mod geometric_utils;
    /// Simulation parameters.
    pub mod params;
    /// Road geometry.
    pub mod road;
    /// Obstacle traffic and its spatial index.
    pub mod traffic;
    /// Population training loop.
    ///
    /// The [`trainer::Trainer`] is the only entry point hosts need to run a
    /// training session tick by tick.
    pub mod trainer;
}

pub mod storage;
