//! Obstacle traffic: slow cars cruising up the road that training cars
//! must overtake.
//!
//! Traffic is regenerated ahead of the pack at a fixed tick interval and
//! pruned once it falls far behind the start line. A k-d tree over obstacle
//! centres narrows each training car's sensing and collision candidates.

use geo::Coord;
use kdtree::KdTree;
use kdtree::distance::squared_euclidean;
use rand::Rng;
use tracing::debug;

use super::car::{Car, ControlVector, Cruise, Surroundings};
use super::geometric_utils::Polygon;
use super::params::{Params, TrafficParams};
use super::road::Road;

type Tree2D = KdTree<f32, usize, [f32; 2]>;

/// Obstacle cars on the road.
#[derive(Debug, Clone, Default)]
pub struct Traffic {
    /// Obstacle cars in spawn order.
    pub cars: Vec<Car>,
    ticks_since_refill: u32,
    next_id: usize,
}

impl Traffic {
    /// Wraps existing obstacle cars.
    pub fn new(cars: Vec<Car>) -> Self {
        let next_id = cars.iter().map(|c| c.id + 1).max().unwrap_or(0);
        Self {
            cars,
            ticks_since_refill: 0,
            next_id,
        }
    }

    /// Places the initial batch in random lanes ahead of the start line.
    pub fn generate<R: Rng + ?Sized>(road: &Road, params: &Params, rng: &mut R) -> Self {
        let mut traffic = Self::default();
        let first_y = params.road.start_y - params.traffic.lead_distance;
        for i in 0..params.traffic.initial_count {
            let y = first_y
                - i as f32 * params.traffic.spacing
                - rng.random::<f32>() * params.traffic.jitter;
            traffic.spawn(road, params, y, rng);
        }
        traffic
    }

    fn spawn<R: Rng + ?Sized>(&mut self, road: &Road, params: &Params, y: f32, rng: &mut R) {
        let lane = rng.random_range(0..road.lane_count);
        let speed = cruising_speed(&params.traffic, rng);
        self.cars.push(Car::traffic(
            self.next_id,
            road.lane_center(lane),
            y,
            &params.vehicle,
            speed,
        ));
        self.next_id += 1;
    }

    /// Appends a batch ahead of the furthest obstacle and drops stragglers.
    pub fn refill<R: Rng + ?Sized>(&mut self, road: &Road, params: &Params, rng: &mut R) {
        let tp = &params.traffic;
        let furthest = self
            .furthest_y()
            .unwrap_or(params.road.start_y - tp.lead_distance + tp.spacing);
        for i in 0..tp.refill_count {
            let y = furthest - (i + 1) as f32 * tp.spacing - rng.random::<f32>() * tp.jitter;
            self.spawn(road, params, y, rng);
        }

        let limit = params.road.start_y + tp.prune_distance;
        self.cars.retain(|car| car.kinematics.y < limit);
        debug!(obstacles = self.cars.len(), "refilled traffic");
    }

    /// Refills on schedule, then drives every obstacle one tick against the borders.
    pub fn step<R: Rng + ?Sized>(&mut self, road: &Road, params: &Params, rng: &mut R) {
        self.ticks_since_refill += 1;
        if self.ticks_since_refill > params.traffic.refill_interval {
            self.refill(road, params, rng);
            self.ticks_since_refill = 0;
        }

        let surroundings = Surroundings {
            borders: &road.borders,
            obstacles: Vec::new(),
        };
        let mut cruise = Cruise(ControlVector::FORWARD);
        for car in &mut self.cars {
            car.drive(&mut cruise, &params.vehicle, &surroundings);
        }
    }

    /// Smallest `y`, i.e. the obstacle furthest up the road.
    pub fn furthest_y(&self) -> Option<f32> {
        self.cars.iter().map(|c| c.kinematics.y).reduce(f32::min)
    }

    /// Number of obstacles behind a car at `y`.
    pub fn overtaken_by(&self, y: f32) -> usize {
        self.cars.iter().filter(|c| y < c.kinematics.y).count()
    }

    /// Builds a spatial index over the current obstacle positions.
    pub fn index(&self) -> TrafficIndex<'_> {
        TrafficIndex::build(&self.cars)
    }
}

fn cruising_speed<R: Rng + ?Sized>(params: &TrafficParams, rng: &mut R) -> f32 {
    if params.max_speed > params.min_speed {
        rng.random_range(params.min_speed..params.max_speed)
    } else {
        params.min_speed
    }
}

/// Spatial lookup of obstacle outlines by centre distance.
pub struct TrafficIndex<'a> {
    cars: &'a [Car],
    tree: Option<Tree2D>,
}

impl<'a> TrafficIndex<'a> {
    /// Indexes `cars`; falls back to linear scans if a position cannot be indexed.
    pub fn build(cars: &'a [Car]) -> Self {
        let mut tree = Tree2D::new(2);
        for (i, car) in cars.iter().enumerate() {
            if let Err(err) = tree.add([car.kinematics.x, car.kinematics.y], i) {
                debug!(?err, "traffic index unavailable, using linear scan");
                return Self { cars, tree: None };
            }
        }
        Self {
            cars,
            tree: Some(tree),
        }
    }

    /// Outlines of obstacles whose centre lies within `reach` of `center`, in spawn order.
    pub fn near(&self, center: Coord<f32>, reach: f32) -> Vec<&'a Polygon> {
        let cars = self.cars;
        let Some(tree) = &self.tree else {
            return self.all();
        };

        match tree.within(&[center.x, center.y], reach * reach, &squared_euclidean) {
            Ok(found) => {
                let mut indices: Vec<usize> = found.into_iter().map(|(_, &i)| i).collect();
                indices.sort_unstable();
                indices.into_iter().map(|i| &cars[i].polygon).collect()
            }
            Err(err) => {
                debug!(?err, "traffic query failed, using linear scan");
                self.all()
            }
        }
    }

    fn all(&self) -> Vec<&'a Polygon> {
        let cars = self.cars;
        cars.iter().map(|c| &c.polygon).collect()
    }
}
