//! Straight multi-lane road bounded by two border segments.

use geo::{Coord, Line};

use super::params::RoadParams;

/// Half-length of the border segments; effectively an endless road.
pub const ROAD_EXTENT: f32 = 1_000_000.0;

/// A vertical road with evenly sized lanes.
#[derive(Debug, Clone)]
pub struct Road {
    /// Left edge x.
    pub left: f32,
    /// Right edge x.
    pub right: f32,
    /// Number of lanes.
    pub lane_count: usize,
    /// Left and right border segments.
    pub borders: Vec<Line<f32>>,
}

impl Road {
    /// Creates a road centred at `center_x` spanning `width`.
    pub fn new(center_x: f32, width: f32, lane_count: usize) -> Self {
        let left = center_x - width / 2.0;
        let right = center_x + width / 2.0;
        let border = |x: f32| {
            Line::new(
                Coord { x, y: -ROAD_EXTENT },
                Coord { x, y: ROAD_EXTENT },
            )
        };

        Self {
            left,
            right,
            lane_count: lane_count.max(1),
            borders: vec![border(left), border(right)],
        }
    }

    /// Creates a road from parameters.
    pub fn from_params(params: &RoadParams) -> Self {
        Self::new(params.center_x, params.width, params.lane_count)
    }

    /// Width of a single lane.
    pub fn lane_width(&self) -> f32 {
        (self.right - self.left) / self.lane_count as f32
    }

    /// Centre x of `lane`; indices past the last lane map to the last lane.
    pub fn lane_center(&self, lane: usize) -> f32 {
        let lane = lane.min(self.lane_count - 1);
        self.left + self.lane_width() / 2.0 + lane as f32 * self.lane_width()
    }
}
