//! Segment and polygon intersection tests shared by sensing and damage detection.

use geo::{Coord, Line};

/// Corners of a car's oriented bounding rectangle.
///
/// Ordered top-left, top-right, bottom-right, bottom-left.
pub type Polygon = [Coord<f32>; 4];

/// Point where a segment meets another, with its parameter along the first segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    /// Intersection point.
    pub point: Coord<f32>,
    /// Fraction of the first segment's length at which the hit occurs, in `[0, 1]`.
    pub offset: f32,
}

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Intersects the bounded segments `a0`-`a1` and `b0`-`b1`.
///
/// Solves the parametric form `a0 + t·(a1 − a0) = b0 + u·(b1 − b0)` and
/// reports a touch only when both `t` and `u` fall inside `[0, 1]`.
/// Parallel (and collinear) segments never touch.
///
/// # Returns
///
/// The touch point with `offset = t`, or `None` if the segments do not cross.
pub fn segment_intersection(
    a0: Coord<f32>,
    a1: Coord<f32>,
    b0: Coord<f32>,
    b1: Coord<f32>,
) -> Option<Touch> {
    let t_top = (b1.x - b0.x) * (a0.y - b0.y) - (b1.y - b0.y) * (a0.x - b0.x);
    let u_top = (b0.y - a0.y) * (a0.x - a1.x) - (b0.x - a0.x) * (a0.y - a1.y);
    let bottom = (b1.y - b0.y) * (a1.x - a0.x) - (b1.x - b0.x) * (a1.y - a0.y);

    if bottom == 0.0 {
        return None;
    }

    let t = t_top / bottom;
    let u = u_top / bottom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(Touch {
            point: Coord {
                x: lerp(a0.x, a1.x, t),
                y: lerp(a0.y, a1.y, t),
            },
            offset: t,
        })
    } else {
        None
    }
}

/// Same as [`segment_intersection`] for `geo` lines.
#[inline]
pub fn line_intersection(a: &Line<f32>, b: &Line<f32>) -> Option<Touch> {
    segment_intersection(a.start, a.end, b.start, b.end)
}

/// Closed edge loop of a polygon: `(p[i], p[(i + 1) % n])` for every corner.
pub fn edges(polygon: &[Coord<f32>]) -> impl Iterator<Item = Line<f32>> + '_ {
    let n = polygon.len();
    (0..n).map(move |i| Line::new(polygon[i], polygon[(i + 1) % n]))
}

/// Returns `true` iff any edge of `p` crosses any edge of `q`.
///
/// Pairwise edge test, `O(|p|·|q|)`. Containment without an edge crossing
/// is not reported. A two-point slice acts as a single segment, which is how
/// road borders are tested against car bodies.
pub fn polygons_intersect(p: &[Coord<f32>], q: &[Coord<f32>]) -> bool {
    edges(p).any(|e| edges(q).any(|f| line_intersection(&e, &f).is_some()))
}

/// Returns `true` iff the polygon's outline crosses the segment.
pub fn polygon_touches_segment(polygon: &[Coord<f32>], segment: &Line<f32>) -> bool {
    polygons_intersect(polygon, &[segment.start, segment.end])
}
