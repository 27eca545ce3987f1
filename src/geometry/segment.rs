use crate::math::intersect_2d::point_segment_distance;
use crate::math::{lerp, Point2, Vector2};

use super::{Aabb2, Axis, CubicBez};

/// Squared length below which a direction vector is considered degenerate.
const DEGENERATE_DIRECTION_SQ: f64 = 1e-24;
/// Flatness at which a curve piece is measured as its chord.
pub const CURVE_FLATNESS: f64 = 1e-10;

/// The geometry between a node and its successor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    /// A straight line segment.
    Line { start: Point2, end: Point2 },
    /// A cubic bezier segment.
    Cubic(CubicBez),
}

impl Segment {
    /// Start point of the segment.
    #[must_use]
    pub fn start(&self) -> Point2 {
        match self {
            Segment::Line { start, .. } => *start,
            Segment::Cubic(c) => c.p0,
        }
    }

    /// End point of the segment.
    #[must_use]
    pub fn end(&self) -> Point2 {
        match self {
            Segment::Line { end, .. } => *end,
            Segment::Cubic(c) => c.p3,
        }
    }

    /// Whether the segment is a cubic curve.
    #[must_use]
    pub fn is_curve(&self) -> bool {
        matches!(self, Segment::Cubic(_))
    }

    /// Returns the segment as a cubic; lines are degree-elevated.
    #[must_use]
    pub fn to_cubic(&self) -> CubicBez {
        match self {
            Segment::Line { start, end } => CubicBez::from_line(*start, *end),
            Segment::Cubic(c) => *c,
        }
    }

    /// Evaluates the segment at parameter `t`.
    #[must_use]
    pub fn eval(&self, t: f64) -> Point2 {
        match self {
            Segment::Line { start, end } => lerp(start, end, t),
            Segment::Cubic(c) => c.eval(t),
        }
    }

    /// Splits the segment at `t`.
    #[must_use]
    pub fn split_at(&self, t: f64) -> (Segment, Segment) {
        match self {
            Segment::Line { start, end } => {
                let mid = lerp(start, end, t);
                (
                    Segment::Line {
                        start: *start,
                        end: mid,
                    },
                    Segment::Line {
                        start: mid,
                        end: *end,
                    },
                )
            }
            Segment::Cubic(c) => {
                let (left, right) = c.subdivide(t);
                (Segment::Cubic(left), Segment::Cubic(right))
            }
        }
    }

    /// Returns the piece of the segment between `t0` and `t1`.
    #[must_use]
    pub fn subsegment(&self, t0: f64, t1: f64) -> Segment {
        match self {
            Segment::Line { start, end } => Segment::Line {
                start: lerp(start, end, t0),
                end: lerp(start, end, t1),
            },
            Segment::Cubic(c) => Segment::Cubic(c.subsegment(t0, t1)),
        }
    }

    /// Signed area contribution of the segment (see [`CubicBez::signed_area`]).
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        match self {
            Segment::Line { start, end } => (start.x * end.y - end.x * start.y) * 0.5,
            Segment::Cubic(c) => c.signed_area(),
        }
    }

    /// Direction in which the segment leaves its start point.
    ///
    /// Uses the first control point that does not coincide with the start,
    /// so a cusp-free cubic with a collapsed handle still reports a direction.
    #[must_use]
    pub fn start_direction(&self) -> Vector2 {
        let c = self.to_cubic();
        first_direction([c.p1 - c.p0, c.p2 - c.p0, c.p3 - c.p0])
    }

    /// Direction in which the segment arrives at its end point.
    #[must_use]
    pub fn end_direction(&self) -> Vector2 {
        let c = self.to_cubic();
        first_direction([c.p3 - c.p2, c.p3 - c.p1, c.p3 - c.p0])
    }

    /// Parameters where the `axis` coordinate equals `value` (unfiltered).
    #[must_use]
    pub fn axis_roots(&self, axis: Axis, value: f64) -> Vec<f64> {
        match self {
            Segment::Line { start, end } => {
                let delta = axis.coord(end) - axis.coord(start);
                if delta.abs() < f64::MIN_POSITIVE {
                    Vec::new()
                } else {
                    vec![(value - axis.coord(start)) / delta]
                }
            }
            Segment::Cubic(c) => c.axis_roots(axis, value),
        }
    }

    /// Interior parameters where the `axis` coordinate is stationary.
    #[must_use]
    pub fn axis_extrema(&self, axis: Axis) -> Vec<f64> {
        match self {
            Segment::Line { .. } => Vec::new(),
            Segment::Cubic(c) => c.axis_extrema(axis),
        }
    }

    /// Shortest distance from `point` to the segment.
    ///
    /// Curves are measured against their flattened pieces, so the result is
    /// exact to within [`CURVE_FLATNESS`].
    #[must_use]
    pub fn distance_to(&self, point: &Point2) -> f64 {
        match self {
            Segment::Line { start, end } => point_segment_distance(point, start, end),
            Segment::Cubic(c) => c.distance_to(point, CURVE_FLATNESS),
        }
    }

    /// Tight bounding box of the segment.
    #[must_use]
    pub fn bounds(&self) -> Aabb2 {
        let mut bounds = Aabb2::from_points(&[self.start(), self.end()]);
        for axis in [Axis::X, Axis::Y] {
            for t in self.axis_extrema(axis) {
                bounds.include(&self.eval(t));
            }
        }
        bounds
    }
}

fn first_direction(candidates: [Vector2; 3]) -> Vector2 {
    candidates
        .into_iter()
        .find(|d| d.norm_squared() > DEGENERATE_DIRECTION_SQ)
        .unwrap_or_else(Vector2::zeros)
}

/// Geometry produced by cutting a segment.
///
/// `prev_out` replaces the outgoing tangent of the node before the cut and
/// `next_in` the incoming tangent of the node after it. `winding_tangent`
/// is only meaningful by its sign against other tangents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubdivideInfo {
    pub position: Point2,
    pub tangent_in: Option<Vector2>,
    pub tangent_out: Option<Vector2>,
    pub prev_out: Option<Vector2>,
    pub next_in: Option<Vector2>,
    pub winding_tangent: Vector2,
}

impl SubdivideInfo {
    /// Cuts `segment` once at `t`.
    #[must_use]
    pub fn at(segment: &Segment, t: f64) -> Self {
        match segment {
            Segment::Line { start, end } => Self {
                position: lerp(start, end, t),
                tangent_in: None,
                tangent_out: None,
                prev_out: None,
                next_in: None,
                winding_tangent: end - start,
            },
            Segment::Cubic(c) => {
                let (left, right) = c.subdivide(t);
                // Difference of the control points adjacent to the cut.
                let mut winding_tangent = right.p1 - left.p2;
                if winding_tangent.norm_squared() <= DEGENERATE_DIRECTION_SQ {
                    winding_tangent = c.derivative(t);
                }
                if winding_tangent.norm_squared() <= DEGENERATE_DIRECTION_SQ {
                    winding_tangent = c.p3 - c.p0;
                }
                Self {
                    position: left.p3,
                    tangent_in: Some(left.p2 - left.p3),
                    tangent_out: Some(right.p1 - right.p0),
                    prev_out: Some(left.p1 - left.p0),
                    next_in: Some(right.p2 - right.p3),
                    winding_tangent,
                }
            }
        }
    }

    /// Cuts `segment` at two parameters `t1 < t2`.
    #[must_use]
    pub fn between(segment: &Segment, t1: f64, t2: f64) -> [Self; 2] {
        let infos = Self::sequence(segment, &[t1, t2]);
        [infos[0], infos[1]]
    }

    /// Cuts `segment` at every parameter of the strictly increasing `ts`.
    ///
    /// Each cut is re-parameterised against the range left over by the
    /// previous one, so positions are exact points of the original curve.
    /// The outgoing tangent of every cut but the last is patched with the
    /// `prev_out` of the following cut.
    #[must_use]
    pub fn sequence(segment: &Segment, ts: &[f64]) -> Vec<Self> {
        let mut infos: Vec<Self> = Vec::with_capacity(ts.len());
        let mut remaining = *segment;
        let mut consumed = 0.0;
        for &t in ts {
            let local = (t - consumed) / (1.0 - consumed);
            let info = Self::at(&remaining, local);
            if let Some(prev) = infos.last_mut() {
                prev.tangent_out = info.prev_out;
            }
            remaining = remaining.split_at(local).1;
            consumed = t;
            infos.push(info);
        }
        infos
    }
}
