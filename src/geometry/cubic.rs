use crate::math::intersect_2d::point_segment_distance;
use crate::math::polynomial::{solve_cubic, solve_quadratic};
use crate::math::{lerp, Point2, Vector2};

use super::{Aabb2, Axis};

/// Subdivision limit of [`CubicBez::distance_to`].
const MAX_DISTANCE_DEPTH: u32 = 32;

/// A cubic bezier curve defined by four control points.
///
/// The parametric form is the Bernstein polynomial over `t ∈ [0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBez {
    pub p0: Point2,
    pub p1: Point2,
    pub p2: Point2,
    pub p3: Point2,
}

impl CubicBez {
    /// Creates a new cubic from its control points.
    #[must_use]
    pub fn new(p0: Point2, p1: Point2, p2: Point2, p3: Point2) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Degree-elevates a straight line so that `t` stays linear in arc length.
    #[must_use]
    pub fn from_line(start: Point2, end: Point2) -> Self {
        Self {
            p0: start,
            p1: lerp(&start, &end, 1.0 / 3.0),
            p2: lerp(&start, &end, 2.0 / 3.0),
            p3: end,
        }
    }

    /// Evaluates the curve at parameter `t`.
    #[must_use]
    pub fn eval(&self, t: f64) -> Point2 {
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;
        Point2::from(
            self.p0.coords * a + self.p1.coords * b + self.p2.coords * c + self.p3.coords * d,
        )
    }

    /// First derivative at parameter `t`.
    #[must_use]
    pub fn derivative(&self, t: f64) -> Vector2 {
        let mt = 1.0 - t;
        (self.p1 - self.p0) * (3.0 * mt * mt)
            + (self.p2 - self.p1) * (6.0 * mt * t)
            + (self.p3 - self.p2) * (3.0 * t * t)
    }

    /// Splits the curve at `t` with de Casteljau's algorithm.
    #[must_use]
    pub fn subdivide(&self, t: f64) -> (CubicBez, CubicBez) {
        let q0 = lerp(&self.p0, &self.p1, t);
        let q1 = lerp(&self.p1, &self.p2, t);
        let q2 = lerp(&self.p2, &self.p3, t);
        let r0 = lerp(&q0, &q1, t);
        let r1 = lerp(&q1, &q2, t);
        let s = lerp(&r0, &r1, t);
        (
            CubicBez::new(self.p0, q0, r0, s),
            CubicBez::new(s, r1, q2, self.p3),
        )
    }

    /// Returns the piece of the curve between `t0` and `t1` (`t0 < t1`).
    #[must_use]
    pub fn subsegment(&self, t0: f64, t1: f64) -> CubicBez {
        let head = if t1 < 1.0 { self.subdivide(t1).0 } else { *self };
        if t0 > 0.0 && t1 > 0.0 {
            head.subdivide(t0 / t1).1
        } else {
            head
        }
    }

    /// Bounding box of the control polygon, which contains the curve.
    #[must_use]
    pub fn hull_box(&self) -> Aabb2 {
        Aabb2::from_points(&[self.p0, self.p1, self.p2, self.p3])
    }

    /// Whether both inner control points lie within `tolerance` of the chord.
    #[must_use]
    pub fn is_flat(&self, tolerance: f64) -> bool {
        let chord = self.p3 - self.p0;
        let len = chord.norm();
        if len < tolerance {
            return (self.p1 - self.p0).norm() < tolerance && (self.p2 - self.p0).norm() < tolerance;
        }
        let d1 = (self.p1 - self.p0).perp(&chord).abs() / len;
        let d2 = (self.p2 - self.p0).perp(&chord).abs() / len;
        d1 < tolerance && d2 < tolerance
    }

    /// Shortest distance from `point` to the curve.
    ///
    /// Halves the curve until its pieces are flat within `flatness`, skipping
    /// pieces whose hull box is further away than the best distance so far.
    #[must_use]
    pub fn distance_to(&self, point: &Point2, flatness: f64) -> f64 {
        let mut best = (self.p0 - point).norm().min((self.p3 - point).norm());
        let mut stack = vec![(*self, 0u32)];
        while let Some((piece, depth)) = stack.pop() {
            if piece.hull_box().distance_to(point) >= best {
                continue;
            }
            if depth >= MAX_DISTANCE_DEPTH || piece.is_flat(flatness) {
                best = best.min(point_segment_distance(point, &piece.p0, &piece.p3));
                continue;
            }
            let (head, tail) = piece.subdivide(0.5);
            stack.push((head, depth + 1));
            stack.push((tail, depth + 1));
        }
        best
    }

    /// Signed area swept between the curve and the origin (Green's theorem).
    ///
    /// Summing this over a closed chain gives the enclosed signed area,
    /// positive for counter-clockwise traversal.
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        let (p0, p1, p2, p3) = (self.p0, self.p1, self.p2, self.p3);
        (p0.x * (6.0 * p1.y + 3.0 * p2.y + p3.y)
            + 3.0 * (p1.x * (-2.0 * p0.y + p2.y + p3.y) - p2.x * (p0.y + p1.y - 2.0 * p3.y))
            - p3.x * (p0.y + 3.0 * p1.y + 6.0 * p2.y))
            / 20.0
    }

    /// Parameters where the curve's `axis` coordinate equals `value`.
    ///
    /// Roots outside `[0, 1]` are returned too; callers filter them.
    #[must_use]
    pub fn axis_roots(&self, axis: Axis, value: f64) -> Vec<f64> {
        let p0 = axis.coord(&self.p0) - value;
        let p1 = axis.coord(&self.p1) - value;
        let p2 = axis.coord(&self.p2) - value;
        let p3 = axis.coord(&self.p3) - value;
        solve_cubic(
            -p0 + 3.0 * p1 - 3.0 * p2 + p3,
            3.0 * p0 - 6.0 * p1 + 3.0 * p2,
            -3.0 * p0 + 3.0 * p1,
            p0,
        )
    }

    /// Interior parameters in `(0, 1)` where the `axis` coordinate is stationary.
    #[must_use]
    pub fn axis_extrema(&self, axis: Axis) -> Vec<f64> {
        let p0 = axis.coord(&self.p0);
        let p1 = axis.coord(&self.p1);
        let p2 = axis.coord(&self.p2);
        let p3 = axis.coord(&self.p3);
        solve_quadratic(
            3.0 * (-p0 + 3.0 * p1 - 3.0 * p2 + p3),
            6.0 * (p0 - 2.0 * p1 + p2),
            3.0 * (p1 - p0),
        )
        .into_iter()
        .filter(|t| *t > 0.0 && *t < 1.0)
        .collect()
    }
}
