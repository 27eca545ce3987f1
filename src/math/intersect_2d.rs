use super::{Point2, Vector2};

/// Relative threshold on the sine of the angle between two directions below
/// which they are treated as parallel.
const PARALLEL_SINE: f64 = 1e-12;

/// Parametric 2D line-line intersection.
///
/// Given lines `p1 + t * d1` and `p2 + u * d2`, returns `(t, u)` if not parallel.
#[must_use]
pub fn line_line_intersect_2d(
    p1: &Point2,
    d1: &Vector2,
    p2: &Point2,
    d2: &Vector2,
) -> Option<(f64, f64)> {
    let cross = d1.perp(d2);
    if cross.abs() <= PARALLEL_SINE * d1.norm() * d2.norm() {
        return None;
    }
    let w = p2 - p1;
    let t = w.perp(d2) / cross;
    let u = w.perp(d1) / cross;
    Some((t, u))
}

/// Bounded segment-segment intersection in 2D.
///
/// Returns `(t, u)` clamped to `[0, 1]` when both parameters fall inside
/// `[-eps, 1 + eps]`.
#[must_use]
pub fn segment_segment_intersect_2d(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
    eps: f64,
) -> Option<(f64, f64)> {
    let (t, u) = line_line_intersect_2d(a0, &(a1 - a0), b0, &(b1 - b0))?;
    let range = -eps..=1.0 + eps;
    if range.contains(&t) && range.contains(&u) {
        Some((t.clamp(0.0, 1.0), u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

/// Distance from `p` to the closed segment `a`-`b`.
#[must_use]
pub fn point_segment_distance(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let d = b - a;
    let len_sq = d.norm_squared();
    if len_sq == 0.0 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&d) / len_sq).clamp(0.0, 1.0);
    (p - (a + d * t)).norm()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::TOLERANCE;

    #[test]
    fn line_line_perpendicular() {
        let p1 = Point2::new(0.0, 0.0);
        let d1 = Vector2::new(1.0, 0.0);
        let p2 = Point2::new(0.5, -1.0);
        let d2 = Vector2::new(0.0, 1.0);
        let (t, u) = line_line_intersect_2d(&p1, &d1, &p2, &d2).unwrap();
        assert!((t - 0.5).abs() < TOLERANCE);
        assert!((u - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn line_line_parallel_returns_none() {
        let p1 = Point2::new(0.0, 0.0);
        let d1 = Vector2::new(1.0, 0.0);
        let p2 = Point2::new(0.0, 1.0);
        let d2 = Vector2::new(3.0, 0.0);
        assert!(line_line_intersect_2d(&p1, &d1, &p2, &d2).is_none());
    }

    #[test]
    fn short_directions_are_not_parallel() {
        // Leaf pieces of a deep subdivision have tiny chords.
        let p1 = Point2::new(0.0, 0.0);
        let d1 = Vector2::new(1e-7, 0.0);
        let p2 = Point2::new(5e-8, -5e-8);
        let d2 = Vector2::new(0.0, 1e-7);
        let (t, u) = line_line_intersect_2d(&p1, &d1, &p2, &d2).unwrap();
        assert!((t - 0.5).abs() < 1e-9);
        assert!((u - 0.5).abs() < 1e-9);
    }

    #[test]
    fn segment_segment_crossing() {
        let a0 = Point2::new(0.0, 0.0);
        let a1 = Point2::new(2.0, 2.0);
        let b0 = Point2::new(0.0, 2.0);
        let b1 = Point2::new(2.0, 0.0);
        let (t, u) = segment_segment_intersect_2d(&a0, &a1, &b0, &b1, TOLERANCE).unwrap();
        assert!((t - 0.5).abs() < TOLERANCE);
        assert!((u - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn segment_segment_no_crossing() {
        let a0 = Point2::new(0.0, 0.0);
        let a1 = Point2::new(1.0, 0.0);
        let b0 = Point2::new(0.5, 0.5);
        let b1 = Point2::new(0.5, 2.0);
        assert!(segment_segment_intersect_2d(&a0, &a1, &b0, &b1, TOLERANCE).is_none());
    }

    #[test]
    fn distance_to_segment_clamps_to_ends() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(2.0, 0.0);
        assert!((point_segment_distance(&Point2::new(1.0, 3.0), &a, &b) - 3.0).abs() < TOLERANCE);
        assert!((point_segment_distance(&Point2::new(5.0, 4.0), &a, &b) - 5.0).abs() < TOLERANCE);
        assert!((point_segment_distance(&Point2::new(1.0, 1.0), &a, &a) - 2f64.sqrt()).abs() < TOLERANCE);
    }

    #[test]
    fn segment_touching_endpoint_is_clamped() {
        let a0 = Point2::new(0.0, 0.0);
        let a1 = Point2::new(1.0, 0.0);
        let b0 = Point2::new(1.0 + 1e-12, -1.0);
        let b1 = Point2::new(1.0 + 1e-12, 1.0);
        let (t, u) = segment_segment_intersect_2d(&a0, &a1, &b0, &b1, 1e-9).unwrap();
        assert!((t - 1.0).abs() < TOLERANCE);
        assert!((u - 0.5).abs() < TOLERANCE);
    }
}
