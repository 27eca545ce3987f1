pub mod intersect_2d;
pub mod polynomial;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Linear interpolation between two points.
#[must_use]
pub fn lerp(a: &Point2, b: &Point2, t: f64) -> Point2 {
    a + (b - a) * t
}

/// Returns `-1`, `0` or `1` depending on which side of zero `value` lies,
/// treating anything within `eps` of zero as zero.
#[must_use]
pub fn side_of(value: f64, eps: f64) -> i8 {
    if value > eps {
        1
    } else if value < -eps {
        -1
    } else {
        0
    }
}
