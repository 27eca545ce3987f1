mod bounds;
mod cubic;
mod segment;

pub use bounds::Aabb2;
pub use cubic::CubicBez;
pub use segment::{Segment, SubdivideInfo};

use crate::math::Point2;

/// A coordinate axis of the plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Returns the coordinate of `p` along this axis.
    #[must_use]
    pub fn coord(self, p: &Point2) -> f64 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
        }
    }

    /// Returns the perpendicular axis.
    #[must_use]
    pub fn transverse(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}
