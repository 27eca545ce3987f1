use crate::math::Point2;

/// Axis-aligned bounding box in the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb2 {
    pub min: Point2,
    pub max: Point2,
}

impl Aabb2 {
    /// Creates the smallest box containing all `points`.
    ///
    /// An empty slice yields an inverted box that overlaps nothing.
    #[must_use]
    pub fn from_points(points: &[Point2]) -> Self {
        let mut bounds = Self {
            min: Point2::new(f64::INFINITY, f64::INFINITY),
            max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        };
        for p in points {
            bounds.include(p);
        }
        bounds
    }

    /// Grows the box to contain `p`.
    pub fn include(&mut self, p: &Point2) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    /// Checks whether two boxes overlap, padding both by `tolerance`.
    #[must_use]
    pub fn overlaps(&self, other: &Aabb2, tolerance: f64) -> bool {
        self.min.x <= other.max.x + tolerance
            && self.max.x >= other.min.x - tolerance
            && self.min.y <= other.max.y + tolerance
            && self.max.y >= other.min.y - tolerance
    }

    /// Distance from `p` to the box, zero when `p` is inside.
    #[must_use]
    pub fn distance_to(&self, p: &Point2) -> f64 {
        let dx = (self.min.x - p.x).max(p.x - self.max.x).max(0.0);
        let dy = (self.min.y - p.y).max(p.y - self.max.y).max(0.0);
        dx.hypot(dy)
    }

    /// Width of the box.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height of the box.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}
