use crate::error::{GeometryError, Result};
use crate::math::{Point2, Vector2};
use crate::topology::{LoopId, NodeId, PathStore};

use super::{IslandVertex, MakeIsland};

/// Handle length of a quarter-circle cubic, as a fraction of the radius.
const KAPPA: f64 = 0.552_284_749_8;

/// Creates an axis-aligned ellipse from four cubic segments.
///
/// The island runs counter-clockwise and starts at the rightmost point.
pub struct MakeEllipse {
    dest: LoopId,
    center: Point2,
    radius_x: f64,
    radius_y: f64,
}

impl MakeEllipse {
    /// Creates a new `MakeEllipse` operation.
    #[must_use]
    pub fn new(dest: LoopId, center: Point2, radius_x: f64, radius_y: f64) -> Self {
        Self {
            dest,
            center,
            radius_x,
            radius_y,
        }
    }

    /// Creates a circle.
    #[must_use]
    pub fn circle(dest: LoopId, center: Point2, radius: f64) -> Self {
        Self::new(dest, center, radius, radius)
    }

    /// Executes the operation, returning the rightmost node.
    ///
    /// # Errors
    ///
    /// Returns an error if a radius is not positive or the loop is missing.
    pub fn execute(&self, store: &mut PathStore) -> Result<NodeId> {
        let (rx, ry) = (self.radius_x, self.radius_y);
        if rx <= 0.0 || ry <= 0.0 {
            return Err(GeometryError::Degenerate(format!("ellipse radii ({rx}, {ry})")).into());
        }
        let c = self.center;
        let (hx, hy) = (rx * KAPPA, ry * KAPPA);
        let vertices = vec![
            IslandVertex::smooth(c + Vector2::new(rx, 0.0), Vector2::new(0.0, -hy), Vector2::new(0.0, hy)),
            IslandVertex::smooth(c + Vector2::new(0.0, ry), Vector2::new(hx, 0.0), Vector2::new(-hx, 0.0)),
            IslandVertex::smooth(c + Vector2::new(-rx, 0.0), Vector2::new(0.0, hy), Vector2::new(0.0, -hy)),
            IslandVertex::smooth(c + Vector2::new(0.0, -ry), Vector2::new(-hx, 0.0), Vector2::new(hx, 0.0)),
        ];
        MakeIsland::new(self.dest, vertices, true).execute(store)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn circle_area_is_close_to_pi() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let head = MakeEllipse::circle(lp, Point2::new(3.0, -1.0), 1.0)
            .execute(&mut store)
            .unwrap();
        assert_eq!(store.closed_island(head).unwrap().len(), 4);
        assert_relative_eq!(store.winding(head).unwrap(), PI, epsilon = 1e-3);
    }

    #[test]
    fn ellipse_passes_through_its_axes() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let head = MakeEllipse::new(lp, Point2::origin(), 2.0, 1.0)
            .execute(&mut store)
            .unwrap();
        let top = store.segment(head).unwrap().end();
        assert_relative_eq!(top.x, 0.0);
        assert_relative_eq!(top.y, 1.0);
        assert!(store.winding(head).unwrap() > 0.0);
    }

    #[test]
    fn flat_ellipse_is_rejected() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        assert!(MakeEllipse::new(lp, Point2::origin(), 1.0, 0.0)
            .execute(&mut store)
            .is_err());
    }
}
