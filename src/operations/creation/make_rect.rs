use crate::error::{GeometryError, Result};
use crate::math::Point2;
use crate::topology::{LoopId, NodeId, PathStore};

use super::{IslandVertex, MakeIsland};

/// Creates a counter-clockwise rectangle from two corner points.
pub struct MakeRect {
    dest: LoopId,
    min_corner: Point2,
    max_corner: Point2,
}

impl MakeRect {
    /// Creates a new `MakeRect` operation.
    #[must_use]
    pub fn new(dest: LoopId, min_corner: Point2, max_corner: Point2) -> Self {
        Self {
            dest,
            min_corner,
            max_corner,
        }
    }

    /// Executes the operation, returning the node at `min_corner`.
    ///
    /// # Errors
    ///
    /// Returns an error if the rectangle has no area or the loop is missing.
    pub fn execute(&self, store: &mut PathStore) -> Result<NodeId> {
        let (lo, hi) = (self.min_corner, self.max_corner);
        if hi.x <= lo.x || hi.y <= lo.y {
            return Err(GeometryError::Degenerate(format!(
                "rectangle from {lo} to {hi} has no area"
            ))
            .into());
        }
        let corners = [
            lo,
            Point2::new(hi.x, lo.y),
            hi,
            Point2::new(lo.x, hi.y),
        ];
        let vertices = corners.into_iter().map(IslandVertex::corner).collect();
        MakeIsland::new(self.dest, vertices, true).execute(store)
    }
}
