use crate::error::Result;
use crate::geometry::Aabb2;
use crate::topology::{NodeId, PathStore};

/// Computes the tight axis-aligned bounds of an island.
///
/// Curved segments are bounded by their extrema, not their control points.
pub struct IslandBounds {
    island: NodeId,
}

impl IslandBounds {
    /// Creates a new `IslandBounds` query.
    #[must_use]
    pub fn new(island: NodeId) -> Self {
        Self { island }
    }

    /// Executes the query, returning the bounding box.
    ///
    /// # Errors
    ///
    /// Returns an error if the island's links are broken.
    pub fn execute(&self, store: &PathStore) -> Result<Aabb2> {
        let mut bounds = Aabb2::from_points(&[]);
        for id in store.island_nodes(self.island)? {
            let node = store.node(id)?;
            if node.next.is_none() {
                bounds.include(&node.position);
                continue;
            }
            let seg = store.segment(id)?.bounds();
            bounds.include(&seg.min);
            bounds.include(&seg.max);
        }
        Ok(bounds)
    }
}
