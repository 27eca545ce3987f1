use crate::error::Result;
use crate::topology::{LoopId, NodeId, PathStore};

/// Computes the signed area of a closed island.
///
/// Counter-clockwise islands are positive. Curved segments contribute
/// their exact area.
pub struct IslandArea {
    island: NodeId,
}

impl IslandArea {
    /// Creates a new `IslandArea` query.
    #[must_use]
    pub fn new(island: NodeId) -> Self {
        Self { island }
    }

    /// Executes the query, returning the signed area.
    ///
    /// # Errors
    ///
    /// Returns an error if the island is open or broken.
    pub fn execute(&self, store: &PathStore) -> Result<f64> {
        store.closed_island(self.island)?;
        Ok(store.winding(self.island)?)
    }
}

/// Computes the signed area enclosed by a loop.
///
/// Sums the signed areas of its closed islands, so holes wound against the
/// outline subtract. Open chains are ignored.
pub struct LoopArea {
    path_loop: LoopId,
}

impl LoopArea {
    /// Creates a new `LoopArea` query.
    #[must_use]
    pub fn new(path_loop: LoopId) -> Self {
        Self { path_loop }
    }

    /// Executes the query, returning the total signed area.
    ///
    /// # Errors
    ///
    /// Returns an error if the loop is missing or its links are broken.
    pub fn execute(&self, store: &PathStore) -> Result<f64> {
        let mut total = 0.0;
        for island in store.islands(self.path_loop, true)? {
            total += store.winding(island)?;
        }
        Ok(total)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use crate::operations::creation::{MakeEllipse, MakeRect};
    use approx::assert_relative_eq;

    #[test]
    fn rect_area() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let rect = MakeRect::new(lp, Point2::new(0.0, 0.0), Point2::new(2.0, 3.0))
            .execute(&mut store)
            .unwrap();
        assert_relative_eq!(IslandArea::new(rect).execute(&store).unwrap(), 6.0);
    }

    #[test]
    fn hole_subtracts_from_loop() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        MakeRect::new(lp, Point2::new(0.0, 0.0), Point2::new(4.0, 4.0))
            .execute(&mut store)
            .unwrap();
        let hole = MakeEllipse::circle(lp, Point2::new(2.0, 2.0), 1.0)
            .execute(&mut store)
            .unwrap();
        store.reverse_island(hole).unwrap();
        let area = LoopArea::new(lp).execute(&store).unwrap();
        assert_relative_eq!(area, 16.0 - std::f64::consts::PI, epsilon = 1e-3);
    }

    #[test]
    fn open_island_has_no_area() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let rect = MakeRect::new(lp, Point2::new(0.0, 0.0), Point2::new(1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let last = store.node(rect).unwrap().prev.unwrap();
        store.node_mut(last).unwrap().next = None;
        store.node_mut(rect).unwrap().prev = None;
        assert!(IslandArea::new(rect).execute(&store).is_err());
        assert_relative_eq!(LoopArea::new(lp).execute(&store).unwrap(), 0.0);
    }
}
