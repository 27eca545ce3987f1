use crate::error::{OperationError, Result};
use crate::topology::{LoopId, NodeId, PathStore};

use super::engine::reflow_execute;
use super::select::BooleanOp;
use super::trace::trace_execute;
use super::{BooleanOutcome, BooleanParams, BooleanStatus};

/// Merges islands into one destination loop by splicing.
pub struct Union {
    dest: LoopId,
    islands: Vec<NodeId>,
    params: BooleanParams,
}

impl Union {
    /// Creates a new `Union` of `islands` into `dest`.
    #[must_use]
    pub fn new(dest: LoopId, islands: Vec<NodeId>) -> Self {
        Self {
            dest,
            islands,
            params: BooleanParams::default(),
        }
    }

    /// Sets custom sampling parameters.
    #[must_use]
    pub fn with_params(mut self, params: BooleanParams) -> Self {
        self.params = params;
        self
    }

    /// Executes the union, leaving the result in the destination loop.
    ///
    /// # Errors
    ///
    /// Returns an error if no island is given or an island is open or broken.
    pub fn execute(&self, store: &mut PathStore) -> Result<BooleanOutcome> {
        union_all(store, self.dest, &self.islands, |store, left, right| {
            reflow_execute(store, left, right, BooleanOp::Union, &self.params)
        })
    }
}

/// Merges islands into one destination loop by tracing new outlines.
///
/// Each merge emits the outer boundary and any holes the merged islands
/// enclose between them.
pub struct TraceUnion {
    dest: LoopId,
    islands: Vec<NodeId>,
    params: BooleanParams,
    keep_inputs: bool,
}

impl TraceUnion {
    /// Creates a new `TraceUnion` of `islands` into `dest`.
    #[must_use]
    pub fn new(dest: LoopId, islands: Vec<NodeId>) -> Self {
        Self {
            dest,
            islands,
            params: BooleanParams::default(),
            keep_inputs: false,
        }
    }

    /// Sets custom sampling parameters.
    #[must_use]
    pub fn with_params(mut self, params: BooleanParams) -> Self {
        self.params = params;
        self
    }

    /// Keeps the traced input nodes instead of removing them.
    #[must_use]
    pub fn keep_inputs(mut self, keep: bool) -> Self {
        self.keep_inputs = keep;
        self
    }

    /// Executes the union, leaving the result in the destination loop.
    ///
    /// # Errors
    ///
    /// Returns an error if no island is given, an island is open or broken,
    /// or a trace fails to close.
    pub fn execute(&self, store: &mut PathStore) -> Result<BooleanOutcome> {
        union_all(store, self.dest, &self.islands, |store, left, right| {
            trace_execute(store, left, right, BooleanOp::Union, &self.params, self.keep_inputs)
        })
    }
}

/// Folds `islands` into `dest` one at a time.
///
/// Every incoming island is merged against the islands already in the
/// result. After a splice the merged outline is checked against the
/// remaining islands again, since it may now reach islands it did not
/// touch before.
fn union_all<F>(
    store: &mut PathStore,
    dest: LoopId,
    islands: &[NodeId],
    mut merge: F,
) -> Result<BooleanOutcome>
where
    F: FnMut(&mut PathStore, NodeId, NodeId) -> Result<BooleanOutcome>,
{
    if islands.is_empty() {
        return Err(OperationError::InvalidInput("union needs at least one island".into()).into());
    }
    let mut merged: Vec<NodeId> = Vec::new();
    let mut status = BooleanStatus::NoCollision;
    for &island in islands {
        store.closed_island(island)?;
        store.migrate_island(island, dest)?;
        let mut current = Some(island);
        'restart: while let Some(incoming) = current {
            for i in 0..merged.len() {
                let outcome = merge(store, merged[i], incoming)?;
                match outcome.status {
                    BooleanStatus::NoCollision | BooleanStatus::Degenerate => {}
                    BooleanStatus::Collision => {
                        merged.remove(i);
                        current = outcome.node;
                        status = BooleanStatus::Collision;
                        continue 'restart;
                    }
                    BooleanStatus::LeftSurroundsRight => {
                        current = None;
                        if status == BooleanStatus::NoCollision {
                            status = outcome.status;
                        }
                        continue 'restart;
                    }
                    BooleanStatus::RightSurroundsLeft => {
                        merged.remove(i);
                        if status == BooleanStatus::NoCollision {
                            status = outcome.status;
                        }
                        continue 'restart;
                    }
                }
            }
            break;
        }
        if let Some(survivor) = current {
            merged.push(survivor);
        }
    }
    tracing::debug!(?status, islands = merged.len(), "union complete");
    Ok(BooleanOutcome::new(status, merged.first().copied()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use crate::topology::NodeData;
    use approx::assert_relative_eq;

    fn square(store: &mut PathStore, lp: LoopId, x0: f64, y0: f64, x1: f64, y1: f64) -> NodeId {
        let ids: Vec<NodeId> = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)]
            .iter()
            .map(|&(x, y)| store.add_node(lp, NodeData::new(Point2::new(x, y))).unwrap())
            .collect();
        for (i, &id) in ids.iter().enumerate() {
            store.link(id, ids[(i + 1) % ids.len()]).unwrap();
        }
        ids[0]
    }

    fn loop_area(store: &PathStore, lp: LoopId) -> f64 {
        store
            .islands(lp, true)
            .unwrap()
            .into_iter()
            .map(|i| store.winding(i).unwrap())
            .sum()
    }

    #[test]
    fn chain_of_squares_merges_into_one() {
        let mut store = PathStore::new();
        let dest = store.add_loop();
        let src = store.add_loop();
        // The first and last squares only meet once the middle one is merged.
        let a = square(&mut store, src, 0.0, 0.0, 2.0, 2.0);
        let c = square(&mut store, src, 3.0, 0.5, 5.0, 2.5);
        let b = square(&mut store, src, 1.0, 1.0, 4.0, 1.5);
        let out = Union::new(dest, vec![a, c, b]).execute(&mut store).unwrap();
        assert_eq!(out.status, BooleanStatus::Collision);
        assert_eq!(store.islands(dest, true).unwrap().len(), 1);
        // 4 + 4 + 1.5 minus the two 0.5 overlaps
        assert_relative_eq!(loop_area(&store, dest), 8.5, epsilon = 1e-9);
    }

    #[test]
    fn nested_island_is_absorbed() {
        let mut store = PathStore::new();
        let dest = store.add_loop();
        let inner = square(&mut store, dest, 2.0, 2.0, 4.0, 4.0);
        let outer = square(&mut store, dest, 0.0, 0.0, 6.0, 6.0);
        let out = Union::new(dest, vec![inner, outer]).execute(&mut store).unwrap();
        assert_eq!(out.status, BooleanStatus::RightSurroundsLeft);
        assert_eq!(out.node, Some(outer));
        assert_relative_eq!(loop_area(&store, dest), 36.0, epsilon = 1e-9);
    }

    #[test]
    fn trace_union_of_three() {
        let mut store = PathStore::new();
        let dest = store.add_loop();
        let a = square(&mut store, dest, 0.0, 0.0, 2.0, 2.0);
        let b = square(&mut store, dest, 1.0, 1.0, 3.0, 3.0);
        let far = square(&mut store, dest, 10.0, 10.0, 11.0, 11.0);
        let out = TraceUnion::new(dest, vec![a, b, far]).execute(&mut store).unwrap();
        assert_eq!(out.status, BooleanStatus::Collision);
        assert_eq!(store.islands(dest, true).unwrap().len(), 2);
        assert_relative_eq!(loop_area(&store, dest), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn empty_union_is_rejected() {
        let mut store = PathStore::new();
        let dest = store.add_loop();
        assert!(Union::new(dest, Vec::new()).execute(&mut store).is_err());
    }
}
