use std::collections::HashMap;

use crate::error::{GeometryError, OperationError, Result};
use crate::geometry::SubdivideInfo;
use crate::math::Vector2;
use crate::topology::{LoopId, NodeData, NodeId, PathStore};

use super::collision::Collision;

/// Two cut parameters closer than this are the same cut.
const SAME_CUT: f64 = 1e-12;

/// One cut on an original node's segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitEntry {
    pub t: f64,
    /// Node created at the cut.
    pub node: NodeId,
    /// Direction of the curve through the cut, used for orientation tests.
    pub winding_tangent: Vector2,
}

/// Where a parameter falls among the cuts of one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitLookup {
    /// A cut, or the original node itself at `t = 0`, sits at the parameter.
    Exact(NodeId),
    /// The parameter lies before the first cut.
    Single { prev: NodeId, next: NodeId },
    /// The parameter lies between two cuts.
    Between { prev: NodeId, next: NodeId },
    /// The parameter lies after the last cut, or the segment has no cuts.
    PastEnd { prev: NodeId },
}

/// Cut ledger of one original node.
#[derive(Debug, Clone)]
pub struct SplitInfo {
    pub node: NodeId,
    /// Predecessor before any cut was made.
    pub orig_prev: Option<NodeId>,
    /// Successor before any cut was made.
    pub orig_next: Option<NodeId>,
    entries: Vec<SplitEntry>,
}

impl SplitInfo {
    #[must_use]
    pub fn new(node: NodeId, orig_prev: Option<NodeId>, orig_next: Option<NodeId>) -> Self {
        Self {
            node,
            orig_prev,
            orig_next,
            entries: Vec::new(),
        }
    }

    /// Cuts in increasing parameter order.
    #[must_use]
    pub fn entries(&self) -> &[SplitEntry] {
        &self.entries
    }

    /// Records a cut, keeping the entries ordered.
    ///
    /// # Errors
    ///
    /// Returns an error if `t` is outside `(0, 1)` or already recorded.
    pub fn add_entry(&mut self, t: f64, node: NodeId, winding_tangent: Vector2) -> Result<()> {
        if !(t > 0.0 && t < 1.0) {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "t",
                value: t,
                min: 0.0,
                max: 1.0,
            }
            .into());
        }
        if self.entries.iter().any(|e| (e.t - t).abs() < SAME_CUT) {
            return Err(OperationError::DuplicateSplit { t }.into());
        }
        let index = self.entries.partition_point(|e| e.t < t);
        self.entries.insert(
            index,
            SplitEntry {
                t,
                node,
                winding_tangent,
            },
        );
        Ok(())
    }

    /// Locates `t` among the recorded cuts.
    #[must_use]
    pub fn get_node(&self, t: f64) -> SplitLookup {
        if t <= 0.0 {
            return SplitLookup::Exact(self.node);
        }
        if let Some(entry) = self.entries.iter().find(|e| (e.t - t).abs() < SAME_CUT) {
            return SplitLookup::Exact(entry.node);
        }
        let index = self.entries.partition_point(|e| e.t < t);
        match (index, self.entries.get(index)) {
            (0, Some(first)) => SplitLookup::Single {
                prev: self.node,
                next: first.node,
            },
            (_, Some(next)) => SplitLookup::Between {
                prev: self.entries[index - 1].node,
                next: next.node,
            },
            (_, None) => SplitLookup::PastEnd {
                prev: self.entries.last().map_or(self.node, |e| e.node),
            },
        }
    }

    fn last_node(&self) -> NodeId {
        self.entries.last().map_or(self.node, |e| e.node)
    }

    fn entry_at(&self, t: f64) -> Option<&SplitEntry> {
        self.entries.iter().find(|e| (e.t - t).abs() < SAME_CUT)
    }
}

/// Cut ledgers of every node touched by one operation.
#[derive(Debug, Clone, Default)]
pub struct SplitCollection {
    infos: HashMap<NodeId, SplitInfo>,
}

impl SplitCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the ledger of `node`, creating it from the node's current
    /// links on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not found.
    pub fn register(&mut self, store: &PathStore, node: NodeId) -> Result<&mut SplitInfo> {
        let data = store.node(node)?;
        Ok(self
            .infos
            .entry(node)
            .or_insert_with(|| SplitInfo::new(node, data.prev, data.next)))
    }

    #[must_use]
    pub fn get(&self, node: NodeId) -> Option<&SplitInfo> {
        self.infos.get(&node)
    }

    /// Node that now sits at parameter `t` of the original `node`.
    #[must_use]
    pub fn diced_node(&self, node: NodeId, t: f64) -> Option<NodeId> {
        if t <= 0.0 {
            return Some(node);
        }
        self.infos.get(&node)?.entry_at(t).map(|e| e.node)
    }

    /// Diced node immediately before parameter `t` of the original `node`.
    ///
    /// At `t = 0` this is the last piece of the original predecessor.
    #[must_use]
    pub fn get_previous_to(&self, node: NodeId, t: f64) -> Option<NodeId> {
        let info = self.infos.get(&node)?;
        if t <= 0.0 {
            let prev = info.orig_prev?;
            return Some(self.infos.get(&prev).map_or(prev, SplitInfo::last_node));
        }
        match info.get_node(t) {
            SplitLookup::Exact(cut) => {
                let index = info.entries.iter().position(|e| e.node == cut)?;
                Some(if index == 0 {
                    info.node
                } else {
                    info.entries[index - 1].node
                })
            }
            SplitLookup::Single { prev, .. }
            | SplitLookup::Between { prev, .. }
            | SplitLookup::PastEnd { prev } => Some(prev),
        }
    }

    /// Diced node immediately after parameter `t` of the original `node`.
    #[must_use]
    pub fn get_next_to(&self, node: NodeId, t: f64) -> Option<NodeId> {
        let info = self.infos.get(&node)?;
        let after = if t <= 0.0 {
            info.entries.first()
        } else {
            info.entries.iter().find(|e| e.t > t + SAME_CUT)
        };
        after.map(|e| e.node).or(info.orig_next)
    }
}

/// Cuts every segment named by `collisions` at its collision parameters.
///
/// New nodes are created in `dest`, linked into their chain and recorded in
/// `splits`. Neighbouring handles are rewritten so the pieces trace the
/// original curve. Hits at `t = 0` reuse the existing node.
///
/// # Errors
///
/// Returns an error if a node is missing or a cut is invalid.
pub fn slice_collision_info(
    store: &mut PathStore,
    collisions: &[Collision],
    splits: &mut SplitCollection,
    dest: LoopId,
) -> Result<()> {
    let mut cuts: Vec<(NodeId, Vec<f64>)> = Vec::new();
    for collision in collisions {
        for hit in [collision.a, collision.b] {
            splits.register(store, hit.node)?;
            if hit.t <= 0.0 {
                continue;
            }
            match cuts.iter_mut().find(|(n, _)| *n == hit.node) {
                Some((_, ts)) => ts.push(hit.t),
                None => cuts.push((hit.node, vec![hit.t])),
            }
        }
    }

    for (node, mut ts) in cuts {
        ts.sort_by(f64::total_cmp);
        ts.dedup_by(|a, b| (*a - *b).abs() < SAME_CUT);
        let segment = store.segment(node)?;
        let next = store
            .node(node)?
            .next
            .ok_or_else(|| OperationError::Failed("sliced node has no successor".into()))?;
        let pieces = SubdivideInfo::sequence(&segment, &ts);

        if segment.is_curve() {
            store.node_mut(node)?.tangent_out = pieces.first().and_then(|p| p.prev_out);
        }
        let mut prev = node;
        for (&t, piece) in ts.iter().zip(&pieces) {
            let data = NodeData::new(piece.position).with_tangents(piece.tangent_in, piece.tangent_out);
            let id = store.add_node(dest, data)?;
            store.link(prev, id)?;
            splits
                .register(store, node)?
                .add_entry(t, id, piece.winding_tangent)?;
            prev = id;
        }
        store.link(prev, next)?;
        if segment.is_curve() {
            store.node_mut(next)?.tangent_in = pieces.last().and_then(|p| p.next_in);
        }
        tracing::trace!(cuts = ts.len(), "sliced segment");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use crate::operations::boolean::collision::SegmentHit;
    use approx::assert_relative_eq;

    fn triangle(store: &mut PathStore, lp: LoopId) -> Vec<NodeId> {
        let ids: Vec<NodeId> = [(0.0, 0.0), (4.0, 0.0), (0.0, 4.0)]
            .iter()
            .map(|&(x, y)| store.add_node(lp, NodeData::new(Point2::new(x, y))).unwrap())
            .collect();
        for (i, &id) in ids.iter().enumerate() {
            store.link(id, ids[(i + 1) % ids.len()]).unwrap();
        }
        ids
    }

    #[test]
    fn add_entry_keeps_order_and_rejects_bad_cuts() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let ids = triangle(&mut store, lp);
        let mut info = SplitInfo::new(ids[0], Some(ids[2]), Some(ids[1]));
        info.add_entry(0.75, ids[1], Vector2::x()).unwrap();
        info.add_entry(0.25, ids[2], Vector2::x()).unwrap();
        let ts: Vec<f64> = info.entries().iter().map(|e| e.t).collect();
        assert_eq!(ts, vec![0.25, 0.75]);
        assert!(info.add_entry(0.25, ids[1], Vector2::x()).is_err());
        assert!(info.add_entry(1.0, ids[1], Vector2::x()).is_err());
        assert!(info.add_entry(0.0, ids[1], Vector2::x()).is_err());
    }

    #[test]
    fn get_node_classifies_queries() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let ids = triangle(&mut store, lp);
        let (a, b, c) = (ids[0], ids[1], ids[2]);
        let mut info = SplitInfo::new(a, None, None);
        assert_eq!(info.get_node(0.5), SplitLookup::PastEnd { prev: a });
        info.add_entry(0.3, b, Vector2::x()).unwrap();
        info.add_entry(0.6, c, Vector2::x()).unwrap();
        assert_eq!(info.get_node(0.0), SplitLookup::Exact(a));
        assert_eq!(info.get_node(0.3), SplitLookup::Exact(b));
        assert_eq!(info.get_node(0.1), SplitLookup::Single { prev: a, next: b });
        assert_eq!(info.get_node(0.5), SplitLookup::Between { prev: b, next: c });
        assert_eq!(info.get_node(0.9), SplitLookup::PastEnd { prev: c });
    }

    #[test]
    fn slicing_a_line_inserts_nodes_in_order() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let ids = triangle(&mut store, lp);
        let collisions = [
            Collision::new(SegmentHit::new(ids[0], 0.75), SegmentHit::new(ids[2], 0.0)),
            Collision::new(SegmentHit::new(ids[0], 0.25), SegmentHit::new(ids[1], 0.5)),
        ];
        let mut splits = SplitCollection::new();
        slice_collision_info(&mut store, &collisions, &mut splits, lp).unwrap();

        let chain = store.island_nodes(ids[0]).unwrap();
        assert_eq!(chain.len(), 6);
        let first = splits.diced_node(ids[0], 0.25).unwrap();
        let second = splits.diced_node(ids[0], 0.75).unwrap();
        assert_eq!(chain[1], first);
        assert_eq!(chain[2], second);
        assert_eq!(chain[3], ids[1]);
        assert_relative_eq!(store.node(first).unwrap().position, Point2::new(1.0, 0.0));
        assert_relative_eq!(store.node(second).unwrap().position, Point2::new(3.0, 0.0));
        assert!(store.node(first).unwrap().tangent_out.is_none());
        assert_relative_eq!(store.winding(ids[0]).unwrap(), 8.0, epsilon = 1e-12);
        assert_eq!(splits.diced_node(ids[2], 0.0), Some(ids[2]));
    }

    #[test]
    fn neighbours_resolve_through_ledgers() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let ids = triangle(&mut store, lp);
        let collisions = [
            Collision::new(SegmentHit::new(ids[0], 0.5), SegmentHit::new(ids[1], 0.0)),
            Collision::new(SegmentHit::new(ids[2], 0.5), SegmentHit::new(ids[1], 0.5)),
        ];
        let mut splits = SplitCollection::new();
        slice_collision_info(&mut store, &collisions, &mut splits, lp).unwrap();
        let cut_a = splits.diced_node(ids[0], 0.5).unwrap();
        let cut_b = splits.diced_node(ids[1], 0.5).unwrap();
        let cut_c = splits.diced_node(ids[2], 0.5).unwrap();

        assert_eq!(splits.get_previous_to(ids[1], 0.0), Some(cut_a));
        assert_eq!(splits.get_next_to(ids[1], 0.0), Some(cut_b));
        assert_eq!(splits.get_previous_to(ids[1], 0.5), Some(ids[1]));
        assert_eq!(splits.get_next_to(ids[1], 0.5), Some(ids[2]));
        assert_eq!(splits.get_previous_to(ids[1], 0.7), Some(cut_b));
        assert_eq!(splits.get_next_to(ids[2], 0.2), Some(cut_c));
        assert_eq!(splits.get_next_to(ids[2], 0.7), Some(ids[0]));
    }

    #[test]
    fn slicing_a_curve_preserves_its_shape() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let a = store
            .add_node(
                lp,
                NodeData::new(Point2::new(0.0, 0.0)).with_tangents(None, Some(Vector2::new(1.0, 2.0))),
            )
            .unwrap();
        let b = store
            .add_node(
                lp,
                NodeData::new(Point2::new(4.0, 0.0)).with_tangents(Some(Vector2::new(-1.0, 2.0)), None),
            )
            .unwrap();
        store.link(a, b).unwrap();
        store.link(b, a).unwrap();
        let before = store.segment(a).unwrap();
        let area = store.winding(a).unwrap();

        let collisions = [Collision::new(SegmentHit::new(a, 0.3), SegmentHit::new(a, 0.8))];
        let mut splits = SplitCollection::new();
        slice_collision_info(&mut store, &collisions, &mut splits, lp).unwrap();

        let first = splits.diced_node(a, 0.3).unwrap();
        let second = splits.diced_node(a, 0.8).unwrap();
        assert_relative_eq!(store.node(first).unwrap().position, before.eval(0.3), epsilon = 1e-12);
        assert_relative_eq!(store.node(second).unwrap().position, before.eval(0.8), epsilon = 1e-12);
        let middle = store.segment(first).unwrap();
        assert_relative_eq!(middle.eval(0.5), before.eval(0.55), epsilon = 1e-12);
        assert_relative_eq!(store.winding(a).unwrap(), area, epsilon = 1e-12);
        assert!(splits.get(a).unwrap().entries()[0].winding_tangent.x > 0.0);
    }
}
