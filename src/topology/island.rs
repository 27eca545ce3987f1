use std::collections::HashSet;

use crate::error::TopologyError;
use crate::geometry::{Axis, CubicBez, Segment};
use crate::math::Point2;

use super::{LoopId, NodeData, NodeId, PathStore};

/// Ties within this distance keep the earlier candidate.
const EXTREMAL_TOLERANCE: f64 = 1e-9;

/// The point of an island that reaches furthest along an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtremalPoint {
    /// Node whose segment carries the point.
    pub node: NodeId,
    /// Parameter on that segment.
    pub t: f64,
    pub point: Point2,
}

impl PathStore {
    /// Nodes of the chain through `start` in traversal order.
    ///
    /// A closed island is returned starting at `start`. An open chain is
    /// returned from its head to its tail.
    ///
    /// # Errors
    ///
    /// Returns an error if a linked node is missing or the links revisit a
    /// node without closing.
    pub fn island_nodes(&self, start: NodeId) -> Result<Vec<NodeId>, TopologyError> {
        let head = if self.is_closed(start)? {
            start
        } else {
            self.chain_head(start)?
        };
        let limit = self.node_count();
        let mut nodes = vec![head];
        let mut current = self.node(head)?.next;
        while let Some(id) = current {
            if id == head {
                break;
            }
            if nodes.len() >= limit {
                return Err(TopologyError::InvalidTopology(
                    "chain revisits a node without closing".into(),
                ));
            }
            nodes.push(id);
            current = self.node(id)?.next;
        }
        Ok(nodes)
    }

    /// Nodes of the closed island through `start`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::IslandNotClosed`] for open chains.
    pub fn closed_island(&self, start: NodeId) -> Result<Vec<NodeId>, TopologyError> {
        if !self.is_closed(start)? {
            return Err(TopologyError::IslandNotClosed);
        }
        self.island_nodes(start)
    }

    /// Whether following `next` from `start` returns to `start`.
    ///
    /// # Errors
    ///
    /// Returns an error if a linked node is missing.
    pub fn is_closed(&self, start: NodeId) -> Result<bool, TopologyError> {
        let mut current = self.node(start)?.next;
        for _ in 0..self.node_count() {
            match current {
                Some(id) if id == start => return Ok(true),
                Some(id) => current = self.node(id)?.next,
                None => return Ok(false),
            }
        }
        Ok(false)
    }

    fn chain_head(&self, start: NodeId) -> Result<NodeId, TopologyError> {
        let mut head = start;
        for _ in 0..self.node_count() {
            match self.node(head)?.prev {
                Some(prev) if prev != start => head = prev,
                _ => return Ok(head),
            }
        }
        Ok(head)
    }

    /// One representative node per island of the loop, in loop order.
    ///
    /// # Errors
    ///
    /// Returns an error if the loop is not found or its links are broken.
    pub fn islands(&self, id: LoopId, closed_only: bool) -> Result<Vec<NodeId>, TopologyError> {
        let mut seen = HashSet::new();
        let mut islands = Vec::new();
        for &node in &self.loop_data(id)?.nodes {
            if seen.contains(&node) {
                continue;
            }
            let closed = self.is_closed(node)?;
            let chain = self.island_nodes(node)?;
            if closed || !closed_only {
                islands.push(chain[0]);
            }
            seen.extend(chain);
        }
        Ok(islands)
    }

    /// Geometry of the segment from `id` to its successor.
    ///
    /// # Errors
    ///
    /// Returns an error if the node or its successor is missing.
    pub fn segment(&self, id: NodeId) -> Result<Segment, TopologyError> {
        let node = self.node(id)?;
        let next_id = node
            .next
            .ok_or_else(|| TopologyError::InvalidTopology("node has no successor".into()))?;
        let next = self.node(next_id)?;
        let (p0, p3) = (node.position, next.position);
        if node.tangent_out.is_none() && next.tangent_in.is_none() {
            return Ok(Segment::Line { start: p0, end: p3 });
        }
        Ok(Segment::Cubic(CubicBez::new(
            p0,
            node.tangent_out.map_or(p0, |t| p0 + t),
            next.tangent_in.map_or(p3, |t| p3 + t),
            p3,
        )))
    }

    /// Signed area of the closed island; positive when counter-clockwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the island is open or broken.
    pub fn winding(&self, start: NodeId) -> Result<f64, TopologyError> {
        let mut area = 0.0;
        for id in self.closed_island(start)? {
            area += self.segment(id)?.signed_area();
        }
        Ok(area)
    }

    /// The point of the island furthest along `axis`, curve extrema included.
    ///
    /// # Errors
    ///
    /// Returns an error if the island is open or broken.
    pub fn extremal_point(&self, start: NodeId, axis: Axis) -> Result<ExtremalPoint, TopologyError> {
        let mut best: Option<ExtremalPoint> = None;
        for id in self.closed_island(start)? {
            let segment = self.segment(id)?;
            let mut candidates = vec![(0.0, segment.start())];
            candidates.extend(
                segment
                    .axis_extrema(axis)
                    .into_iter()
                    .map(|t| (t, segment.eval(t))),
            );
            for (t, point) in candidates {
                let better = best.map_or(true, |b| {
                    axis.coord(&point) > axis.coord(&b.point) + EXTREMAL_TOLERANCE
                });
                if better {
                    best = Some(ExtremalPoint { node: id, t, point });
                }
            }
        }
        best.ok_or_else(|| TopologyError::InvalidTopology("empty island".into()))
    }

    /// Reverses the traversal direction of the closed island.
    ///
    /// # Errors
    ///
    /// Returns an error if the island is open or broken.
    pub fn reverse_island(&mut self, start: NodeId) -> Result<(), TopologyError> {
        for id in self.closed_island(start)? {
            let node = self.node_mut(id)?;
            std::mem::swap(&mut node.prev, &mut node.next);
            std::mem::swap(&mut node.tangent_in, &mut node.tangent_out);
        }
        Ok(())
    }

    /// Copies the closed island into `dest` and returns the copy of `start`.
    ///
    /// # Errors
    ///
    /// Returns an error if the island is open or broken, or `dest` is missing.
    pub fn clone_island(&mut self, start: NodeId, dest: LoopId) -> Result<NodeId, TopologyError> {
        let source = self.closed_island(start)?;
        let mut copies = Vec::with_capacity(source.len());
        for id in &source {
            let node = self.node(*id)?;
            let copy = NodeData::new(node.position).with_tangents(node.tangent_in, node.tangent_out);
            copies.push(self.add_node(dest, copy)?);
        }
        for (i, &id) in copies.iter().enumerate() {
            self.link(id, copies[(i + 1) % copies.len()])?;
        }
        Ok(copies[0])
    }

    /// Reparents every node of the island into `dest`.
    ///
    /// Source loops left without nodes are removed from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the island is broken or `dest` is missing.
    pub fn migrate_island(&mut self, start: NodeId, dest: LoopId) -> Result<(), TopologyError> {
        let mut sources = Vec::new();
        for id in self.island_nodes(start)? {
            if let Some(parent) = self.node(id)?.parent {
                if parent != dest && !sources.contains(&parent) {
                    sources.push(parent);
                }
            }
            self.set_parent(id, dest)?;
        }
        for source in sources {
            if self.loop_data(source)?.nodes.is_empty() {
                self.remove_loop(source)?;
            }
        }
        Ok(())
    }

    /// Removes every node of the chain through `start`.
    ///
    /// # Errors
    ///
    /// Returns an error if the chain is broken.
    pub fn remove_island(&mut self, start: NodeId) -> Result<(), TopologyError> {
        for id in self.island_nodes(start)? {
            self.remove_node(id)?;
        }
        Ok(())
    }
}
