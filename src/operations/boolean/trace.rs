use std::collections::HashMap;

use crate::error::{OperationError, Result, TopologyError};
use crate::geometry::Segment;
use crate::topology::{LoopId, NodeData, NodeId, PathStore};

use super::classify::{boundary_distance, classify_islands, ON_BOUNDARY};
use super::collision::{clean_collisions, segment_collisions, Collision, SegmentHit};
use super::contact::{island_crossings, Crossing};
use super::engine::{islands_coincide, owning_loop, resolve_coincident, resolve_containment};
use super::select::{containment_action, needs_reversal, BooleanOp, IslandSource, JunctionView};
use super::{BooleanOutcome, BooleanParams, BooleanStatus};

/// Stops on the same node closer than this are the same position.
const SAME_STOP: f64 = 1e-12;

/// A crossing as seen from one of the two chains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceStop {
    /// Where this chain leaves the crossing.
    pub t: f64,
    /// Index into [`TraceData::crossings`].
    pub crossing: usize,
    /// Where the other chain leaves the crossing.
    pub other: SegmentHit,
    /// Whether this chain continues into the other island.
    pub heads_inside: bool,
}

/// Everything a trace walk needs to know about two islands.
#[derive(Debug, Clone)]
pub struct TraceData {
    /// Nodes of the left island followed by those of the right one.
    pub nodes: Vec<NodeId>,
    pub sources: HashMap<NodeId, IslandSource>,
    /// Cleaned collisions of every segment pair, self-crossings included.
    pub collisions: Vec<Collision>,
    /// Places where the two boundaries cross, `a` on the left island.
    pub crossings: Vec<Crossing>,
    stops: HashMap<NodeId, Vec<TraceStop>>,
}

impl TraceData {
    /// Crossing stops on `node`'s segment in increasing parameter order.
    #[must_use]
    pub fn stops(&self, node: NodeId) -> &[TraceStop] {
        self.stops.get(&node).map_or(&[][..], Vec::as_slice)
    }

    /// Number of crossings between the two islands.
    #[must_use]
    pub fn cross_island_count(&self) -> usize {
        self.crossings.len()
    }

    /// Parameter of the first stop after `t`, or `1.0`.
    fn next_stop(&self, node: NodeId, t: f64) -> f64 {
        self.stops(node)
            .iter()
            .find(|s| s.t > t + SAME_STOP)
            .map_or(1.0, |s| s.t)
    }

    fn junction(&self, at: SegmentHit) -> Option<&TraceStop> {
        self.stops(at.node)
            .iter()
            .find(|s| (s.t - at.t).abs() < SAME_STOP)
    }

    fn junctions(&self, at: SegmentHit) -> impl Iterator<Item = &TraceStop> {
        self.stops(at.node)
            .iter()
            .filter(move |s| (s.t - at.t).abs() < SAME_STOP)
    }

    fn source(&self, node: NodeId) -> Result<IslandSource> {
        self.sources
            .get(&node)
            .copied()
            .ok_or_else(|| TopologyError::EntityNotFound("traced node".into()).into())
    }
}

/// Collects nodes, collisions and crossings of both islands for tracing.
///
/// Every unordered pair of segments is sampled, pairs within the same
/// island included. Collisions between the islands are reduced to
/// crossings, and each crossing becomes a stop on both chains where they
/// leave it. Self-crossings are recorded but are not junctions.
///
/// # Errors
///
/// Returns an error if either island is open or broken.
pub fn gather_trace_data(
    store: &PathStore,
    left: NodeId,
    right: NodeId,
    params: &BooleanParams,
) -> Result<TraceData> {
    let left_nodes = store.closed_island(left)?;
    let right_nodes = store.closed_island(right)?;
    let mut sources = HashMap::new();
    sources.extend(left_nodes.iter().map(|&id| (id, IslandSource::Left)));
    sources.extend(right_nodes.iter().map(|&id| (id, IslandSource::Right)));
    let nodes: Vec<NodeId> = left_nodes.into_iter().chain(right_nodes).collect();
    let segments = nodes
        .iter()
        .map(|&id| store.segment(id))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut raw = Vec::new();
    for i in 0..nodes.len() {
        for j in i + 1..nodes.len() {
            for (ta, tb) in segment_collisions(&segments[i], &segments[j], params) {
                raw.push(Collision::new(
                    SegmentHit::new(nodes[i], ta),
                    SegmentHit::new(nodes[j], tb),
                ));
            }
        }
    }
    let collisions = clean_collisions(store, raw, params)?;

    let between: Vec<Collision> = collisions
        .iter()
        .filter_map(|c| {
            match (sources.get(&c.a.node), sources.get(&c.b.node)) {
                (Some(IslandSource::Left), Some(IslandSource::Right)) => Some(*c),
                (Some(IslandSource::Right), Some(IslandSource::Left)) => Some(c.reciprocal()),
                _ => None,
            }
        })
        .collect();
    let crossings = island_crossings(store, left, right, &between)?;

    let mut stops: HashMap<NodeId, Vec<TraceStop>> = HashMap::new();
    for (index, crossing) in crossings.iter().enumerate() {
        let on_left = crossing.b_exit;
        stops.entry(on_left.a.node).or_default().push(TraceStop {
            t: on_left.a.t,
            crossing: index,
            other: on_left.b,
            heads_inside: crossing.a_enters,
        });
        let on_right = crossing.a_exit;
        stops.entry(on_right.b.node).or_default().push(TraceStop {
            t: on_right.b.t,
            crossing: index,
            other: on_right.a,
            heads_inside: crossing.b_enters,
        });
    }
    for list in stops.values_mut() {
        list.sort_by(|x, y| x.t.total_cmp(&y.t));
    }
    tracing::trace!(
        nodes = nodes.len(),
        collisions = collisions.len(),
        crossings = crossings.len(),
        "gathered trace data"
    );
    Ok(TraceData {
        nodes,
        sources,
        collisions,
        crossings,
        stops,
    })
}

/// Executes a boolean operation by walking both islands and emitting new
/// chains into the left island's loop.
///
/// Union starts at the rightmost vertex when it lies off the other
/// boundary. Every operation then starts from each crossing not yet
/// visited, so holes and separate pieces get their own chains. At each
/// junction the decision function of `op` chooses between continuing and
/// jumping to the other chain. Chains enclosing no area are dropped.
///
/// Unless `keep_inputs` is set the original nodes are removed afterwards.
/// Kept inputs are left as they were found, orientation included, and
/// results that would reuse an input are copies.
///
/// # Errors
///
/// Returns an error if either island is open or broken, or a walk does not
/// close.
pub fn trace_execute(
    store: &mut PathStore,
    left: NodeId,
    right: NodeId,
    op: BooleanOp,
    params: &BooleanParams,
    keep_inputs: bool,
) -> Result<BooleanOutcome> {
    tracing::debug!(?op, keep_inputs, "trace boolean");
    let dest = owning_loop(store, left)?;
    if islands_coincide(store, left, right, params.tolerance)? {
        if keep_inputs {
            return copy_coincident(store, left, op, dest);
        }
        return resolve_coincident(store, left, right, op);
    }

    let reversed = needs_reversal(store.winding(left)?, store.winding(right)?, op);
    if reversed {
        store.reverse_island(right)?;
    }

    let data = gather_trace_data(store, left, right, params)?;
    let outcome = if data.cross_island_count() == 0 {
        let status = classify_islands(store, left, right)?;
        if !keep_inputs {
            return resolve_containment(store, left, right, op, status, dest);
        }
        copy_containment(store, left, right, op, status, dest)?
    } else {
        let chains = {
            let mut walker = Walker {
                store: &*store,
                data: &data,
                decide: op.trace_decision(),
                islands: [left, right],
                visited: vec![false; data.crossings.len()],
            };
            walker.walk_all(op)?
        };
        let mut emitted = Vec::with_capacity(chains.len());
        for pieces in &chains {
            let area: f64 = pieces.iter().map(Segment::signed_area).sum();
            if area.abs() <= params.tolerance {
                tracing::trace!(pieces = pieces.len(), "dropped chain without area");
                continue;
            }
            emitted.push(emit_chain(store, dest, pieces)?);
        }
        tracing::debug!(chains = emitted.len(), "trace complete");
        BooleanOutcome::new(BooleanStatus::Collision, emitted.first().copied())
    };

    if keep_inputs {
        if reversed {
            store.reverse_island(right)?;
        }
    } else {
        let right_loop = owning_loop(store, right)?;
        for &id in &data.nodes {
            store.remove_node(id)?;
        }
        if right_loop != dest && store.loop_data(right_loop)?.nodes.is_empty() {
            store.remove_loop(right_loop)?;
        }
    }
    Ok(outcome)
}

/// Copies the islands that survive a containment outcome into `dest`.
fn copy_containment(
    store: &mut PathStore,
    left: NodeId,
    right: NodeId,
    op: BooleanOp,
    status: BooleanStatus,
    dest: LoopId,
) -> Result<BooleanOutcome> {
    let action = containment_action(status, op);
    let mut node = None;
    if action.keep_left {
        node = Some(store.clone_island(left, dest)?);
    }
    if action.keep_right {
        let copy = store.clone_island(right, dest)?;
        node = node.or(Some(copy));
    }
    tracing::debug!(?status, ?action, "copied containment outcome");
    Ok(BooleanOutcome::new(status, node))
}

fn copy_coincident(
    store: &mut PathStore,
    left: NodeId,
    op: BooleanOp,
    dest: LoopId,
) -> Result<BooleanOutcome> {
    tracing::debug!(?op, "islands coincide");
    match op {
        BooleanOp::Union | BooleanOp::Intersection => Ok(BooleanOutcome::new(
            BooleanStatus::LeftSurroundsRight,
            Some(store.clone_island(left, dest)?),
        )),
        BooleanOp::Difference => Ok(BooleanOutcome::new(BooleanStatus::RightSurroundsLeft, None)),
    }
}

struct Walker<'a> {
    store: &'a PathStore,
    data: &'a TraceData,
    decide: fn(&JunctionView) -> bool,
    islands: [NodeId; 2],
    visited: Vec<bool>,
}

impl Walker<'_> {
    fn walk_all(&mut self, op: BooleanOp) -> Result<Vec<Vec<Segment>>> {
        let mut chains = Vec::new();
        if op == BooleanOp::Union {
            if let Some(start) = self.outer_start()? {
                chains.push(self.walk(SegmentHit::new(start, 0.0))?);
            }
        }
        for index in 0..self.data.crossings.len() {
            if self.visited[index] {
                continue;
            }
            self.visited[index] = true;
            let crossing = self.data.crossings[index];
            let view = JunctionView {
                current: IslandSource::Left,
                heads_inside: crossing.a_enters,
            };
            let start = if (self.decide)(&view) {
                crossing.a_exit.a
            } else {
                crossing.b_exit.b
            };
            chains.push(self.walk(start)?);
        }
        Ok(chains)
    }

    /// The rightmost vertex of both islands, unless it lies on the other
    /// island's boundary.
    fn outer_start(&self) -> Result<Option<NodeId>> {
        let mut best: Option<(NodeId, f64)> = None;
        for &id in &self.data.nodes {
            let x = self.store.node(id)?.position.x;
            if best.map_or(true, |(_, bx)| x > bx) {
                best = Some((id, x));
            }
        }
        let (id, _) = best.ok_or_else(|| OperationError::InvalidInput("nothing to trace".into()))?;
        let other = match self.data.source(id)? {
            IslandSource::Left => self.islands[1],
            IslandSource::Right => self.islands[0],
        };
        let position = self.store.node(id)?.position;
        if boundary_distance(self.store, &position, other)? > ON_BOUNDARY {
            Ok(Some(id))
        } else {
            tracing::trace!("rightmost vertex lies on both islands");
            Ok(None)
        }
    }

    fn walk(&mut self, start: SegmentHit) -> Result<Vec<Segment>> {
        let limit = 2 * (self.data.nodes.len() + 4 * self.data.crossings.len()) + 4;
        let mut pieces = Vec::new();
        let mut current = start;
        for _ in 0..limit {
            let end = self.data.next_stop(current.node, current.t);
            pieces.push(self.store.segment(current.node)?.subsegment(current.t, end));
            let mut next = if end < 1.0 {
                SegmentHit::new(current.node, end)
            } else {
                SegmentHit::new(self.successor(current.node)?, 0.0)
            };
            if same_position(next, start) {
                for stop in self.data.junctions(next) {
                    self.visited[stop.crossing] = true;
                }
                return Ok(pieces);
            }
            if let Some(stop) = self.data.junction(next) {
                self.visited[stop.crossing] = true;
                let view = JunctionView {
                    current: self.data.source(next.node)?,
                    heads_inside: stop.heads_inside,
                };
                if !(self.decide)(&view) {
                    next = stop.other;
                    if same_position(next, start) {
                        return Ok(pieces);
                    }
                }
            }
            current = next;
        }
        tracing::warn!(pieces = pieces.len(), "trace walk did not close");
        Err(OperationError::Failed("trace walk did not close".into()).into())
    }

    fn successor(&self, node: NodeId) -> Result<NodeId> {
        self.store
            .node(node)?
            .next
            .ok_or_else(|| TopologyError::InvalidTopology("node has no successor".into()).into())
    }
}

fn same_position(a: SegmentHit, b: SegmentHit) -> bool {
    a.node == b.node && (a.t - b.t).abs() < SAME_STOP
}

/// Writes a closed chain of pieces into `dest` and returns its first node.
fn emit_chain(store: &mut PathStore, dest: LoopId, pieces: &[Segment]) -> Result<NodeId> {
    let ids = pieces
        .iter()
        .map(|piece| store.add_node(dest, NodeData::new(piece.start())))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    for (k, piece) in pieces.iter().enumerate() {
        let next = ids[(k + 1) % ids.len()];
        store.link(ids[k], next)?;
        if let Segment::Cubic(c) = piece {
            store.node_mut(ids[k])?.tangent_out = Some(c.p1 - c.p0);
            store.node_mut(next)?.tangent_in = Some(c.p2 - c.p3);
        }
    }
    ids.first()
        .copied()
        .ok_or_else(|| OperationError::Failed("empty trace".into()).into())
}
