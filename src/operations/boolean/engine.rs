use crate::error::{OperationError, Result};
use crate::geometry::CubicBez;
use crate::topology::{LoopId, NodeId, PathStore};

use super::classify::classify_islands;
use super::cleanup::clip_loose_ends;
use super::collision::{island_collisions, Collision, SegmentHit};
use super::contact::island_crossings;
use super::select::{containment_action, keeps_left_incoming, needs_reversal, BooleanOp};
use super::split::{slice_collision_info, SplitCollection};
use super::{BooleanOutcome, BooleanParams, BooleanStatus};

/// Two hits on the same node closer than this claim the same cut.
const SAME_CLAIM: f64 = 1e-12;

/// Executes a boolean operation by splicing the two islands in place.
///
/// Orchestrates the full pipeline: orientation, collision sampling,
/// containment fallback, slicing, splicing and loose-end cleanup. The
/// result lives in the left island's loop; the right island's nodes are
/// moved there or removed.
///
/// # Errors
///
/// Returns an error if either island is open or broken.
pub fn reflow_execute(
    store: &mut PathStore,
    left: NodeId,
    right: NodeId,
    op: BooleanOp,
    params: &BooleanParams,
) -> Result<BooleanOutcome> {
    tracing::debug!(?op, "reflow boolean");
    let dest = owning_loop(store, left)?;
    if islands_coincide(store, left, right, params.tolerance)? {
        return resolve_coincident(store, left, right, op);
    }

    // Step 1: orientation
    let left_winding = store.winding(left)?;
    let right_winding = store.winding(right)?;
    let reversed = needs_reversal(left_winding, right_winding, op);
    if reversed {
        store.reverse_island(right)?;
    }

    // Step 2: sampling, with the containment short-circuit
    let collisions = island_collisions(store, left, right, params)?;
    tracing::trace!(count = collisions.len(), "island collisions");
    if op == BooleanOp::Difference && !collisions.is_empty() {
        let status = if collisions.len() == 1 {
            tracing::debug!("single collision in difference, leaving inputs untouched");
            Some(BooleanStatus::NoCollision)
        } else if has_duplicate_claims(&collisions) {
            tracing::warn!("difference cut claimed twice, reporting degenerate");
            Some(BooleanStatus::Degenerate)
        } else {
            None
        };
        if let Some(status) = status {
            if reversed {
                store.reverse_island(right)?;
            }
            return Ok(BooleanOutcome::unchanged(status));
        }
    }
    let crossings = island_crossings(store, left, right, &collisions)?;
    if crossings.is_empty() {
        let status = classify_islands(store, left, right)?;
        return resolve_containment(store, left, right, op, status, dest);
    }

    // Step 3: slice both islands where the splices land
    let plan: Vec<(Collision, bool)> = crossings
        .iter()
        .map(|c| {
            let left_in = keeps_left_incoming(c.b_enters, op);
            (if left_in { c.b_exit } else { c.a_exit }, left_in)
        })
        .collect();
    let cuts: Vec<Collision> = plan.iter().map(|&(c, _)| c).collect();
    store.migrate_island(right, dest)?;
    let mut splits = SplitCollection::new();
    slice_collision_info(store, &cuts, &mut splits, dest)?;

    // Step 4: splice every crossing
    let mut candidates = Vec::new();
    let mut joints = Vec::with_capacity(plan.len());
    for (collision, left_in) in plan {
        let (keep, drop) = if left_in {
            (collision.a, collision.b)
        } else {
            (collision.b, collision.a)
        };
        joints.push(splice(store, &splits, keep, drop, &mut candidates)?);
        tracing::trace!(left_in, "spliced crossing");
    }

    // Step 5: cleanup
    let removed = clip_loose_ends(store, &candidates)?;
    let node = joints.into_iter().find(|&id| store.contains_node(id));
    tracing::debug!(removed, survived = node.is_some(), "reflow complete");
    Ok(BooleanOutcome::new(BooleanStatus::Collision, node))
}

/// Loop that owns the node.
pub(super) fn owning_loop(store: &PathStore, node: NodeId) -> Result<LoopId> {
    store
        .node(node)?
        .parent
        .ok_or_else(|| OperationError::InvalidInput("island has no owning loop".into()).into())
}

/// Applies the whole-island outcome of two islands that never cross.
pub(super) fn resolve_containment(
    store: &mut PathStore,
    left: NodeId,
    right: NodeId,
    op: BooleanOp,
    status: BooleanStatus,
    dest: LoopId,
) -> Result<BooleanOutcome> {
    let action = containment_action(status, op);
    if !action.keep_left {
        store.remove_island(left)?;
    }
    if action.keep_right {
        store.migrate_island(right, dest)?;
    } else {
        store.remove_island(right)?;
    }
    let node = if action.keep_left {
        Some(left)
    } else if action.keep_right {
        Some(right)
    } else {
        None
    };
    tracing::debug!(?status, ?action, "resolved without splicing");
    Ok(BooleanOutcome::new(status, node))
}

/// Handles two islands tracing the same boundary.
///
/// Union and intersection keep the left copy; difference removes both.
pub(super) fn resolve_coincident(
    store: &mut PathStore,
    left: NodeId,
    right: NodeId,
    op: BooleanOp,
) -> Result<BooleanOutcome> {
    tracing::debug!(?op, "islands coincide");
    store.remove_island(right)?;
    match op {
        BooleanOp::Union | BooleanOp::Intersection => Ok(BooleanOutcome::new(
            BooleanStatus::LeftSurroundsRight,
            Some(left),
        )),
        BooleanOp::Difference => {
            store.remove_island(left)?;
            Ok(BooleanOutcome::new(BooleanStatus::RightSurroundsLeft, None))
        }
    }
}

/// Whether both closed islands run through the same segments, in either
/// direction and from any starting node.
pub(super) fn islands_coincide(
    store: &PathStore,
    left: NodeId,
    right: NodeId,
    tolerance: f64,
) -> Result<bool> {
    let a = island_curves(store, left)?;
    let b = island_curves(store, right)?;
    if a.len() != b.len() {
        return Ok(false);
    }
    let n = a.len();
    let same = |x: &CubicBez, y: &CubicBez| {
        [(x.p0, y.p0), (x.p1, y.p1), (x.p2, y.p2), (x.p3, y.p3)]
            .iter()
            .all(|(p, q)| (p - q).norm() <= tolerance)
    };
    for offset in 0..n {
        if (0..n).all(|i| same(&a[i], &b[(offset + i) % n])) {
            return Ok(true);
        }
        if (0..n).all(|i| same(&a[i], &reverse_curve(&b[(offset + n - i) % n]))) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn island_curves(store: &PathStore, start: NodeId) -> Result<Vec<CubicBez>> {
    store
        .closed_island(start)?
        .into_iter()
        .map(|id| Ok(store.segment(id)?.to_cubic()))
        .collect()
}

fn reverse_curve(c: &CubicBez) -> CubicBez {
    CubicBez::new(c.p3, c.p2, c.p1, c.p0)
}

fn has_duplicate_claims(collisions: &[Collision]) -> bool {
    let hits: Vec<SegmentHit> = collisions.iter().flat_map(|c| [c.a, c.b]).collect();
    hits.iter().enumerate().any(|(i, x)| {
        hits[i + 1..]
            .iter()
            .any(|y| x.node == y.node && (x.t - y.t).abs() < SAME_CLAIM)
    })
}

fn diced(splits: &SplitCollection, hit: SegmentHit) -> Result<NodeId> {
    splits
        .diced_node(hit.node, hit.t)
        .ok_or_else(|| OperationError::Failed("collision was not sliced".into()).into())
}

/// Routes the cut at `keep` into the outgoing side of the cut at `drop`,
/// returning the joint.
///
/// Neighbours are resolved through the cut ledger. The dropped cut and the
/// nodes that lose their link become loose-end candidates.
fn splice(
    store: &mut PathStore,
    splits: &SplitCollection,
    keep: SegmentHit,
    drop: SegmentHit,
    candidates: &mut Vec<NodeId>,
) -> Result<NodeId> {
    let joint = diced(splits, keep)?;
    let cut = diced(splits, drop)?;
    let unresolved = || OperationError::Failed("cut has no neighbour in the ledger".into());
    let drop_next = splits.get_next_to(drop.node, drop.t).ok_or_else(unresolved)?;
    let drop_prev = splits.get_previous_to(drop.node, drop.t).ok_or_else(unresolved)?;
    let keep_next = splits.get_next_to(keep.node, keep.t).ok_or_else(unresolved)?;
    candidates.extend([cut, keep_next, drop_prev]);
    store.node_mut(joint)?.tangent_out = store.node(cut)?.tangent_out;
    store.link(joint, drop_next)?;
    Ok(joint)
}
