use std::collections::VecDeque;

use crate::error::Result;
use crate::topology::{NodeId, PathStore};

/// Removes nodes left dangling by a splice.
///
/// A node is garbage when either neighbour is missing or does not link back
/// to it. Each garbage node clears the links that still point at it, is
/// removed from its loop and the store, and its former neighbours are
/// re-examined. Returns the number of removed nodes.
///
/// # Errors
///
/// Returns an error if the store rejects a removal.
pub fn clip_loose_ends(store: &mut PathStore, candidates: &[NodeId]) -> Result<usize> {
    let mut queue: VecDeque<NodeId> = candidates.iter().copied().collect();
    let mut removed = 0;
    while let Some(id) = queue.pop_front() {
        if !store.contains_node(id) || is_healthy(store, id) {
            continue;
        }
        let (prev, next) = {
            let node = store.node(id)?;
            (node.prev, node.next)
        };
        if let Some(prev) = prev.filter(|&p| store.contains_node(p)) {
            let neighbour = store.node_mut(prev)?;
            if neighbour.next == Some(id) {
                neighbour.next = None;
            }
            queue.push_back(prev);
        }
        if let Some(next) = next.filter(|&n| store.contains_node(n)) {
            let neighbour = store.node_mut(next)?;
            if neighbour.prev == Some(id) {
                neighbour.prev = None;
            }
            queue.push_back(next);
        }
        store.remove_node(id)?;
        removed += 1;
    }
    if removed > 0 {
        tracing::trace!(removed, "clipped loose ends");
    }
    Ok(removed)
}

fn is_healthy(store: &PathStore, id: NodeId) -> bool {
    let Ok(node) = store.node(id) else {
        return false;
    };
    let prev_ok = node
        .prev
        .and_then(|p| store.node(p).ok())
        .is_some_and(|p| p.next == Some(id));
    let next_ok = node
        .next
        .and_then(|n| store.node(n).ok())
        .is_some_and(|n| n.prev == Some(id));
    prev_ok && next_ok
}
