pub mod island;
pub mod node;
pub mod path_loop;

pub use island::ExtremalPoint;
pub use node::{NodeData, NodeId};
pub use path_loop::{LoopData, LoopId};

use crate::error::TopologyError;
use slotmap::SlotMap;

/// Central arena that owns all nodes and loops.
///
/// Nodes reference each other and their loop via typed IDs (generational
/// indices), so the cyclic `prev`/`next`/`parent` graph needs no
/// self-referential structures.
#[derive(Debug, Default)]
pub struct PathStore {
    nodes: SlotMap<NodeId, NodeData>,
    loops: SlotMap<LoopId, LoopData>,
}

impl PathStore {
    /// Creates a new, empty path store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Loop operations ---

    /// Inserts an empty loop and returns its ID.
    pub fn add_loop(&mut self) -> LoopId {
        self.loops.insert(LoopData::default())
    }

    /// Returns a reference to the loop data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn loop_data(&self, id: LoopId) -> Result<&LoopData, TopologyError> {
        self.loops
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("loop".into()))
    }

    /// Whether the loop exists.
    #[must_use]
    pub fn contains_loop(&self, id: LoopId) -> bool {
        self.loops.contains_key(id)
    }

    /// Removes every node owned by the loop, keeping the loop itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the loop is not found.
    pub fn clear_loop(&mut self, id: LoopId) -> Result<(), TopologyError> {
        let owned = std::mem::take(
            &mut self
                .loops
                .get_mut(id)
                .ok_or_else(|| TopologyError::EntityNotFound("loop".into()))?
                .nodes,
        );
        for node in owned {
            self.nodes.remove(node);
        }
        Ok(())
    }

    /// Removes the loop and every node it owns.
    ///
    /// # Errors
    ///
    /// Returns an error if the loop is not found.
    pub fn remove_loop(&mut self, id: LoopId) -> Result<(), TopologyError> {
        self.clear_loop(id)?;
        self.loops.remove(id);
        Ok(())
    }

    /// Number of loops in the store.
    #[must_use]
    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    // --- Node operations ---

    /// Inserts a node owned by `parent` and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the loop is not found.
    pub fn add_node(&mut self, parent: LoopId, mut data: NodeData) -> Result<NodeId, TopologyError> {
        if !self.loops.contains_key(parent) {
            return Err(TopologyError::EntityNotFound("loop".into()));
        }
        data.parent = Some(parent);
        let id = self.nodes.insert(data);
        if let Some(owner) = self.loops.get_mut(parent) {
            owner.nodes.push(id);
        }
        Ok(id)
    }

    /// Returns a reference to the node data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn node(&self, id: NodeId) -> Result<&NodeData, TopologyError> {
        self.nodes
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("node".into()))
    }

    /// Returns a mutable reference to the node data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, TopologyError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("node".into()))
    }

    /// Whether the node exists.
    #[must_use]
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes in the store.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Moves a node into another loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the node or the loop is not found.
    pub fn set_parent(&mut self, id: NodeId, parent: LoopId) -> Result<(), TopologyError> {
        if !self.loops.contains_key(parent) {
            return Err(TopologyError::EntityNotFound("loop".into()));
        }
        let node = self.node_mut(id)?;
        let old = node.parent.replace(parent);
        if old == Some(parent) {
            return Ok(());
        }
        if let Some(owner) = old.and_then(|old| self.loops.get_mut(old)) {
            owner.nodes.retain(|&n| n != id);
        }
        if let Some(owner) = self.loops.get_mut(parent) {
            owner.nodes.push(id);
        }
        Ok(())
    }

    /// Removes a node from its loop and the arena.
    ///
    /// Links held by former neighbours are left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not found.
    pub fn remove_node(&mut self, id: NodeId) -> Result<NodeData, TopologyError> {
        let data = self
            .nodes
            .remove(id)
            .ok_or_else(|| TopologyError::EntityNotFound("node".into()))?;
        if let Some(owner) = data.parent.and_then(|p| self.loops.get_mut(p)) {
            owner.nodes.retain(|&n| n != id);
        }
        Ok(data)
    }

    /// Links `from.next = to` and `to.prev = from`.
    ///
    /// # Errors
    ///
    /// Returns an error if either node is not found.
    pub fn link(&mut self, from: NodeId, to: NodeId) -> Result<(), TopologyError> {
        if !self.nodes.contains_key(to) {
            return Err(TopologyError::EntityNotFound("node".into()));
        }
        self.node_mut(from)?.next = Some(to);
        self.node_mut(to)?.prev = Some(from);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;

    fn corner(x: f64, y: f64) -> NodeData {
        NodeData::new(Point2::new(x, y))
    }

    #[test]
    fn add_node_records_parent() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let n = store.add_node(lp, corner(1.0, 2.0)).unwrap();
        assert_eq!(store.node(n).unwrap().parent, Some(lp));
        assert_eq!(store.loop_data(lp).unwrap().nodes, vec![n]);
    }

    #[test]
    fn set_parent_moves_between_loops() {
        let mut store = PathStore::new();
        let a = store.add_loop();
        let b = store.add_loop();
        let n = store.add_node(a, corner(0.0, 0.0)).unwrap();
        store.set_parent(n, b).unwrap();
        assert!(store.loop_data(a).unwrap().nodes.is_empty());
        assert_eq!(store.loop_data(b).unwrap().nodes, vec![n]);
        assert_eq!(store.node(n).unwrap().parent, Some(b));
    }

    #[test]
    fn remove_node_detaches_from_loop() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let a = store.add_node(lp, corner(0.0, 0.0)).unwrap();
        let b = store.add_node(lp, corner(1.0, 0.0)).unwrap();
        store.link(a, b).unwrap();
        store.remove_node(b).unwrap();
        assert!(!store.contains_node(b));
        assert_eq!(store.loop_data(lp).unwrap().nodes, vec![a]);
        // Neighbour links are not rewritten.
        assert_eq!(store.node(a).unwrap().next, Some(b));
    }

    #[test]
    fn remove_loop_drops_owned_nodes() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        store.add_node(lp, corner(0.0, 0.0)).unwrap();
        store.add_node(lp, corner(1.0, 0.0)).unwrap();
        store.remove_loop(lp).unwrap();
        assert_eq!(store.node_count(), 0);
        assert!(store.loop_data(lp).is_err());
    }

    #[test]
    fn missing_entities_are_errors() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let n = store.add_node(lp, corner(0.0, 0.0)).unwrap();
        store.remove_node(n).unwrap();
        assert!(store.node(n).is_err());
        assert!(store.link(n, n).is_err());
        store.remove_loop(lp).unwrap();
        assert!(store.add_node(lp, corner(0.0, 0.0)).is_err());
    }
}
