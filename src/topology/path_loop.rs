use super::node::NodeId;

slotmap::new_key_type! {
    /// Unique identifier for a loop in the path store.
    pub struct LoopId;
}

/// An owned collection of nodes, possibly holding several islands.
#[derive(Debug, Clone, Default)]
pub struct LoopData {
    /// Owned nodes in insertion order.
    pub nodes: Vec<NodeId>,
}
