use crate::math::{Point2, Vector2};

use super::path_loop::LoopId;

slotmap::new_key_type! {
    /// Unique identifier for a node in the path store.
    pub struct NodeId;
}

/// One anchor point of a path.
///
/// Tangents are offsets relative to `position`; `None` means the tangent is
/// unused and the adjoining segment is straight on that side.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub position: Point2,
    pub tangent_in: Option<Vector2>,
    pub tangent_out: Option<Vector2>,
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
    /// Loop that owns this node.
    pub parent: Option<LoopId>,
}

impl NodeData {
    /// Creates an unlinked corner node at the given position.
    #[must_use]
    pub fn new(position: Point2) -> Self {
        Self {
            position,
            tangent_in: None,
            tangent_out: None,
            prev: None,
            next: None,
            parent: None,
        }
    }

    /// Sets both tangents.
    #[must_use]
    pub fn with_tangents(mut self, tangent_in: Option<Vector2>, tangent_out: Option<Vector2>) -> Self {
        self.tangent_in = tangent_in;
        self.tangent_out = tangent_out;
        self
    }
}
