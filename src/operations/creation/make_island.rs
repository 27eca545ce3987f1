use crate::error::{OperationError, Result};
use crate::math::{Point2, Vector2};
use crate::topology::{LoopId, NodeData, NodeId, PathStore};

/// One anchor of an island under construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IslandVertex {
    pub position: Point2,
    pub tangent_in: Option<Vector2>,
    pub tangent_out: Option<Vector2>,
}

impl IslandVertex {
    /// A corner with straight segments on both sides.
    #[must_use]
    pub fn corner(position: Point2) -> Self {
        Self {
            position,
            tangent_in: None,
            tangent_out: None,
        }
    }

    /// An anchor with curve handles, given relative to `position`.
    #[must_use]
    pub fn smooth(position: Point2, tangent_in: Vector2, tangent_out: Vector2) -> Self {
        Self {
            position,
            tangent_in: Some(tangent_in),
            tangent_out: Some(tangent_out),
        }
    }
}

/// Creates an island from a sequence of anchors.
pub struct MakeIsland {
    dest: LoopId,
    vertices: Vec<IslandVertex>,
    close: bool,
}

impl MakeIsland {
    /// Creates a new `MakeIsland` operation.
    #[must_use]
    pub fn new(dest: LoopId, vertices: Vec<IslandVertex>, close: bool) -> Self {
        Self {
            dest,
            vertices,
            close,
        }
    }

    /// Executes the operation, returning the first node of the island.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than two anchors are given or the loop is
    /// missing.
    pub fn execute(&self, store: &mut PathStore) -> Result<NodeId> {
        if self.vertices.len() < 2 {
            return Err(OperationError::InvalidInput(format!(
                "island needs at least 2 anchors, got {}",
                self.vertices.len()
            ))
            .into());
        }
        let mut ids = Vec::with_capacity(self.vertices.len());
        for v in &self.vertices {
            let data = NodeData::new(v.position).with_tangents(v.tangent_in, v.tangent_out);
            ids.push(store.add_node(self.dest, data)?);
        }
        for pair in ids.windows(2) {
            store.link(pair[0], pair[1])?;
        }
        if self.close {
            store.link(ids[ids.len() - 1], ids[0])?;
        }
        Ok(ids[0])
    }
}
