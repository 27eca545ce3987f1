use crate::error::Result;
use crate::topology::{NodeId, PathStore};

use super::engine::{owning_loop, reflow_execute};
use super::select::BooleanOp;
use super::trace::trace_execute;
use super::{BooleanOutcome, BooleanParams};

/// Computes the intersection of two islands by splicing.
pub struct Intersection {
    left: NodeId,
    right: NodeId,
    remove_right: bool,
    params: BooleanParams,
}

impl Intersection {
    /// Creates a new `Intersection` operation.
    ///
    /// With `remove_right` unset, the operation works on a copy of the right
    /// island and the original stays in place.
    #[must_use]
    pub fn new(left: NodeId, right: NodeId, remove_right: bool) -> Self {
        Self {
            left,
            right,
            remove_right,
            params: BooleanParams::default(),
        }
    }

    /// Sets custom sampling parameters.
    #[must_use]
    pub fn with_params(mut self, params: BooleanParams) -> Self {
        self.params = params;
        self
    }

    /// Executes the intersection in the left island's loop.
    ///
    /// # Errors
    ///
    /// Returns an error if either island is open or broken.
    pub fn execute(&self, store: &mut PathStore) -> Result<BooleanOutcome> {
        let right = operand(store, self.right, self.remove_right)?;
        reflow_execute(store, self.left, right, BooleanOp::Intersection, &self.params)
    }
}

/// Computes the intersection of two islands by tracing a new outline.
pub struct TraceIntersection {
    left: NodeId,
    right: NodeId,
    remove_right: bool,
    params: BooleanParams,
    keep_inputs: bool,
}

impl TraceIntersection {
    /// Creates a new `TraceIntersection` operation.
    #[must_use]
    pub fn new(left: NodeId, right: NodeId, remove_right: bool) -> Self {
        Self {
            left,
            right,
            remove_right,
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

    /// Executes the intersection, emitting the result into the left island's loop.
    ///
    /// # Errors
    ///
    /// Returns an error if either island is open or broken, or a walk does
    /// not close.
    pub fn execute(&self, store: &mut PathStore) -> Result<BooleanOutcome> {
        let right = operand(store, self.right, self.remove_right)?;
        trace_execute(
            store,
            self.left,
            right,
            BooleanOp::Intersection,
            &self.params,
            self.keep_inputs,
        )
    }
}

/// Returns the island the operation may consume.
fn operand(store: &mut PathStore, right: NodeId, remove_right: bool) -> Result<NodeId> {
    if remove_right {
        return Ok(right);
    }
    let home = owning_loop(store, right)?;
    Ok(store.clone_island(right, home)?)
}
