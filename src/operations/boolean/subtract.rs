use crate::error::Result;
use crate::topology::{NodeId, PathStore};

use super::engine::reflow_execute;
use super::select::BooleanOp;
use super::trace::trace_execute;
use super::{BooleanOutcome, BooleanParams};

/// Computes the difference of two islands (left minus right) by splicing.
pub struct Difference {
    left: NodeId,
    right: NodeId,
    params: BooleanParams,
}

impl Difference {
    /// Creates a new `Difference` operation (left - right).
    #[must_use]
    pub fn new(left: NodeId, right: NodeId) -> Self {
        Self {
            left,
            right,
            params: BooleanParams::default(),
        }
    }

    /// Sets custom sampling parameters.
    #[must_use]
    pub fn with_params(mut self, params: BooleanParams) -> Self {
        self.params = params;
        self
    }

    /// Executes the subtraction in the left island's loop.
    ///
    /// The right island is consumed. When the right island lies inside the
    /// left one it becomes a hole of the result.
    ///
    /// # Errors
    ///
    /// Returns an error if either island is open or broken.
    pub fn execute(&self, store: &mut PathStore) -> Result<BooleanOutcome> {
        reflow_execute(store, self.left, self.right, BooleanOp::Difference, &self.params)
    }
}

/// Computes the difference of two islands by tracing a new outline.
pub struct TraceDifference {
    left: NodeId,
    right: NodeId,
    params: BooleanParams,
    keep_inputs: bool,
}

impl TraceDifference {
    /// Creates a new `TraceDifference` operation (left - right).
    #[must_use]
    pub fn new(left: NodeId, right: NodeId) -> Self {
        Self {
            left,
            right,
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

    /// Executes the subtraction, emitting the result into the left island's loop.
    ///
    /// # Errors
    ///
    /// Returns an error if either island is open or broken, or a walk does
    /// not close.
    pub fn execute(&self, store: &mut PathStore) -> Result<BooleanOutcome> {
        trace_execute(
            store,
            self.left,
            self.right,
            BooleanOp::Difference,
            &self.params,
            self.keep_inputs,
        )
    }
}
