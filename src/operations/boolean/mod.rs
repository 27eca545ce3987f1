mod classify;
mod cleanup;
mod collision;
mod contact;
mod engine;
mod intersect_op;
mod select;
mod split;
mod subtract;
mod trace;
mod union;

pub use classify::{boundary_distance, classify_islands, point_in_island, ray_crossings};
pub use cleanup::clip_loose_ends;
pub use collision::{island_collisions, segment_collisions, Collision, SegmentHit};
pub use contact::{island_crossings, Crossing};
pub use engine::reflow_execute;
pub use intersect_op::{Intersection, TraceIntersection};
pub use select::{BooleanOp, IslandSource, JunctionView};
pub use split::{slice_collision_info, SplitCollection, SplitEntry, SplitInfo, SplitLookup};
pub use subtract::{Difference, TraceDifference};
pub use trace::{gather_trace_data, trace_execute, TraceData, TraceStop};
pub use union::{TraceUnion, Union};

use crate::topology::NodeId;

/// Numeric parameters shared by the boolean operations.
#[derive(Debug, Clone, Copy)]
pub struct BooleanParams {
    /// Maximum bisection depth of the intersection sampler.
    pub max_depth: u32,
    /// Bounding-box padding and flatness tolerance of the sampler.
    pub tolerance: f64,
    /// Parameters within this distance of 0 or 1 are snapped to the vertex.
    pub edge_tolerance: f64,
    /// Hits on the same node pair closer than this are coalesced.
    pub duplicate_tolerance: f64,
}

impl Default for BooleanParams {
    fn default() -> Self {
        Self {
            max_depth: 20,
            tolerance: 1e-9,
            edge_tolerance: 1e-6,
            duplicate_tolerance: 1e-5,
        }
    }
}

/// How a boolean operation resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanStatus {
    /// The islands neither touch nor contain each other, or nothing was done.
    NoCollision,
    /// The boundaries crossed and were spliced.
    Collision,
    /// The left island encloses the right one.
    LeftSurroundsRight,
    /// The right island encloses the left one.
    RightSurroundsLeft,
    /// The split data contradicts itself; topology was left as is.
    Degenerate,
}

/// Result of a boolean operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BooleanOutcome {
    pub status: BooleanStatus,
    /// A node on the resulting geometry, `None` when nothing survives or
    /// nothing changed.
    pub node: Option<NodeId>,
}

impl BooleanOutcome {
    #[must_use]
    pub fn new(status: BooleanStatus, node: Option<NodeId>) -> Self {
        Self { status, node }
    }

    /// An outcome that left the inputs untouched.
    #[must_use]
    pub fn unchanged(status: BooleanStatus) -> Self {
        Self { status, node: None }
    }
}
