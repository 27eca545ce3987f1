use super::BooleanStatus;

/// The type of boolean operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Difference,
    Intersection,
}

/// Which operand a node came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IslandSource {
    Left,
    Right,
}

/// What to do with the operands when their boundaries never cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainmentAction {
    pub keep_left: bool,
    pub keep_right: bool,
}

impl ContainmentAction {
    const fn new(keep_left: bool, keep_right: bool) -> Self {
        Self {
            keep_left,
            keep_right,
        }
    }
}

/// Decides which whole islands survive when no splice is possible.
///
/// | Relation           | Union        | Difference            | Intersection |
/// |--------------------|--------------|-----------------------|--------------|
/// | disjoint           | keep both    | drop right            | drop both    |
/// | left surrounds     | drop right   | keep both (cavity)    | drop left    |
/// | right surrounds    | drop left    | drop both             | drop right   |
#[allow(clippy::match_same_arms)]
#[must_use]
pub fn containment_action(status: BooleanStatus, op: BooleanOp) -> ContainmentAction {
    match (status, op) {
        (BooleanStatus::LeftSurroundsRight, BooleanOp::Union) => ContainmentAction::new(true, false),
        (BooleanStatus::LeftSurroundsRight, BooleanOp::Difference) => {
            ContainmentAction::new(true, true)
        }
        (BooleanStatus::LeftSurroundsRight, BooleanOp::Intersection) => {
            ContainmentAction::new(false, true)
        }

        (BooleanStatus::RightSurroundsLeft, BooleanOp::Union) => ContainmentAction::new(false, true),
        (BooleanStatus::RightSurroundsLeft, BooleanOp::Difference) => {
            ContainmentAction::new(false, false)
        }
        (BooleanStatus::RightSurroundsLeft, BooleanOp::Intersection) => {
            ContainmentAction::new(true, false)
        }

        (_, BooleanOp::Union) => ContainmentAction::new(true, true),
        (_, BooleanOp::Difference) => ContainmentAction::new(true, false),
        (_, BooleanOp::Intersection) => ContainmentAction::new(false, false),
    }
}

/// Whether the right island must be reversed so that both operands have
/// the orientation the operation expects.
///
/// Union and intersection need matching windings; difference needs
/// opposite ones.
#[must_use]
pub fn needs_reversal(left_winding: f64, right_winding: f64, op: BooleanOp) -> bool {
    let same = (left_winding > 0.0) == (right_winding > 0.0);
    let want_same = op != BooleanOp::Difference;
    same != want_same
}

/// Whether a reflow splice keeps the left cut's incoming side.
///
/// `right_enters` tells whether the right chain continues into the left
/// island past the crossing.
#[must_use]
pub fn keeps_left_incoming(right_enters: bool, op: BooleanOp) -> bool {
    match op {
        BooleanOp::Union => !right_enters,
        BooleanOp::Difference | BooleanOp::Intersection => right_enters,
    }
}

/// What a trace walk knows when it reaches a junction.
#[derive(Debug, Clone, Copy)]
pub struct JunctionView {
    /// Operand of the chain being walked.
    pub current: IslandSource,
    /// Whether the current chain continues into the other island.
    pub heads_inside: bool,
}

fn trace_union(view: &JunctionView) -> bool {
    !view.heads_inside
}

fn trace_intersection(view: &JunctionView) -> bool {
    view.heads_inside
}

fn trace_difference(view: &JunctionView) -> bool {
    match view.current {
        IslandSource::Left => !view.heads_inside,
        IslandSource::Right => view.heads_inside,
    }
}

impl BooleanOp {
    /// Junction decision for the trace walk: `true` keeps walking the
    /// current chain, `false` jumps to the other one.
    #[must_use]
    pub fn trace_decision(self) -> fn(&JunctionView) -> bool {
        match self {
            BooleanOp::Union => trace_union,
            BooleanOp::Difference => trace_difference,
            BooleanOp::Intersection => trace_intersection,
        }
    }
}
