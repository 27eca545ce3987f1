use std::collections::HashMap;
use std::f64::consts::TAU;

use crate::error::{OperationError, Result};
use crate::geometry::{Aabb2, Segment};
use crate::math::{Point2, Vector2};
use crate::topology::{NodeId, PathStore};

use super::classify::{boundary_distance, ON_BOUNDARY};
use super::collision::{Collision, SegmentHit};

/// Hits on the same node closer than this share a position.
const SAME_POSITION: f64 = 1e-12;
/// Largest side-test radius, as a fraction of the operands' extent.
const RADIUS_FRACTION: f64 = 1e-3;
/// Samples per segment while walking out to a radius.
const WALK_STEPS: u32 = 16;
/// Bisection steps refining the point found at a radius.
const REFINE_STEPS: u32 = 40;

/// A place where the two boundaries actually cross.
///
/// A contact is a single collision, or a run of collisions joined by
/// boundary pieces both islands share. The `a` chain is the left island,
/// the `b` chain the right one. When the chains run through a shared piece
/// in opposite directions they leave it at different ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    /// Collision at which the `a` chain leaves the contact.
    pub a_exit: Collision,
    /// Collision at which the `b` chain leaves the contact.
    pub b_exit: Collision,
    /// Whether the `a` chain continues into the `b` island.
    pub a_enters: bool,
    /// Whether the `b` chain continues into the `a` island.
    pub b_enters: bool,
}

/// Reduces cleaned collisions between two islands to the crossings
/// where their boundaries change sides.
///
/// Collisions are ordered along the left island. Consecutive ones whose
/// connecting piece lies on the right boundary form one contact. Each
/// contact is judged by where the right chain runs just before and just
/// after it, relative to the left chain. A contact whose ends fall on the
/// same side only touches and is dropped.
///
/// Collisions must carry their left hit in `a` and their right hit in `b`.
///
/// # Errors
///
/// Returns an error if either island is open or broken, or a collision
/// does not lie on the islands.
pub fn island_crossings(
    store: &PathStore,
    left: NodeId,
    right: NodeId,
    collisions: &[Collision],
) -> Result<Vec<Crossing>> {
    if collisions.is_empty() {
        return Ok(Vec::new());
    }
    let a = Chain::new(store, left)?;
    let b = Chain::new(store, right)?;

    let mut order = Vec::with_capacity(collisions.len());
    for (i, c) in collisions.iter().enumerate() {
        order.push((a.position(c.a)?, i));
    }
    order.sort_by(|x, y| x.0 .0.cmp(&y.0 .0).then(x.0 .1.total_cmp(&y.0 .1)));
    let order: Vec<usize> = order.into_iter().map(|(_, i)| i).collect();
    let n = order.len();

    // Pieces of the left chain between consecutive collisions that the
    // right chain runs along
    let mut shared = vec![false; n];
    if n > 1 {
        for j in 0..n {
            let from = collisions[order[j]].a;
            let to = collisions[order[(j + 1) % n]].a;
            shared[j] = if from.node == to.node && (from.t - to.t).abs() < SAME_POSITION {
                true
            } else {
                boundary_distance(store, &a.inner_point(from, to)?, right)? < ON_BOUNDARY
            };
        }
    }
    if shared.iter().all(|&s| s) {
        tracing::trace!(collisions = n, "boundaries coincide between all collisions");
        return Ok(Vec::new());
    }

    let points = collisions
        .iter()
        .map(|c| a.point(c.a))
        .collect::<Result<Vec<_>>>()?;
    let mut extent = a.extent();
    let other = b.extent();
    extent.include(&other.min);
    extent.include(&other.max);
    let base_radius = RADIUS_FRACTION * extent.width().max(extent.height());

    let context = Context {
        a: &a,
        b: &b,
        a_ccw: store.winding(left)? > 0.0,
        b_ccw: store.winding(right)? > 0.0,
    };
    let mut crossings = Vec::new();
    for j in 0..n {
        if shared[(j + n - 1) % n] {
            continue;
        }
        let mut members = vec![order[j]];
        let mut e = j;
        while shared[e] {
            e = (e + 1) % n;
            members.push(order[e]);
        }
        let entry = order[j];
        let exit = order[e];
        let mut radius = base_radius;
        for (i, p) in points.iter().enumerate() {
            if members.contains(&i) {
                continue;
            }
            for m in [entry, exit] {
                let d = (p - points[m]).norm();
                if d > 0.0 {
                    radius = radius.min(0.5 * d);
                }
            }
        }
        let next = members.get(1).map(|&i| collisions[i]);
        if let Some(crossing) =
            context.crossing(collisions[entry], collisions[exit], next, radius)?
        {
            crossings.push(crossing);
        }
    }
    tracing::trace!(
        collisions = n,
        crossings = crossings.len(),
        "reduced collisions to crossings"
    );
    Ok(crossings)
}

struct Context<'a> {
    a: &'a Chain,
    b: &'a Chain,
    a_ccw: bool,
    b_ccw: bool,
}

impl Context<'_> {
    /// Judges one contact entered by the left chain at `entry` and left at
    /// `exit`. `next` is the member after `entry` in a run.
    fn crossing(
        &self,
        entry: Collision,
        exit: Collision,
        next: Option<Collision>,
        radius: f64,
    ) -> Result<Option<Crossing>> {
        let same_direction = match next {
            None => true,
            Some(next) => {
                let gap = (self.a.point(next.a)? - self.a.point(entry.a)?).norm();
                let reach = radius.min(0.5 * gap);
                reach <= 0.0
                    || (self.b.walk(entry.b, true, reach)? - self.a.walk(entry.a, true, reach)?)
                        .norm()
                        < ON_BOUNDARY
            }
        };
        let (b_entry, b_exit) = if same_direction {
            (entry, exit)
        } else {
            (exit, entry)
        };

        let before = self.b.walk(b_entry.b, false, radius)?;
        let after = self.b.walk(b_exit.b, true, radius)?;
        let came_from_left = self.a.left_of(b_entry.a, &before, radius)?;
        let goes_left = self.a.left_of(b_exit.a, &after, radius)?;
        if came_from_left == goes_left {
            tracing::trace!(same_direction, "contact only touches");
            return Ok(None);
        }

        let a_after = self.a.walk(exit.a, true, radius)?;
        let a_goes_left = self.b.left_of(exit.b, &a_after, radius)?;
        Ok(Some(Crossing {
            a_exit: exit,
            b_exit,
            a_enters: a_goes_left == self.b_ccw,
            b_enters: goes_left == self.a_ccw,
        }))
    }
}

/// Segments of one closed island, indexed for walking along it.
struct Chain {
    index: HashMap<NodeId, usize>,
    segments: Vec<Segment>,
}

impl Chain {
    fn new(store: &PathStore, island: NodeId) -> Result<Self> {
        let nodes = store.closed_island(island)?;
        let segments = nodes
            .iter()
            .map(|&id| store.segment(id))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let index = nodes.into_iter().enumerate().map(|(i, id)| (id, i)).collect();
        Ok(Self { index, segments })
    }

    fn position(&self, hit: SegmentHit) -> Result<(usize, f64)> {
        self.index
            .get(&hit.node)
            .map(|&k| (k, hit.t))
            .ok_or_else(|| OperationError::InvalidInput("collision is not on the island".into()).into())
    }

    fn point(&self, hit: SegmentHit) -> Result<Point2> {
        let (k, t) = self.position(hit)?;
        Ok(self.segments[k].eval(t))
    }

    fn extent(&self) -> Aabb2 {
        let mut extent = Aabb2::from_points(&[]);
        for segment in &self.segments {
            let bounds = segment.bounds();
            extent.include(&bounds.min);
            extent.include(&bounds.max);
        }
        extent
    }

    /// First point along the chain from `hit` at `radius` from it.
    ///
    /// Walks forward or backward for at most one lap. A chain that never
    /// leaves the circle yields the last point sampled.
    fn walk(&self, hit: SegmentHit, forward: bool, radius: f64) -> Result<Point2> {
        let (mut k, mut t) = self.position(hit)?;
        let origin = self.segments[k].eval(t);
        let n = self.segments.len();
        let end = if forward { 1.0 } else { 0.0 };
        let mut last = origin;
        for _ in 0..=n {
            let segment = &self.segments[k];
            let mut inner = t;
            for i in 1..=WALK_STEPS {
                let u = t + (end - t) * f64::from(i) / f64::from(WALK_STEPS);
                let q = segment.eval(u);
                if (q - origin).norm() >= radius {
                    return Ok(refine(segment, &origin, radius, inner, u));
                }
                inner = u;
                last = q;
            }
            if forward {
                k = (k + 1) % n;
                t = 0.0;
            } else {
                k = (k + n - 1) % n;
                t = 1.0;
            }
        }
        Ok(last)
    }

    /// A point strictly inside the stretch of chain from `from` to `to`,
    /// taken from its longest parameter span.
    fn inner_point(&self, from: SegmentHit, to: SegmentHit) -> Result<Point2> {
        let (k1, t1) = self.position(from)?;
        let (k2, t2) = self.position(to)?;
        if k1 == k2 && t2 > t1 {
            return Ok(self.segments[k1].eval(0.5 * (t1 + t2)));
        }
        let n = self.segments.len();
        let mut best = (1.0 - t1, k1, t1, 1.0);
        let mut k = (k1 + 1) % n;
        while k != k2 {
            if best.0 < 1.0 {
                best = (1.0, k, 0.0, 1.0);
            }
            k = (k + 1) % n;
        }
        if t2 > best.0 {
            best = (t2, k2, 0.0, t2);
        }
        let (_, k, lo, hi) = best;
        Ok(self.segments[k].eval(0.5 * (lo + hi)))
    }

    /// Whether `point`, at `radius` from the chain's position `hit`, lies on
    /// the left of the chain as it passes through `hit`.
    ///
    /// The chain near `hit` is reduced to the two points where it crosses
    /// the circle of `radius`. The left side is the sector swept
    /// counter-clockwise from the outgoing point to the incoming one.
    fn left_of(&self, hit: SegmentHit, point: &Point2, radius: f64) -> Result<bool> {
        let origin = self.point(hit)?;
        let before = self.walk(hit, false, radius)? - origin;
        let after = self.walk(hit, true, radius)? - origin;
        let sweep = |v: &Vector2| {
            let angle = after.perp(v).atan2(after.dot(v));
            if angle > 0.0 {
                angle
            } else {
                angle + TAU
            }
        };
        Ok(sweep(&(point - origin)) < sweep(&before))
    }
}

fn refine(segment: &Segment, origin: &Point2, radius: f64, inner: f64, outer: f64) -> Point2 {
    let (mut lo, mut hi) = (inner, outer);
    for _ in 0..REFINE_STEPS {
        let mid = 0.5 * (lo + hi);
        if (segment.eval(mid) - origin).norm() >= radius {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    segment.eval(hi)
}
