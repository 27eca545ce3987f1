use crate::error::{Result, TopologyError};
use crate::geometry::{CubicBez, Segment};
use crate::math::intersect_2d::segment_segment_intersect_2d;
use crate::topology::{NodeId, PathStore};

use super::BooleanParams;

/// Chord parameters may overshoot `[0, 1]` by this much at a leaf.
const CHORD_SLACK: f64 = 1e-7;

/// A parametric position on the segment that starts at `node`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    pub node: NodeId,
    pub t: f64,
}

impl SegmentHit {
    #[must_use]
    pub fn new(node: NodeId, t: f64) -> Self {
        Self { node, t }
    }
}

/// A crossing between two segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    pub a: SegmentHit,
    pub b: SegmentHit,
}

impl Collision {
    #[must_use]
    pub fn new(a: SegmentHit, b: SegmentHit) -> Self {
        Self { a, b }
    }

    /// The same crossing seen from the other segment.
    #[must_use]
    pub fn reciprocal(&self) -> Self {
        Self {
            a: self.b,
            b: self.a,
        }
    }
}

/// Approximate crossings between two segments as `(t_a, t_b)` pairs.
///
/// Both segments are bisected recursively while their control-hull boxes
/// overlap. At the depth limit, or once both pieces are flat, the chords of
/// the pieces are intersected and mapped back to the full parameter range.
/// Parallel chords report nothing, so colinear overlaps yield no samples.
#[must_use]
pub fn segment_collisions(a: &Segment, b: &Segment, params: &BooleanParams) -> Vec<(f64, f64)> {
    let mut hits = Vec::new();
    bisect(
        &a.to_cubic(),
        (0.0, 1.0),
        &b.to_cubic(),
        (0.0, 1.0),
        0,
        params,
        &mut hits,
    );
    hits
}

fn bisect(
    a: &CubicBez,
    a_range: (f64, f64),
    b: &CubicBez,
    b_range: (f64, f64),
    depth: u32,
    params: &BooleanParams,
    hits: &mut Vec<(f64, f64)>,
) {
    if !a.hull_box().overlaps(&b.hull_box(), params.tolerance) {
        return;
    }
    if depth >= params.max_depth || (a.is_flat(params.tolerance) && b.is_flat(params.tolerance)) {
        if let Some((s, u)) = segment_segment_intersect_2d(&a.p0, &a.p3, &b.p0, &b.p3, CHORD_SLACK) {
            hits.push((
                a_range.0 + (a_range.1 - a_range.0) * s,
                b_range.0 + (b_range.1 - b_range.0) * u,
            ));
        }
        return;
    }

    let (a0, a1) = a.subdivide(0.5);
    let (b0, b1) = b.subdivide(0.5);
    let a_mid = (a_range.0 + a_range.1) * 0.5;
    let b_mid = (b_range.0 + b_range.1) * 0.5;
    let a_halves = [(a0, (a_range.0, a_mid)), (a1, (a_mid, a_range.1))];
    let b_halves = [(b0, (b_range.0, b_mid)), (b1, (b_mid, b_range.1))];
    for (ac, ar) in &a_halves {
        for (bc, br) in &b_halves {
            bisect(ac, *ar, bc, *br, depth + 1, params, hits);
        }
    }
}

/// Collisions between every segment of island `a` and every segment of
/// island `b`, cleaned with [`clean_collisions`].
///
/// # Errors
///
/// Returns an error if either island is open or broken.
pub fn island_collisions(
    store: &PathStore,
    a: NodeId,
    b: NodeId,
    params: &BooleanParams,
) -> Result<Vec<Collision>> {
    let nodes_a = store.closed_island(a)?;
    let nodes_b = store.closed_island(b)?;
    let segments_b = nodes_b
        .iter()
        .map(|&id| store.segment(id).map(|s| (id, s)))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut raw = Vec::new();
    for &na in &nodes_a {
        let seg_a = store.segment(na)?;
        for (nb, seg_b) in &segments_b {
            for (ta, tb) in segment_collisions(&seg_a, seg_b, params) {
                raw.push(Collision::new(SegmentHit::new(na, ta), SegmentHit::new(*nb, tb)));
            }
        }
    }
    clean_collisions(store, raw, params)
}

/// Normalises raw sampler output.
///
/// Drops hits at the vertex two neighbouring segments share, moves hits at
/// `t ≈ 1` onto the successor's `t = 0`, snaps `t ≈ 0` to exactly zero and
/// coalesces duplicates on the same node pair.
///
/// # Errors
///
/// Returns an error if a referenced node or its successor is missing.
pub fn clean_collisions(
    store: &PathStore,
    raw: Vec<Collision>,
    params: &BooleanParams,
) -> Result<Vec<Collision>> {
    let edge = params.edge_tolerance;
    let mut clean: Vec<Collision> = Vec::with_capacity(raw.len());
    for collision in raw {
        let node_a = store.node(collision.a.node)?;
        let (ta, tb) = (collision.a.t, collision.b.t);
        let shared_end = node_a.next == Some(collision.b.node) && ta > 1.0 - edge && tb < edge;
        let shared_start = node_a.prev == Some(collision.b.node) && ta < edge && tb > 1.0 - edge;
        if shared_end || shared_start {
            continue;
        }
        let a = snap_hit(store, collision.a, edge)?;
        let b = snap_hit(store, collision.b, edge)?;
        let duplicate = clean.iter().any(|c| {
            c.a.node == a.node
                && c.b.node == b.node
                && (c.a.t - a.t).abs() < params.duplicate_tolerance
                && (c.b.t - b.t).abs() < params.duplicate_tolerance
        });
        if !duplicate {
            clean.push(Collision::new(a, b));
        }
    }
    Ok(clean)
}

fn snap_hit(store: &PathStore, hit: SegmentHit, edge: f64) -> Result<SegmentHit> {
    if hit.t > 1.0 - edge {
        let next = store
            .node(hit.node)?
            .next
            .ok_or_else(|| TopologyError::InvalidTopology("node has no successor".into()))?;
        return Ok(SegmentHit::new(next, 0.0));
    }
    if hit.t < edge {
        return Ok(SegmentHit::new(hit.node, 0.0));
    }
    Ok(hit)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use crate::topology::{LoopId, NodeData};
    use approx::assert_relative_eq;

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> Segment {
        Segment::Line {
            start: Point2::new(x0, y0),
            end: Point2::new(x1, y1),
        }
    }

    fn polygon(store: &mut PathStore, lp: LoopId, points: &[(f64, f64)]) -> NodeId {
        let ids: Vec<NodeId> = points
            .iter()
            .map(|&(x, y)| store.add_node(lp, NodeData::new(Point2::new(x, y))).unwrap())
            .collect();
        for (i, &id) in ids.iter().enumerate() {
            store.link(id, ids[(i + 1) % ids.len()]).unwrap();
        }
        ids[0]
    }

    #[test]
    fn crossing_lines() {
        let hits = segment_collisions(
            &line(0.0, 0.0, 4.0, 4.0),
            &line(0.0, 4.0, 4.0, 0.0),
            &BooleanParams::default(),
        );
        assert!(!hits.is_empty());
        for (ta, tb) in hits {
            assert_relative_eq!(ta, 0.5, epsilon = 1e-7);
            assert_relative_eq!(tb, 0.5, epsilon = 1e-7);
        }
    }

    #[test]
    fn parallel_lines_do_not_collide() {
        let hits = segment_collisions(
            &line(0.0, 0.0, 4.0, 0.0),
            &line(1.0, 0.0, 3.0, 0.0),
            &BooleanParams::default(),
        );
        assert!(hits.is_empty());
    }

    #[test]
    fn curve_crosses_line_twice() {
        let arch = Segment::Cubic(CubicBez::new(
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 2.0),
            Point2::new(4.0, 2.0),
            Point2::new(4.0, 0.0),
        ));
        let params = BooleanParams::default();
        let hits = segment_collisions(&arch, &line(-1.0, 1.0, 5.0, 1.0), &params);
        let mut ts: Vec<f64> = hits.iter().map(|h| h.0).collect();
        ts.sort_by(f64::total_cmp);
        ts.dedup_by(|a, b| (*a - *b).abs() < params.duplicate_tolerance);
        assert_eq!(ts.len(), 2);
        for t in ts {
            assert_relative_eq!(arch.eval(t).y, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn reciprocal_swaps_sides() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let a = store.add_node(lp, NodeData::new(Point2::origin())).unwrap();
        let b = store.add_node(lp, NodeData::new(Point2::origin())).unwrap();
        let c = Collision::new(SegmentHit::new(a, 0.25), SegmentHit::new(b, 0.75));
        let r = c.reciprocal();
        assert_eq!(r.a, c.b);
        assert_eq!(r.b, c.a);
        assert_eq!(r.reciprocal(), c);
    }

    #[test]
    fn overlapping_squares_collide_twice() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let a = polygon(&mut store, lp, &[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
        let b = polygon(&mut store, lp, &[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]);
        let hits = island_collisions(&store, a, b, &BooleanParams::default()).unwrap();
        assert_eq!(hits.len(), 2);
        for hit in hits {
            assert_relative_eq!(hit.a.t, 0.5, epsilon = 1e-7);
            assert_relative_eq!(hit.b.t, 0.5, epsilon = 1e-7);
        }
    }

    #[test]
    fn vertex_hits_snap_to_successor() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        // The right square's corner (2, 1) lies on the left square's edge.
        let a = polygon(&mut store, lp, &[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
        let b = polygon(&mut store, lp, &[(2.0, 1.0), (4.0, 1.0), (4.0, 3.0), (2.0, 3.0)]);
        let hits = island_collisions(&store, a, b, &BooleanParams::default()).unwrap();
        assert!(!hits.is_empty());
        for hit in &hits {
            assert!(hit.b.t == 0.0 || hit.b.t > 1e-6);
            assert!(hit.b.t < 1.0 - 1e-6);
        }
        assert!(hits.iter().any(|h| h.b.node == b && h.b.t == 0.0));
    }

    #[test]
    fn neighbour_endpoints_are_not_collisions() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let a = polygon(&mut store, lp, &[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0)]);
        let next = store.node(a).unwrap().next.unwrap();
        let raw = vec![Collision::new(SegmentHit::new(a, 1.0), SegmentHit::new(next, 0.0))];
        let clean = clean_collisions(&store, raw, &BooleanParams::default()).unwrap();
        assert!(clean.is_empty());
    }

    #[test]
    fn duplicates_coalesce() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let a = polygon(&mut store, lp, &[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0)]);
        let b = polygon(&mut store, lp, &[(5.0, 0.0), (6.0, 0.0), (6.0, 2.0)]);
        let raw = vec![
            Collision::new(SegmentHit::new(a, 0.5), SegmentHit::new(b, 0.5)),
            Collision::new(SegmentHit::new(a, 0.500_000_1), SegmentHit::new(b, 0.499_999_9)),
        ];
        let clean = clean_collisions(&store, raw, &BooleanParams::default()).unwrap();
        assert_eq!(clean.len(), 1);
    }
}
