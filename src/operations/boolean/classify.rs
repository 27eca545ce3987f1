use crate::error::Result;
use crate::geometry::{Axis, Segment};
use crate::math::{side_of, Point2};
use crate::topology::{NodeId, PathStore};

use super::BooleanStatus;

/// Transverse distances within this of the ray count as on the ray.
const RAY_EPSILON: f64 = 1e-9;
/// Parameter offset for sampling both sides of an interior root.
const TANGENCY_OFFSET: f64 = 1e-6;

/// Points closer than this to a boundary are treated as lying on it.
pub const ON_BOUNDARY: f64 = 1e-7;
/// Parameters sampled on every segment when looking for a test point.
const SAMPLE_PARAMS: [f64; 3] = [0.5, 0.25, 0.75];

/// Classifies two closed islands whose boundaries do not cross.
///
/// Each island is tested against the other with a ray along +x from a
/// point of its boundary. The island's furthest point is tried first; when
/// the other boundary touches it there, a segment sample off the other
/// boundary is used instead. Returns
/// [`BooleanStatus::RightSurroundsLeft`] when the left island lies inside
/// the right one, [`BooleanStatus::LeftSurroundsRight`] for the converse
/// and [`BooleanStatus::NoCollision`] otherwise.
///
/// # Errors
///
/// Returns an error if either island is open or broken.
pub fn classify_islands(store: &PathStore, left: NodeId, right: NodeId) -> Result<BooleanStatus> {
    let status = if island_inside(store, left, right)? {
        BooleanStatus::RightSurroundsLeft
    } else if island_inside(store, right, left)? {
        BooleanStatus::LeftSurroundsRight
    } else {
        BooleanStatus::NoCollision
    };
    tracing::trace!(?status, "classified islands without crossings");
    Ok(status)
}

/// Whether `island` lies inside `other`, judged from the first boundary
/// point of `island` that is not on `other`'s boundary.
///
/// An island lying entirely on the other boundary is not inside it.
fn island_inside(store: &PathStore, island: NodeId, other: NodeId) -> Result<bool> {
    let mut candidates = vec![store.extremal_point(island, Axis::X)?.point];
    for id in store.closed_island(island)? {
        let segment = store.segment(id)?;
        candidates.extend(SAMPLE_PARAMS.iter().map(|&t| segment.eval(t)));
    }
    for point in &candidates {
        if boundary_distance(store, point, other)? > ON_BOUNDARY {
            return point_in_island(store, point, other);
        }
    }
    tracing::debug!("island lies on the other boundary");
    Ok(false)
}

/// Shortest distance from `point` to the island's boundary.
///
/// # Errors
///
/// Returns an error if the island is open or broken.
pub fn boundary_distance(store: &PathStore, point: &Point2, island: NodeId) -> Result<f64> {
    let mut best = f64::INFINITY;
    for id in store.closed_island(island)? {
        let segment = store.segment(id)?;
        if segment.bounds().distance_to(point) < best {
            best = best.min(segment.distance_to(point));
        }
    }
    Ok(best)
}

/// Whether `point` lies inside the closed island.
///
/// # Errors
///
/// Returns an error if the island is open or broken.
pub fn point_in_island(store: &PathStore, point: &Point2, island: NodeId) -> Result<bool> {
    Ok(ray_crossings(store, point, island, Axis::X)? % 2 == 1)
}

/// Counts how often a ray from `origin` towards +`axis` crosses the island.
///
/// A ray passing exactly through a vertex counts once when the chain
/// changes sides there and not at all when it only touches. Runs of
/// segments lying on the ray are skipped and judged by the sides of the
/// chain before and after the run.
///
/// # Errors
///
/// Returns an error if the island is open or broken.
pub fn ray_crossings(store: &PathStore, origin: &Point2, island: NodeId, axis: Axis) -> Result<usize> {
    let across = axis.transverse();
    let level = across.coord(origin);
    let along = axis.coord(origin);
    let segments = store
        .closed_island(island)?
        .into_iter()
        .map(|id| store.segment(id))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let ray = RaySides {
        segments: &segments,
        across,
        level,
    };

    let count = segments.len();
    let mut crossings = 0;
    for (k, segment) in segments.iter().enumerate() {
        if ray.colinear(k) {
            continue;
        }
        for t in ray.roots(segment) {
            // Owned by the successor's start.
            if t > 1.0 - RAY_EPSILON {
                continue;
            }
            if axis.coord(&segment.eval(t)) <= along + RAY_EPSILON {
                continue;
            }
            if t < RAY_EPSILON {
                let mut before = (k + count - 1) % count;
                for _ in 0..count {
                    if !ray.colinear(before) {
                        break;
                    }
                    before = (before + count - 1) % count;
                }
                let entry = ray.lead_in(before);
                let exit = ray.lead_out(k);
                if entry != 0 && exit != 0 && entry != exit {
                    crossings += 1;
                }
                continue;
            }
            let below = ray.side(&segment.eval((t - TANGENCY_OFFSET).max(0.0)), 0.0);
            let above = ray.side(&segment.eval((t + TANGENCY_OFFSET).min(1.0)), 0.0);
            if below != above {
                crossings += 1;
            }
        }
    }
    Ok(crossings)
}

struct RaySides<'a> {
    segments: &'a [Segment],
    across: Axis,
    level: f64,
}

impl RaySides<'_> {
    fn side(&self, p: &Point2, eps: f64) -> i8 {
        side_of(self.across.coord(p) - self.level, eps)
    }

    fn controls(&self, k: usize) -> [Point2; 4] {
        let c = self.segments[k].to_cubic();
        [c.p0, c.p1, c.p2, c.p3]
    }

    fn colinear(&self, k: usize) -> bool {
        self.controls(k).iter().all(|p| self.side(p, RAY_EPSILON) == 0)
    }

    /// Side from which the chain arrives at the end of segment `k`.
    fn lead_in(&self, k: usize) -> i8 {
        let [p0, p1, p2, _] = self.controls(k);
        [p2, p1, p0]
            .iter()
            .map(|p| self.side(p, RAY_EPSILON))
            .find(|s| *s != 0)
            .unwrap_or(0)
    }

    /// Side towards which the chain leaves the start of segment `k`.
    fn lead_out(&self, k: usize) -> i8 {
        let [_, p1, p2, p3] = self.controls(k);
        [p1, p2, p3]
            .iter()
            .map(|p| self.side(p, RAY_EPSILON))
            .find(|s| *s != 0)
            .unwrap_or(0)
    }

    /// Distinct parameters in `[0, 1]` where the segment meets the ray's line.
    fn roots(&self, segment: &Segment) -> Vec<f64> {
        let mut roots: Vec<f64> = Vec::new();
        for t in segment.axis_roots(self.across, self.level) {
            if !(-RAY_EPSILON..=1.0 + RAY_EPSILON).contains(&t) {
                continue;
            }
            let t = t.clamp(0.0, 1.0);
            if roots.iter().all(|r| (r - t).abs() >= RAY_EPSILON) {
                roots.push(t);
            }
        }
        roots
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Vector2;
    use crate::topology::{LoopId, NodeData};

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

    fn square(store: &mut PathStore, lp: LoopId, x0: f64, y0: f64, x1: f64, y1: f64) -> NodeId {
        polygon(store, lp, &[(x0, y0), (x1, y0), (x1, y1), (x0, y1)])
    }

    fn circle(store: &mut PathStore, lp: LoopId, cx: f64, cy: f64, r: f64) -> NodeId {
        let k = 0.552_284_749_8 * r;
        let quadrants = [
            ((cx + r, cy), Vector2::new(0.0, 1.0)),
            ((cx, cy + r), Vector2::new(-1.0, 0.0)),
            ((cx - r, cy), Vector2::new(0.0, -1.0)),
            ((cx, cy - r), Vector2::new(1.0, 0.0)),
        ];
        let ids: Vec<NodeId> = quadrants
            .iter()
            .map(|&((x, y), dir)| {
                let data = NodeData::new(Point2::new(x, y)).with_tangents(Some(-dir * k), Some(dir * k));
                store.add_node(lp, data).unwrap()
            })
            .collect();
        for (i, &id) in ids.iter().enumerate() {
            store.link(id, ids[(i + 1) % ids.len()]).unwrap();
        }
        ids[0]
    }

    #[test]
    fn nested_squares_are_anti_symmetric() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let outer = square(&mut store, lp, 0.0, 0.0, 6.0, 6.0);
        let inner = square(&mut store, lp, 2.0, 2.0, 4.0, 4.0);
        assert_eq!(
            classify_islands(&store, outer, inner).unwrap(),
            BooleanStatus::LeftSurroundsRight
        );
        assert_eq!(
            classify_islands(&store, inner, outer).unwrap(),
            BooleanStatus::RightSurroundsLeft
        );
    }

    #[test]
    fn disjoint_squares() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let a = square(&mut store, lp, 0.0, 0.0, 1.0, 1.0);
        let b = square(&mut store, lp, 5.0, 5.0, 6.0, 6.0);
        assert_eq!(classify_islands(&store, a, b).unwrap(), BooleanStatus::NoCollision);
        assert_eq!(classify_islands(&store, b, a).unwrap(), BooleanStatus::NoCollision);
    }

    #[test]
    fn nested_circles() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let big = circle(&mut store, lp, 0.0, 0.0, 10.0);
        let small = circle(&mut store, lp, 3.0, 0.0, 1.0);
        assert_eq!(
            classify_islands(&store, big, small).unwrap(),
            BooleanStatus::LeftSurroundsRight
        );
        assert!(point_in_island(&store, &Point2::new(9.0, 0.0), big).unwrap());
        assert!(!point_in_island(&store, &Point2::new(11.0, 0.0), big).unwrap());
    }

    #[test]
    fn tangent_circles_are_disjoint_both_ways() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let a = circle(&mut store, lp, 0.0, 0.0, 1.0);
        let b = circle(&mut store, lp, 2.0, 0.0, 1.0);
        assert_eq!(classify_islands(&store, a, b).unwrap(), BooleanStatus::NoCollision);
        assert_eq!(classify_islands(&store, b, a).unwrap(), BooleanStatus::NoCollision);
    }

    #[test]
    fn internally_tangent_circle_is_surrounded() {
        // Both circles pass through (2, 0), where the rays would start
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let big = circle(&mut store, lp, 0.0, 0.0, 2.0);
        let small = circle(&mut store, lp, 1.0, 0.0, 1.0);
        assert_eq!(
            classify_islands(&store, big, small).unwrap(),
            BooleanStatus::LeftSurroundsRight
        );
        assert_eq!(
            classify_islands(&store, small, big).unwrap(),
            BooleanStatus::RightSurroundsLeft
        );
    }

    #[test]
    fn squares_touching_at_a_corner_are_disjoint() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let a = square(&mut store, lp, 0.0, 0.0, 1.0, 1.0);
        let b = square(&mut store, lp, 1.0, 1.0, 2.0, 2.0);
        let c = square(&mut store, lp, 1.0, 0.0, 2.0, 1.0);
        assert_eq!(classify_islands(&store, a, b).unwrap(), BooleanStatus::NoCollision);
        assert_eq!(classify_islands(&store, b, a).unwrap(), BooleanStatus::NoCollision);
        assert_eq!(classify_islands(&store, a, c).unwrap(), BooleanStatus::NoCollision);
    }

    #[test]
    fn boundary_distance_inside_and_outside() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let a = square(&mut store, lp, 0.0, 0.0, 2.0, 2.0);
        let d = |x: f64, y: f64| boundary_distance(&store, &Point2::new(x, y), a).unwrap();
        assert!((d(1.0, 1.0) - 1.0).abs() < 1e-12);
        assert!((d(3.0, 1.0) - 1.0).abs() < 1e-12);
        assert!(d(1.0, 0.0) < 1e-12);
        let c = circle(&mut store, lp, 0.0, 0.0, 1.0);
        let near = boundary_distance(&store, &Point2::new(0.0, 0.0), c).unwrap();
        assert!((near - 1.0).abs() < 1e-3);
    }

    #[test]
    fn colinear_run_that_crosses_counts_once() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let chain = polygon(
            &mut store,
            lp,
            &[(2.0, -1.0), (3.0, 0.0), (4.0, 0.0), (5.0, 1.0), (6.0, 1.0), (6.0, -2.0)],
        );
        let n = ray_crossings(&store, &Point2::new(1.0, 0.0), chain, Axis::X).unwrap();
        assert_eq!(n, 2);
    }

    #[test]
    fn colinear_run_that_touches_does_not_count() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let chain = polygon(
            &mut store,
            lp,
            &[(2.0, -1.0), (3.0, 0.0), (4.0, 0.0), (5.0, -1.0), (6.0, -1.0), (6.0, -2.0)],
        );
        let n = ray_crossings(&store, &Point2::new(1.0, 0.0), chain, Axis::X).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn touching_vertex_does_not_count() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let chain = polygon(&mut store, lp, &[(2.0, -1.0), (3.0, 0.0), (4.0, -1.0)]);
        let n = ray_crossings(&store, &Point2::new(1.0, 0.0), chain, Axis::X).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn tangent_curve_does_not_count() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        // Unit circle touched at its top by the ray y = 1.
        let c = circle(&mut store, lp, 5.0, 0.0, 1.0);
        let n = ray_crossings(&store, &Point2::new(0.0, 1.0), c, Axis::X).unwrap();
        assert_eq!(n, 0);
        let n = ray_crossings(&store, &Point2::new(0.0, 0.5), c, Axis::X).unwrap();
        assert_eq!(n, 2);
    }

    #[test]
    fn open_island_is_rejected() {
        let mut store = PathStore::new();
        let lp = store.add_loop();
        let a = store.add_node(lp, NodeData::new(Point2::new(0.0, 0.0))).unwrap();
        let b = store.add_node(lp, NodeData::new(Point2::new(1.0, 0.0))).unwrap();
        store.link(a, b).unwrap();
        assert!(point_in_island(&store, &Point2::origin(), a).is_err());
    }
}
