//! Polygon set operations over flattened paths.
//!
//! All edges of all operands are split at their mutual intersections. Each
//! resulting sub-edge is classified by sampling the winding number of every
//! operand just to either side of it; edges that separate inside from outside
//! are kept, oriented so the inside lies to their left, and chained back into
//! contours.

use std::collections::{HashMap, HashSet};

use kurbo::{BezPath, PathEl, Point, Vec2};
use log::trace;

use crate::FillRule;

/// Vertices closer than this are the same vertex
const MERGE_DISTANCE: f64 = 1e-7;
/// Vertex coordinates are snapped to this many decimal places
const SNAP_SCALE: f64 = 1e9;
/// How far beside an edge we sample winding
const MAX_SAMPLE_OFFSET: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SetOp {
    Union,
    Intersection,
    /// First operand minus all the rest
    Difference,
}

impl SetOp {
    fn is_inside(self, inside: &[bool]) -> bool {
        match self {
            SetOp::Union => inside.iter().any(|v| *v),
            SetOp::Intersection => !inside.is_empty() && inside.iter().all(|v| *v),
            SetOp::Difference => match inside.split_first() {
                Some((first, rest)) => *first && !rest.iter().any(|v| *v),
                None => false,
            },
        }
    }
}

/// A flattened path and the rule used to fill it.
pub(crate) struct Operand {
    contours: Vec<Vec<Point>>,
    fill_rule: FillRule,
}

impl Operand {
    pub(crate) fn new(path: &BezPath, fill_rule: FillRule, tolerance: f64) -> Operand {
        Operand {
            contours: flatten(path, tolerance),
            fill_rule,
        }
    }

    fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.contours.iter().flat_map(|contour| {
            contour
                .iter()
                .zip(contour.iter().cycle().skip(1))
                .map(|(a, b)| (*a, *b))
        })
    }

    fn winding(&self, pt: Point) -> i32 {
        let mut winding = 0;
        for (a, b) in self.edges() {
            let side = (b - a).cross(pt - a);
            if a.y <= pt.y {
                if b.y > pt.y && side > 0.0 {
                    winding += 1;
                }
            } else if b.y <= pt.y && side < 0.0 {
                winding -= 1;
            }
        }
        winding
    }

    fn contains(&self, pt: Point) -> bool {
        self.fill_rule.is_inside(self.winding(pt))
    }
}

fn flatten(path: &BezPath, tolerance: f64) -> Vec<Vec<Point>> {
    let mut contours = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    kurbo::flatten(path.iter(), tolerance, |el| match el {
        PathEl::MoveTo(p) => {
            finish_contour(&mut contours, &mut current);
            current.push(p);
        }
        PathEl::LineTo(p) => {
            if current.last() != Some(&p) {
                current.push(p);
            }
        }
        PathEl::ClosePath => finish_contour(&mut contours, &mut current),
        // flatten only emits lines
        PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
    });
    finish_contour(&mut contours, &mut current);
    contours
}

fn finish_contour(contours: &mut Vec<Vec<Point>>, current: &mut Vec<Point>) {
    let mut contour = std::mem::take(current);
    if contour.len() > 1 && contour.first() == contour.last() {
        contour.pop();
    }
    // fewer than three points can't enclose anything
    if contour.len() >= 3 {
        contours.push(contour);
    }
}

/// Interns points so that nearly coincident vertices share an id.
#[derive(Default)]
struct VertexPool {
    points: Vec<Point>,
    cells: HashMap<(i64, i64), Vec<usize>>,
}

impl VertexPool {
    fn cell(v: f64) -> i64 {
        (v / MERGE_DISTANCE).floor() as i64
    }

    fn intern(&mut self, pt: Point) -> usize {
        let pt = Point::new(
            (pt.x * SNAP_SCALE).round() / SNAP_SCALE,
            (pt.y * SNAP_SCALE).round() / SNAP_SCALE,
        );
        let (cx, cy) = (Self::cell(pt.x), Self::cell(pt.y));
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(candidates) = self.cells.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                if let Some(id) = candidates
                    .iter()
                    .find(|id| (self.points[**id] - pt).hypot() <= MERGE_DISTANCE)
                {
                    return *id;
                }
            }
        }
        let id = self.points.len();
        self.points.push(pt);
        self.cells.entry((cx, cy)).or_default().push(id);
        id
    }
}

/// Points where segment ab meets segment cd, including the ends of collinear overlaps.
fn intersections(a: Point, b: Point, c: Point, d: Point) -> Vec<Point> {
    let r = b - a;
    let s = d - c;
    let qp = c - a;
    let denom = r.cross(s);
    let scale = r.hypot() * s.hypot();
    if scale == 0.0 {
        return Vec::new();
    }
    if denom.abs() <= 1e-12 * scale {
        // parallel; only collinear overlap matters
        if qp.cross(r).abs() > MERGE_DISTANCE * r.hypot() {
            return Vec::new();
        }
        let mut result = Vec::new();
        for (p, from, along) in [(c, a, r), (d, a, r), (a, c, s), (b, c, s)] {
            let t = (p - from).dot(along) / along.hypot2();
            if t > 0.0 && t < 1.0 {
                result.push(p);
            }
        }
        return result;
    }
    let t = qp.cross(s) / denom;
    let u = qp.cross(r) / denom;
    let slack = 1e-12;
    if (-slack..=1.0 + slack).contains(&t) && (-slack..=1.0 + slack).contains(&u) {
        vec![a + r * t.clamp(0.0, 1.0)]
    } else {
        Vec::new()
    }
}

fn overlaps(a: Point, b: Point, c: Point, d: Point) -> bool {
    let pad = MERGE_DISTANCE;
    a.x.min(b.x) - pad <= c.x.max(d.x)
        && c.x.min(d.x) - pad <= a.x.max(b.x)
        && a.y.min(b.y) - pad <= c.y.max(d.y)
        && c.y.min(d.y) - pad <= a.y.max(b.y)
}

/// Split every edge at every point where it meets another edge.
///
/// Returns the vertex pool and the unique undirected sub-edges.
fn split_edges(operands: &[Operand]) -> (VertexPool, Vec<(usize, usize)>) {
    let edges: Vec<(Point, Point)> = operands.iter().flat_map(Operand::edges).collect();
    let mut splits: Vec<Vec<Point>> = edges.iter().map(|(a, b)| vec![*a, *b]).collect();

    for i in 0..edges.len() {
        let (a, b) = edges[i];
        for j in (i + 1)..edges.len() {
            let (c, d) = edges[j];
            if !overlaps(a, b, c, d) {
                continue;
            }
            for pt in intersections(a, b, c, d) {
                splits[i].push(pt);
                splits[j].push(pt);
            }
        }
    }

    let mut pool = VertexPool::default();
    let mut seen = HashSet::new();
    let mut sub_edges = Vec::new();
    for ((a, b), mut points) in edges.into_iter().zip(splits) {
        let along = b - a;
        let len2 = along.hypot2();
        points.sort_by(|p, q| {
            let tp = (*p - a).dot(along) / len2;
            let tq = (*q - a).dot(along) / len2;
            tp.total_cmp(&tq)
        });
        let mut ids: Vec<usize> = points.into_iter().map(|p| pool.intern(p)).collect();
        ids.dedup();
        for pair in ids.windows(2) {
            let (u, v) = (pair[0], pair[1]);
            if u == v {
                continue;
            }
            if seen.insert((u.min(v), u.max(v))) {
                sub_edges.push((u, v));
            }
        }
    }
    (pool, sub_edges)
}

/// Keep the sub-edges that bound the result, directed with the inside on their left.
fn boundary_edges(
    operands: &[Operand],
    op: SetOp,
    pool: &VertexPool,
    sub_edges: &[(usize, usize)],
) -> Vec<(usize, usize)> {
    let mut result = Vec::new();
    let mut inside = vec![false; operands.len()];
    for (u, v) in sub_edges.iter().copied() {
        let (pu, pv) = (pool.points[u], pool.points[v]);
        let dir = pv - pu;
        let len = dir.hypot();
        if len == 0.0 {
            continue;
        }
        let normal = Vec2::new(-dir.y, dir.x) / len;
        let offset = (len * 0.01).min(MAX_SAMPLE_OFFSET);
        let mid = pu.midpoint(pv);

        for (slot, operand) in inside.iter_mut().zip(operands) {
            *slot = operand.contains(mid + normal * offset);
        }
        let left = op.is_inside(&inside);
        for (slot, operand) in inside.iter_mut().zip(operands) {
            *slot = operand.contains(mid - normal * offset);
        }
        let right = op.is_inside(&inside);

        match (left, right) {
            (true, false) => result.push((u, v)),
            (false, true) => result.push((v, u)),
            _ => (),
        }
    }
    result
}

/// Walk directed edges into closed loops, preferring the sharpest left turn at junctions.
fn chain(pool: &VertexPool, edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
    for (idx, (from, _)) in edges.iter().enumerate() {
        outgoing.entry(*from).or_default().push(idx);
    }
    let mut used = vec![false; edges.len()];
    let mut loops = Vec::new();

    for start_idx in 0..edges.len() {
        if used[start_idx] {
            continue;
        }
        used[start_idx] = true;
        let (start, mut current) = edges[start_idx];
        let mut incoming = pool.points[current] - pool.points[start];
        let mut contour = vec![start];

        while current != start {
            contour.push(current);
            let here = pool.points[current];
            let next = outgoing.get(&current).and_then(|candidates| {
                candidates
                    .iter()
                    .copied()
                    .filter(|idx| !used[*idx])
                    .max_by(|e1, e2| {
                        let turn = |idx: usize| {
                            let out = pool.points[edges[idx].1] - here;
                            incoming.cross(out).atan2(incoming.dot(out))
                        };
                        turn(*e1).total_cmp(&turn(*e2))
                    })
            });
            let Some(next) = next else {
                trace!("Unable to close contour at {here:?}, dropping it");
                contour.clear();
                break;
            };
            used[next] = true;
            incoming = pool.points[edges[next].1] - here;
            current = edges[next].1;
        }
        if !contour.is_empty() {
            loops.push(contour);
        }
    }
    loops
}

fn is_collinear(prev: Point, at: Point, next: Point) -> bool {
    let (d1, d2) = (at - prev, next - at);
    d1.cross(d2).abs() <= 1e-9 * d1.hypot() * d2.hypot()
}

/// Drop redundant vertices and start at the top-left-most point.
fn tidy(pool: &VertexPool, contour: Vec<usize>) -> Option<Vec<Point>> {
    let mut points: Vec<Point> = contour.into_iter().map(|id| pool.points[id]).collect();
    loop {
        let n = points.len();
        if n < 3 {
            return None;
        }
        let redundant = (0..n).find(|i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            is_collinear(prev, points[*i], next)
        });
        match redundant {
            Some(i) => {
                points.remove(i);
            }
            None => break,
        }
    }
    let start = points
        .iter()
        .enumerate()
        .min_by(|(_, p), (_, q)| p.y.total_cmp(&q.y).then(p.x.total_cmp(&q.x)))
        .map(|(idx, _)| idx)
        .unwrap_or_default();
    points.rotate_left(start);
    Some(points)
}

pub(crate) fn combine(operands: &[Operand], op: SetOp) -> BezPath {
    let (pool, sub_edges) = split_edges(operands);
    let boundary = boundary_edges(operands, op, &pool, &sub_edges);
    let mut contours: Vec<Vec<Point>> = chain(&pool, &boundary)
        .into_iter()
        .filter_map(|contour| tidy(&pool, contour))
        .collect();
    contours.sort_by(|c1, c2| {
        let (p, q) = (c1[0], c2[0]);
        p.y.total_cmp(&q.y).then(p.x.total_cmp(&q.x))
    });
    trace!(
        "{op:?} of {} operands: {} sub-edges, {} boundary edges, {} contours",
        operands.len(),
        sub_edges.len(),
        boundary.len(),
        contours.len()
    );

    let mut path = BezPath::new();
    for contour in contours {
        path.move_to(contour[0]);
        for pt in &contour[1..] {
            path.line_to(*pt);
        }
        path.close_path();
    }
    path
}

#[cfg(test)]
mod tests {
    use kurbo::{BezPath, Point};

    use super::*;

    #[test]
    fn crossing_segments_meet_once() {
        let points = intersections(
            Point::new(0.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
            Point::new(2.0, 0.0),
        );
        assert_eq!(vec![Point::new(1.0, 1.0)], points);
    }

    #[test]
    fn collinear_overlap_reports_inner_ends() {
        let points = intersections(
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(6.0, 0.0),
        );
        assert_eq!(vec![Point::new(2.0, 0.0), Point::new(4.0, 0.0)], points);
    }

    #[test]
    fn pool_merges_near_points() {
        let mut pool = VertexPool::default();
        let a = pool.intern(Point::new(6.0, 6.0));
        let b = pool.intern(Point::new(5.999999999999999, 6.000000000000001));
        assert_eq!(a, b);
        assert_eq!(Point::new(6.0, 6.0), pool.points[a]);
    }

    #[test]
    fn winding_of_square() {
        let operand = Operand::new(
            &BezPath::from_svg("M0,0 L10,0 L10,10 L0,10 Z").unwrap(),
            FillRule::NonZero,
            0.1,
        );
        assert!(operand.contains(Point::new(5.0, 5.0)));
        assert!(!operand.contains(Point::new(15.0, 5.0)));
    }

    #[test]
    fn self_intersecting_bowtie_under_evenodd() {
        let operand = Operand::new(
            &BezPath::from_svg("M0,0 L10,10 L10,0 L0,10 Z").unwrap(),
            FillRule::EvenOdd,
            0.1,
        );
        let result = combine(&[operand], SetOp::Union);
        assert_eq!(
            "M0,0 L5,5 L0,10 Z M10,0 L10,10 L5,5 Z",
            result.to_svg()
        );
    }
}
