//! Incremental QuickHull over the deduplicated vertex set.
//!
//! The hull only feeds extra candidate normals to the optimizer; it is never
//! used for volume computation, so a hull stopped at the iteration cap is
//! accepted as is.

use std::collections::HashSet;

use printorient_math::{normalize_or_zero, Point3, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::face::Face;

/// Minimum extent below which the seed simplex is considered degenerate.
const DEGENERATE_EPS: f64 = 1e-10;
/// A point must be this far outside a face to be inserted.
const OUTSIDE_EPS: f64 = 1e-8;
/// A face is visible from a point beyond this plane distance.
const VISIBLE_EPS: f64 = 1e-10;

/// Hull construction settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HullParams {
    /// Maximum number of point insertions before giving up on convergence.
    pub max_iterations: usize,
    /// Grid scale used to deduplicate vertices before hull construction.
    pub vertex_scale: f64,
}

impl Default for HullParams {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            vertex_scale: 1000.0,
        }
    }
}

/// A triangulated convex hull.
#[derive(Debug, Clone)]
pub struct ConvexHull {
    /// The input point set.
    pub points: Vec<Point3>,
    /// Outward-wound faces as indices into `points`.
    pub faces: Vec<[usize; 3]>,
    /// False when construction hit the iteration cap.
    pub converged: bool,
}

impl ConvexHull {
    /// Outward unit normal of face `index`.
    pub fn face_normal(&self, index: usize) -> Vec3 {
        plane_normal(&self.points, &self.faces[index])
    }

    /// Non-degenerate hull faces with normal and area, ready for clustering.
    pub fn analyzed_faces(&self) -> Vec<Face> {
        self.faces
            .iter()
            .filter_map(|f| {
                Face::from_vertices(self.points[f[0]], self.points[f[1]], self.points[f[2]])
            })
            .collect()
    }
}

/// Build the convex hull of `points`.
///
/// Returns `None` for fewer than four points or when the points are
/// coincident, collinear or coplanar.
pub fn build_hull(points: Vec<Point3>, max_iterations: usize) -> Option<ConvexHull> {
    if points.len() < 4 {
        debug!(points = points.len(), "Too few points for a hull");
        return None;
    }

    let Some(tetra) = initial_tetrahedron(&points) else {
        debug!(points = points.len(), "Degenerate point set, no hull");
        return None;
    };

    let mut arena = FaceArena::default();
    arena.push([tetra[0], tetra[1], tetra[2]]);
    arena.push([tetra[0], tetra[3], tetra[1]]);
    arena.push([tetra[1], tetra[3], tetra[2]]);
    arena.push([tetra[0], tetra[2], tetra[3]]);

    let mut assigned = vec![false; points.len()];
    for &t in &tetra {
        assigned[t] = true;
    }

    let mut converged = false;
    for _ in 0..max_iterations {
        if !insert_one_point(&points, &mut arena, &mut assigned) {
            converged = true;
            break;
        }
        if arena.dead > arena.slots.len() - arena.dead {
            arena.compact();
        }
    }

    if !converged {
        warn!(
            max_iterations,
            points = points.len(),
            "Hull iteration cap reached, using partial hull"
        );
    }

    let faces = arena.live().collect::<Vec<_>>();
    debug!(faces = faces.len(), converged, "Built convex hull");
    Some(ConvexHull {
        points,
        faces,
        converged,
    })
}

/// Scan faces newest-first for an outside point and insert the farthest one.
///
/// Returns false when no face has an outside point.
fn insert_one_point(points: &[Point3], arena: &mut FaceArena, assigned: &mut [bool]) -> bool {
    let mut changed = false;
    for fi in (0..arena.slots.len()).rev() {
        let Some(face) = arena.slots[fi] else {
            continue;
        };
        let normal = plane_normal(points, &face);
        let origin = points[face[0]];

        let mut farthest = None;
        let mut farthest_dist = OUTSIDE_EPS;
        for (i, p) in points.iter().enumerate() {
            if assigned[i] {
                continue;
            }
            let d = (p - origin).dot(&normal);
            if d > farthest_dist {
                farthest_dist = d;
                farthest = Some(i);
            }
        }
        let Some(eye) = farthest else {
            continue;
        };
        changed = true;
        assigned[eye] = true;

        let visible: Vec<usize> = arena
            .slots
            .iter()
            .enumerate()
            .filter_map(|(fj, f)| f.map(|f| (fj, f)))
            .filter(|(_, f)| {
                (points[eye] - points[f[0]]).dot(&plane_normal(points, f)) > VISIBLE_EPS
            })
            .map(|(fj, _)| fj)
            .collect();
        if visible.is_empty() {
            continue;
        }

        let horizon = horizon_edges(arena, &visible);
        for &fj in &visible {
            arena.remove(fj);
        }
        for (a, b) in horizon {
            arena.push([a, b, eye]);
        }
        break;
    }
    changed
}

/// Edges of the visible region with no reversed twin among visible faces.
fn horizon_edges(arena: &FaceArena, visible: &[usize]) -> Vec<(usize, usize)> {
    let faces: Vec<[usize; 3]> = visible.iter().filter_map(|&fj| arena.slots[fj]).collect();
    let directed: HashSet<(usize, usize)> = faces
        .iter()
        .flat_map(|f| [(f[0], f[1]), (f[1], f[2]), (f[2], f[0])])
        .collect();
    faces
        .iter()
        .flat_map(|f| [(f[0], f[1]), (f[1], f[2]), (f[2], f[0])])
        .filter(|&(a, b)| !directed.contains(&(b, a)))
        .collect()
}

/// Pick the seed tetrahedron `[a, b, c, d]`, wound so all four faces point
/// outward.
fn initial_tetrahedron(points: &[Point3]) -> Option<[usize; 4]> {
    let mut extremes = [0usize; 6];
    for (i, p) in points.iter().enumerate().skip(1) {
        for axis in 0..3 {
            if p[axis] < points[extremes[axis * 2]][axis] {
                extremes[axis * 2] = i;
            }
            if p[axis] > points[extremes[axis * 2 + 1]][axis] {
                extremes[axis * 2 + 1] = i;
            }
        }
    }

    let (mut a, mut b) = (0, 1);
    let mut best = 0.0;
    for i in 0..extremes.len() {
        for j in i + 1..extremes.len() {
            let d = (points[extremes[i]] - points[extremes[j]]).norm();
            if d > best {
                best = d;
                a = extremes[i];
                b = extremes[j];
            }
        }
    }
    if best < DEGENERATE_EPS {
        return None;
    }

    let line = normalize_or_zero(&(points[b] - points[a]));
    let c = farthest_by(points, |p| {
        let v = p - points[a];
        (v - line * v.dot(&line)).norm()
    })?;

    let plane = normalize_or_zero(&(points[b] - points[a]).cross(&(points[c] - points[a])));
    let d = farthest_by(points, |p| (p - points[a]).dot(&plane).abs())?;

    let mut tetra = [a, b, c, d];
    let [p0, p1, p2, p3] = tetra.map(|i| points[i]);
    let signed_volume = (p3 - p0).dot(&(p1 - p0).cross(&(p2 - p0)));
    if signed_volume > 0.0 {
        tetra.swap(1, 2);
    }
    Some(tetra)
}

/// Index of the point with the largest `metric`, if that exceeds the
/// degeneracy threshold.
fn farthest_by(points: &[Point3], metric: impl Fn(&Point3) -> f64) -> Option<usize> {
    let mut best = 0.0;
    let mut best_idx = None;
    for (i, p) in points.iter().enumerate() {
        let d = metric(p);
        if d > best {
            best = d;
            best_idx = Some(i);
        }
    }
    best_idx.filter(|_| best >= DEGENERATE_EPS)
}

fn plane_normal(points: &[Point3], face: &[usize; 3]) -> Vec3 {
    let [a, b, c] = face.map(|i| points[i]);
    normalize_or_zero(&(b - a).cross(&(c - a)))
}

/// Face storage with tombstoned removal.
///
/// Live faces keep their relative order; new faces are appended. Dead slots
/// are compacted away once they outnumber the live ones.
#[derive(Debug, Default)]
struct FaceArena {
    slots: Vec<Option<[usize; 3]>>,
    dead: usize,
}

impl FaceArena {
    fn push(&mut self, face: [usize; 3]) {
        self.slots.push(Some(face));
    }

    fn remove(&mut self, index: usize) {
        if self.slots[index].take().is_some() {
            self.dead += 1;
        }
    }

    /// Drop tombstones. Invalidates indices, so only call between scans.
    fn compact(&mut self) {
        self.slots.retain(Option::is_some);
        self.dead = 0;
    }

    fn live(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.slots.iter().flatten().copied()
    }
}
