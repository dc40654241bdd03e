//! Best-of-candidates orientation search.

use std::time::{Duration, Instant};

use printorient_math::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::candidate::generate_candidates;
use crate::error::{OrientError, Result};
use crate::face::{analyze_faces, unique_vertices, Face};
use crate::hull::build_hull;
use crate::mesh::TriangleSoup;
use crate::score::{score, ScoreParams};
use crate::OrientParams;

/// Outcome of an orientation search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrientationResult {
    /// Winning "up" direction (unit vector).
    pub direction: [f64; 3],
    /// Cost of the winning direction.
    pub cost: f64,
    /// Number of candidates evaluated.
    pub candidate_count: usize,
    /// Wall-clock search time in milliseconds.
    pub time_ms: u64,
}

impl OrientationResult {
    /// Winning direction as a vector.
    pub fn up(&self) -> Vec3 {
        Vec3::from(self.direction)
    }
}

/// Score every candidate and return the index and cost of the winner.
///
/// A later candidate only replaces the current best when it is cheaper by
/// more than `tie_margin`, so near-ties go to the earliest candidate.
/// Returns `None` when no candidate has a finite cost.
pub fn select_best(
    candidates: &[Vec3],
    faces: &[Face],
    params: &ScoreParams,
    tie_margin: f64,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, up) in candidates.iter().enumerate() {
        let cost = score(up, faces, params);
        let best_cost = best.map_or(f64::INFINITY, |(_, c)| c);
        if cost < best_cost - tie_margin {
            best = Some((i, cost));
        }
    }
    best
}

/// Whole milliseconds, rounded to nearest.
fn elapsed_ms(elapsed: Duration) -> u64 {
    (elapsed.as_secs_f64() * 1000.0).round() as u64
}

/// Search for the build direction that minimizes print cost.
///
/// Runs face analysis, hull construction, candidate generation and scoring.
/// A degenerate hull only removes the hull-derived candidates.
pub fn find_best_orientation(
    mesh: &TriangleSoup,
    params: &OrientParams,
) -> Result<OrientationResult> {
    params.validate()?;
    if mesh.is_empty() {
        return Err(OrientError::EmptyMesh);
    }
    let start = Instant::now();

    let faces = analyze_faces(mesh);
    debug!(
        triangles = mesh.triangle_count(),
        faces = faces.len(),
        "Analyzed faces"
    );

    let vertices = unique_vertices(mesh, params.hull.vertex_scale);
    let hull = build_hull(vertices, params.hull.max_iterations);
    let candidates = generate_candidates(&faces, hull.as_ref(), &params.candidates);

    let (best, cost) = select_best(&candidates, &faces, &params.score, params.tie_margin)
        .ok_or(OrientError::NoFiniteCost {
            candidates: candidates.len(),
        })?;
    let direction = candidates[best];

    let result = OrientationResult {
        direction: direction.into(),
        cost,
        candidate_count: candidates.len(),
        time_ms: elapsed_ms(start.elapsed()),
    };
    info!(
        direction = ?result.direction,
        cost = format!("{:.4}", result.cost),
        candidates = result.candidate_count,
        hull = hull.is_some(),
        time_ms = result.time_ms,
        "Orientation search complete"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::reference_directions;
    use crate::fixtures::{box_mesh, pyramid_mesh};
    use approx::assert_relative_eq;

    #[test]
    fn test_tie_goes_to_first_candidate() {
        let faces = analyze_faces(&box_mesh(10.0, 10.0, 10.0));
        let candidates = vec![Vec3::x(), -Vec3::y(), Vec3::z()];
        let (idx, _) = select_best(&candidates, &faces, &ScoreParams::default(), 1e-6).unwrap();
        assert_eq!(idx, 0);
    }

    #[test]
    fn test_strict_improvement_margin() {
        let faces = analyze_faces(&box_mesh(10.0, 10.0, 10.0));
        let params = ScoreParams::default();
        let candidates = vec![Vec3::new(1.0, 1.0, 0.0).normalize(), Vec3::y()];
        let (idx, cost) = select_best(&candidates, &faces, &params, 1e-6).unwrap();
        assert_eq!(idx, 1);
        // a margin larger than the gap keeps the first candidate
        let gap = score(&candidates[0], &faces, &params) - cost;
        let (idx, _) = select_best(&candidates, &faces, &params, gap + 1.0).unwrap();
        assert_eq!(idx, 0);
    }

    #[test]
    fn test_cube_picks_axis_direction() {
        let result =
            find_best_orientation(&box_mesh(10.0, 10.0, 10.0), &OrientParams::default()).unwrap();
        assert!(result.cost.is_finite());
        assert!(result.cost < 1.0);
        let up = result.up();
        let axes = &reference_directions()[..6];
        assert!(axes.iter().any(|a| (a - up).norm() < 1e-9), "{up:?}");
        assert!(result.candidate_count >= 18);
    }

    #[test]
    fn test_pyramid_prefers_base_down() {
        let result =
            find_best_orientation(&pyramid_mesh(20.0, 5.0), &OrientParams::default()).unwrap();
        assert_relative_eq!(result.up(), Vec3::y(), epsilon = 1e-9);
    }

    #[test]
    fn test_flat_mesh_falls_back_to_mesh_and_reference_candidates() {
        let mut mesh = crate::mesh::TriangleSoup::new();
        mesh.push_triangle([0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [10.0, 0.0, 10.0]);
        mesh.push_triangle([0.0, 0.0, 0.0], [10.0, 0.0, 10.0], [0.0, 0.0, 10.0]);
        let result = find_best_orientation(&mesh, &OrientParams::default()).unwrap();
        assert!(result.cost.is_finite());
        // one mesh cluster (-Y) plus the reference set minus its duplicate
        assert_eq!(result.candidate_count, 18);
    }

    #[test]
    fn test_nan_costs_select_nothing() {
        let faces = analyze_faces(&box_mesh(10.0, 10.0, 10.0));
        let params = ScoreParams {
            relative_factor: f64::NAN,
            ..Default::default()
        };
        assert!(select_best(&reference_directions(), &faces, &params, 1e-6).is_none());
    }

    #[test]
    fn test_overflowing_costs_are_an_error() {
        // valid but huge weights push every cost to infinity
        let mut params = OrientParams::default();
        params.score.relative_factor = f64::MAX;
        params.score.blend_d = f64::MAX;
        assert!(params.validate().is_ok());
        let err = find_best_orientation(&box_mesh(10.0, 10.0, 10.0), &params);
        assert!(matches!(err, Err(OrientError::NoFiniteCost { .. })));
    }

    #[test]
    fn test_elapsed_ms_rounds() {
        assert_eq!(elapsed_ms(Duration::from_micros(1400)), 1);
        assert_eq!(elapsed_ms(Duration::from_micros(1600)), 2);
        assert_eq!(elapsed_ms(Duration::from_micros(400)), 0);
    }

    #[test]
    fn test_empty_mesh_is_an_error() {
        let err = find_best_orientation(&TriangleSoup::new(), &OrientParams::default());
        assert!(matches!(err, Err(OrientError::EmptyMesh)));
    }

    #[test]
    fn test_result_serializes_with_camel_case_fields() {
        let result = OrientationResult {
            direction: [0.0, 1.0, 0.0],
            cost: 0.5,
            candidate_count: 20,
            time_ms: 3,
        };
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["candidateCount"], 20);
        assert_eq!(json["timeMs"], 3);
        assert_eq!(json["direction"][1], 1.0);
    }
}
