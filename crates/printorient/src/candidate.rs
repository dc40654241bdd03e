//! Candidate "up" directions for the orientation search.

use std::f64::consts::FRAC_1_SQRT_2;

use printorient_math::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cluster::cluster_normals;
use crate::face::Face;
use crate::hull::ConvexHull;

/// Settings for candidate generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateParams {
    /// Number of mesh-normal clusters to keep.
    pub mesh_clusters: usize,
    /// Number of hull-normal clusters to keep.
    pub hull_clusters: usize,
    /// Candidates closer than this angle (degrees) to an earlier one are
    /// dropped.
    pub dedup_angle: f64,
    /// Quantization steps per unit used to bucket normals.
    pub cluster_resolution: f64,
    /// Normalized resultant a bucket must exceed to count as a cluster.
    pub min_resultant: f64,
}

impl Default for CandidateParams {
    fn default() -> Self {
        Self {
            mesh_clusters: 10,
            hull_clusters: 14,
            dedup_angle: 5.0,
            cluster_resolution: 50.0,
            min_resultant: 0.5,
        }
    }
}

/// The 6 axis directions followed by the 12 two-axis diagonals.
pub fn reference_directions() -> [Vec3; 18] {
    let s = FRAC_1_SQRT_2;
    [
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(-1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, -1.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(0.0, 0.0, -1.0),
        Vec3::new(s, s, 0.0),
        Vec3::new(-s, s, 0.0),
        Vec3::new(s, -s, 0.0),
        Vec3::new(-s, -s, 0.0),
        Vec3::new(s, 0.0, s),
        Vec3::new(-s, 0.0, s),
        Vec3::new(s, 0.0, -s),
        Vec3::new(-s, 0.0, -s),
        Vec3::new(0.0, s, s),
        Vec3::new(0.0, -s, s),
        Vec3::new(0.0, s, -s),
        Vec3::new(0.0, -s, -s),
    ]
}

/// Build the ordered, deduplicated candidate list.
///
/// Order is mesh clusters, then hull clusters (when a hull exists), then the
/// reference directions. The optimizer relies on this order for tie-breaks.
pub fn generate_candidates(
    mesh_faces: &[Face],
    hull: Option<&ConvexHull>,
    params: &CandidateParams,
) -> Vec<Vec3> {
    let mut candidates: Vec<Vec3> = cluster_normals(
        mesh_faces,
        params.mesh_clusters,
        params.cluster_resolution,
        params.min_resultant,
    )
    .into_iter()
    .map(|c| c.direction)
    .collect();
    let mesh_count = candidates.len();

    if let Some(hull) = hull {
        candidates.extend(
            cluster_normals(
                &hull.analyzed_faces(),
                params.hull_clusters,
                params.cluster_resolution,
                params.min_resultant,
            )
            .into_iter()
            .map(|c| c.direction),
        );
    }
    let hull_count = candidates.len() - mesh_count;

    candidates.extend(reference_directions());

    let deduped = dedup_directions(candidates, params.dedup_angle);
    debug!(
        mesh_count,
        hull_count,
        candidates = deduped.len(),
        "Generated orientation candidates"
    );
    deduped
}

/// Greedily keep each direction whose angle to every kept one exceeds
/// `angle_deg`.
pub fn dedup_directions(directions: Vec<Vec3>, angle_deg: f64) -> Vec<Vec3> {
    let cos_threshold = angle_deg.to_radians().cos();
    let mut kept: Vec<Vec3> = Vec::with_capacity(directions.len());
    for d in directions {
        if kept.iter().all(|k| d.dot(k) <= cos_threshold) {
            kept.push(d);
        }
    }
    kept
}
