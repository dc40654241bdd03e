#![warn(missing_docs)]

//! Automatic print orientation for triangle meshes.
//!
//! Given a mesh, this crate searches a set of candidate "up" directions for
//! the one that minimizes an estimated FDM print cost (large, compact first
//! layer, little overhang), then rotates the mesh so that direction points
//! along +Y and sets it down centered on the build plate.
//!
//! All geometry is handled in a Y-up frame. STL data is Z-up; convert with
//! [`TriangleSoup::z_up_to_y_up`] and [`TriangleSoup::y_up_to_z_up`].
//! 3MF archives load through [`read_3mf`], and [`MeshFormat`] picks the
//! reader and load-time rotation from a file extension.
//!
//! # Example
//!
//! ```ignore
//! use printorient::{load_stl, orient_mesh, OrientParams};
//!
//! let mut mesh = load_stl("bracket.stl")?.z_up_to_y_up()?;
//! let outcome = orient_mesh(&mut mesh, &OrientParams::default())?;
//!
//! println!("Up: {:?}", outcome.result.direction);
//! println!("Cost: {:.3}", outcome.result.cost);
//! ```

pub mod bake;
pub mod candidate;
pub mod cluster;
pub mod error;
pub mod face;
pub mod footprint;
pub mod format;
pub mod hull;
pub mod mesh;
pub mod optimize;
pub mod score;
pub mod stl;
pub mod task;
pub mod threemf;

#[cfg(test)]
mod fixtures;

pub use bake::{bake_orientation, is_already_optimal, placement_transform, BakeOutcome, BakedMesh};
pub use candidate::{dedup_directions, generate_candidates, reference_directions, CandidateParams};
pub use cluster::{cluster_normals, Cluster};
pub use error::{OrientError, Result};
pub use face::{analyze_faces, unique_vertices, Face};
pub use format::{load_mesh, MeshFormat};
pub use hull::{build_hull, ConvexHull, HullParams};
pub use mesh::{MeshStats, TriangleSoup};
pub use optimize::{find_best_orientation, select_best, OrientationResult};
pub use score::{score, score_breakdown, ScoreBreakdown, ScoreParams};
pub use stl::{load_stl, oriented_file_name, read_stl, save_stl, write_stl};
pub use task::{OrientSlot, OrientStatus, OrientTask, TaskReport};
pub use threemf::{load_3mf, read_3mf};

use serde::{Deserialize, Serialize};

/// Orientation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientParams {
    /// Cost model weights.
    pub score: ScoreParams,
    /// Candidate generation.
    pub candidates: CandidateParams,
    /// Hull construction.
    pub hull: HullParams,
    /// A later candidate must beat the best cost by more than this.
    pub tie_margin: f64,
    /// Per-component tolerance for treating the best direction as +Y.
    pub optimal_tolerance: f64,
}

impl Default for OrientParams {
    fn default() -> Self {
        Self {
            score: ScoreParams::default(),
            candidates: CandidateParams::default(),
            hull: HullParams::default(),
            tie_margin: 1e-6,
            optimal_tolerance: 0.01,
        }
    }
}

impl OrientParams {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        self.score.validate()?;
        if !is_positive(self.candidates.cluster_resolution) {
            return Err(OrientError::InvalidParams(
                "cluster_resolution must be positive".into(),
            ));
        }
        if !(is_positive(self.candidates.dedup_angle) && self.candidates.dedup_angle < 90.0) {
            return Err(OrientError::InvalidParams(
                "dedup_angle must be between 0 and 90 degrees".into(),
            ));
        }
        if !is_positive(self.hull.vertex_scale) {
            return Err(OrientError::InvalidParams(
                "vertex_scale must be positive".into(),
            ));
        }
        if self.hull.max_iterations == 0 {
            return Err(OrientError::InvalidParams(
                "max_iterations must be at least 1".into(),
            ));
        }
        if !is_non_negative(self.tie_margin) || !is_non_negative(self.optimal_tolerance) {
            return Err(OrientError::InvalidParams(
                "tolerances must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

// NaN fails both checks
fn is_positive(v: f64) -> bool {
    v > 0.0
}

fn is_non_negative(v: f64) -> bool {
    v >= 0.0
}

/// Result of a full orientation run.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientOutcome {
    /// The search result.
    pub result: OrientationResult,
    /// What happened to the mesh.
    pub bake: BakeOutcome,
}

/// Find the best orientation and apply it to the mesh.
///
/// The mesh is only replaced once the rotated copy has been fully built, so
/// on error it is left exactly as it was.
pub fn orient_mesh(mesh: &mut TriangleSoup, params: &OrientParams) -> Result<OrientOutcome> {
    let result = find_best_orientation(mesh, params)?;
    let bake = bake_orientation(mesh, &result.up(), params.optimal_tolerance)?;
    Ok(OrientOutcome { result, bake })
}
