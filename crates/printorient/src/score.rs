//! Print-cost model for a single candidate "up" direction.
//!
//! The cost rewards a large, compact first layer and penalizes downward
//! facing area. Lower is better.

use printorient_math::{least_significant_axis, normalize_or_zero, Point2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{OrientError, Result};
use crate::face::Face;
use crate::footprint::convex_hull_area;

/// Weights and thresholds of the cost model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreParams {
    /// First layer height (mm). Faces entirely below `min + h` touch the bed.
    pub first_layer_height: f64,
    /// Faces with `normal · up` below this count as overhang.
    pub ascent: f64,
    /// Overall scale of the cost.
    pub relative_factor: f64,
    /// Weight of the contour (perimeter) estimate.
    pub contour_factor: f64,
    /// Weight of the first-layer area.
    pub bottom_factor: f64,
    /// Weight of the footprint hull area.
    pub bottom_hull_factor: f64,
    /// Overhang blend factor in the numerator.
    pub blend_c: f64,
    /// Constant term in numerator and denominator.
    pub blend_d: f64,
    /// Bottom area below which the penalty is applied.
    pub min_bottom_area: f64,
    /// Penalty for a near-zero bottom.
    pub bottom_penalty: f64,
    /// Heights below this mean the mesh is flat along the candidate.
    pub min_height: f64,
    /// Cost reported for a flat mesh.
    pub degenerate_cost: f64,
}

impl Default for ScoreParams {
    fn default() -> Self {
        Self {
            first_layer_height: 0.2,
            ascent: -0.5,
            relative_factor: 6.6106,
            contour_factor: 0.2323,
            bottom_factor: 1.1672,
            bottom_hull_factor: 0.1,
            blend_c: 0.2431,
            blend_d: 0.6285,
            min_bottom_area: 0.1,
            bottom_penalty: 100.0,
            min_height: 1e-6,
            degenerate_cost: 1000.0,
        }
    }
}

impl ScoreParams {
    /// Check that every evaluation yields a finite cost.
    ///
    /// The denominator is `blend_d` plus non-negative terms, so it stays
    /// positive as long as `blend_d > 0` and the area weights are not
    /// negative.
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("ascent", self.ascent),
            ("relative_factor", self.relative_factor),
            ("contour_factor", self.contour_factor),
            ("bottom_factor", self.bottom_factor),
            ("bottom_hull_factor", self.bottom_hull_factor),
            ("blend_c", self.blend_c),
            ("blend_d", self.blend_d),
            ("min_bottom_area", self.min_bottom_area),
            ("bottom_penalty", self.bottom_penalty),
            ("degenerate_cost", self.degenerate_cost),
        ];
        if let Some((name, _)) = weights.iter().find(|(_, v)| !v.is_finite()) {
            return Err(OrientError::InvalidParams(format!("{name} must be finite")));
        }
        if !(self.first_layer_height > 0.0 && self.first_layer_height.is_finite()) {
            return Err(OrientError::InvalidParams(
                "first_layer_height must be positive".into(),
            ));
        }
        if !(self.min_height > 0.0 && self.min_height.is_finite()) {
            return Err(OrientError::InvalidParams(
                "min_height must be positive".into(),
            ));
        }
        if self.blend_d <= 0.0 {
            return Err(OrientError::InvalidParams("blend_d must be positive".into()));
        }
        if self.contour_factor < 0.0 || self.bottom_factor < 0.0 || self.bottom_hull_factor < 0.0
        {
            return Err(OrientError::InvalidParams(
                "contour, bottom and bottom hull factors must not be negative".into(),
            ));
        }
        Ok(())
    }
}

/// Intermediate terms of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Weighted first-layer area. A face lying within half a layer of the
    /// bed counts 1.5 times its area.
    pub bottom: f64,
    /// Downward-facing area above the bed.
    pub overhang: f64,
    /// Perimeter estimate, `4 * sqrt(bottom)`.
    pub contour: f64,
    /// Area of the 2D convex hull of the first-layer vertices.
    pub bottom_hull: f64,
    /// Final cost.
    pub cost: f64,
}

/// Right/forward axes spanning the plane orthogonal to `up`.
fn plane_basis(up: &Vec3) -> (Vec3, Vec3) {
    let seed = least_significant_axis(up);
    let right = normalize_or_zero(&up.cross(&seed));
    let forward = normalize_or_zero(&right.cross(up));
    (right, forward)
}

/// Cost of printing with `up` as the build direction.
pub fn score(up: &Vec3, faces: &[Face], params: &ScoreParams) -> f64 {
    score_breakdown(up, faces, params).cost
}

/// Cost of printing with `up` as the build direction, with its terms.
pub fn score_breakdown(up: &Vec3, faces: &[Face], params: &ScoreParams) -> ScoreBreakdown {
    let mut min_h = f64::INFINITY;
    let mut max_h = f64::NEG_INFINITY;
    for face in faces {
        for v in &face.vertices {
            let h = v.coords.dot(up);
            min_h = min_h.min(h);
            max_h = max_h.max(h);
        }
    }
    if faces.is_empty() || max_h - min_h < params.min_height {
        return ScoreBreakdown {
            cost: params.degenerate_cost,
            ..Default::default()
        };
    }

    let (right, forward) = plane_basis(up);
    let layer_top = min_h + params.first_layer_height;
    let half_layer_top = min_h + params.first_layer_height * 0.5;

    let mut bottom = 0.0;
    let mut overhang = 0.0;
    let mut bottom_points = Vec::new();

    for face in faces {
        let heights = face.vertices.map(|v| v.coords.dot(up));
        let face_top = heights[0].max(heights[1]).max(heights[2]);
        let in_layer = face_top < layer_top;
        let in_half_layer = face_top < half_layer_top;

        if in_layer {
            bottom += face.area * 0.5;
            if in_half_layer {
                bottom += face.area;
            }
            for (v, h) in face.vertices.iter().zip(heights) {
                if h < layer_top {
                    bottom_points.push(Point2::new(v.coords.dot(&right), v.coords.dot(&forward)));
                }
            }
        }

        if !in_half_layer && face.normal.dot(up) < params.ascent {
            overhang += face.area;
        }
    }

    let contour = 4.0 * bottom.sqrt();
    let bottom_hull = convex_hull_area(bottom_points);

    let mut cost = params.relative_factor * (overhang * params.blend_c + params.blend_d)
        / (params.blend_d
            + params.contour_factor * contour
            + params.bottom_factor * bottom
            + params.bottom_hull_factor * bottom_hull);
    if bottom < params.min_bottom_area {
        cost += params.bottom_penalty;
    }

    ScoreBreakdown {
        bottom,
        overhang,
        contour,
        bottom_hull,
        cost,
    }
}
