//! Per-triangle normal and area extraction, plus vertex deduplication.

use std::collections::HashSet;

use printorient_math::{normalize_or_zero, Point3, Vec3};

use crate::mesh::TriangleSoup;

/// Triangles with area at or below this are ignored.
pub const MIN_FACE_AREA: f64 = 1e-10;

/// An analyzed, non-degenerate triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// Unit normal following the vertex winding.
    pub normal: Vec3,
    /// Triangle area.
    pub area: f64,
    /// The three corner positions.
    pub vertices: [Point3; 3],
}

impl Face {
    /// Analyze one triangle. Returns `None` when it is degenerate.
    pub fn from_vertices(a: Point3, b: Point3, c: Point3) -> Option<Self> {
        let cross = (b - a).cross(&(c - a));
        let area = 0.5 * cross.norm();
        if area > MIN_FACE_AREA {
            Some(Self {
                normal: normalize_or_zero(&cross),
                area,
                vertices: [a, b, c],
            })
        } else {
            None
        }
    }
}

/// Derive normal, area and corners for every non-degenerate triangle.
pub fn analyze_faces(mesh: &TriangleSoup) -> Vec<Face> {
    mesh.triangles()
        .filter_map(|[a, b, c]| Face::from_vertices(a, b, c))
        .collect()
}

/// Collapse vertices that share a quantized grid cell.
///
/// Each coordinate is scaled by `scale` and truncated toward zero; the first
/// position seen for a cell is kept. Order of first appearance is preserved.
pub fn unique_vertices(mesh: &TriangleSoup, scale: f64) -> Vec<Point3> {
    let mut seen = HashSet::new();
    mesh.positions()
        .filter(|p| {
            let key = (
                (p.x * scale) as i64,
                (p.y * scale) as i64,
                (p.z * scale) as i64,
            );
            seen.insert(key)
        })
        .collect()
}
