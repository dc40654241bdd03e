//! Triangle soup storage and bounding-box statistics.

use std::f64::consts::FRAC_PI_2;
use std::fmt;

use printorient_math::{Point3, Transform};
use serde::{Deserialize, Serialize};

use crate::error::{OrientError, Result};

/// Coordinates stored per triangle (3 vertices × xyz).
pub const COORDS_PER_TRIANGLE: usize = 9;

/// An unindexed triangle mesh.
///
/// Vertices are stored flat as `[x0, y0, z0, x1, y1, z1, ...]`, nine values
/// per triangle. No vertex sharing is assumed. The working frame is Y-up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleSoup {
    coords: Vec<f32>,
}

impl TriangleSoup {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self { coords: Vec::new() }
    }

    /// Wrap a flat coordinate buffer holding `triangle_count` triangles.
    ///
    /// Fails when the buffer length is not `9 * triangle_count` or when any
    /// coordinate is not finite.
    pub fn from_coords(coords: Vec<f32>, triangle_count: usize) -> Result<Self> {
        let expected = triangle_count * COORDS_PER_TRIANGLE;
        if coords.len() != expected {
            return Err(OrientError::CoordinateCount {
                expected,
                got: coords.len(),
            });
        }
        if let Some(index) = coords.iter().position(|c| !c.is_finite()) {
            return Err(OrientError::NonFiniteCoordinate { index });
        }
        Ok(Self { coords })
    }

    /// Append one triangle.
    pub fn push_triangle(&mut self, a: [f32; 3], b: [f32; 3], c: [f32; 3]) {
        self.coords.extend_from_slice(&a);
        self.coords.extend_from_slice(&b);
        self.coords.extend_from_slice(&c);
    }

    /// Flat coordinate buffer.
    pub fn coords(&self) -> &[f32] {
        &self.coords
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.coords.len() / COORDS_PER_TRIANGLE
    }

    /// True when the mesh holds no triangles.
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Vertices of triangle `index`, widened to f64.
    pub fn triangle(&self, index: usize) -> [Point3; 3] {
        let o = index * COORDS_PER_TRIANGLE;
        let c = &self.coords[o..o + COORDS_PER_TRIANGLE];
        [
            Point3::new(c[0] as f64, c[1] as f64, c[2] as f64),
            Point3::new(c[3] as f64, c[4] as f64, c[5] as f64),
            Point3::new(c[6] as f64, c[7] as f64, c[8] as f64),
        ]
    }

    /// Iterate over all triangles.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3; 3]> + '_ {
        (0..self.triangle_count()).map(move |i| self.triangle(i))
    }

    /// Iterate over every vertex position (three per triangle).
    pub fn positions(&self) -> impl Iterator<Item = Point3> + '_ {
        self.coords
            .chunks_exact(3)
            .map(|c| Point3::new(c[0] as f64, c[1] as f64, c[2] as f64))
    }

    /// Axis-aligned bounding box, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Point3, Point3)> {
        let mut positions = self.positions();
        let first = positions.next()?;
        let (mut min, mut max) = (first, first);
        for p in positions {
            min = min.inf(&p);
            max = max.sup(&p);
        }
        Some((min, max))
    }

    /// Bounding-box dimensions and triangle count.
    pub fn stats(&self) -> MeshStats {
        let dimensions = self
            .bounds()
            .map(|(min, max)| {
                let size = max - min;
                [size.x, size.y, size.z]
            })
            .unwrap_or([0.0; 3]);
        MeshStats {
            dimensions,
            triangle_count: self.triangle_count(),
        }
    }

    /// A copy of this mesh with `transform` applied to every vertex.
    ///
    /// Fails without producing a partial mesh if any transformed coordinate
    /// does not fit a finite f32.
    pub fn transformed(&self, transform: &Transform) -> Result<Self> {
        let mut coords = Vec::with_capacity(self.coords.len());
        for p in self.positions() {
            let q = transform.apply_point(&p);
            coords.extend_from_slice(&[q.x as f32, q.y as f32, q.z as f32]);
        }
        if let Some(index) = coords.iter().position(|c| !c.is_finite()) {
            return Err(OrientError::NonFiniteCoordinate { index });
        }
        Ok(Self { coords })
    }

    /// Convert Z-up data (as STL files are authored) into the Y-up working
    /// frame.
    pub fn z_up_to_y_up(&self) -> Result<Self> {
        self.transformed(&Transform::rotation_x(-FRAC_PI_2))
    }

    /// Convert Y-up working-frame data back to Z-up.
    pub fn y_up_to_z_up(&self) -> Result<Self> {
        self.transformed(&Transform::rotation_x(FRAC_PI_2))
    }
}

/// Bounding statistics shown alongside a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshStats {
    /// Bounding-box size along X, Y, Z (mm).
    pub dimensions: [f64; 3],
    /// Number of triangles.
    pub triangle_count: usize,
}

impl fmt::Display for MeshStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, z] = self.dimensions;
        write!(f, "{x:.1} x {y:.1} x {z:.1} mm")
    }
}
