#![warn(missing_docs)]

//! Math types for the printorient optimizer.
//!
//! Thin wrappers around nalgebra: points, vectors, unit directions and a
//! 4x4 affine transform with the rotations the orientation pipeline needs.

use std::f64::consts::PI;

use nalgebra::{Matrix4, Unit, Vector3, Vector4};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point in a 2D projection plane.
pub type Point2 = nalgebra::Point2<f64>;

/// Canonical build-plate "up" axis of the working frame (+Y).
pub fn up_axis() -> Dir3 {
    Dir3::new_unchecked(Vec3::y())
}

/// Normalize `v`, returning the zero vector when it is too short to have a
/// direction.
pub fn normalize_or_zero(v: &Vec3) -> Vec3 {
    let len = v.norm();
    if len < 1e-12 {
        Vec3::zeros()
    } else {
        v / len
    }
}

/// The coordinate axis along which `v` has the smallest magnitude.
///
/// Ties resolve to X before Y before Z. Crossing `v` with the result never
/// yields a degenerate vector for a non-zero `v`.
pub fn least_significant_axis(v: &Vec3) -> Vec3 {
    let (ax, ay, az) = (v.x.abs(), v.y.abs(), v.z.abs());
    if ax <= ay && ax <= az {
        Vec3::x()
    } else if ay <= az {
        Vec3::y()
    } else {
        Vec3::z()
    }
}

/// A 4x4 affine transformation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Rotation about the X axis by `angle` radians.
    pub fn rotation_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(1, 1)] = c;
        m[(1, 2)] = -s;
        m[(2, 1)] = s;
        m[(2, 2)] = c;
        Self { matrix: m }
    }

    /// Rotation about the Y axis by `angle` radians.
    pub fn rotation_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(0, 0)] = c;
        m[(0, 2)] = s;
        m[(2, 0)] = -s;
        m[(2, 2)] = c;
        Self { matrix: m }
    }

    /// Rotation about an arbitrary axis through the origin by `angle` radians.
    ///
    /// Uses Rodrigues' rotation formula.
    pub fn rotation_about_axis(axis: &Dir3, angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let (x, y, z) = (axis.as_ref().x, axis.as_ref().y, axis.as_ref().z);
        let mut m = Matrix4::identity();
        m[(0, 0)] = t * x * x + c;
        m[(0, 1)] = t * x * y - s * z;
        m[(0, 2)] = t * x * z + s * y;
        m[(1, 0)] = t * x * y + s * z;
        m[(1, 1)] = t * y * y + c;
        m[(1, 2)] = t * y * z - s * x;
        m[(2, 0)] = t * x * z - s * y;
        m[(2, 1)] = t * y * z + s * x;
        m[(2, 2)] = t * z * z + c;
        Self { matrix: m }
    }

    /// Shortest-arc rotation carrying direction `from` onto direction `to`.
    ///
    /// Opposite directions are related by a half turn about an axis
    /// perpendicular to `from`.
    pub fn rotation_between(from: &Dir3, to: &Dir3) -> Self {
        let c = from.dot(to.as_ref()).clamp(-1.0, 1.0);
        if c > 1.0 - 1e-12 {
            return Self::identity();
        }
        if c < -1.0 + 1e-12 {
            let seed = least_significant_axis(from.as_ref());
            let axis = Dir3::new_normalize(from.cross(&seed));
            return Self::rotation_about_axis(&axis, PI);
        }
        let axis = Dir3::new_normalize(from.cross(to.as_ref()));
        Self::rotation_about_axis(&axis, c.acos())
    }

    /// Compose as `self * other`, so `other` is applied first.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
