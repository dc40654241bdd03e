//! Committing a chosen orientation to the mesh.

use printorient_math::{up_axis, Dir3, Point3, Transform, Vec3};
use tracing::info;

use crate::error::{OrientError, Result};
use crate::mesh::{MeshStats, TriangleSoup};
use crate::stl::write_stl;

/// What baking did to the mesh.
#[derive(Debug, Clone, PartialEq)]
pub enum BakeOutcome {
    /// The direction already points up; the mesh was not touched.
    AlreadyOptimal,
    /// The mesh was rotated and placed on the build plate.
    Rotated(BakedMesh),
}

/// A mesh after rotation and placement.
#[derive(Debug, Clone, PartialEq)]
pub struct BakedMesh {
    /// Dimensions and triangle count after placement.
    pub stats: MeshStats,
    /// The placed mesh as binary STL.
    pub stl: Vec<u8>,
    /// Rotation followed by placement, as applied to the mesh.
    pub transform: Transform,
}

/// True when `direction` matches +Y within `tolerance` on every component.
pub fn is_already_optimal(direction: &Vec3, tolerance: f64) -> bool {
    (direction.y - 1.0).abs() < tolerance
        && direction.x.abs() < tolerance
        && direction.z.abs() < tolerance
}

/// Transform that rotates `direction` onto +Y, then centers the footprint on
/// the X/Z origin and rests the lowest point on y = 0.
pub fn placement_transform(mesh: &TriangleSoup, direction: &Vec3) -> Result<Transform> {
    let from = Dir3::try_new(*direction, 1e-12).ok_or(OrientError::ZeroDirection)?;
    let rotation = Transform::rotation_between(&from, &up_axis());

    let mut positions = mesh.positions().map(|p| rotation.apply_point(&p));
    let first = positions.next().ok_or(OrientError::EmptyMesh)?;
    let (min, max) = positions.fold((first, first), |(lo, hi), p| (lo.inf(&p), hi.sup(&p)));
    let center = Point3::from((min.coords + max.coords) / 2.0);

    Ok(Transform::translation(-center.x, -min.y, -center.z).then(&rotation))
}

/// Rotate `mesh` so `direction` points up and place it on the build plate.
///
/// The mesh is replaced only after the whole transform has succeeded; on
/// error it is left as it was.
pub fn bake_orientation(
    mesh: &mut TriangleSoup,
    direction: &Vec3,
    tolerance: f64,
) -> Result<BakeOutcome> {
    if is_already_optimal(direction, tolerance) {
        info!("Mesh already in optimal orientation");
        return Ok(BakeOutcome::AlreadyOptimal);
    }

    let transform = placement_transform(mesh, direction)?;
    let placed = mesh.transformed(&transform)?;
    *mesh = placed;

    let stats = mesh.stats();
    info!(
        triangles = stats.triangle_count,
        dimensions = %stats,
        "Baked orientation"
    );
    Ok(BakeOutcome::Rotated(BakedMesh {
        stats,
        stl: write_stl(mesh),
        transform,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::box_mesh;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_already_optimal() {
        assert!(is_already_optimal(&Vec3::new(0.005, 0.999, -0.005), 0.01));
        assert!(!is_already_optimal(&Vec3::new(0.02, 0.999, 0.0), 0.01));
        assert!(!is_already_optimal(&-Vec3::y(), 0.01));
    }

    #[test]
    fn test_already_optimal_leaves_mesh_untouched() {
        let mut mesh = box_mesh(3.0, 4.0, 5.0);
        let before = write_stl(&mesh);
        let outcome = bake_orientation(&mut mesh, &Vec3::y(), 0.01).unwrap();
        assert_eq!(outcome, BakeOutcome::AlreadyOptimal);
        assert_eq!(write_stl(&mesh), before);
    }

    #[test]
    fn test_bake_rests_on_plate_and_centers() {
        let mut mesh = box_mesh(10.0, 20.0, 30.0);
        let outcome = bake_orientation(&mut mesh, &Vec3::x(), 0.01).unwrap();
        let BakeOutcome::Rotated(baked) = outcome else {
            panic!("expected a rotation");
        };

        let (min, max) = mesh.bounds().unwrap();
        assert_abs_diff_eq!(min.y, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!((min.x + max.x) / 2.0, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!((min.z + max.z) / 2.0, 0.0, epsilon = 1e-5);
        // the 10 mm X extent is now the height
        assert_abs_diff_eq!(baked.stats.dimensions[1], 10.0, epsilon = 1e-5);
        assert_eq!(baked.stats.triangle_count, 12);
        assert_eq!(baked.stl, write_stl(&mesh));
    }

    #[test]
    fn test_bake_upside_down() {
        let mut mesh = box_mesh(10.0, 20.0, 30.0);
        bake_orientation(&mut mesh, &-Vec3::y(), 0.01).unwrap();
        let stats = mesh.stats();
        assert_abs_diff_eq!(stats.dimensions[1], 20.0, epsilon = 1e-5);
        assert_abs_diff_eq!(mesh.bounds().unwrap().0.y, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_zero_direction_leaves_mesh_untouched() {
        let mut mesh = box_mesh(1.0, 1.0, 1.0);
        let before = mesh.clone();
        let err = bake_orientation(&mut mesh, &Vec3::zeros(), 0.01);
        assert!(matches!(err, Err(OrientError::ZeroDirection)));
        assert_eq!(mesh, before);
    }
}
