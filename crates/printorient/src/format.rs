//! Mesh file formats and their load-time frames.

use std::f64::consts::FRAC_PI_2;
use std::fs;
use std::path::Path;

use printorient_math::Transform;

use crate::error::{OrientError, Result};
use crate::mesh::TriangleSoup;
use crate::{stl, threemf};

/// A mesh file format that can be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    /// Binary or ASCII STL.
    Stl,
    /// 3MF archive.
    ThreeMf,
}

impl MeshFormat {
    /// Pick the format from a file extension, ignoring case.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("stl") => Ok(Self::Stl),
            Some("3mf") => Ok(Self::ThreeMf),
            _ => Err(OrientError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Decode file contents in the file's own frame.
    pub fn read(self, bytes: &[u8]) -> Result<TriangleSoup> {
        match self {
            Self::Stl => stl::read_stl(bytes),
            Self::ThreeMf => threemf::read_3mf(bytes),
        }
    }

    /// Rotation from the file's frame into the Y-up working frame.
    ///
    /// STL is taken as Z-up. 3MF is turned a quarter about X and then a
    /// quarter about Y, which maps +Z to -Y and +X to -Z.
    pub fn load_transform(self) -> Transform {
        match self {
            Self::Stl => Transform::rotation_x(-FRAC_PI_2),
            Self::ThreeMf => {
                Transform::rotation_y(FRAC_PI_2).then(&Transform::rotation_x(FRAC_PI_2))
            }
        }
    }

    /// Rotate a freshly read mesh into the working frame.
    pub fn to_working_frame(self, mesh: &TriangleSoup) -> Result<TriangleSoup> {
        mesh.transformed(&self.load_transform())
    }
}

/// Read a mesh file, choosing the format from its extension. The mesh is
/// returned in the file's own frame.
pub fn load_mesh(path: impl AsRef<Path>) -> Result<(MeshFormat, TriangleSoup)> {
    let path = path.as_ref();
    let format = MeshFormat::from_path(path)?;
    let mesh = format.read(&fs::read(path)?)?;
    Ok((format, mesh))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use printorient_math::{Point3, Vec3};

    fn image(format: MeshFormat, v: Vec3) -> Vec3 {
        format.load_transform().apply_point(&Point3::from(v)).coords
    }

    #[test]
    fn test_format_from_extension() {
        let format = |p: &str| MeshFormat::from_path(Path::new(p)).unwrap();
        assert_eq!(format("a.stl"), MeshFormat::Stl);
        assert_eq!(format("dir/B.STL"), MeshFormat::Stl);
        assert_eq!(format("part.3MF"), MeshFormat::ThreeMf);
        assert!(matches!(
            MeshFormat::from_path(Path::new("part.obj")),
            Err(OrientError::UnsupportedFormat(_))
        ));
        assert!(MeshFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_threemf_frame() {
        let z = image(MeshFormat::ThreeMf, Vec3::z());
        assert_relative_eq!(z, -Vec3::y(), epsilon = 1e-12);
        let x = image(MeshFormat::ThreeMf, Vec3::x());
        assert_relative_eq!(x, -Vec3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_stl_frame_matches_z_up_conversion() {
        let mut mesh = TriangleSoup::new();
        mesh.push_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 5.0]);
        let via_format = MeshFormat::Stl.to_working_frame(&mesh).unwrap();
        let via_mesh = mesh.z_up_to_y_up().unwrap();
        for (a, b) in via_format.coords().iter().zip(via_mesh.coords()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-6);
        }
        assert_relative_eq!(via_format.coords()[7], 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_load_mesh_rejects_unknown_extension() {
        let err = load_mesh("model.step");
        assert!(matches!(err, Err(OrientError::UnsupportedFormat(_))));
    }
}
