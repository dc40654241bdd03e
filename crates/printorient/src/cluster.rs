//! Area-weighted grouping of face normals into dominant directions.

use std::collections::HashMap;

use printorient_math::{normalize_or_zero, Vec3};

use crate::face::Face;

/// A dominant normal direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cluster {
    /// Area-weighted mean normal, normalized.
    pub direction: Vec3,
    /// Total area of the faces in the bucket.
    pub area: f64,
}

#[derive(Default)]
struct Bucket {
    weighted: Vec3,
    area: f64,
}

/// Bucket key for a normal: each component scaled by `resolution` and
/// rounded half-up.
fn bucket_key(n: &Vec3, resolution: f64) -> (i64, i64, i64) {
    let q = |c: f64| (c * resolution + 0.5).floor() as i64;
    (q(n.x), q(n.y), q(n.z))
}

/// Group `faces` by quantized normal and return the `top_n` largest
/// clusters by area.
///
/// Buckets whose normalized resultant does not exceed `min_resultant` are
/// dropped. Equal areas keep the order in which their buckets were first
/// seen.
pub fn cluster_normals(
    faces: &[Face],
    top_n: usize,
    resolution: f64,
    min_resultant: f64,
) -> Vec<Cluster> {
    let mut index: HashMap<(i64, i64, i64), usize> = HashMap::new();
    let mut buckets: Vec<Bucket> = Vec::new();

    for face in faces {
        let slot = *index
            .entry(bucket_key(&face.normal, resolution))
            .or_insert_with(|| {
                buckets.push(Bucket::default());
                buckets.len() - 1
            });
        let bucket = &mut buckets[slot];
        bucket.weighted += face.normal * face.area;
        bucket.area += face.area;
    }

    let mut clusters: Vec<Cluster> = buckets
        .into_iter()
        .filter_map(|b| {
            let direction = normalize_or_zero(&b.weighted);
            (direction.norm() > min_resultant).then_some(Cluster {
                direction,
                area: b.area,
            })
        })
        .collect();

    clusters.sort_by(|a, b| b.area.total_cmp(&a.area));
    clusters.truncate(top_n);
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use printorient_math::Point3;

    fn face(normal: Vec3, area: f64) -> Face {
        Face {
            normal,
            area,
            vertices: [Point3::origin(); 3],
        }
    }

    #[test]
    fn test_clusters_sorted_by_area() {
        let faces = vec![
            face(Vec3::x(), 1.0),
            face(Vec3::y(), 5.0),
            face(Vec3::y(), 5.0),
            face(-Vec3::z(), 3.0),
        ];
        let clusters = cluster_normals(&faces, 10, 50.0, 0.5);
        assert_eq!(clusters.len(), 3);
        assert_relative_eq!(clusters[0].direction, Vec3::y());
        assert_relative_eq!(clusters[0].area, 10.0);
        assert_relative_eq!(clusters[1].direction, -Vec3::z());
        assert_relative_eq!(clusters[2].direction, Vec3::x());
    }

    #[test]
    fn test_nearby_normals_share_bucket() {
        let tilted = Vec3::new(0.004, 1.0, 0.0).normalize();
        let faces = vec![face(Vec3::y(), 1.0), face(tilted, 3.0)];
        let clusters = cluster_normals(&faces, 10, 50.0, 0.5);
        assert_eq!(clusters.len(), 1);
        assert_relative_eq!(clusters[0].area, 4.0);
        assert_relative_eq!(clusters[0].direction.norm(), 1.0, epsilon = 1e-12);
        assert!(clusters[0].direction.x > 0.0 && clusters[0].direction.x < 0.004);
    }

    #[test]
    fn test_top_n_truncates() {
        let faces = vec![
            face(Vec3::x(), 4.0),
            face(Vec3::y(), 3.0),
            face(Vec3::z(), 2.0),
        ];
        let clusters = cluster_normals(&faces, 2, 50.0, 0.5);
        assert_eq!(clusters.len(), 2);
        assert_relative_eq!(clusters[1].direction, Vec3::y());
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let faces = vec![face(Vec3::z(), 2.0), face(Vec3::x(), 2.0)];
        let clusters = cluster_normals(&faces, 10, 50.0, 0.5);
        assert_relative_eq!(clusters[0].direction, Vec3::z());
        assert_relative_eq!(clusters[1].direction, Vec3::x());
    }

    #[test]
    fn test_zero_normals_dropped() {
        let faces = vec![face(Vec3::zeros(), 2.0)];
        assert!(cluster_normals(&faces, 10, 50.0, 0.5).is_empty());
    }
}
