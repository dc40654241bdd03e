//! Meshes shared by unit tests.

use crate::mesh::TriangleSoup;

/// Axis-aligned box spanning `[0, sx] x [0, sy] x [0, sz]`, outward wound.
pub fn box_mesh(sx: f32, sy: f32, sz: f32) -> TriangleSoup {
    let c = |i: usize| {
        [
            if i & 1 != 0 { sx } else { 0.0 },
            if i & 2 != 0 { sy } else { 0.0 },
            if i & 4 != 0 { sz } else { 0.0 },
        ]
    };
    let quads = [
        [0, 4, 6, 2], // -x
        [1, 3, 7, 5], // +x
        [0, 1, 5, 4], // -y
        [2, 6, 7, 3], // +y
        [0, 2, 3, 1], // -z
        [4, 5, 7, 6], // +z
    ];
    let mut mesh = TriangleSoup::new();
    for q in quads {
        mesh.push_triangle(c(q[0]), c(q[1]), c(q[2]));
        mesh.push_triangle(c(q[0]), c(q[2]), c(q[3]));
    }
    mesh
}

/// Square pyramid with a `base` x `base` footprint on y = 0 and its apex at
/// `height`.
pub fn pyramid_mesh(base: f32, height: f32) -> TriangleSoup {
    let h = base / 2.0;
    let apex = [0.0, height, 0.0];
    let corners = [[-h, 0.0, -h], [h, 0.0, -h], [h, 0.0, h], [-h, 0.0, h]];
    let mut mesh = TriangleSoup::new();
    // base faces -Y
    mesh.push_triangle(corners[0], corners[1], corners[2]);
    mesh.push_triangle(corners[0], corners[2], corners[3]);
    for i in 0..4 {
        mesh.push_triangle(corners[(i + 1) % 4], corners[i], apex);
    }
    mesh
}
