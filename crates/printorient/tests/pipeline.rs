//! End-to-end runs through the public API: STL or 3MF in, orient, STL out.

use std::io::{Cursor, Write};

use approx::assert_abs_diff_eq;
use printorient::stl::binary_size;
use printorient::{
    find_best_orientation, orient_mesh, read_3mf, read_stl, write_stl, BakeOutcome, MeshFormat,
    OrientParams, TriangleSoup,
};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn box_mesh(sx: f32, sy: f32, sz: f32) -> TriangleSoup {
    let c = |i: usize| {
        [
            if i & 1 != 0 { sx } else { 0.0 },
            if i & 2 != 0 { sy } else { 0.0 },
            if i & 4 != 0 { sz } else { 0.0 },
        ]
    };
    let mut mesh = TriangleSoup::new();
    for q in [
        [0, 4, 6, 2],
        [1, 3, 7, 5],
        [0, 1, 5, 4],
        [2, 6, 7, 3],
        [0, 2, 3, 1],
        [4, 5, 7, 6],
    ] {
        mesh.push_triangle(c(q[0]), c(q[1]), c(q[2]));
        mesh.push_triangle(c(q[0]), c(q[2]), c(q[3]));
    }
    mesh
}

/// Pyramid standing on its base in the Y-up frame.
fn pyramid_mesh(base: f32, height: f32) -> TriangleSoup {
    let h = base / 2.0;
    let apex = [0.0, height, 0.0];
    let corners = [[-h, 0.0, -h], [h, 0.0, -h], [h, 0.0, h], [-h, 0.0, h]];
    let mut mesh = TriangleSoup::new();
    mesh.push_triangle(corners[0], corners[1], corners[2]);
    mesh.push_triangle(corners[0], corners[2], corners[3]);
    for i in 0..4 {
        mesh.push_triangle(corners[(i + 1) % 4], corners[i], apex);
    }
    mesh
}

#[test]
fn cube_through_stl() {
    let stl = write_stl(&box_mesh(10.0, 10.0, 10.0));
    assert_eq!(stl.len(), binary_size(12));

    let mut mesh = read_stl(&stl).unwrap().z_up_to_y_up().unwrap();
    let outcome = orient_mesh(&mut mesh, &OrientParams::default()).unwrap();

    // a cube rests on a face whichever axis wins
    let up = outcome.result.up();
    let axis_aligned = [up.x, up.y, up.z]
        .iter()
        .filter(|c| (c.abs() - 1.0).abs() < 1e-6)
        .count();
    assert_eq!(axis_aligned, 1);

    let stats = mesh.stats();
    for d in stats.dimensions {
        assert_abs_diff_eq!(d, 10.0, epsilon = 1e-4);
    }
    let (min, _) = mesh.bounds().unwrap();
    assert_abs_diff_eq!(min.y, 0.0, epsilon = 1e-4);

    let out = write_stl(&mesh.y_up_to_z_up().unwrap());
    assert_eq!(out.len(), 84 + 50 * 12);
}

/// Indexed 10 mm cube packed as a single-part 3MF archive.
fn cube_3mf() -> Vec<u8> {
    let mut vertices = String::new();
    for i in 0..8 {
        let c = |bit: usize| if i & bit != 0 { 10 } else { 0 };
        vertices += &format!(r#"<vertex x="{}" y="{}" z="{}"/>"#, c(1), c(2), c(4));
    }
    let mut triangles = String::new();
    for q in [
        [0, 4, 6, 2],
        [1, 3, 7, 5],
        [0, 1, 5, 4],
        [2, 6, 7, 3],
        [0, 2, 3, 1],
        [4, 5, 7, 6],
    ] {
        for [a, b, c] in [[q[0], q[1], q[2]], [q[0], q[2], q[3]]] {
            triangles += &format!(r#"<triangle v1="{a}" v2="{b}" v3="{c}"/>"#);
        }
    }
    let model = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<model unit="millimeter" xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02">
<resources><object id="1" type="model"><mesh>
<vertices>{vertices}</vertices><triangles>{triangles}</triangles>
</mesh></object></resources><build><item objectid="1"/></build></model>"#
    );

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("3D/3dmodel.model", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(model.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

#[test]
fn cube_through_3mf() {
    let file = read_3mf(&cube_3mf()).unwrap();
    assert_eq!(file.triangle_count(), 12);

    let mut mesh = MeshFormat::ThreeMf.to_working_frame(&file).unwrap();
    orient_mesh(&mut mesh, &OrientParams::default()).unwrap();

    for d in mesh.stats().dimensions {
        assert_abs_diff_eq!(d, 10.0, epsilon = 1e-4);
    }
    let (min, _) = mesh.bounds().unwrap();
    assert_abs_diff_eq!(min.y, 0.0, epsilon = 1e-4);

    let out = write_stl(&mesh.y_up_to_z_up().unwrap());
    assert_eq!(out.len(), binary_size(12));
}

#[test]
fn upright_pyramid_is_left_alone() {
    let mut mesh = pyramid_mesh(20.0, 8.0);
    let before = write_stl(&mesh);

    let outcome = orient_mesh(&mut mesh, &OrientParams::default()).unwrap();
    assert_eq!(outcome.bake, BakeOutcome::AlreadyOptimal);
    assert_eq!(write_stl(&mesh), before);
}

#[test]
fn second_run_is_already_optimal() {
    // lying on its side with the apex along +Z
    let mut mesh = pyramid_mesh(20.0, 8.0).y_up_to_z_up().unwrap();
    let params = OrientParams::default();
    let first = orient_mesh(&mut mesh, &params).unwrap();
    assert!(matches!(first.bake, BakeOutcome::Rotated(_)));

    let second = orient_mesh(&mut mesh, &params).unwrap();
    assert_eq!(second.bake, BakeOutcome::AlreadyOptimal);
    assert_abs_diff_eq!(second.result.direction[1], 1.0, epsilon = 0.01);
}

#[test]
fn inverted_pyramid_is_flipped() {
    let mut mesh = pyramid_mesh(20.0, 8.0).y_up_to_z_up().unwrap();
    // y_up_to_z_up leaves the apex along +Z; going once more lays it upside down
    mesh = mesh.y_up_to_z_up().unwrap();

    let outcome = orient_mesh(&mut mesh, &OrientParams::default()).unwrap();
    let BakeOutcome::Rotated(baked) = outcome.bake else {
        panic!("expected the mesh to be rotated");
    };
    assert_eq!(baked.stl.len(), binary_size(6));

    let (min, max) = mesh.bounds().unwrap();
    assert_abs_diff_eq!(min.y, 0.0, epsilon = 1e-4);
    assert_abs_diff_eq!(max.y, 8.0, epsilon = 1e-4);
    assert_abs_diff_eq!(min.x + max.x, 0.0, epsilon = 1e-4);
    assert_abs_diff_eq!(min.z + max.z, 0.0, epsilon = 1e-4);
}

#[test]
fn flat_mesh_falls_back_to_reference_directions() {
    let mut mesh = TriangleSoup::new();
    mesh.push_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]);
    mesh.push_triangle([1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]);

    let result = find_best_orientation(&mesh, &OrientParams::default()).unwrap();
    assert!(result.cost.is_finite());
    assert!(result.candidate_count >= 18);
}
