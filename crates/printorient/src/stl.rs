//! STL reading and writing.
//!
//! Output is always binary: [`DEFAULT_HEADER`] zero-padded to 80 bytes, the
//! triangle count as a little-endian `u32`, then one 50-byte record per
//! triangle holding the normal and three vertices as `f32` plus a zero `u16`.
//! Normals are recomputed from the winding on write and ignored on read.
//!
//! Input may be binary or ASCII. Data counts as binary when its length is
//! within 10 bytes of what the count at offset 80 implies.

use std::fs;
use std::path::Path;

use printorient_math::Vec3;

use crate::error::{OrientError, Result};
use crate::face::Face;
use crate::mesh::{TriangleSoup, COORDS_PER_TRIANGLE};

/// STL binary header size in bytes.
pub const HEADER_SIZE: usize = 80;

/// Size of one triangle record in binary STL.
pub const TRIANGLE_SIZE: usize = 50;

/// Header text written by [`write_stl`].
pub const DEFAULT_HEADER: &str = "binary STL by printorient";

/// Byte length of a binary STL holding `triangles` triangles.
pub fn binary_size(triangles: usize) -> usize {
    HEADER_SIZE + 4 + TRIANGLE_SIZE * triangles
}

/// Encode `mesh` as binary STL with the default header.
pub fn write_stl(mesh: &TriangleSoup) -> Vec<u8> {
    write_stl_with_header(mesh, DEFAULT_HEADER)
}

/// Encode `mesh` as binary STL.
///
/// `header` is truncated to 80 bytes and zero-padded. Normals are
/// recomputed from the vertices; degenerate triangles get a zero normal.
pub fn write_stl_with_header(mesh: &TriangleSoup, header: &str) -> Vec<u8> {
    let count = mesh.triangle_count();
    let mut data = Vec::with_capacity(binary_size(count));

    let mut head = [0u8; HEADER_SIZE];
    let text = header.as_bytes();
    let n = text.len().min(HEADER_SIZE);
    head[..n].copy_from_slice(&text[..n]);
    data.extend_from_slice(&head);
    data.extend_from_slice(&(count as u32).to_le_bytes());

    for (tri, [a, b, c]) in mesh
        .coords()
        .chunks_exact(COORDS_PER_TRIANGLE)
        .zip(mesh.triangles())
    {
        let normal = Face::from_vertices(a, b, c).map_or(Vec3::zeros(), |f| f.normal);
        for v in [normal.x, normal.y, normal.z] {
            data.extend_from_slice(&(v as f32).to_le_bytes());
        }
        for v in tri {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(&0u16.to_le_bytes());
    }

    data
}

/// Decode binary or ASCII STL.
///
/// The data is treated as binary when its length is within 10 bytes of what
/// the triangle count at offset 80 implies; otherwise it is parsed as ASCII.
pub fn read_stl(bytes: &[u8]) -> Result<TriangleSoup> {
    if bytes.len() >= HEADER_SIZE + 4 {
        let count = u32::from_le_bytes([
            bytes[HEADER_SIZE],
            bytes[HEADER_SIZE + 1],
            bytes[HEADER_SIZE + 2],
            bytes[HEADER_SIZE + 3],
        ]) as usize;
        let expected = binary_size(count);
        if expected.abs_diff(bytes.len()) < 10 {
            return read_binary(bytes, count, expected);
        }
    }
    read_ascii(bytes)
}

fn read_binary(bytes: &[u8], count: usize, expected: usize) -> Result<TriangleSoup> {
    if bytes.len() < expected {
        return Err(OrientError::TruncatedStl {
            expected,
            got: bytes.len(),
        });
    }
    let mut coords = Vec::with_capacity(count * COORDS_PER_TRIANGLE);
    for record in bytes[HEADER_SIZE + 4..expected].chunks_exact(TRIANGLE_SIZE) {
        // skip the stored normal, keep the 9 vertex floats
        for v in record[12..48].chunks_exact(4) {
            coords.push(f32::from_le_bytes([v[0], v[1], v[2], v[3]]));
        }
    }
    TriangleSoup::from_coords(coords, count)
}

fn read_ascii(bytes: &[u8]) -> Result<TriangleSoup> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| OrientError::InvalidStl("not binary and not UTF-8 text".into()))?;
    if !text.trim_start().to_ascii_lowercase().starts_with("solid") {
        return Err(OrientError::InvalidStl("missing 'solid' keyword".into()));
    }

    let mut coords = Vec::new();
    let mut facet: Vec<f32> = Vec::with_capacity(COORDS_PER_TRIANGLE);
    let mut tokens = text.split_whitespace();
    while let Some(token) = tokens.next() {
        if token.eq_ignore_ascii_case("vertex") {
            for _ in 0..3 {
                let value = tokens
                    .next()
                    .ok_or_else(|| OrientError::InvalidStl("vertex is missing coordinates".into()))?;
                let parsed = value.parse::<f32>().map_err(|_| {
                    OrientError::InvalidStl(format!("bad vertex coordinate '{value}'"))
                })?;
                facet.push(parsed);
            }
        } else if token.eq_ignore_ascii_case("endfacet") {
            if facet.len() != COORDS_PER_TRIANGLE {
                return Err(OrientError::InvalidStl(format!(
                    "facet has {} vertices, expected 3",
                    facet.len() / 3
                )));
            }
            coords.append(&mut facet);
        }
    }
    if !facet.is_empty() {
        return Err(OrientError::InvalidStl("unterminated facet".into()));
    }

    let count = coords.len() / COORDS_PER_TRIANGLE;
    TriangleSoup::from_coords(coords, count)
}

/// Read an STL file.
pub fn load_stl(path: impl AsRef<Path>) -> Result<TriangleSoup> {
    read_stl(&fs::read(path)?)
}

/// Write `mesh` to a binary STL file.
pub fn save_stl(path: impl AsRef<Path>, mesh: &TriangleSoup) -> Result<()> {
    fs::write(path, write_stl(mesh))?;
    Ok(())
}

/// Output name for an oriented copy of `file_name`: the extension is
/// replaced by `_oriented.stl`.
pub fn oriented_file_name(file_name: Option<&str>) -> String {
    let stem = file_name
        .map(|name| match name.rfind('.') {
            Some(dot) if dot > 0 => &name[..dot],
            _ => name,
        })
        .filter(|stem| !stem.is_empty())
        .unwrap_or("model");
    format!("{stem}_oriented.stl")
}
