//! 3MF mesh import.
//!
//! A 3MF file is a zip archive. Every `*.model` part in it is parsed, and
//! each `<mesh>` is expanded from its indexed `<vertex>` / `<triangle>`
//! elements into plain triangles. Element names are matched on their local
//! name, so the 2015/02 core namespace, the 2013/01 draft namespace and
//! unqualified documents all load the same way.

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::error::{OrientError, Result};
use crate::mesh::{TriangleSoup, COORDS_PER_TRIANGLE};

/// Decode a 3MF archive into a triangle soup in the file's own frame.
///
/// Model parts that fail to parse are skipped with a warning. Fails when
/// the archive has no model part or no part yields a triangle.
pub fn read_3mf(bytes: &[u8]) -> Result<TriangleSoup> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| invalid(format!("not a zip archive: {e}")))?;

    let mut coords = Vec::new();
    let mut parts = 0;
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| invalid(format!("failed to read archive entry: {e}")))?;
        if file.is_dir() || !file.name().to_ascii_lowercase().ends_with(".model") {
            continue;
        }
        let name = file.name().to_string();
        let mut xml = String::new();
        file.read_to_string(&mut xml)?;
        parts += 1;

        match parse_model(&xml) {
            Ok(part) => {
                debug!(
                    part = %name,
                    triangles = part.len() / COORDS_PER_TRIANGLE,
                    "Parsed 3MF model part"
                );
                coords.extend(part);
            }
            Err(e) => warn!(part = %name, error = %e, "Skipping unreadable 3MF model part"),
        }
    }

    if parts == 0 {
        return Err(invalid("no .model files found"));
    }
    if coords.is_empty() {
        return Err(invalid("no geometry found"));
    }
    let count = coords.len() / COORDS_PER_TRIANGLE;
    TriangleSoup::from_coords(coords, count)
}

/// Read a 3MF file.
pub fn load_3mf(path: impl AsRef<Path>) -> Result<TriangleSoup> {
    read_3mf(&fs::read(path)?)
}

fn invalid(message: impl Into<String>) -> OrientError {
    OrientError::InvalidThreeMf(message.into())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Other,
    Vertices,
    Triangles,
}

/// One `<mesh>` element, still indexed.
#[derive(Default)]
struct MeshPart {
    vertices: Vec<[f32; 3]>,
    triangles: Vec<[usize; 3]>,
}

impl MeshPart {
    fn expand_into(&self, coords: &mut Vec<f32>) -> Result<()> {
        coords.reserve(self.triangles.len() * COORDS_PER_TRIANGLE);
        for tri in &self.triangles {
            for &v in tri {
                let vertex = self.vertices.get(v).ok_or_else(|| {
                    invalid(format!(
                        "triangle references vertex {v} of {}",
                        self.vertices.len()
                    ))
                })?;
                coords.extend_from_slice(vertex);
            }
        }
        Ok(())
    }
}

/// Triangle coordinates of every mesh in one model document.
fn parse_model(xml: &str) -> Result<Vec<f32>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut coords = Vec::new();
    let mut mesh: Option<MeshPart> = None;
    let mut section = Section::Other;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"mesh" => mesh = Some(MeshPart::default()),
                b"vertices" if mesh.is_some() => section = Section::Vertices,
                b"triangles" if mesh.is_some() => section = Section::Triangles,
                _ => add_element(e, section, mesh.as_mut())?,
            },
            Ok(Event::Empty(ref e)) => add_element(e, section, mesh.as_mut())?,
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"mesh" => {
                    if let Some(part) = mesh.take() {
                        part.expand_into(&mut coords)?;
                    }
                    section = Section::Other;
                }
                b"vertices" | b"triangles" => section = Section::Other,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(invalid(format!(
                    "XML error at byte {}: {e}",
                    reader.error_position()
                )))
            }
            _ => {}
        }
    }

    Ok(coords)
}

fn add_element(e: &BytesStart<'_>, section: Section, mesh: Option<&mut MeshPart>) -> Result<()> {
    let Some(mesh) = mesh else {
        return Ok(());
    };
    match (section, e.local_name().as_ref()) {
        (Section::Vertices, b"vertex") => mesh.vertices.push([
            coordinate(e, b"x"),
            coordinate(e, b"y"),
            coordinate(e, b"z"),
        ]),
        (Section::Triangles, b"triangle") => mesh.triangles.push([
            vertex_index(e, b"v1")?,
            vertex_index(e, b"v2")?,
            vertex_index(e, b"v3")?,
        ]),
        _ => {}
    }
    Ok(())
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .and_then(|attr| std::str::from_utf8(&attr.value).ok().map(str::to_string))
}

/// Missing or unparsable coordinates read as zero.
fn coordinate(e: &BytesStart<'_>, name: &[u8]) -> f32 {
    attribute(e, name)
        .and_then(|v| v.trim().parse::<f32>().ok())
        .filter(|v| !v.is_nan())
        .unwrap_or(0.0)
}

fn vertex_index(e: &BytesStart<'_>, name: &[u8]) -> Result<usize> {
    let value = attribute(e, name).ok_or_else(|| {
        invalid(format!(
            "triangle is missing {}",
            String::from_utf8_lossy(name)
        ))
    })?;
    value
        .trim()
        .parse()
        .map_err(|_| invalid(format!("bad vertex index '{value}'")))
}
