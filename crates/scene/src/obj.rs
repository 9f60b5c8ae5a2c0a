//! Minimal Wavefront OBJ loader.
//!
//! Reads vertex positions and faces only; normals, texture coordinates, and
//! material libraries are skipped (the renderer derives face normals
//! itself). Each `o`/`g` group becomes its own [`TriMesh`] with a private
//! vertex pool, polygons are fan-triangulated, and both 1-based and
//! negative (relative) indices are accepted.

use crate::{mesh_color, Model, SceneError, TriMesh};
use glam::Vec3;
use std::collections::HashMap;
use std::path::Path;

/// Load a model from an OBJ file on disk.
pub fn load(path: impl AsRef<Path>) -> Result<Model, SceneError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let model = parse(&text)?;
    tracing::info!(
        "loaded {} ({} meshes, {} triangles)",
        path.display(),
        model.meshes.len(),
        model.triangle_count()
    );
    Ok(model)
}

/// Parse OBJ text into a model.
pub fn parse(text: &str) -> Result<Model, SceneError> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut meshes: Vec<TriMesh> = Vec::new();
    let mut current = MeshBuilder::new("default");

    for (idx, raw_line) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut tokens = trimmed.split_whitespace();
        let keyword = tokens.next().unwrap_or_default();
        match keyword {
            "v" => {
                let p = parse_position(&mut tokens, line)?;
                positions.push(p);
            }
            "o" | "g" => {
                let name = tokens.next().unwrap_or("default");
                current.flush_into(&mut meshes);
                current = MeshBuilder::new(name);
            }
            "f" => {
                let face = parse_face(&mut tokens, &positions, line)?;
                current.push_face(&face, &positions);
            }
            // vn/vt/mtllib/usemtl/s and anything else: ignored.
            _ => {}
        }
    }
    current.flush_into(&mut meshes);

    if meshes.iter().all(|m| m.indices.is_empty()) {
        return Err(SceneError::EmptyModel);
    }
    Ok(Model { meshes })
}

fn parse_position<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<Vec3, SceneError> {
    let mut coords = [0.0f32; 3];
    for c in &mut coords {
        let tok = tokens.next().ok_or_else(|| SceneError::Parse {
            line,
            msg: "vertex needs three coordinates".into(),
        })?;
        *c = tok.parse().map_err(|_| SceneError::Parse {
            line,
            msg: format!("bad coordinate {tok:?}"),
        })?;
    }
    Ok(Vec3::from_array(coords))
}

/// Resolve the face's vertex references into absolute position indices.
fn parse_face<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    positions: &[Vec3],
    line: usize,
) -> Result<Vec<u32>, SceneError> {
    let mut face = Vec::new();
    for tok in tokens {
        // "v", "v/vt", "v//vn", "v/vt/vn" — only the position field matters.
        let field = tok.split('/').next().unwrap_or_default();
        let raw: i64 = field.parse().map_err(|_| SceneError::Parse {
            line,
            msg: format!("bad face index {tok:?}"),
        })?;
        let resolved = if raw > 0 {
            raw - 1
        } else if raw < 0 {
            positions.len() as i64 + raw
        } else {
            -1 // OBJ indices are 1-based; zero is always invalid
        };
        if resolved < 0 || resolved as usize >= positions.len() {
            return Err(SceneError::Parse {
                line,
                msg: format!("face index {raw} out of range"),
            });
        }
        face.push(resolved as u32);
    }
    if face.len() < 3 {
        return Err(SceneError::Parse {
            line,
            msg: "face needs at least three vertices".into(),
        });
    }
    Ok(face)
}

/// Accumulates one mesh, remapping global OBJ indices to a local pool.
struct MeshBuilder {
    name: String,
    positions: Vec<Vec3>,
    indices: Vec<[u32; 3]>,
    remap: HashMap<u32, u32>,
}

impl MeshBuilder {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            positions: Vec::new(),
            indices: Vec::new(),
            remap: HashMap::new(),
        }
    }

    fn local_index(&mut self, global: u32, positions: &[Vec3]) -> u32 {
        *self.remap.entry(global).or_insert_with(|| {
            self.positions.push(positions[global as usize]);
            (self.positions.len() - 1) as u32
        })
    }

    fn push_face(&mut self, face: &[u32], positions: &[Vec3]) {
        // Fan triangulation around the first vertex.
        for i in 1..face.len() - 1 {
            let tri = [
                self.local_index(face[0], positions),
                self.local_index(face[i], positions),
                self.local_index(face[i + 1], positions),
            ];
            self.indices.push(tri);
        }
    }

    fn flush_into(self, meshes: &mut Vec<TriMesh>) {
        if self.indices.is_empty() {
            return;
        }
        let color = mesh_color(meshes.len());
        meshes.push(TriMesh {
            name: self.name,
            positions: self.positions,
            indices: self.indices,
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_TRIANGLES: &str = "\
# comment
v 0 0 0
v 1 0 0
v 0 1 0
v 0 0 1
f 1 2 3
f 1 2 4
";

    #[test]
    fn parses_triangles_into_default_mesh() {
        let model = parse(TWO_TRIANGLES).unwrap();
        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.meshes[0].name, "default");
        assert_eq!(model.triangle_count(), 2);
        // Shared vertices are pooled once per mesh.
        assert_eq!(model.meshes[0].positions.len(), 4);
    }

    #[test]
    fn groups_become_separate_meshes() {
        let text = "\
v 0 0 0
v 1 0 0
v 0 1 0
o floor
f 1 2 3
o wall
f 3 2 1
";
        let model = parse(text).unwrap();
        assert_eq!(model.meshes.len(), 2);
        assert_eq!(model.meshes[0].name, "floor");
        assert_eq!(model.meshes[1].name, "wall");
        assert_ne!(model.meshes[0].color, model.meshes[1].color);
    }

    #[test]
    fn quad_fan_triangulates() {
        let text = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let model = parse(text).unwrap();
        assert_eq!(model.triangle_count(), 2);
    }

    #[test]
    fn negative_indices_resolve_relative_to_end() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let model = parse(text).unwrap();
        assert_eq!(model.meshes[0].indices[0], [0, 1, 2]);
    }

    #[test]
    fn slash_fields_use_position_only() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/1/1 2//2 3/3\n";
        assert_eq!(parse(text).unwrap().triangle_count(), 1);
    }

    #[test]
    fn out_of_range_index_reports_line() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n";
        match parse(text) {
            Err(SceneError::Parse { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn zero_index_rejected() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n";
        assert!(matches!(parse(text), Err(SceneError::Parse { .. })));
    }

    #[test]
    fn bad_coordinate_rejected() {
        let text = "v 0 zero 0\n";
        assert!(matches!(
            parse(text),
            Err(SceneError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn vertices_without_faces_is_empty_model() {
        assert!(matches!(parse("v 0 0 0\n"), Err(SceneError::EmptyModel)));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.obj");
        std::fs::write(&path, TWO_TRIANGLES).unwrap();
        let model = load(&path).unwrap();
        assert_eq!(model.triangle_count(), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            load("/nonexistent/model.obj"),
            Err(SceneError::Io(_))
        ));
    }
}
