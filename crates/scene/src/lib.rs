//! Scene loading: triangle models from OBJ files, world bounds, and
//! per-model camera presets.
//!
//! This is configuration and I/O glue around the viewer core. The renderer
//! consumes a [`Model`] by value; nothing here is touched again once the
//! interactive loop is running.

pub mod obj;
pub mod presets;

use glam::Vec3;
use rayview_common::PoseError;

pub use presets::{framing_pose, PresetTable};

/// Errors from loading a scene or its camera presets.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OBJ parse error at line {line}: {msg}")]
    Parse { line: usize, msg: String },
    #[error("model contains no triangles")]
    EmptyModel,
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("camera preset {name:?} is degenerate: {source}")]
    BadPreset {
        name: String,
        #[source]
        source: PoseError,
    },
}

/// One triangle mesh: an OBJ object/group with its own vertex pool.
#[derive(Debug, Clone)]
pub struct TriMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    /// Indices into `positions`, three per triangle.
    pub indices: Vec<[u32; 3]>,
    /// Flat debug albedo, derived deterministically from the mesh index.
    pub color: Vec3,
}

impl TriMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    pub fn bounds(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        for p in &self.positions {
            aabb.grow(*p);
        }
        aabb
    }
}

/// A loaded model: one or more triangle meshes.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub meshes: Vec<TriMesh>,
}

impl Model {
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(TriMesh::triangle_count).sum()
    }

    /// Axis-aligned bounds over every mesh.
    pub fn bounds(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        for mesh in &self.meshes {
            aabb.union(&mesh.bounds());
        }
        aabb
    }

    /// Characteristic length used to scale camera motion: half the
    /// bounding-box diagonal, floored at 1 so tiny models stay steerable.
    pub fn world_scale(&self) -> f32 {
        let b = self.bounds();
        if b.is_empty() {
            return 1.0;
        }
        (b.diagonal().length() * 0.5).max(1.0)
    }
}

/// Axis-aligned bounding box. Empty boxes have `min > max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    pub fn grow(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn diagonal(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Deterministic debug color for mesh `index`. Same palette every run so
/// screenshots are comparable.
pub fn mesh_color(index: usize) -> Vec3 {
    // splitmix-style integer scramble, then spread the bits over RGB.
    let mut h = index as u64 ^ 0x9e37_79b9_7f4a_7c15;
    h ^= h >> 30;
    h = h.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h ^= h >> 27;
    let r = (h & 0xff) as f32 / 255.0;
    let g = (h >> 8 & 0xff) as f32 / 255.0;
    let b = (h >> 16 & 0xff) as f32 / 255.0;
    // Keep colors out of the dark corner so shading stays visible.
    Vec3::new(r, g, b) * 0.7 + Vec3::splat(0.3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_mesh_model() -> Model {
        Model {
            meshes: vec![
                TriMesh {
                    name: "a".into(),
                    positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
                    indices: vec![[0, 1, 2]],
                    color: mesh_color(0),
                },
                TriMesh {
                    name: "b".into(),
                    positions: vec![Vec3::splat(4.0), Vec3::new(5.0, 4.0, 4.0), Vec3::new(4.0, 5.0, 4.0)],
                    indices: vec![[0, 1, 2]],
                    color: mesh_color(1),
                },
            ],
        }
    }

    #[test]
    fn bounds_cover_all_meshes() {
        let model = two_mesh_model();
        let b = model.bounds();
        assert_eq!(b.min, Vec3::ZERO);
        assert_eq!(b.max, Vec3::new(5.0, 5.0, 4.0));
        assert_eq!(model.triangle_count(), 2);
    }

    #[test]
    fn empty_model_has_unit_world_scale() {
        let model = Model::default();
        assert!(model.bounds().is_empty());
        assert_eq!(model.world_scale(), 1.0);
    }

    #[test]
    fn mesh_colors_are_stable_and_distinct() {
        assert_eq!(mesh_color(7), mesh_color(7));
        assert_ne!(mesh_color(0), mesh_color(1));
        let c = mesh_color(3);
        assert!(c.min_element() >= 0.3 && c.max_element() <= 1.0);
    }
}
