//! Per-model camera presets.
//!
//! Known models get a hand-tuned starting pose; everything else gets a pose
//! framing the model bounds. A JSON preset file can extend or override the
//! built-in table.

use crate::{Aabb, SceneError};
use glam::Vec3;
use rayview_common::CameraPose;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Lookup table from model file stem to starting camera pose.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetTable {
    presets: BTreeMap<String, CameraPose>,
}

impl PresetTable {
    /// Hand-tuned poses for the models the viewer ships with.
    pub fn builtin() -> Self {
        let mut presets = BTreeMap::new();
        presets.insert(
            "sponza".to_string(),
            CameraPose::new(
                Vec3::new(-1293.07, 154.68, -0.77),
                Vec3::new(-1293.07, 154.68, -0.77) + Vec3::new(1.0, 0.0, 0.0),
                Vec3::Y,
            ),
        );
        presets.insert(
            "bunny".to_string(),
            CameraPose::new(
                Vec3::new(-0.2, 0.25, 0.3),
                Vec3::new(-0.02, 0.1, 0.0),
                Vec3::Y,
            ),
        );
        presets.insert(
            "cornell_box".to_string(),
            CameraPose::new(
                Vec3::new(278.0, 273.0, -800.0),
                Vec3::new(278.0, 273.0, 0.0),
                Vec3::Y,
            ),
        );
        Self { presets }
    }

    /// Load a preset table from a JSON file, validating every pose.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let table: Self = serde_json::from_str(&text)?;
        for (name, pose) in &table.presets {
            pose.validate().map_err(|source| SceneError::BadPreset {
                name: name.clone(),
                source,
            })?;
        }
        tracing::debug!(
            "loaded {} camera presets from {}",
            table.presets.len(),
            path.as_ref().display()
        );
        Ok(table)
    }

    /// Overlay `other` on top of this table; its entries win on conflict.
    pub fn merge(&mut self, other: PresetTable) {
        self.presets.extend(other.presets);
    }

    pub fn get(&self, stem: &str) -> Option<CameraPose> {
        self.presets.get(stem).copied()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

/// Fallback pose for models without a preset: back off from the bounds
/// center along a three-quarter view so the whole model is in frame.
pub fn framing_pose(bounds: &Aabb) -> CameraPose {
    if bounds.is_empty() {
        return CameraPose::new(Vec3::new(0.0, 1.0, 3.0), Vec3::ZERO, Vec3::Y);
    }
    let center = bounds.center();
    let radius = (bounds.diagonal().length() * 0.5).max(1e-3);
    let eye = center + Vec3::new(-0.6, 0.4, 1.0).normalize() * radius * 2.2;
    CameraPose::new(eye, center, Vec3::Y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_poses_are_valid() {
        let table = PresetTable::builtin();
        assert!(table.get("sponza").is_some());
        for name in ["sponza", "bunny", "cornell_box"] {
            let pose = table.get(name).unwrap();
            assert!(pose.validate().is_ok(), "builtin preset {name} degenerate");
        }
        assert!(table.get("unknown_model").is_none());
    }

    #[test]
    fn file_presets_override_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.json");
        std::fs::write(
            &path,
            r#"{"sponza": {"eye": [0, 1, 5], "target": [0, 0, 0], "up": [0, 1, 0]}}"#,
        )
        .unwrap();

        let mut table = PresetTable::builtin();
        table.merge(PresetTable::load(&path).unwrap());
        let pose = table.get("sponza").unwrap();
        assert_eq!(pose.eye, Vec3::new(0.0, 1.0, 5.0));
        // Untouched entries survive the merge.
        assert!(table.get("bunny").is_some());
    }

    #[test]
    fn degenerate_file_preset_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.json");
        std::fs::write(
            &path,
            r#"{"broken": {"eye": [1, 1, 1], "target": [1, 1, 1], "up": [0, 1, 0]}}"#,
        )
        .unwrap();
        assert!(matches!(
            PresetTable::load(&path),
            Err(SceneError::BadPreset { .. })
        ));
    }

    #[test]
    fn framing_pose_is_never_degenerate() {
        let mut bounds = Aabb::empty();
        assert!(framing_pose(&bounds).validate().is_ok());

        bounds.grow(Vec3::ZERO);
        bounds.grow(Vec3::splat(10.0));
        let pose = framing_pose(&bounds);
        assert!(pose.validate().is_ok());
        assert_eq!(pose.target, Vec3::splat(5.0));
    }

    #[test]
    fn framing_pose_for_point_bounds() {
        let mut bounds = Aabb::empty();
        bounds.grow(Vec3::ONE);
        assert!(framing_pose(&bounds).validate().is_ok());
    }
}
