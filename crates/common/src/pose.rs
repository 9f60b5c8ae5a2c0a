use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Camera pose: where the eye sits, what it looks at, which way is up.
///
/// Replaced wholesale on every camera change. The session controller never
/// mutates individual fields; it copies a fresh pose out of the input widget
/// and pushes it into the render session, so the two copies are decoupled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

/// Errors from validating a camera pose.
#[derive(Debug, thiserror::Error)]
pub enum PoseError {
    #[error("eye and target coincide at ({0}, {1}, {2})")]
    DegenerateView(f32, f32, f32),
    #[error("up vector is parallel to the view direction")]
    ParallelUp,
}

impl CameraPose {
    pub fn new(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        Self { eye, target, up }
    }

    /// View direction from eye to target. Not normalized.
    pub fn look_dir(&self) -> Vec3 {
        self.target - self.eye
    }

    /// Check the pose invariants: eye and target must be distinct, and the
    /// up vector must not be parallel to the view direction.
    pub fn validate(&self) -> Result<(), PoseError> {
        let dir = self.look_dir();
        if dir.length_squared() < 1e-12 {
            return Err(PoseError::DegenerateView(self.eye.x, self.eye.y, self.eye.z));
        }
        if self.up.length_squared() < 1e-12 {
            return Err(PoseError::ParallelUp);
        }
        let cross = dir.normalize().cross(self.up.normalize());
        if cross.length_squared() < 1e-8 {
            return Err(PoseError::ParallelUp);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_pose_passes() {
        let pose = CameraPose::new(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO, Vec3::Y);
        assert!(pose.validate().is_ok());
    }

    #[test]
    fn coincident_eye_and_target_rejected() {
        let pose = CameraPose::new(Vec3::ONE, Vec3::ONE, Vec3::Y);
        assert!(matches!(
            pose.validate(),
            Err(PoseError::DegenerateView(..))
        ));
    }

    #[test]
    fn parallel_up_rejected() {
        // Looking straight down +Y with up also +Y has no defined frame.
        let pose = CameraPose::new(Vec3::ZERO, Vec3::new(0.0, 3.0, 0.0), Vec3::Y);
        assert!(matches!(pose.validate(), Err(PoseError::ParallelUp)));
    }

    #[test]
    fn zero_up_rejected() {
        let pose = CameraPose::new(Vec3::ZERO, Vec3::X, Vec3::ZERO);
        assert!(matches!(pose.validate(), Err(PoseError::ParallelUp)));
    }
}
