use glam::Vec3;
use rayview_common::CameraPose;
use rayview_session::CameraWidget;

const ROTATE_SENSITIVITY: f32 = 0.005;
const PAN_SENSITIVITY: f32 = 0.0015;
const ZOOM_STEP: f32 = 0.1;
const MAX_PITCH: f32 = 1.55; // just short of straight up/down, in radians

/// Orbit-style camera widget: the eye circles a target point.
///
/// Every mutation raises the modified flag; the session controller reads
/// and clears it once per loop iteration through [`CameraWidget`]. Pitch
/// and distance limits keep every pose this widget hands out valid.
pub struct OrbitCamera {
    target: Vec3,
    distance: f32,
    yaw: f32,
    pitch: f32,
    /// Characteristic scene size; scales pan speed and the minimum zoom.
    world_scale: f32,
    modified: bool,
}

impl OrbitCamera {
    /// Derive orbit parameters from a starting pose.
    ///
    /// The widget orbits around the pose's target. A degenerate pose (eye
    /// on top of target) falls back to a unit orbit distance.
    pub fn from_pose(pose: CameraPose, world_scale: f32) -> Self {
        let offset = pose.eye - pose.target;
        let distance = offset.length().max(world_scale * 1e-3).max(1e-3);
        let (yaw, pitch) = if offset.length_squared() > 1e-12 {
            (
                offset.x.atan2(offset.z),
                (offset.y / distance).clamp(-1.0, 1.0).asin().clamp(-MAX_PITCH, MAX_PITCH),
            )
        } else {
            (0.0, 0.0)
        };
        Self {
            target: pose.target,
            distance,
            yaw,
            pitch,
            world_scale: world_scale.max(1e-3),
            modified: false,
        }
    }

    fn offset_dir(&self) -> Vec3 {
        Vec3::new(
            self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.cos() * self.pitch.cos(),
        )
    }

    pub fn eye(&self) -> Vec3 {
        self.target + self.offset_dir() * self.distance
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Rotate by a mouse delta in pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * ROTATE_SENSITIVITY;
        self.pitch = (self.pitch + dy * ROTATE_SENSITIVITY).clamp(-MAX_PITCH, MAX_PITCH);
        self.modified = true;
    }

    /// Slide the target across the view plane.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let forward = -self.offset_dir();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);
        let step = self.distance * PAN_SENSITIVITY;
        self.target += (right * -dx + up * dy) * step;
        self.modified = true;
    }

    /// Zoom by scroll ticks; positive moves the eye closer.
    pub fn zoom(&mut self, ticks: f32) {
        self.distance = (self.distance * (1.0 - ticks * ZOOM_STEP).max(0.1))
            .max(self.world_scale * 1e-3);
        self.modified = true;
    }
}

impl CameraWidget for OrbitCamera {
    fn pose(&self) -> CameraPose {
        CameraPose::new(self.eye(), self.target, Vec3::Y)
    }

    fn take_modified(&mut self) -> bool {
        std::mem::take(&mut self.modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> OrbitCamera {
        let pose = CameraPose::new(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO, Vec3::Y);
        OrbitCamera::from_pose(pose, 10.0)
    }

    #[test]
    fn from_pose_round_trips_eye_and_target() {
        let w = widget();
        let pose = w.pose();
        assert!(pose.eye.distance(Vec3::new(0.0, 2.0, 5.0)) < 1e-4);
        assert_eq!(pose.target, Vec3::ZERO);
        assert!(pose.validate().is_ok());
    }

    #[test]
    fn fresh_widget_is_unmodified() {
        let mut w = widget();
        assert!(!w.take_modified());
    }

    #[test]
    fn mutations_set_flag_and_take_clears_it() {
        let mut w = widget();
        w.rotate(10.0, 0.0);
        assert!(w.take_modified());
        assert!(!w.take_modified());

        w.pan(3.0, -2.0);
        assert!(w.take_modified());
        w.zoom(1.0);
        assert!(w.take_modified());
    }

    #[test]
    fn pitch_clamp_keeps_pose_valid_at_the_poles() {
        let mut w = widget();
        // Drag far past vertical in both directions.
        w.rotate(0.0, 1e5);
        assert!(w.pose().validate().is_ok());
        w.rotate(0.0, -2e5);
        assert!(w.pose().validate().is_ok());
    }

    #[test]
    fn zoom_never_collapses_eye_onto_target() {
        let mut w = widget();
        for _ in 0..500 {
            w.zoom(5.0);
        }
        assert!(w.pose().validate().is_ok());
        assert!(w.eye().distance(w.target()) > 0.0);
    }

    #[test]
    fn pan_moves_target_but_keeps_orbit_shape() {
        let mut w = widget();
        let before = w.eye().distance(w.target());
        w.pan(100.0, 50.0);
        assert_ne!(w.target(), Vec3::ZERO);
        let after = w.eye().distance(w.target());
        assert!((before - after).abs() < 1e-4);
    }

    #[test]
    fn degenerate_starting_pose_recovers() {
        let pose = CameraPose::new(Vec3::ONE, Vec3::ONE, Vec3::Y);
        let w = OrbitCamera::from_pose(pose, 1.0);
        assert!(w.pose().validate().is_ok());
    }
}
