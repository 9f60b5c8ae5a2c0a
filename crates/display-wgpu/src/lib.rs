//! wgpu display backend for the viewer.
//!
//! Two halves of the display surface contract: [`OrbitCamera`] is the
//! input-driven camera widget (implements the core's `CameraWidget`), and
//! [`FrameBlitter`] puts the core's packed pixel buffer on screen
//! (implements `PresentTarget`) via a texture upload and a fullscreen
//! triangle.
//!
//! # Invariants
//! - The orbit widget can only produce valid camera poses: pitch is clamped
//!   short of the poles and the orbit distance stays positive.
//! - The blit texture always matches the surface configuration.

mod blit;
mod camera;
mod shaders;

pub use blit::FrameBlitter;
pub use camera::OrbitCamera;
