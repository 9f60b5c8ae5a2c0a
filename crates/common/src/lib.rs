//! Shared types for the rayview workspace.
//!
//! # Invariants
//! - A [`CameraPose`] that passes [`CameraPose::validate`] always has a
//!   defined view direction and a usable up vector.
//! - Packed pixels are R,G,B,A in memory byte order on little-endian,
//!   matching what the display blitter uploads.

pub mod color;
pub mod pose;

pub use color::{pack_rgba8, unpack_rgba8};
pub use pose::{CameraPose, PoseError};
