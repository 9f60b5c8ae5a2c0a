//! Viewer core: the session controller and the state it owns.
//!
//! The controller sits between an opaque render session (anything that can
//! take a camera, render a pass, and hand back pixels) and an opaque display
//! surface (anything that can blit a packed pixel buffer). It owns the frame
//! buffer and drives exactly one render pass and one present per event-loop
//! iteration.
//!
//! # Invariants
//! - Frame buffer length always equals width × height.
//! - At most one camera push per loop iteration, and always before that
//!   iteration's render pass.
//! - The render pass runs every iteration whether or not the camera moved;
//!   progressive renderers keep accumulating between camera motions.
//! - Single-threaded: the display surface's event loop is the only
//!   scheduler, so no state here needs locking.

pub mod controller;
pub mod framebuffer;

pub use controller::{CameraWidget, PresentTarget, RenderSession, SessionController};
pub use framebuffer::FrameBuffer;
