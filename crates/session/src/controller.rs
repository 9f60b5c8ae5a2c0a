//! The session controller and the capability traits it drives.
//!
//! Both collaborators are modeled as capability traits rather than concrete
//! backends: any GPU or CPU renderer satisfying [`RenderSession`] and any
//! windowing layer satisfying [`PresentTarget`] slot in unchanged, and tests
//! substitute recording doubles for both.

use crate::FrameBuffer;
use rayview_common::CameraPose;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The external renderer, treated as one opaque unit of work per pass.
///
/// All operations are synchronous; the controller never overlaps them.
pub trait RenderSession {
    /// Replace the renderer's camera with a fresh snapshot.
    fn set_camera(&mut self, pose: CameraPose);
    /// Advance the renderer's internal image by one pass.
    fn render_one_pass(&mut self);
    /// Match the renderer's internal buffer to a new drawable size.
    fn resize(&mut self, width: u32, height: u32);
    /// Copy the current image into `dest`, overwriting it completely.
    /// `dest.len()` must equal the renderer's current width × height.
    fn download_pixels(&mut self, dest: &mut [u32]);
    /// Time spent building the bottom-level acceleration structures.
    fn blas_build_time(&self) -> Duration;
    /// Time spent building the top-level acceleration structure.
    fn tlas_build_time(&self) -> Duration;
}

/// The input side of the display surface: a camera-manipulation widget that
/// knows whether the user moved the camera since the last frame.
pub trait CameraWidget {
    /// Current camera pose.
    fn pose(&self) -> CameraPose;
    /// Report and clear the modification flag in one step, so one loop
    /// iteration can trigger at most one camera push.
    fn take_modified(&mut self) -> bool;
}

/// The output side of the display surface: takes a packed pixel buffer and
/// puts it on screen.
pub trait PresentTarget {
    fn blit(&mut self, width: u32, height: u32, pixels: &[u32]);
}

/// Drives one render pass and one present per event-loop iteration.
///
/// Owns the frame buffer and the render session; the widget and the present
/// target stay with the windowing layer and are borrowed per call. Between
/// iterations the controller carries no state beyond those two buffers;
/// each iteration is fully determined by the widget's flag and the
/// session's internal image.
pub struct SessionController<R: RenderSession> {
    session: R,
    framebuffer: FrameBuffer,
}

impl<R: RenderSession> SessionController<R> {
    /// Wire up a session: push the starting pose and size both buffers.
    pub fn new(mut session: R, pose: CameraPose, width: u32, height: u32) -> Self {
        session.set_camera(pose);
        session.resize(width, height);
        Self {
            session,
            framebuffer: FrameBuffer::new(width, height),
        }
    }

    /// The "render" callback: push the camera if the widget moved it, then
    /// run one render pass.
    ///
    /// The pass runs unconditionally. Progressive renderers refine their
    /// image between camera motions, so skipping "idle" frames would stall
    /// them.
    pub fn advance(&mut self, widget: &mut impl CameraWidget) {
        if widget.take_modified() {
            self.session.set_camera(widget.pose());
        }
        self.session.render_one_pass();
    }

    /// The "draw" callback: download the session's image into the owned
    /// frame buffer, then hand it to the display surface.
    ///
    /// The frame buffer must already match the drawable size; [`resize`]
    /// runs before the next present after any window-size change, so a
    /// mismatch here is a programming error rather than a runtime case.
    ///
    /// [`resize`]: SessionController::resize
    pub fn present(&mut self, target: &mut impl PresentTarget) {
        self.session.download_pixels(self.framebuffer.pixels_mut());
        target.blit(
            self.framebuffer.width(),
            self.framebuffer.height(),
            self.framebuffer.pixels(),
        );
    }

    /// Propagate a new drawable size to every size-dependent buffer.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.framebuffer.resize(width, height);
        self.session.resize(width, height);
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    pub fn session(&self) -> &R {
        &self.session
    }

    /// Append the acceleration-structure build times, one integer
    /// microsecond count per line, to `<base>-blasbuildtime.txt` and
    /// `<base>-tlasbuildtime.txt`.
    ///
    /// Best-effort diagnostics: an unwritable log is reported as a warning
    /// and never blocks startup.
    pub fn write_accel_build_times(&self, base: &Path) {
        append_micros(base, "blasbuildtime", self.session.blas_build_time());
        append_micros(base, "tlasbuildtime", self.session.tlas_build_time());
    }
}

fn append_micros(base: &Path, kind: &str, value: Duration) {
    let mut name = base.as_os_str().to_owned();
    name.push(format!("-{kind}.txt"));
    let path = PathBuf::from(name);
    let appended = OpenOptions::new()
        .append(true)
        .create(true)
        .open(&path)
        .and_then(|mut file| writeln!(file, "{}", value.as_micros()));
    match appended {
        Ok(()) => tracing::debug!("appended {kind} to {}", path.display()),
        Err(e) => tracing::warn!("failed to append {kind} to {}: {e}", path.display()),
    }
}
