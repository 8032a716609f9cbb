use anyhow::Result;

use crate::detect::result::Detection;
use crate::frame::FrameView;
use crate::orientation::RotationState;

/// Synchronous detector backend.
///
/// Backends run on a dedicated detector thread (see `ThreadedService`), so
/// `detect` may block for as long as inference takes.
///
/// Implementations must treat the frame view as read-only and ephemeral: the
/// pixel slice is only valid for the duration of the call, after which the
/// frame is released back to its source.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    ///
    /// `rotation` is the display rotation the request was tagged with.
    /// Returned geometry is in the frame's post-rotation (logical) coordinates.
    fn detect(&mut self, frame: FrameView<'_>, rotation: RotationState) -> Result<Vec<Detection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
