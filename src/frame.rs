//! Frame ownership.
//!
//! A `Frame` owns one captured pixel buffer borrowed from its `FrameSource`.
//! Release is tied to `Drop`, so every frame is released exactly once no matter
//! which path consumes it:
//!
//! - pooled buffers go back to the source's `BufferRecycler`
//! - unpooled buffers are zeroized in place
//!
//! There is no `Clone` and no way to move the bytes out, so a released buffer
//! cannot be observed again.
//!
//! ```compile_fail
//! use frame_overlay::Frame;
//!
//! fn keep_two(frame: Frame) -> (Frame, Frame) {
//!     (frame.clone(), frame)
//! }
//! ```
//!
//! ```compile_fail
//! use frame_overlay::Frame;
//!
//! fn release_twice(frame: Frame) {
//!     frame.release();
//!     frame.release();
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use zeroize::Zeroize;

use crate::FrameId;

/// Takes back buffers released by the analyzer.
pub trait BufferRecycler: Send + Sync {
    fn recycle(&self, frame_id: FrameId, buffer: Vec<u8>);
}

/// One captured frame plus its dimension/rotation metadata.
pub struct Frame {
    id: FrameId,
    /// Private pixel data. Never exposed by value.
    data: Vec<u8>,
    width: u32,
    height: u32,
    rotation_degrees: u16,
    recycler: Option<Arc<dyn BufferRecycler>>,
}

impl Frame {
    /// Wrap a buffer. `width`/`height` are sensor (pre-rotation) dimensions.
    pub fn new(
        id: FrameId,
        data: Vec<u8>,
        width: u32,
        height: u32,
        rotation_degrees: u16,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(anyhow!(
                "frame {} has empty dimensions {}x{}",
                id,
                width,
                height
            ));
        }
        if !matches!(rotation_degrees, 0 | 90 | 180 | 270) {
            return Err(anyhow!(
                "frame {} rotation hint must be 0, 90, 180 or 270 (got {})",
                id,
                rotation_degrees
            ));
        }
        Ok(Self {
            id,
            data,
            width,
            height,
            rotation_degrees,
            recycler: None,
        })
    }

    /// Route the buffer back to `recycler` on release instead of wiping it.
    pub fn with_recycler(mut self, recycler: Arc<dyn BufferRecycler>) -> Self {
        self.recycler = Some(recycler);
        self
    }

    pub fn id(&self) -> FrameId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rotation_degrees(&self) -> u16 {
        self.rotation_degrees
    }

    /// Frame shape after applying the rotation hint.
    ///
    /// The sensor buffer is rotated relative to the display, so for 90°/270°
    /// the axes swap.
    pub fn logical_dimensions(&self) -> (u32, u32) {
        match self.rotation_degrees {
            90 | 270 => (self.height, self.width),
            _ => (self.width, self.height),
        }
    }

    /// Read-only view handed to detectors.
    pub fn view(&self) -> FrameView<'_> {
        FrameView { frame: self }
    }

    /// Release the buffer back to its source. Consumes the frame.
    pub fn release(self) {
        drop(self);
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Pixel data is intentionally omitted.
        f.debug_struct("Frame")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rotation_degrees", &self.rotation_degrees)
            .field("bytes", &self.data.len())
            .field("pooled", &self.recycler.is_some())
            .finish()
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        let mut buffer = std::mem::take(&mut self.data);
        match self.recycler.take() {
            Some(recycler) => recycler.recycle(self.id, buffer),
            None => buffer.zeroize(),
        }
    }
}

/// Borrowed, read-only view of a frame for detection.
///
/// The lifetime ties any pixel slice to the owning request, so a detector
/// cannot hold on to pixels past release.
#[derive(Clone, Copy)]
pub struct FrameView<'a> {
    frame: &'a Frame,
}

impl<'a> FrameView<'a> {
    pub fn id(&self) -> FrameId {
        self.frame.id
    }

    pub fn width(&self) -> u32 {
        self.frame.width
    }

    pub fn height(&self) -> u32 {
        self.frame.height
    }

    pub fn rotation_degrees(&self) -> u16 {
        self.frame.rotation_degrees
    }

    pub fn logical_dimensions(&self) -> (u32, u32) {
        self.frame.logical_dimensions()
    }

    pub fn pixels(&self) -> &'a [u8] {
        &self.frame.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingRecycler {
        released: Mutex<Vec<(FrameId, usize)>>,
    }

    impl BufferRecycler for CountingRecycler {
        fn recycle(&self, frame_id: FrameId, buffer: Vec<u8>) {
            self.released.lock().unwrap().push((frame_id, buffer.len()));
        }
    }

    fn make_frame(id: u64, rotation: u16) -> Frame {
        Frame::new(FrameId(id), vec![7u8; 48], 4, 4, rotation).expect("frame")
    }

    #[test]
    fn release_returns_buffer_once() {
        let recycler = Arc::new(CountingRecycler::default());
        let frame = make_frame(3, 0).with_recycler(recycler.clone());
        frame.release();

        let released = recycler.released.lock().unwrap().clone();
        assert_eq!(released, vec![(FrameId(3), 48)]);
    }

    #[test]
    fn implicit_drop_also_releases() {
        let recycler = Arc::new(CountingRecycler::default());
        {
            let _frame = make_frame(1, 90).with_recycler(recycler.clone());
        }
        assert_eq!(recycler.released.lock().unwrap().len(), 1);
    }

    #[test]
    fn logical_dimensions_swap_for_quarter_turns() {
        let frame = Frame::new(FrameId(0), vec![], 480, 640, 90).unwrap();
        assert_eq!(frame.logical_dimensions(), (640, 480));
        let frame = Frame::new(FrameId(0), vec![], 480, 640, 180).unwrap();
        assert_eq!(frame.logical_dimensions(), (480, 640));
        let frame = Frame::new(FrameId(0), vec![], 480, 640, 270).unwrap();
        assert_eq!(frame.logical_dimensions(), (640, 480));
    }

    #[test]
    fn rejects_invalid_metadata() {
        assert!(Frame::new(FrameId(0), vec![], 640, 480, 45).is_err());
        assert!(Frame::new(FrameId(0), vec![], 0, 480, 0).is_err());
    }

    #[test]
    fn view_exposes_metadata_and_pixels() {
        let frame = make_frame(9, 270);
        let view = frame.view();
        assert_eq!(view.id(), FrameId(9));
        assert_eq!(view.rotation_degrees(), 270);
        assert_eq!(view.pixels().len(), 48);
        assert!(format!("{:?}", frame).contains("bytes: 48"));
    }
}
