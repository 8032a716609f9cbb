//! Frame ingestion sources.
//!
//! Sources hand the analyzer one `Frame` per capture tick. Ownership of the
//! backing buffer moves with the frame and comes back through the source's
//! `BufferRecycler` when the analyzer releases it.
//!
//! This module provides:
//! - `SyntheticSource` for `stub://` URLs (tests, demos)
//! - `BufferPool`, a bounded recycling pool for frame buffers
//! - `CaptureTarget`, the capture configuration's rotation target
//!
//! Physical camera drivers live outside this crate and plug in through the
//! `FrameSource` trait.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::frame::Frame;
use crate::orientation::{RotationSink, RotationState, SharedRotation};

mod pool;
pub mod synthetic;

pub use pool::{BufferPool, PoolStats};
pub use synthetic::{SyntheticConfig, SyntheticSource};

/// A sequential stream of frames in capture order.
pub trait FrameSource: Send {
    /// Capture the next frame. May block until the next capture tick.
    fn next_frame(&mut self) -> Result<Frame>;

    /// Check if the source is healthy.
    fn is_healthy(&self) -> bool;

    /// Capture configuration that should follow device rotation, if any.
    fn rotation_sink(&self) -> Option<Arc<dyn RotationSink>> {
        None
    }
}

/// Which way the lens faces. Front-facing capture is mirrored on screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LensFacing {
    #[default]
    Front,
    Back,
}

impl LensFacing {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "front" => Ok(LensFacing::Front),
            "back" => Ok(LensFacing::Back),
            other => Err(anyhow!("lens facing must be 'front' or 'back' (got '{}')", other)),
        }
    }

    pub fn is_mirrored(self) -> bool {
        matches!(self, LensFacing::Front)
    }
}

/// Target rotation of the capture/analysis use cases.
///
/// Updated by the orientation tracker; sources consult it when tagging new
/// frames, so a change only affects frames captured afterwards.
#[derive(Debug, Default)]
pub struct CaptureTarget {
    rotation: SharedRotation,
}

impl CaptureTarget {
    pub fn new(initial: RotationState) -> Self {
        Self {
            rotation: SharedRotation::new(initial),
        }
    }

    pub fn target_rotation(&self) -> RotationState {
        self.rotation.load()
    }

    /// Rotation hint for a buffer captured now.
    ///
    /// Degrees the sensor image must be rotated clockwise to appear upright at
    /// the current target rotation. Front sensors are mounted mirrored, so the
    /// device rotation adds instead of subtracting.
    pub fn rotation_hint(&self, sensor_orientation: u16, lens: LensFacing) -> u16 {
        let device = self.target_rotation().degrees();
        match lens {
            LensFacing::Front => (sensor_orientation + device) % 360,
            LensFacing::Back => (sensor_orientation + 360 - device) % 360,
        }
    }
}

impl RotationSink for CaptureTarget {
    fn rotation_changed(&self, rotation: RotationState) {
        self.rotation.store(rotation);
    }
}
