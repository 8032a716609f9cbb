//! Synthetic frame source (`stub://` URLs).
//!
//! Produces RGB frames from a pooled set of buffers at a target frame rate.
//! The rotation hint of each frame follows the shared `CaptureTarget`, so
//! orientation changes show up on frames captured after the change.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};

use super::{BufferPool, CaptureTarget, FrameSource, LensFacing};
use crate::frame::{BufferRecycler, Frame};
use crate::orientation::RotationSink;
use crate::FrameId;

/// Configuration for a synthetic source.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    /// Source URL; must use the `stub://` scheme.
    pub url: String,
    /// Sensor buffer width (pre-rotation).
    pub width: u32,
    /// Sensor buffer height (pre-rotation).
    pub height: u32,
    /// Target frame rate. 0 disables pacing.
    pub target_fps: u32,
    /// Sensor mounting orientation in degrees.
    pub sensor_orientation: u16,
    pub lens: LensFacing,
    /// Maximum buffers handed out at once.
    pub pool_size: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            url: "stub://front_camera".to_string(),
            width: 640,
            height: 480,
            target_fps: 30,
            sensor_orientation: 270,
            lens: LensFacing::Front,
            pool_size: 4,
        }
    }
}

/// Statistics for a synthetic source.
#[derive(Clone, Debug)]
pub struct SyntheticStats {
    pub frames_captured: u64,
    pub url: String,
}

pub struct SyntheticSource {
    config: SyntheticConfig,
    pool: Arc<BufferPool>,
    target: Arc<CaptureTarget>,
    frame_count: u64,
    /// Simulated scene; changes every 50 frames.
    scene_state: u8,
    next_deadline: Option<Instant>,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Result<Self> {
        if !config.url.starts_with("stub://") {
            return Err(anyhow!(
                "synthetic source only supports stub:// URLs (got {})",
                config.url
            ));
        }
        if config.width == 0 || config.height == 0 {
            return Err(anyhow!("synthetic source dimensions must be non-zero"));
        }
        if !matches!(config.sensor_orientation, 0 | 90 | 180 | 270) {
            return Err(anyhow!(
                "sensor orientation must be 0, 90, 180 or 270 (got {})",
                config.sensor_orientation
            ));
        }
        let buffer_len = (config.width as usize) * (config.height as usize) * 3;
        log::info!(
            "SyntheticSource: {} {}x{} @ {} fps ({:?} lens, sensor {}°)",
            config.url,
            config.width,
            config.height,
            config.target_fps,
            config.lens,
            config.sensor_orientation
        );
        Ok(Self {
            pool: Arc::new(BufferPool::new(config.pool_size, buffer_len)),
            target: Arc::new(CaptureTarget::default()),
            config,
            frame_count: 0,
            scene_state: 0,
            next_deadline: None,
        })
    }

    pub fn pool(&self) -> Arc<BufferPool> {
        Arc::clone(&self.pool)
    }

    pub fn capture_target(&self) -> Arc<CaptureTarget> {
        Arc::clone(&self.target)
    }

    pub fn stats(&self) -> SyntheticStats {
        SyntheticStats {
            frames_captured: self.frame_count,
            url: self.config.url.clone(),
        }
    }

    fn pace(&mut self) {
        if self.config.target_fps == 0 {
            return;
        }
        let interval = Duration::from_secs(1) / self.config.target_fps;
        let now = Instant::now();
        match self.next_deadline {
            Some(deadline) if deadline > now => {
                std::thread::sleep(deadline - now);
                self.next_deadline = Some(deadline + interval);
            }
            _ => self.next_deadline = Some(now + interval),
        }
    }

    fn fill_synthetic_pixels(&mut self, pixels: &mut [u8]) {
        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }
        let offset = self.scene_state as usize * 7;
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i + offset) % 256) as u8;
        }
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Frame> {
        self.pace();
        let mut pixels = self.pool.acquire()?;
        self.frame_count += 1;
        self.fill_synthetic_pixels(&mut pixels);

        let rotation = self
            .target
            .rotation_hint(self.config.sensor_orientation, self.config.lens);
        let frame = match Frame::new(
            FrameId(self.frame_count),
            pixels,
            self.config.width,
            self.config.height,
            rotation,
        ) {
            Ok(frame) => frame,
            Err(err) => {
                // Keep the outstanding count balanced.
                self.pool.recycle(FrameId(self.frame_count), Vec::new());
                return Err(err);
            }
        };
        Ok(frame.with_recycler(self.pool.clone()))
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn rotation_sink(&self) -> Option<Arc<dyn RotationSink>> {
        Some(self.target.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::RotationState;

    fn unpaced() -> SyntheticConfig {
        SyntheticConfig {
            width: 8,
            height: 6,
            target_fps: 0,
            ..SyntheticConfig::default()
        }
    }

    #[test]
    fn frames_carry_ids_dimensions_and_hint() {
        let mut source = SyntheticSource::new(unpaced()).unwrap();
        let first = source.next_frame().unwrap();
        let second = source.next_frame().unwrap();
        assert_eq!(first.id(), FrameId(1));
        assert_eq!(second.id(), FrameId(2));
        assert_eq!((first.width(), first.height()), (8, 6));
        assert_eq!(first.rotation_degrees(), 270);
        assert_eq!(first.logical_dimensions(), (6, 8));
        assert_eq!(source.stats().frames_captured, 2);
    }

    #[test]
    fn released_frames_return_to_pool() {
        let mut source = SyntheticSource::new(unpaced()).unwrap();
        for _ in 0..10 {
            let frame = source.next_frame().unwrap();
            frame.release();
        }
        let stats = source.pool().stats();
        assert_eq!(stats.outstanding, 0);
        assert_eq!(stats.released, 10);
        assert_eq!(stats.allocated, 1);
    }

    #[test]
    fn capture_target_changes_apply_to_next_frame() {
        let mut source = SyntheticSource::new(unpaced()).unwrap();
        let before = source.next_frame().unwrap();
        source
            .rotation_sink()
            .unwrap()
            .rotation_changed(RotationState::Right);
        let after = source.next_frame().unwrap();
        assert_eq!(before.rotation_degrees(), 270);
        assert_eq!(after.rotation_degrees(), 0);
    }

    #[test]
    fn rejects_non_stub_urls() {
        let config = SyntheticConfig {
            url: "rtsp://camera".to_string(),
            ..unpaced()
        };
        assert!(SyntheticSource::new(config).is_err());
    }
}
