//! Device orientation tracking.
//!
//! Raw orientation samples (degrees, as reported by the motion sensor) are
//! bucketed into one of four discrete `RotationState`s. The bucket table is
//! fixed:
//!
//! | angle          | state  | degrees |
//! |----------------|--------|---------|
//! | `[45, 135)`    | `Left` | 270     |
//! | `[135, 225)`   | `Down` | 180     |
//! | `[225, 315)`   | `Right`| 90      |
//! | anything else  | `Up`   | 0       |
//!
//! Negative readings mean "orientation unknown" (device flat) and are ignored.
//! Whenever the bucket changes, every subscribed `RotationSink` is notified so
//! that subsequent frames and requests pick up the new rotation. Requests that
//! were already submitted keep the rotation they were tagged with.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{anyhow, Result};

/// Discrete display rotation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RotationState {
    #[default]
    Up,
    Right,
    Down,
    Left,
}

impl RotationState {
    /// Bucket a raw orientation angle. Returns `None` for negative (unknown) readings.
    pub fn from_orientation(angle_degrees: i32) -> Option<Self> {
        if angle_degrees < 0 {
            return None;
        }
        let state = match angle_degrees {
            45..=134 => RotationState::Left,
            135..=224 => RotationState::Down,
            225..=314 => RotationState::Right,
            _ => RotationState::Up,
        };
        Some(state)
    }

    /// Rotation in degrees relative to the natural ("up") orientation.
    pub fn degrees(self) -> u16 {
        match self {
            RotationState::Up => 0,
            RotationState::Right => 90,
            RotationState::Down => 180,
            RotationState::Left => 270,
        }
    }

    pub fn from_degrees(degrees: u16) -> Result<Self> {
        match degrees {
            0 => Ok(RotationState::Up),
            90 => Ok(RotationState::Right),
            180 => Ok(RotationState::Down),
            270 => Ok(RotationState::Left),
            other => Err(anyhow!(
                "rotation must be one of 0, 90, 180, 270 (got {})",
                other
            )),
        }
    }
}

/// Receiver of rotation changes.
pub trait RotationSink: Send + Sync {
    fn rotation_changed(&self, rotation: RotationState);
}

/// Lock-free cell holding a `RotationState`.
///
/// Readers on the frame worker never contend with the orientation callback.
#[derive(Debug, Default)]
pub struct SharedRotation {
    degrees: AtomicU16,
}

impl SharedRotation {
    pub fn new(rotation: RotationState) -> Self {
        Self {
            degrees: AtomicU16::new(rotation.degrees()),
        }
    }

    pub fn load(&self) -> RotationState {
        // Only valid degree values are ever stored.
        RotationState::from_degrees(self.degrees.load(Ordering::Acquire)).unwrap_or_default()
    }

    pub fn store(&self, rotation: RotationState) {
        self.degrees.store(rotation.degrees(), Ordering::Release);
    }
}

struct TrackerState {
    current: RotationState,
    sinks: Vec<Arc<dyn RotationSink>>,
}

/// Converts orientation samples into `RotationState` and publishes changes.
pub struct OrientationTracker {
    state: Mutex<TrackerState>,
}

impl OrientationTracker {
    pub fn new() -> Self {
        Self::with_initial(RotationState::Up)
    }

    pub fn with_initial(initial: RotationState) -> Self {
        Self {
            state: Mutex::new(TrackerState {
                current: initial,
                sinks: Vec::new(),
            }),
        }
    }

    /// Subscribe a sink. It receives every subsequent change, in order.
    pub fn subscribe(&self, sink: Arc<dyn RotationSink>) {
        self.lock().sinks.push(sink);
    }

    /// Feed one raw sample. Returns the new state when the bucket changed.
    ///
    /// Publication happens under the tracker lock so sinks observe changes in
    /// the same order the tracker computed them.
    pub fn on_sample(&self, angle_degrees: i32) -> Option<RotationState> {
        let next = RotationState::from_orientation(angle_degrees)?;
        let mut state = self.lock();
        if state.current == next {
            return None;
        }
        log::debug!(
            "orientation: {:?} -> {:?} (sample {}°)",
            state.current,
            next,
            angle_degrees
        );
        state.current = next;
        for sink in &state.sinks {
            sink.rotation_changed(next);
        }
        Some(next)
    }

    pub fn current_rotation(&self) -> RotationState {
        self.lock().current
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TrackerState> {
        // A panicking sink must not wedge orientation tracking.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for OrientationTracker {
    fn default() -> Self {
        Self::new()
    }
}
