//! Frame Overlay Kernel
//!
//! This crate streams live camera frames through an asynchronous detector and
//! renders the detected feature geometry as an overlay aligned to a preview
//! surface that may be rotated, mirrored or rescaled relative to the sensor.
//!
//! # Architecture
//!
//! The kernel holds four invariants by construction:
//!
//! 1. **At most one in-flight request**: frames arriving while a detection is
//!    pending are released and dropped, never queued.
//! 2. **Exactly-once release**: frame buffers are released on `Drop`; the
//!    detection completion is a consume-once `PendingDetection`.
//! 3. **Batch-consistent geometry**: each overlay batch is drawn with the
//!    source geometry of the frame that produced it.
//! 4. **Whole-value replacement**: overlay state is swapped as an immutable
//!    snapshot, so a renderer never observes a half-updated batch.
//!
//! # Module Structure
//!
//! - `orientation`: sensor angle bucketing, rotation publication
//! - `frame`: frame buffer ownership and release
//! - `ingest`: frame sources (synthetic `stub://` source, buffer pool)
//! - `detect`: detection service contract, backends, registry
//! - `analyzer`: at-most-one-in-flight frame analysis and completion dispatch
//! - `transform`: detector-space to surface-space mapping
//! - `overlay`: overlay items, renderer, render surfaces
//! - `pipeline`: start/stop composition of all of the above
//! - `config`: JSON file + environment configuration

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod analyzer;
pub mod config;
pub mod detect;
pub mod frame;
pub mod ingest;
pub mod orientation;
pub mod overlay;
pub mod pipeline;
pub mod transform;

pub use analyzer::{
    AnalyzerSettings, AnalyzerStats, CompletionQueue, DetectionListener, FrameAnalyzer,
    PendingDetection, StatsSnapshot, SubmitOutcome,
};
pub use detect::{
    BackendRegistry, Contour, ContourKind, Detection, DetectionBatch, DetectionRequest,
    DetectionService, DetectorBackend, StubBackend, SyntheticFaceBackend, ThreadedService,
};
pub use frame::{BufferRecycler, Frame, FrameView};
pub use ingest::{
    BufferPool, CaptureTarget, FrameSource, LensFacing, SyntheticConfig, SyntheticSource,
};
pub use orientation::{OrientationTracker, RotationSink, RotationState, SharedRotation};
pub use overlay::{
    Color, DrawCall, FeatureOverlay, OverlayItem, OverlayRenderer, OverlaySnapshot, OverlayStyle,
    RasterSurface, RecordingSurface, RenderReport, Surface,
};
pub use pipeline::{Pipeline, PipelineSettings};
pub use transform::{CoordinateTransformer, SourceGeometry, TransformContext};

// -------------------- Identifiers --------------------

/// Capture-order frame identifier assigned by the frame source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(pub u64);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

/// Detection request identifier assigned by the analyzer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request#{}", self.0)
    }
}

// -------------------- Geometry --------------------

/// A point in either detector-image or surface coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounds expressed as centre + extent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub center: Point,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn from_corners(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            center: Point::new((left + right) / 2.0, (top + bottom) / 2.0),
            width: (right - left).abs(),
            height: (bottom - top).abs(),
        }
    }

    pub fn left(&self) -> f32 {
        self.center.x - self.width / 2.0
    }

    pub fn top(&self) -> f32 {
        self.center.y - self.height / 2.0
    }

    pub fn right(&self) -> f32 {
        self.center.x + self.width / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.center.y + self.height / 2.0
    }
}

/// Pixel dimensions of a render surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
