//! Detection contract.
//!
//! - `DetectionService`: asynchronous, one `PendingDetection` per request
//! - `DetectorBackend`: synchronous plug-in, adapted by `ThreadedService`
//! - `BackendRegistry`: name-based backend selection

mod backend;
mod backends;
mod registry;
mod result;
mod service;

pub use backend::DetectorBackend;
pub use backends::{StubBackend, SyntheticFaceBackend};
pub use registry::BackendRegistry;
pub use result::{Contour, ContourKind, Detection, DetectionBatch};
pub use service::{DetectionRequest, DetectionService, ThreadedService};
