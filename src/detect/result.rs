use serde::{Deserialize, Serialize};

use crate::orientation::RotationState;
use crate::transform::SourceGeometry;
use crate::{BoundingBox, FrameId, Point, RequestId};

/// One recognized feature, in the coordinate space of the source frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bounds: BoundingBox,
    /// Ordered contour point-groups.
    pub contours: Vec<Contour>,
}

impl Detection {
    pub fn new(bounds: BoundingBox) -> Self {
        Self {
            bounds,
            contours: Vec::new(),
        }
    }

    pub fn with_contour(mut self, contour: Contour) -> Self {
        self.contours.push(contour);
        self
    }

    /// All contour points, in contour order.
    pub fn contour_points(&self) -> impl Iterator<Item = Point> + '_ {
        self.contours
            .iter()
            .flat_map(|contour| contour.points.iter().copied())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub kind: ContourKind,
    pub points: Vec<Point>,
}

impl Contour {
    pub fn new(kind: ContourKind, points: Vec<Point>) -> Self {
        Self { kind, points }
    }
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContourKind {
    FaceOval,
    LeftEyebrow,
    RightEyebrow,
    LeftEye,
    RightEye,
    NoseBridge,
    UpperLip,
    LowerLip,
    LeftCheek,
    RightCheek,
    Other,
}

/// Result of one completed request, delivered on the completion context.
#[derive(Clone, Debug)]
pub struct DetectionBatch {
    pub request_id: RequestId,
    pub frame_id: FrameId,
    /// Rotation the request was tagged with at submission.
    pub rotation: RotationState,
    /// Source geometry of the frame that produced these detections.
    pub geometry: SourceGeometry,
    pub detections: Vec<Detection>,
}

impl DetectionBatch {
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}
