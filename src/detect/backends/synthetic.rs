use std::f32::consts::TAU;

use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{Contour, ContourKind, Detection};
use crate::frame::FrameView;
use crate::orientation::RotationState;
use crate::{BoundingBox, Point};

const OVAL_POINTS: usize = 36;
const EYE_POINTS: usize = 8;
const LIP_POINTS: usize = 9;

/// Synthetic face backend.
///
/// Emits one face near the middle of the logical frame. The offset is derived
/// from a digest of the pixels, so identical frames yield identical faces and
/// a changing scene makes the face wander.
pub struct SyntheticFaceBackend {
    fail_every: Option<u32>,
    calls: u64,
}

impl SyntheticFaceBackend {
    pub fn new() -> Self {
        Self {
            fail_every: None,
            calls: 0,
        }
    }

    /// Fail every `n`th call (to exercise the failure path).
    pub fn with_failure_every(mut self, n: u32) -> Self {
        self.fail_every = (n > 0).then_some(n);
        self
    }

    fn jitter(pixels: &[u8]) -> (f32, f32) {
        let digest: [u8; 32] = Sha256::digest(pixels).into();
        // Map two digest bytes into [-1.0, 1.0].
        let unit = |b: u8| (b as f32 / 127.5) - 1.0;
        (unit(digest[0]), unit(digest[1]))
    }
}

impl Default for SyntheticFaceBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for SyntheticFaceBackend {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn detect(&mut self, frame: FrameView<'_>, _rotation: RotationState) -> Result<Vec<Detection>> {
        self.calls += 1;
        if let Some(n) = self.fail_every {
            if self.calls % n as u64 == 0 {
                return Err(anyhow!(
                    "synthetic backend: injected failure on call {}",
                    self.calls
                ));
            }
        }

        let (width, height) = frame.logical_dimensions();
        let (w, h) = (width as f32, height as f32);
        let (jx, jy) = Self::jitter(frame.pixels());
        let center = Point::new(w / 2.0 + jx * w / 20.0, h / 2.0 + jy * h / 20.0);
        let ry = w.min(h) * 0.25;
        let rx = ry * 0.8;

        let eye_dx = rx * 0.4;
        let eye_y = center.y - ry * 0.25;
        let detection = Detection::new(BoundingBox {
            center,
            width: rx * 2.0,
            height: ry * 2.0,
        })
        .with_contour(Contour::new(
            ContourKind::FaceOval,
            ellipse(center, rx, ry, OVAL_POINTS),
        ))
        .with_contour(Contour::new(
            ContourKind::LeftEye,
            ellipse(
                Point::new(center.x - eye_dx, eye_y),
                rx * 0.15,
                ry * 0.06,
                EYE_POINTS,
            ),
        ))
        .with_contour(Contour::new(
            ContourKind::RightEye,
            ellipse(
                Point::new(center.x + eye_dx, eye_y),
                rx * 0.15,
                ry * 0.06,
                EYE_POINTS,
            ),
        ))
        .with_contour(Contour::new(
            ContourKind::NoseBridge,
            vec![
                Point::new(center.x, eye_y),
                Point::new(center.x, center.y + ry * 0.1),
            ],
        ))
        .with_contour(Contour::new(
            ContourKind::UpperLip,
            arc(Point::new(center.x, center.y + ry * 0.45), rx * 0.35, LIP_POINTS),
        ));

        Ok(vec![detection])
    }
}

fn ellipse(center: Point, rx: f32, ry: f32, points: usize) -> Vec<Point> {
    (0..points)
        .map(|i| {
            let t = TAU * i as f32 / points as f32;
            Point::new(center.x + rx * t.cos(), center.y + ry * t.sin())
        })
        .collect()
}

fn arc(center: Point, half_width: f32, points: usize) -> Vec<Point> {
    let last = points.saturating_sub(1).max(1) as f32;
    (0..points)
        .map(|i| {
            let s = i as f32 / last * 2.0 - 1.0;
            Point::new(center.x + s * half_width, center.y + (1.0 - s * s) * half_width * 0.2)
        })
        .collect()
}
