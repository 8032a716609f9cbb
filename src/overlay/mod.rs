//! Overlay items and the renderer that draws them onto a surface.
//!
//! The renderer holds one immutable `OverlaySnapshot` (items plus the source
//! geometry of the batch that produced them). A completed batch replaces the
//! snapshot wholesale; `render` clones the current `Arc` and draws without
//! holding the lock, so a render pass never observes a half-updated batch.
//!
//! The surface size is read from the surface on every render. A surface that
//! changes size between batches re-projects the current items against the
//! batch geometry they were detected with.

use std::sync::{Arc, PoisonError, RwLock};

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::detect::{Detection, DetectionBatch};
use crate::transform::{CoordinateTransformer, SourceGeometry};
use crate::Point;

mod surface;

pub use surface::{DrawCall, RasterSurface, RecordingSurface, Surface};

/// RGB colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn parse_hex(value: &str) -> Result<Self> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(anyhow!("colour must be #rrggbb (got '{}')", value));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| anyhow!("colour must be #rrggbb (got '{}')", value))
        };
        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayStyle {
    pub point_radius: f32,
    pub color: Color,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            point_radius: 5.0,
            color: Color::WHITE,
        }
    }
}

/// Draws one detected feature: a marker at the bounding-box centre and one
/// per contour point.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureOverlay {
    detection: Detection,
}

impl FeatureOverlay {
    pub fn new(detection: Detection) -> Self {
        Self { detection }
    }

    pub fn detection(&self) -> &Detection {
        &self.detection
    }

    /// Marker positions in source coordinates, centre first.
    pub fn markers(&self) -> impl Iterator<Item = Point> + '_ {
        std::iter::once(self.detection.bounds.center).chain(self.detection.contour_points())
    }

    fn draw(
        &self,
        surface: &mut dyn Surface,
        transformer: &CoordinateTransformer,
        style: &OverlayStyle,
        report: &mut RenderReport,
    ) {
        for point in self.markers() {
            match transformer.to_surface(point) {
                Some(mapped) => {
                    surface.draw_circle(mapped, style.point_radius, style.color);
                    report.markers_drawn += 1;
                }
                None => report.markers_skipped += 1,
            }
        }
    }
}

/// Drawable overlay item.
#[derive(Clone, Debug, PartialEq)]
pub enum OverlayItem {
    Feature(FeatureOverlay),
}

impl OverlayItem {
    pub fn draw(
        &self,
        surface: &mut dyn Surface,
        transformer: &CoordinateTransformer,
        style: &OverlayStyle,
        report: &mut RenderReport,
    ) {
        match self {
            OverlayItem::Feature(feature) => feature.draw(surface, transformer, style, report),
        }
    }
}

impl From<Detection> for OverlayItem {
    fn from(detection: Detection) -> Self {
        OverlayItem::Feature(FeatureOverlay::new(detection))
    }
}

/// Immutable overlay state published by the renderer.
#[derive(Clone, Debug, Default)]
pub struct OverlaySnapshot {
    pub items: Vec<OverlayItem>,
    /// Source geometry the items were detected in; `None` until the first batch.
    pub geometry: Option<SourceGeometry>,
    /// Increments on every replacement.
    pub sequence: u64,
}

/// Outcome of one render pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RenderReport {
    pub sequence: u64,
    pub items: usize,
    pub markers_drawn: usize,
    /// Markers not drawn because no source geometry is known yet.
    pub markers_skipped: usize,
}

pub struct OverlayRenderer {
    style: OverlayStyle,
    current: RwLock<Arc<OverlaySnapshot>>,
}

impl OverlayRenderer {
    pub fn new(style: OverlayStyle) -> Self {
        Self {
            style,
            current: RwLock::new(Arc::new(OverlaySnapshot::default())),
        }
    }

    pub fn style(&self) -> OverlayStyle {
        self.style
    }

    /// Replace the whole item set.
    ///
    /// `geometry` of `None` keeps the geometry of the previous batch.
    pub fn replace_all(&self, items: Vec<OverlayItem>, geometry: Option<SourceGeometry>) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = OverlaySnapshot {
            items,
            geometry: geometry.or(current.geometry),
            sequence: current.sequence + 1,
        };
        *current = Arc::new(next);
    }

    /// Replace the item set with the detections of one completed batch.
    pub fn replace_batch(&self, batch: &DetectionBatch) {
        let items = batch
            .detections
            .iter()
            .cloned()
            .map(OverlayItem::from)
            .collect();
        self.replace_all(items, Some(batch.geometry));
    }

    /// Drop all items and forget the source geometry.
    pub fn clear(&self) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let sequence = current.sequence + 1;
        *current = Arc::new(OverlaySnapshot {
            sequence,
            ..OverlaySnapshot::default()
        });
    }

    pub fn snapshot(&self) -> Arc<OverlaySnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Draw the current item set onto `surface`. Safe to call at any time.
    pub fn render(&self, surface: &mut dyn Surface) -> RenderReport {
        let snapshot = self.snapshot();
        let mut transformer = CoordinateTransformer::new(surface.size());
        if let Some(geometry) = snapshot.geometry {
            transformer.set_context(geometry.width, geometry.height, geometry.mirrored);
        }

        let mut report = RenderReport {
            sequence: snapshot.sequence,
            items: snapshot.items.len(),
            ..RenderReport::default()
        };
        for item in &snapshot.items {
            item.draw(surface, &transformer, &self.style, &mut report);
        }
        if report.markers_skipped > 0 {
            log::debug!(
                "overlay: skipped {} markers, source geometry not known yet",
                report.markers_skipped
            );
        }
        report
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new(OverlayStyle::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{Contour, ContourKind};
    use crate::orientation::RotationState;
    use crate::{BoundingBox, FrameId, RequestId, SurfaceSize};

    fn face(center: Point) -> Detection {
        Detection::new(BoundingBox {
            center,
            width: 100.0,
            height: 120.0,
        })
        .with_contour(Contour::new(
            ContourKind::LeftEye,
            vec![Point::new(300.0, 220.0), Point::new(310.0, 220.0)],
        ))
    }

    fn batch(detections: Vec<Detection>, geometry: SourceGeometry) -> DetectionBatch {
        DetectionBatch {
            request_id: RequestId(1),
            frame_id: FrameId(1),
            rotation: RotationState::Up,
            geometry,
            detections,
        }
    }

    const PORTRAIT: SourceGeometry = SourceGeometry::new(640, 480, false);

    #[test]
    fn empty_set_draws_nothing() {
        let renderer = OverlayRenderer::default();
        let mut surface = RecordingSurface::new(SurfaceSize::new(1080, 1920));
        let report = renderer.render(&mut surface);
        assert_eq!(report.items, 0);
        assert!(surface.calls().is_empty());

        renderer.replace_batch(&batch(Vec::new(), PORTRAIT));
        renderer.render(&mut surface);
        assert!(surface.calls().is_empty());
    }

    #[test]
    fn draws_centre_then_contour_points() {
        let renderer = OverlayRenderer::default();
        renderer.replace_batch(&batch(vec![face(Point::new(320.0, 240.0))], PORTRAIT));

        let mut surface = RecordingSurface::new(SurfaceSize::new(1280, 960));
        let report = renderer.render(&mut surface);
        assert_eq!(report.markers_drawn, 3);
        assert_eq!(report.markers_skipped, 0);

        let calls = surface.calls();
        assert_eq!(calls[0].center, Point::new(640.0, 480.0));
        assert_eq!(calls[1].center, Point::new(600.0, 440.0));
        assert!(calls.iter().all(|c| c.radius == 5.0 && c.color == Color::WHITE));
    }

    #[test]
    fn repeated_render_is_identical() {
        let renderer = OverlayRenderer::default();
        renderer.replace_batch(&batch(vec![face(Point::new(100.0, 50.0))], PORTRAIT));

        let mut first = RecordingSurface::new(SurfaceSize::new(1080, 1920));
        let mut second = RecordingSurface::new(SurfaceSize::new(1080, 1920));
        renderer.render(&mut first);
        renderer.render(&mut second);
        assert_eq!(first.calls(), second.calls());
    }

    #[test]
    fn unknown_geometry_skips_markers() {
        let renderer = OverlayRenderer::default();
        renderer.replace_all(vec![face(Point::new(10.0, 10.0)).into()], None);

        let mut surface = RecordingSurface::new(SurfaceSize::new(100, 100));
        let report = renderer.render(&mut surface);
        assert_eq!(report.markers_drawn, 0);
        assert_eq!(report.markers_skipped, 3);
        assert!(surface.calls().is_empty());
    }

    #[test]
    fn resize_reprojects_current_batch() {
        let renderer = OverlayRenderer::default();
        renderer.replace_batch(&batch(
            vec![Detection::new(BoundingBox {
                center: Point::new(320.0, 240.0),
                width: 10.0,
                height: 10.0,
            })],
            PORTRAIT,
        ));

        let mut small = RecordingSurface::new(SurfaceSize::new(640, 480));
        renderer.render(&mut small);
        small.resize(SurfaceSize::new(1280, 960));
        renderer.render(&mut small);

        let calls = small.calls();
        assert_eq!(calls[0].center, Point::new(320.0, 240.0));
        assert_eq!(calls[1].center, Point::new(640.0, 480.0));
    }

    #[test]
    fn replacement_keeps_previous_geometry_when_unspecified() {
        let renderer = OverlayRenderer::default();
        renderer.replace_batch(&batch(Vec::new(), PORTRAIT));
        renderer.replace_all(vec![face(Point::new(1.0, 1.0)).into()], None);

        let snapshot = renderer.snapshot();
        assert_eq!(snapshot.geometry, Some(PORTRAIT));
        assert_eq!(snapshot.sequence, 2);

        renderer.clear();
        let cleared = renderer.snapshot();
        assert!(cleared.items.is_empty());
        assert_eq!(cleared.geometry, None);
        assert_eq!(cleared.sequence, 3);
    }

    #[test]
    fn held_snapshot_is_unaffected_by_replacement() {
        let renderer = OverlayRenderer::default();
        renderer.replace_batch(&batch(vec![face(Point::new(1.0, 1.0))], PORTRAIT));
        let held = renderer.snapshot();
        renderer.replace_batch(&batch(Vec::new(), PORTRAIT));
        assert_eq!(held.items.len(), 1);
        assert!(renderer.snapshot().items.is_empty());
    }

    #[test]
    fn parses_hex_colours() {
        assert_eq!(Color::parse_hex("#ff8000").unwrap(), Color::rgb(255, 128, 0));
        assert_eq!(Color::parse_hex("FFFFFF").unwrap(), Color::WHITE);
        assert!(Color::parse_hex("#fff").is_err());
        assert!(Color::parse_hex("#gg0000").is_err());
        // from_str_radix alone would accept a leading sign per channel.
        assert!(Color::parse_hex("+1+2+3").is_err());
        assert!(Color::parse_hex("#-1-2-3").is_err());
    }
}
