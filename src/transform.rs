//! Detector-space to surface-space coordinate mapping.
//!
//! The transformer only scales and mirrors. Rotation is resolved upstream:
//! callers hand it the *post-rotation* source shape (width/height already
//! swapped for 90°/270° frames), see `Frame::logical_dimensions`.

use crate::{Point, SurfaceSize};

/// Source half of a transform context, fixed per detection batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceGeometry {
    pub width: u32,
    pub height: u32,
    pub mirrored: bool,
}

impl SourceGeometry {
    pub const fn new(width: u32, height: u32, mirrored: bool) -> Self {
        Self {
            width,
            height,
            mirrored,
        }
    }
}

/// Everything needed to map a source point onto the surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransformContext {
    pub source_width: u32,
    pub source_height: u32,
    pub surface_width: u32,
    pub surface_height: u32,
    pub mirrored: bool,
}

impl TransformContext {
    pub fn new(source: SourceGeometry, surface: SurfaceSize) -> Self {
        Self {
            source_width: source.width,
            source_height: source.height,
            surface_width: surface.width,
            surface_height: surface.height,
            mirrored: source.mirrored,
        }
    }

    /// Independent (sx, sy) scale factors, `None` until both source axes are known.
    pub fn scale(&self) -> Option<(f32, f32)> {
        if self.source_width == 0 || self.source_height == 0 {
            return None;
        }
        Some((
            self.surface_width as f32 / self.source_width as f32,
            self.surface_height as f32 / self.source_height as f32,
        ))
    }
}

/// Maps detector-image points to surface points.
///
/// Scale factors are derived from the context on every call, so a dimension
/// change can never leave a stale factor behind.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CoordinateTransformer {
    context: TransformContext,
}

impl CoordinateTransformer {
    pub fn new(surface: SurfaceSize) -> Self {
        Self {
            context: TransformContext {
                surface_width: surface.width,
                surface_height: surface.height,
                ..TransformContext::default()
            },
        }
    }

    pub fn with_context(context: TransformContext) -> Self {
        Self { context }
    }

    pub fn set_context(&mut self, source_width: u32, source_height: u32, mirrored: bool) {
        self.context.source_width = source_width;
        self.context.source_height = source_height;
        self.context.mirrored = mirrored;
    }

    pub fn set_surface_size(&mut self, surface: SurfaceSize) {
        self.context.surface_width = surface.width;
        self.context.surface_height = surface.height;
    }

    pub fn context(&self) -> TransformContext {
        self.context
    }

    /// True once source dimensions are known.
    pub fn is_ready(&self) -> bool {
        self.context.scale().is_some()
    }

    pub fn to_surface_x(&self, px: f32) -> Option<f32> {
        let (sx, _) = self.context.scale()?;
        let x = px * sx;
        if self.context.mirrored {
            Some(self.context.surface_width as f32 - x)
        } else {
            Some(x)
        }
    }

    pub fn to_surface_y(&self, py: f32) -> Option<f32> {
        let (_, sy) = self.context.scale()?;
        Some(py * sy)
    }

    pub fn to_surface(&self, point: Point) -> Option<Point> {
        Some(Point::new(
            self.to_surface_x(point.x)?,
            self.to_surface_y(point.y)?,
        ))
    }
}
