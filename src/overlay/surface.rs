use anyhow::{anyhow, Result};

use super::Color;
use crate::{Point, SurfaceSize};

/// Render target for overlay markers.
pub trait Surface {
    /// Current pixel dimensions. Read on every render pass.
    fn size(&self) -> SurfaceSize;

    /// Draw a filled circle. Parts outside the surface are clipped.
    fn draw_circle(&mut self, center: Point, radius: f32, color: Color);
}

/// One recorded `draw_circle` call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCall {
    pub center: Point,
    pub radius: f32,
    pub color: Color,
}

/// Surface that records draw calls instead of rasterising them.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    size: SurfaceSize,
    calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            calls: Vec::new(),
        }
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn draw_circle(&mut self, center: Point, radius: f32, color: Color) {
        self.calls.push(DrawCall {
            center,
            radius,
            color,
        });
    }
}

/// RGB8 pixel buffer surface.
pub struct RasterSurface {
    size: SurfaceSize,
    background: Color,
    pixels: Vec<u8>,
}

impl RasterSurface {
    pub fn new(size: SurfaceSize) -> Self {
        Self::with_background(size, Color::BLACK)
    }

    pub fn with_background(size: SurfaceSize, background: Color) -> Self {
        let mut surface = Self {
            size,
            background,
            pixels: Vec::new(),
        };
        surface.resize(size);
        surface
    }

    /// Change dimensions. Contents are reset to the background.
    pub fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
        let len = size.width as usize * size.height as usize * 3;
        self.pixels.clear();
        self.pixels.resize(len, 0);
        self.clear();
    }

    /// Fill with the background colour.
    pub fn clear(&mut self) {
        let fill = self.background.to_array();
        for pixel in self.pixels.chunks_exact_mut(3) {
            pixel.copy_from_slice(&fill);
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let offset = (y as usize * self.size.width as usize + x as usize) * 3;
        let rgb = self.pixels.get(offset..offset + 3)?;
        Some(Color::rgb(rgb[0], rgb[1], rgb[2]))
    }

    /// Number of pixels that differ from the background.
    pub fn painted_pixels(&self) -> usize {
        let fill = self.background.to_array();
        self.pixels
            .chunks_exact(3)
            .filter(|pixel| *pixel != fill)
            .count()
    }

    /// Encode the surface as a JPEG.
    #[cfg(feature = "snapshot-jpeg")]
    pub fn encode_jpeg(&self) -> Result<Vec<u8>> {
        use std::io::Cursor;

        let image =
            image::RgbImage::from_raw(self.size.width, self.size.height, self.pixels.clone())
                .ok_or_else(|| anyhow!("raster surface buffer does not match its size"))?;
        let mut out = Cursor::new(Vec::new());
        image
            .write_to(&mut out, image::ImageFormat::Jpeg)
            .map_err(|e| anyhow!("jpeg encode failed: {}", e))?;
        Ok(out.into_inner())
    }

    #[cfg(not(feature = "snapshot-jpeg"))]
    pub fn encode_jpeg(&self) -> Result<Vec<u8>> {
        Err(anyhow!(
            "jpeg snapshots require the snapshot-jpeg feature"
        ))
    }
}

impl Surface for RasterSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn draw_circle(&mut self, center: Point, radius: f32, color: Color) {
        if self.size.is_empty() || radius <= 0.0 || !center.x.is_finite() || !center.y.is_finite()
        {
            return;
        }
        let max_x = self.size.width as f32 - 1.0;
        let max_y = self.size.height as f32 - 1.0;
        let x0 = (center.x - radius).floor().max(0.0);
        let x1 = (center.x + radius).ceil().min(max_x);
        let y0 = (center.y - radius).floor().max(0.0);
        let y1 = (center.y + radius).ceil().min(max_y);
        if x0 > x1 || y0 > y1 {
            return;
        }

        let rgb = color.to_array();
        let r2 = radius * radius;
        let width = self.size.width as usize;
        for y in y0 as u32..=y1 as u32 {
            for x in x0 as u32..=x1 as u32 {
                let dx = x as f32 - center.x;
                let dy = y as f32 - center.y;
                if dx * dx + dy * dy <= r2 {
                    let offset = (y as usize * width + x as usize) * 3;
                    self.pixels[offset..offset + 3].copy_from_slice(&rgb);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_filled_disc() {
        let mut surface = RasterSurface::new(SurfaceSize::new(20, 20));
        surface.draw_circle(Point::new(10.0, 10.0), 2.0, Color::WHITE);
        assert_eq!(surface.pixel(10, 10), Some(Color::WHITE));
        assert_eq!(surface.pixel(12, 10), Some(Color::WHITE));
        assert_eq!(surface.pixel(13, 10), Some(Color::BLACK));
        // Integer points with dx^2 + dy^2 <= 4.
        assert_eq!(surface.painted_pixels(), 13);
    }

    #[test]
    fn clips_at_edges() {
        let mut surface = RasterSurface::new(SurfaceSize::new(10, 10));
        surface.draw_circle(Point::new(0.0, 0.0), 1.0, Color::WHITE);
        surface.draw_circle(Point::new(-50.0, 5.0), 3.0, Color::WHITE);
        surface.draw_circle(Point::new(f32::NAN, 5.0), 3.0, Color::WHITE);
        assert_eq!(surface.painted_pixels(), 3);
    }

    #[test]
    fn resize_resets_contents() {
        let mut surface = RasterSurface::new(SurfaceSize::new(4, 4));
        surface.draw_circle(Point::new(1.0, 1.0), 1.0, Color::WHITE);
        surface.resize(SurfaceSize::new(8, 2));
        assert_eq!(surface.size(), SurfaceSize::new(8, 2));
        assert_eq!(surface.pixels().len(), 8 * 2 * 3);
        assert_eq!(surface.painted_pixels(), 0);
    }

    #[cfg(feature = "snapshot-jpeg")]
    #[test]
    fn encodes_jpeg() {
        let mut surface = RasterSurface::new(SurfaceSize::new(16, 16));
        surface.draw_circle(Point::new(8.0, 8.0), 4.0, Color::WHITE);
        let jpeg = surface.encode_jpeg().unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }
}
