//! Owned RGBA pixel buffer backed by a tiny-skia pixmap

use choro_core::Color;
use tiny_skia::{ColorU8, FillRule, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform};

use crate::error::{ExportError, ExportResult};

fn paint(color: Color, anti_alias: bool) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = anti_alias;
    paint
}

/// Pixel buffer for one export. Dimensions are fixed at creation.
pub struct Raster {
    pixmap: Pixmap,
}

impl Raster {
    pub fn new(width: u32, height: u32, background: Color) -> ExportResult<Self> {
        let mut pixmap = Pixmap::new(width, height).ok_or(ExportError::RasterAlloc { width, height })?;
        pixmap.fill(tiny_skia::Color::from_rgba8(background.r, background.g, background.b, background.a));
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Straight-alpha color at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        // Pixmap::pixel only bounds-checks the flat index
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let p = self.pixmap.pixel(x, y)?.demultiply();
        Some(Color::rgba(p.red(), p.green(), p.blue(), p.alpha()))
    }

    /// Axis-aligned, pixel-snapped rectangle fill.
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        if let Some(rect) = Rect::from_xywh(x, y, width, height) {
            self.pixmap.fill_rect(rect, &paint(color, false), Transform::identity(), None);
        }
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, line_width: f32, color: Color) {
        if let Some(rect) = Rect::from_xywh(x, y, width, height) {
            let path = PathBuilder::from_rect(rect);
            self.stroke_path(&path, line_width, color);
        }
    }

    pub fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), line_width: f32, color: Color) {
        let mut pb = PathBuilder::new();
        pb.move_to(from.0, from.1);
        pb.line_to(to.0, to.1);
        if let Some(path) = pb.finish() {
            self.stroke_path(&path, line_width, color);
        }
    }

    pub fn fill_path(&mut self, path: &Path, color: Color, rule: FillRule) {
        self.pixmap.fill_path(path, &paint(color, true), rule, Transform::identity(), None);
    }

    pub fn stroke_path(&mut self, path: &Path, line_width: f32, color: Color) {
        if line_width <= 0.0 {
            return;
        }
        let stroke = Stroke { width: line_width, ..Stroke::default() };
        self.pixmap.stroke_path(path, &paint(color, true), &stroke, Transform::identity(), None);
    }

    /// Blend an 8-bit coverage bitmap (row-major, `width` x `height`) in `color`
    /// with its top-left corner at `(x, y)`. Parts outside the raster are clipped.
    pub fn draw_coverage(&mut self, x: i32, y: i32, width: u32, height: u32, coverage: &[u8], color: Color) {
        let Some(mut glyph) = Pixmap::new(width, height) else {
            return;
        };
        for (dst, &cov) in glyph.pixels_mut().iter_mut().zip(coverage) {
            let alpha = (u16::from(cov) * u16::from(color.a) / 255) as u8;
            *dst = ColorU8::from_rgba(color.r, color.g, color.b, alpha).premultiply();
        }
        self.pixmap.draw_pixmap(x, y, glyph.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
    }

    /// Straight-alpha RGBA bytes, row-major.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.pixels().len() * 4);
        for p in self.pixmap.pixels() {
            let c = p.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_fills_background() {
        let raster = Raster::new(4, 3, Color::rgb(10, 20, 30)).unwrap();
        assert_eq!((raster.width(), raster.height()), (4, 3));
        assert_eq!(raster.pixel(3, 2), Some(Color::rgb(10, 20, 30)));
        assert_eq!(raster.pixel(4, 0), None);
        assert_eq!(raster.pixel(0, 3), None);
        assert_eq!(raster.pixel(u32::MAX, 0), None);
        assert_eq!(raster.to_rgba().len(), 4 * 3 * 4);
    }

    #[test]
    fn test_zero_size_is_alloc_error() {
        assert!(matches!(
            Raster::new(0, 10, Color::WHITE),
            Err(ExportError::RasterAlloc { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_fill_rect_is_pixel_exact() {
        let mut raster = Raster::new(10, 10, Color::WHITE).unwrap();
        raster.fill_rect(2.0, 2.0, 3.0, 3.0, Color::rgb(255, 0, 0));
        assert_eq!(raster.pixel(2, 2), Some(Color::rgb(255, 0, 0)));
        assert_eq!(raster.pixel(4, 4), Some(Color::rgb(255, 0, 0)));
        assert_eq!(raster.pixel(5, 5), Some(Color::WHITE));
        assert_eq!(raster.pixel(1, 2), Some(Color::WHITE));
    }

    #[test]
    fn test_out_of_range_column_does_not_wrap() {
        let mut raster = Raster::new(3, 2, Color::WHITE).unwrap();
        raster.fill_rect(0.0, 1.0, 1.0, 1.0, Color::rgb(255, 0, 0));
        // (3, 0) would alias (0, 1) through the flat index
        assert_eq!(raster.pixel(0, 1), Some(Color::rgb(255, 0, 0)));
        assert_eq!(raster.pixel(3, 0), None);
    }

    #[test]
    fn test_draw_coverage_blends_and_clips() {
        let mut raster = Raster::new(4, 4, Color::WHITE).unwrap();
        let coverage = [255, 0, 128, 255];
        raster.draw_coverage(2, 2, 2, 2, &coverage, Color::rgb(0, 0, 0));
        assert_eq!(raster.pixel(2, 2), Some(Color::rgb(0, 0, 0)));
        assert_eq!(raster.pixel(3, 2), Some(Color::WHITE));
        let half = raster.pixel(2, 3).unwrap();
        assert!(half.r > 100 && half.r < 150, "half coverage gives mid grey, got {:?}", half);

        // Fully outside: nothing drawn, no panic
        raster.draw_coverage(10, -5, 2, 2, &coverage, Color::rgb(0, 0, 0));
        raster.draw_coverage(0, 0, 0, 0, &[], Color::rgb(0, 0, 0));
        assert_eq!(raster.pixel(0, 0), Some(Color::WHITE));
    }
}
