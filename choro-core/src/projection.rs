//! Geographic to pixel mapping through a fixed Web-Mercator style transform.
//!
//! The reference bounding box is projected once; the draw rectangle keeps the
//! projected aspect ratio inside whatever pixel area the page offers, so only the
//! pixel scale changes between DPI settings.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{ChoroError, ChoroResult};

/// Conformal cylindrical projection of a lon/lat pair (degrees) into radians space.
pub fn mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = lon * PI / 180.0;
    let y = (PI / 4.0 + lat * PI / 360.0).tan().ln();
    (x, y)
}

/// Reference extent of the mapped region in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    pub fn new(min_lon: f64, max_lon: f64, min_lat: f64, max_lat: f64) -> ChoroResult<Self> {
        let bounds = Self { min_lon, max_lon, min_lat, max_lat };
        bounds.validate()?;
        Ok(bounds)
    }

    /// South Korea, mainland plus Jeju.
    pub fn korea() -> Self {
        Self { min_lon: 124.2, max_lon: 131.3, min_lat: 32.8, max_lat: 39.1 }
    }

    pub fn validate(&self) -> ChoroResult<()> {
        let finite = [self.min_lon, self.max_lon, self.min_lat, self.max_lat].iter().all(|v| v.is_finite());
        if !finite || self.min_lon >= self.max_lon || self.min_lat >= self.max_lat {
            return Err(ChoroError::InvalidParams(format!("degenerate bounds: {:?}", self)));
        }
        if self.min_lat <= -90.0 || self.max_lat >= 90.0 {
            return Err(ChoroError::InvalidParams("latitude bounds must stay inside (-90, 90)".into()));
        }
        Ok(())
    }

    /// Projected (min_x, min_y, max_x, max_y).
    pub fn projected(&self) -> (f64, f64, f64, f64) {
        let (min_x, min_y) = mercator(self.min_lon, self.min_lat);
        let (max_x, max_y) = mercator(self.max_lon, self.max_lat);
        (min_x, min_y, max_x, max_y)
    }

    /// Projected width over projected height.
    pub fn aspect_ratio(&self) -> f64 {
        let (min_x, min_y, max_x, max_y) = self.projected();
        (max_x - min_x) / (max_y - min_y)
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::korea()
    }
}

/// Axis-aligned rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Maps lon/lat into a draw rectangle fitted inside a page area.
#[derive(Debug, Clone, PartialEq)]
pub struct Projector {
    min_x: f64,
    min_y: f64,
    span_x: f64,
    span_y: f64,
    draw: PixelRect,
}

impl Projector {
    /// Fit `bounds` into `area`, preserving the projected aspect ratio and centering
    /// along the dimension that has slack.
    pub fn fit(bounds: &GeoBounds, area: PixelRect) -> Self {
        let (min_x, min_y, max_x, max_y) = bounds.projected();
        let span_x = max_x - min_x;
        let span_y = max_y - min_y;
        let data_ratio = span_x / span_y;
        let area_ratio = area.width / area.height;

        let draw = if area_ratio > data_ratio {
            // Area is wider than the data: height is the constraint
            let width = area.height * data_ratio;
            PixelRect::new(area.x + (area.width - width) / 2.0, area.y, width, area.height)
        } else {
            let height = area.width / data_ratio;
            PixelRect::new(area.x, area.y + (area.height - height) / 2.0, area.width, height)
        };

        Self { min_x, min_y, span_x, span_y, draw }
    }

    pub fn draw_rect(&self) -> PixelRect {
        self.draw
    }

    /// Pixel position of a lon/lat pair. North maps to smaller `y`.
    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (mx, my) = mercator(lon, lat);
        let px = (mx - self.min_x) / self.span_x * self.draw.width + self.draw.x;
        let py = (1.0 - (my - self.min_y) / self.span_y) * self.draw.height + self.draw.y;
        (px, py)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_mercator_reference_points() {
        let (x, y) = mercator(0.0, 0.0);
        assert!(x.abs() < EPS && y.abs() < EPS);
        let (x, _) = mercator(180.0, 0.0);
        assert!((x - PI).abs() < EPS);
        // Symmetric about the equator
        let (_, north) = mercator(10.0, 45.0);
        let (_, south) = mercator(10.0, -45.0);
        assert!((north + south).abs() < EPS);
    }

    #[test]
    fn test_fit_wide_area_constrains_height() {
        let bounds = GeoBounds::korea();
        let area = PixelRect::new(36.0, 84.0, 10_000.0, 500.0);
        let projector = Projector::fit(&bounds, area);
        let draw = projector.draw_rect();
        assert!((draw.height - 500.0).abs() < EPS);
        assert!((draw.y - 84.0).abs() < EPS);
        assert!((draw.width / draw.height - bounds.aspect_ratio()).abs() < 1e-9);
        // Centered horizontally
        let left_gap = draw.x - area.x;
        let right_gap = area.right() - draw.right();
        assert!((left_gap - right_gap).abs() < 1e-6);
    }

    #[test]
    fn test_fit_tall_area_constrains_width() {
        let bounds = GeoBounds::korea();
        let area = PixelRect::new(0.0, 0.0, 400.0, 4_000.0);
        let draw = Projector::fit(&bounds, area).draw_rect();
        assert!((draw.width - 400.0).abs() < EPS);
        assert!((draw.y - (4_000.0 - draw.height) / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_corners_map_to_draw_rect() {
        let bounds = GeoBounds::korea();
        let projector = Projector::fit(&bounds, PixelRect::new(10.0, 20.0, 300.0, 300.0));
        let draw = projector.draw_rect();

        let (x, y) = projector.project(bounds.min_lon, bounds.max_lat);
        assert!((x - draw.x).abs() < 1e-6 && (y - draw.y).abs() < 1e-6);

        let (x, y) = projector.project(bounds.max_lon, bounds.min_lat);
        assert!((x - draw.right()).abs() < 1e-6 && (y - draw.bottom()).abs() < 1e-6);
    }

    #[test]
    fn test_proportions_are_scale_invariant() {
        let bounds = GeoBounds::korea();
        let small = Projector::fit(&bounds, PixelRect::new(0.0, 0.0, 722.0, 600.0));
        let large = Projector::fit(&bounds, PixelRect::new(0.0, 0.0, 722.0 * 3.125, 600.0 * 3.125));
        let (sx, sy) = small.project(127.0, 37.5);
        let (lx, ly) = large.project(127.0, 37.5);
        assert!((lx / sx - 3.125).abs() < 1e-9);
        assert!((ly / sy - 3.125).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(GeoBounds::new(130.0, 120.0, 30.0, 40.0).is_err());
        assert!(GeoBounds::new(120.0, 130.0, 30.0, 90.0).is_err());
        assert!(GeoBounds::new(120.0, 130.0, 30.0, 40.0).is_ok());
    }
}
