//! Region polygons into the raster: even-odd fill, then one stroke per ring

use choro_core::{Color, ColorScheme, Projector, Region, Ring};
use tiny_skia::{FillRule, Path, PathBuilder};

use crate::raster::Raster;

/// Outline drawn around every ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureStroke {
    pub color: Color,
    pub width: f32,
}

impl Default for FeatureStroke {
    fn default() -> Self {
        // rgba(80,80,80,0.55)
        Self { color: Color::rgba(80, 80, 80, 140), width: 0.6 }
    }
}

fn push_ring(pb: &mut PathBuilder, ring: &Ring, projector: &Projector) -> bool {
    if ring.len() < 2 {
        return false;
    }
    let (x0, y0) = projector.project(ring[0][0], ring[0][1]);
    pb.move_to(x0 as f32, y0 as f32);
    for pos in &ring[1..] {
        let (x, y) = projector.project(pos[0], pos[1]);
        pb.line_to(x as f32, y as f32);
    }
    pb.close();
    true
}

/// Single closed path for one ring, `None` when it has fewer than two vertices.
pub fn ring_path(ring: &Ring, projector: &Projector) -> Option<Path> {
    let mut pb = PathBuilder::new();
    if !push_ring(&mut pb, ring, projector) {
        return None;
    }
    pb.finish()
}

/// Every ring of every polygon of the region as one compound path.
pub fn region_path(region: &Region, projector: &Projector) -> Option<Path> {
    let mut pb = PathBuilder::new();
    let mut any = false;
    for ring in region.geometry.rings() {
        any |= push_ring(&mut pb, ring, projector);
    }
    if !any {
        return None;
    }
    pb.finish()
}

/// Fill `region` with `fill` and outline each of its rings. Returns false when
/// nothing drawable was left.
pub fn draw_region(raster: &mut Raster, region: &Region, fill: Color, projector: &Projector, stroke: &FeatureStroke) -> bool {
    let Some(path) = region_path(region, projector) else {
        log::debug!("Region '{}' has no drawable rings", region.id);
        return false;
    };
    raster.fill_path(&path, fill, FillRule::EvenOdd);

    for ring in region.geometry.rings() {
        if let Some(outline) = ring_path(ring, projector) {
            raster.stroke_path(&outline, stroke.width, stroke.color);
        }
    }
    true
}

/// Draw regions in input order; later regions paint over earlier ones.
pub fn draw_regions(
    raster: &mut Raster,
    regions: &[Region],
    scheme: &ColorScheme,
    projector: &Projector,
    stroke: &FeatureStroke,
) -> usize {
    let mut drawn = 0;
    for region in regions {
        if draw_region(raster, region, scheme.fill_for(&region.id), projector, stroke) {
            drawn += 1;
        }
    }
    log::debug!("Rasterized {}/{} regions", drawn, regions.len());
    drawn
}
