/*!
# Page Composition

Lays out an A4 portrait page (header, map frame, legend, footer) at any DPI.
Every measurement is given in reference units at 96 DPI and converted with
`round(reference * dpi / 96)`, each dimension rounded on its own, so the page
keeps its proportions across resolutions.
*/

use choro_core::{Color, ColorScheme, GeoBounds, LegendEntry, PixelRect, Projector, Region};
use tiny_skia::{FillRule, Path, PathBuilder};

use crate::error::ExportResult;
use crate::raster::Raster;
use crate::rasterize::{draw_regions, FeatureStroke};
use crate::text::{draw_text, Fonts, HAlign, TextStyle, VAnchor};

/// Resolution at which reference units equal pixels.
pub const REFERENCE_DPI: f64 = 96.0;

pub fn scale_for_dpi(dpi: u32) -> f64 {
    dpi as f64 / REFERENCE_DPI
}

/// Reference length scaled and rounded to whole pixels.
pub fn px(reference: f64, scale: f64) -> f64 {
    (reference * scale).round()
}

/// Page measurements in reference units.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSpec {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    pub header_height: f64,
    pub divider_width: f64,
    pub map_padding: f64,
    pub legend_height: f64,
    pub footer_height: f64,
    pub section_gap: f64,
    pub corner_radius: f64,
    pub border_width: f64,
    pub feature_stroke_width: f64,
    pub title_size: f64,
    pub title_y: f64,
    pub subtitle_size: f64,
    pub subtitle_y: f64,
    pub footer_text_offset: f64,
    pub secondary_offset: f64,
    pub dpi_tag_offset: f64,
    pub attribution_size: f64,
    pub secondary_size: f64,
    pub legend: LegendSpec,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            width: 794.0,
            height: 1123.0,
            margin: 36.0,
            header_height: 72.0,
            divider_width: 1.0,
            map_padding: 12.0,
            legend_height: 150.0,
            footer_height: 60.0,
            section_gap: 8.0,
            corner_radius: 4.0,
            border_width: 1.0,
            feature_stroke_width: 0.6,
            title_size: 22.0,
            title_y: 24.0,
            subtitle_size: 13.0,
            subtitle_y: 52.0,
            footer_text_offset: 16.0,
            secondary_offset: 18.0,
            dpi_tag_offset: 4.0,
            attribution_size: 12.0,
            secondary_size: 10.0,
            legend: LegendSpec::default(),
        }
    }
}

/// Legend swatch and label measurements in reference units.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendSpec {
    pub max_columns: usize,
    pub bottom_inset: f64,
    pub swatch_size: f64,
    pub label_size: f64,
    pub label_offset: f64,
    pub swatch_border: f64,
}

impl Default for LegendSpec {
    fn default() -> Self {
        Self {
            max_columns: 4,
            bottom_inset: 4.0,
            swatch_size: 13.0,
            label_size: 11.0,
            label_offset: 5.0,
            swatch_border: 0.5,
        }
    }
}

/// Non-data colors of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub background: Color,
    pub water: Color,
    pub map_border: Color,
    pub title: Color,
    pub subtitle: Color,
    pub divider: Color,
    pub legend_text: Color,
    pub swatch_border: Color,
    pub attribution: Color,
    pub attribution_secondary: Color,
    pub dpi_tag: Color,
    pub feature_stroke: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            water: Color::rgb(0xd8, 0xea, 0xf4),
            map_border: Color::rgb(0xaa, 0xc8, 0xdc),
            title: Color::rgb(0x1e, 0x3a, 0x5f),
            subtitle: Color::rgb(0x6b, 0x72, 0x80),
            divider: Color::rgb(0xe5, 0xe7, 0xeb),
            legend_text: Color::rgb(0x37, 0x41, 0x51),
            swatch_border: Color::rgb(0xcc, 0xcc, 0xcc),
            attribution: Color::rgb(0x1e, 0x3a, 0x5f),
            attribution_secondary: Color::rgb(0x9c, 0xa3, 0xaf),
            dpi_tag: Color::rgb(0xd1, 0xd5, 0xdb),
            feature_stroke: FeatureStroke::default().color,
        }
    }
}

/// Footer credit lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribution {
    pub primary: String,
    pub secondary: String,
}

impl Default for Attribution {
    fn default() -> Self {
        Self {
            primary: "Dept. of Geography, Kongju National University".to_string(),
            secondary: "All rights reserved".to_string(),
        }
    }
}

/// Pixel positions of every page section at one DPI.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub dpi: u32,
    pub scale: f64,
    pub width: u32,
    pub height: u32,
    pub margin: f64,
    pub inner_width: f64,
    pub header_height: f64,
    pub divider_width: f64,
    pub map_padding: f64,
    pub legend_height: f64,
    pub footer_height: f64,
    pub section_gap: f64,
    pub map_top: f64,
    pub map_bottom: f64,
    pub legend_top: f64,
    pub footer_top: f64,
    pub corner_radius: f64,
    pub border_width: f64,
    pub feature_stroke_width: f64,
}

impl PageLayout {
    pub fn new(spec: &PageSpec, dpi: u32) -> Self {
        let scale = scale_for_dpi(dpi);
        let width = px(spec.width, scale);
        let height = px(spec.height, scale);
        let margin = px(spec.margin, scale);
        let header_height = px(spec.header_height, scale);
        let map_padding = px(spec.map_padding, scale);
        let legend_height = px(spec.legend_height, scale);
        let footer_height = px(spec.footer_height, scale);
        let section_gap = px(spec.section_gap, scale);

        let map_top = header_height + map_padding;
        let map_bottom = height - footer_height - section_gap - legend_height - section_gap;

        let layout = Self {
            dpi,
            scale,
            width: width as u32,
            height: height as u32,
            margin,
            inner_width: width - 2.0 * margin,
            header_height,
            divider_width: px(spec.divider_width, scale),
            map_padding,
            legend_height,
            footer_height,
            section_gap,
            map_top,
            map_bottom,
            legend_top: map_bottom + section_gap,
            footer_top: height - footer_height,
            corner_radius: px(spec.corner_radius, scale),
            border_width: px(spec.border_width, scale),
            feature_stroke_width: px(spec.feature_stroke_width, scale),
        };
        log::debug!(
            "Page layout at {} dpi: {}x{}, map {}..{}, legend {}, footer {}",
            dpi, layout.width, layout.height, layout.map_top, layout.map_bottom, layout.legend_top, layout.footer_top
        );
        layout
    }

    /// Area available to the map draw rectangle.
    pub fn map_area(&self) -> PixelRect {
        PixelRect::new(self.margin, self.map_top, self.inner_width, self.map_bottom - self.map_top)
    }

    pub fn legend_area(&self) -> PixelRect {
        PixelRect::new(self.margin, self.legend_top, self.inner_width, self.legend_height)
    }
}

/// Map-only canvas: page inner width, height from the projected aspect ratio,
/// map padding on every side.
#[derive(Debug, Clone, PartialEq)]
pub struct MapOnlyLayout {
    pub dpi: u32,
    pub width: u32,
    pub height: u32,
    pub map_area: PixelRect,
}

impl MapOnlyLayout {
    pub fn new(spec: &PageSpec, bounds: &GeoBounds, dpi: u32) -> Self {
        let page = PageLayout::new(spec, dpi);
        let pad = page.map_padding;
        let draw_width = page.inner_width - 2.0 * pad;
        let draw_height = (draw_width / bounds.aspect_ratio()).round();
        Self {
            dpi,
            width: page.inner_width as u32,
            height: (draw_height + 2.0 * pad) as u32,
            map_area: PixelRect::new(pad, pad, draw_width, draw_height),
        }
    }
}

/// Cell arithmetic of the legend grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendGrid {
    pub columns: usize,
    pub rows: usize,
    pub column_width: f64,
    pub row_height: f64,
}

impl LegendGrid {
    pub fn new(entries: usize, area: &PixelRect, spec: &LegendSpec, scale: f64) -> Option<Self> {
        if entries == 0 {
            return None;
        }
        let columns = spec.max_columns.min(entries.div_ceil(2)).max(1);
        let rows = entries.div_ceil(columns);
        Some(Self {
            columns,
            rows,
            column_width: (area.width / columns as f64).floor(),
            row_height: ((area.height - px(spec.bottom_inset, scale)) / rows as f64).floor(),
        })
    }

    /// Left edge and vertical center of entry `index`.
    pub fn cell(&self, area: &PixelRect, index: usize) -> (f64, f64) {
        let col = index % self.columns;
        let row = index / self.columns;
        let x = area.x + col as f64 * self.column_width;
        let y = area.y + row as f64 * self.row_height + self.row_height / 2.0;
        (x, y)
    }
}

fn rounded_rect(rect: &PixelRect, radius: f64) -> Option<Path> {
    let (x, y, w, h) = (rect.x as f32, rect.y as f32, rect.width as f32, rect.height as f32);
    let r = (radius as f32).min(w / 2.0).min(h / 2.0).max(0.0);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}

/// Map frame inputs shared by the full-page and map-only variants.
pub struct MapFrame<'a> {
    pub bounds: &'a GeoBounds,
    pub regions: &'a [Region],
    pub scheme: &'a ColorScheme,
}

/// Paints page sections into an owned raster.
pub struct PageBuilder<'a> {
    raster: Raster,
    spec: &'a PageSpec,
    theme: &'a Theme,
    fonts: &'a Fonts,
    scale: f64,
}

impl<'a> PageBuilder<'a> {
    pub fn new(
        width: u32,
        height: u32,
        dpi: u32,
        spec: &'a PageSpec,
        theme: &'a Theme,
        fonts: &'a Fonts,
    ) -> ExportResult<Self> {
        let raster = Raster::new(width, height, theme.background)?;
        Ok(Self { raster, spec, theme, fonts, scale: scale_for_dpi(dpi) })
    }

    fn r(&self, reference: f64) -> f64 {
        px(reference, self.scale)
    }

    fn hline(&mut self, x0: f64, x1: f64, y: f64, width: f64, color: Color) {
        self.raster.stroke_line((x0 as f32, y as f32), (x1 as f32, y as f32), width as f32, color);
    }

    /// Title, optional subtitle and the divider under the header.
    pub fn add_header(&mut self, layout: &PageLayout, title: &str, subtitle: Option<&str>) {
        let title_style = TextStyle::new(self.r(self.spec.title_size) as f32, self.theme.title).bold();
        let x = layout.margin as f32;
        let title_y = self.r(self.spec.title_y) as f32;
        draw_text(&mut self.raster, self.fonts, x, title_y, title, &title_style, HAlign::Left, VAnchor::Middle);

        if let Some(subtitle) = subtitle.filter(|s| !s.is_empty()) {
            let style = TextStyle::new(self.r(self.spec.subtitle_size) as f32, self.theme.subtitle);
            let subtitle_y = self.r(self.spec.subtitle_y) as f32;
            draw_text(&mut self.raster, self.fonts, x, subtitle_y, subtitle, &style, HAlign::Left, VAnchor::Middle);
        }

        let right = layout.width as f64 - layout.margin;
        self.hline(layout.margin, right, layout.header_height, layout.divider_width, self.theme.divider);
    }

    /// Water background, regions, then the frame border. Returns the projector used.
    pub fn add_map_frame(&mut self, area: PixelRect, frame: &MapFrame<'_>) -> Projector {
        let projector = Projector::fit(frame.bounds, area);
        let draw = projector.draw_rect();
        let radius = self.r(self.spec.corner_radius);
        let outline = rounded_rect(&draw, radius);

        if let Some(path) = &outline {
            self.raster.fill_path(path, self.theme.water, FillRule::Winding);
        }

        let stroke = FeatureStroke {
            color: self.theme.feature_stroke,
            width: self.r(self.spec.feature_stroke_width) as f32,
        };
        let drawn = draw_regions(&mut self.raster, frame.regions, frame.scheme, &projector, &stroke);
        log::info!("Drew {} regions into a {:.0}x{:.0} map frame", drawn, draw.width, draw.height);

        if let Some(path) = &outline {
            self.raster.stroke_path(path, self.r(self.spec.border_width) as f32, self.theme.map_border);
        }
        projector
    }

    /// Swatch grid; empty `entries` draws nothing.
    pub fn add_legend(&mut self, area: PixelRect, entries: &[LegendEntry]) {
        let spec = &self.spec.legend;
        let Some(grid) = LegendGrid::new(entries.len(), &area, spec, self.scale) else {
            return;
        };
        let swatch = self.r(spec.swatch_size);
        let border = self.r(spec.swatch_border);
        let label_offset = self.r(spec.label_offset);
        let label_style = TextStyle::new(self.r(spec.label_size) as f32, self.theme.legend_text);

        for (i, entry) in entries.iter().enumerate() {
            let (x, cy) = grid.cell(&area, i);
            let top = cy - swatch / 2.0;
            self.raster.fill_rect(x as f32, top as f32, swatch as f32, swatch as f32, entry.color);
            self.raster
                .stroke_rect(x as f32, top as f32, swatch as f32, swatch as f32, border as f32, self.theme.swatch_border);
            draw_text(
                &mut self.raster,
                self.fonts,
                (x + swatch + label_offset) as f32,
                cy as f32,
                &entry.label,
                &label_style,
                HAlign::Left,
                VAnchor::Middle,
            );
        }
    }

    /// Divider, two attribution lines and the right-aligned DPI tag.
    pub fn add_footer(&mut self, layout: &PageLayout, attribution: &Attribution) {
        let right = layout.width as f64 - layout.margin;
        self.hline(layout.margin, right, layout.footer_top, layout.divider_width, self.theme.divider);

        let fy = layout.footer_top + self.r(self.spec.footer_text_offset);
        let x = layout.margin as f32;
        let primary = TextStyle::new(self.r(self.spec.attribution_size) as f32, self.theme.attribution).bold();
        draw_text(&mut self.raster, self.fonts, x, fy as f32, &attribution.primary, &primary, HAlign::Left, VAnchor::Top);

        let secondary = TextStyle::new(self.r(self.spec.secondary_size) as f32, self.theme.attribution_secondary);
        let secondary_y = (fy + self.r(self.spec.secondary_offset)) as f32;
        draw_text(&mut self.raster, self.fonts, x, secondary_y, &attribution.secondary, &secondary, HAlign::Left, VAnchor::Top);

        let tag = TextStyle::new(self.r(self.spec.secondary_size) as f32, self.theme.dpi_tag);
        let tag_y = (fy + self.r(self.spec.dpi_tag_offset)) as f32;
        let label = format!("{} DPI", layout.dpi);
        draw_text(&mut self.raster, self.fonts, right as f32, tag_y, &label, &tag, HAlign::Right, VAnchor::Top);
    }

    pub fn finish(self) -> Raster {
        self.raster
    }
}
