//! Text drawing with fontdue-rasterized TrueType glyphs
//!
//! DejaVu Sans (regular and bold) is embedded and covers Latin, Greek and
//! Cyrillic. Scripts it lacks, Hangul among them, need a fallback font added with
//! [`Fonts::with_fallback`]; characters no font carries draw as the primary
//! font's missing-glyph box.

use std::fmt;
use std::sync::{Arc, OnceLock};

use choro_core::Color;
use fontdue::{Font, FontSettings};

use crate::error::{ExportError, ExportResult};
use crate::raster::Raster;

const DEJAVU_SANS: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
const DEJAVU_SANS_BOLD: &[u8] = include_bytes!("../assets/fonts/DejaVuSans-Bold.ttf");

fn parse_font(bytes: &[u8]) -> ExportResult<Font> {
    Font::from_bytes(bytes, FontSettings::default()).map_err(|e| ExportError::Font(e.to_string()))
}

#[derive(Clone)]
struct Face {
    font: Arc<Font>,
    /// Draw a second, offset pass to fake a bold weight.
    embolden: bool,
}

/// Ordered font chains for regular and bold text. Each character is drawn with
/// the first font in the chain that has a glyph for it.
#[derive(Clone)]
pub struct Fonts {
    regular: Vec<Face>,
    bold: Vec<Face>,
}

impl fmt::Debug for Fonts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fonts")
            .field("regular", &self.regular.len())
            .field("bold", &self.bold.len())
            .finish()
    }
}

impl Fonts {
    /// Regular and bold faces from raw TrueType/OpenType bytes.
    pub fn from_bytes(regular: &[u8], bold: &[u8]) -> ExportResult<Self> {
        Ok(Self {
            regular: vec![Face { font: Arc::new(parse_font(regular)?), embolden: false }],
            bold: vec![Face { font: Arc::new(parse_font(bold)?), embolden: false }],
        })
    }

    /// The embedded DejaVu Sans pair. Parsed once per process.
    pub fn embedded() -> ExportResult<Self> {
        static EMBEDDED: OnceLock<Result<Fonts, String>> = OnceLock::new();
        EMBEDDED
            .get_or_init(|| Fonts::from_bytes(DEJAVU_SANS, DEJAVU_SANS_BOLD).map_err(|e| e.to_string()))
            .clone()
            .map_err(ExportError::Font)
    }

    /// Append a fallback font to both chains; bold text in it is synthesized.
    pub fn with_fallback(mut self, bytes: &[u8]) -> ExportResult<Self> {
        let font = Arc::new(parse_font(bytes)?);
        self.regular.push(Face { font: font.clone(), embolden: false });
        self.bold.push(Face { font, embolden: true });
        Ok(self)
    }

    /// Whether any regular font has a real glyph for `ch`.
    pub fn has_glyph(&self, ch: char) -> bool {
        self.regular.iter().any(|face| face.font.lookup_glyph_index(ch) != 0)
    }

    fn chain(&self, bold: bool) -> &[Face] {
        if bold {
            &self.bold
        } else {
            &self.regular
        }
    }

    fn face_for(&self, ch: char, bold: bool) -> Option<&Face> {
        let chain = self.chain(bold);
        chain
            .iter()
            .find(|face| face.font.lookup_glyph_index(ch) != 0)
            .or_else(|| chain.first())
    }

    /// `(ascent, descent)` of the primary font; descent is negative.
    fn line_extent(&self, size: f32, bold: bool) -> (f32, f32) {
        self.chain(bold)
            .first()
            .and_then(|face| face.font.horizontal_line_metrics(size))
            .map(|m| (m.ascent, m.descent))
            .unwrap_or((size * 0.8, -size * 0.2))
    }
}

impl Default for Fonts {
    fn default() -> Self {
        Self::embedded().unwrap_or_else(|err| {
            log::error!("Embedded fonts unavailable, text will not be drawn: {}", err);
            Self { regular: Vec::new(), bold: Vec::new() }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAnchor {
    Top,
    Middle,
}

/// Text appearance. `size` is a pixel size at the target resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub color: Color,
    pub bold: bool,
}

impl TextStyle {
    pub fn new(size: f32, color: Color) -> Self {
        Self { size, color, bold: false }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Offset of the second pass for synthesized bold.
    fn embolden_offset(&self) -> i32 {
        ((self.size / 24.0).round() as i32).max(1)
    }
}

/// `(width, height)` of `text` in pixels; height spans ascent to descent.
pub fn measure(fonts: &Fonts, text: &str, style: &TextStyle) -> (f32, f32) {
    let (ascent, descent) = fonts.line_extent(style.size, style.bold);
    let mut width = 0.0;
    let mut embolden = false;
    for ch in text.chars() {
        if let Some(face) = fonts.face_for(ch, style.bold) {
            width += face.font.metrics(ch, style.size).advance_width;
            embolden |= face.embolden;
        }
    }
    if width > 0.0 && embolden {
        width += style.embolden_offset() as f32;
    }
    (width, ascent - descent)
}

/// Draw `text` anchored at `(x, y)`. Returns the advance width.
pub fn draw_text(
    raster: &mut Raster,
    fonts: &Fonts,
    x: f32,
    y: f32,
    text: &str,
    style: &TextStyle,
    align: HAlign,
    anchor: VAnchor,
) -> f32 {
    let (width, _) = measure(fonts, text, style);
    if width <= 0.0 {
        return 0.0;
    }
    let (ascent, descent) = fonts.line_extent(style.size, style.bold);
    let mut pen_x = match align {
        HAlign::Left => x,
        HAlign::Right => x - width,
    };
    let baseline = match anchor {
        VAnchor::Top => y + ascent,
        VAnchor::Middle => y + (ascent + descent) / 2.0,
    }
    .round() as i32;

    for ch in text.chars() {
        let Some(face) = fonts.face_for(ch, style.bold) else {
            continue;
        };
        let (metrics, coverage) = face.font.rasterize(ch, style.size);
        // ymin is the bottom edge relative to the baseline, y up
        let gx = pen_x.round() as i32 + metrics.xmin;
        let gy = baseline - (metrics.height as i32 + metrics.ymin);
        let (w, h) = (metrics.width as u32, metrics.height as u32);
        raster.draw_coverage(gx, gy, w, h, &coverage, style.color);
        if face.embolden {
            raster.draw_coverage(gx + style.embolden_offset(), gy, w, h, &coverage, style.color);
        }
        pen_x += metrics.advance_width;
    }
    width
}
