/*!
# Map Export

Front door of the crate: compose a page (or a bare map), encode it and hand
back the bytes with a suggested filename. Nothing here touches the filesystem.
*/

use choro_core::{ColorScheme, GeoBounds, LegendText, Region};
use rayon::prelude::*;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use crate::error::{ExportError, ExportResult};
use crate::page::{Attribution, MapFrame, MapOnlyLayout, PageBuilder, PageLayout, PageSpec, Theme};
use crate::png::encode_with_dpi;
use crate::text::Fonts;

pub const PNG_MIME: &str = "image/png";

/// Which canvas to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportKind {
    /// A4 portrait with header, legend and footer.
    #[default]
    FullPage,
    /// Only the map frame.
    MapOnly,
}

impl ExportKind {
    pub fn filename(&self, base: &str, dpi: u32) -> String {
        match self {
            ExportKind::FullPage => format!("{}_A4_{}dpi.png", base, dpi),
            ExportKind::MapOnly => format!("{}_{}dpi.png", base, dpi),
        }
    }
}

/// Export configuration
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub dpi: u32,
    pub kind: ExportKind,
    pub title: String,
    pub subtitle: Option<String>,
    pub base_name: String,
    pub bounds: GeoBounds,
    pub page: PageSpec,
    pub theme: Theme,
    pub attribution: Attribution,
    pub legend_text: LegendText,
    pub fonts: Fonts,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            kind: ExportKind::FullPage,
            title: String::new(),
            subtitle: None,
            base_name: "map".to_string(),
            bounds: GeoBounds::default(),
            page: PageSpec::default(),
            theme: Theme::default(),
            attribution: Attribution::default(),
            legend_text: LegendText::default(),
            fonts: Fonts::default(),
        }
    }
}

/// Encoded image plus what a file or download step needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedImage {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
    pub dpi: u32,
}

/// Map export system
pub struct MapExporter {
    config: ExportConfig,
}

impl MapExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Same settings at another resolution.
    pub fn with_dpi(&self, dpi: u32) -> Self {
        Self { config: ExportConfig { dpi, ..self.config.clone() } }
    }

    /// Render and encode one image at the configured DPI.
    pub fn export(&self, regions: &[Region], scheme: &ColorScheme) -> ExportResult<ExportedImage> {
        let cfg = &self.config;
        if cfg.dpi == 0 {
            return Err(choro_core::ChoroError::InvalidParams("dpi must be positive".into()).into());
        }
        cfg.bounds.validate()?;
        log::info!("Exporting {:?} at {} dpi ({} regions)", cfg.kind, cfg.dpi, regions.len());

        let frame = MapFrame { bounds: &cfg.bounds, regions, scheme };
        let raster = match cfg.kind {
            ExportKind::FullPage => {
                let layout = PageLayout::new(&cfg.page, cfg.dpi);
                let mut page = PageBuilder::new(layout.width, layout.height, cfg.dpi, &cfg.page, &cfg.theme, &cfg.fonts)?;
                page.add_header(&layout, &cfg.title, cfg.subtitle.as_deref());
                page.add_map_frame(layout.map_area(), &frame);
                page.add_legend(layout.legend_area(), &scheme.legend_entries(&cfg.legend_text));
                page.add_footer(&layout, &cfg.attribution);
                page.finish()
            }
            ExportKind::MapOnly => {
                let layout = MapOnlyLayout::new(&cfg.page, &cfg.bounds, cfg.dpi);
                let mut page = PageBuilder::new(layout.width, layout.height, cfg.dpi, &cfg.page, &cfg.theme, &cfg.fonts)?;
                page.add_map_frame(layout.map_area, &frame);
                page.finish()
            }
        };

        let bytes = encode_with_dpi(&raster, cfg.dpi)?;
        let image = ExportedImage {
            filename: cfg.kind.filename(&cfg.base_name, cfg.dpi),
            mime: PNG_MIME,
            width: raster.width(),
            height: raster.height(),
            dpi: cfg.dpi,
            bytes,
        };
        log::info!("Exported {} ({}x{}, {} bytes)", image.filename, image.width, image.height, image.bytes.len());
        Ok(image)
    }

    /// Render every DPI in parallel. Results keep the order of `dpis`.
    pub fn export_all_dpis(&self, dpis: &[u32], regions: &[Region], scheme: &ColorScheme) -> Vec<ExportResult<ExportedImage>> {
        dpis.par_iter()
            .map(|&dpi| self.with_dpi(dpi).export(regions, scheme))
            .collect()
    }
}

/// Pending result of [`spawn_export`]. Dropping it discards the result.
pub struct ExportHandle {
    rx: Receiver<ExportResult<ExportedImage>>,
}

impl ExportHandle {
    /// Block until the worker delivers.
    pub fn wait(self) -> ExportResult<ExportedImage> {
        self.rx.recv().map_err(|_| ExportError::WorkerLost)?
    }

    /// Non-blocking poll; `None` while the export is still running.
    pub fn try_take(&self) -> Option<ExportResult<ExportedImage>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ExportError::WorkerLost)),
        }
    }
}

/// Run one export on a background thread.
pub fn spawn_export(exporter: MapExporter, regions: Vec<Region>, scheme: ColorScheme) -> ExportHandle {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || run_worker(&exporter, &regions, &scheme, &tx));
    ExportHandle { rx }
}

/// Export and deliver. Returns false when the handle was dropped first.
fn run_worker(
    exporter: &MapExporter,
    regions: &[Region],
    scheme: &ColorScheme,
    tx: &Sender<ExportResult<ExportedImage>>,
) -> bool {
    let result = exporter.export(regions, scheme);
    if tx.send(result).is_ok() {
        return true;
    }
    let cfg = exporter.config();
    log::debug!("Export handle dropped, discarding {}", cfg.kind.filename(&cfg.base_name, cfg.dpi));
    false
}
