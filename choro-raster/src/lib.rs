/*!
# choro Raster Export

CPU rasterization of choropleth and hotspot maps into print-ready PNG files.

## Pipeline

1. **Rasterize**: region polygons are projected and filled with the even-odd rule,
   then every ring is outlined
2. **Compose**: header, map frame, legend and footer are laid out on an A4 page,
   every measurement scaled by `dpi / 96`
3. **Encode**: the page is written as PNG and a `pHYs` chunk carrying the DPI is
   spliced in after the image header

Text is drawn from embedded DejaVu Sans; [`Fonts::with_fallback`] adds faces for
scripts it does not cover.

Multiple resolutions can be exported in parallel; each export owns its raster.
*/

pub mod error;
pub mod export;
pub mod page;
pub mod png;
pub mod raster;
pub mod rasterize;
pub mod text;

pub use error::{ExportError, ExportResult};
pub use export::{spawn_export, ExportConfig, ExportHandle, ExportKind, ExportedImage, MapExporter, PNG_MIME};
pub use page::{Attribution, PageLayout, PageSpec, Theme, REFERENCE_DPI};
pub use png::{crc32, phys_chunk, pixels_per_meter, read_phys, PhysicalDensity};
pub use raster::Raster;
pub use rasterize::FeatureStroke;
pub use text::{Fonts, HAlign, TextStyle, VAnchor};
