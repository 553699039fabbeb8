//! choro core library
//!
//! Region data model, natural-breaks classification, map projection, color
//! schemes with legend derivation, and GeoJSON input loading.

pub mod classify;
pub mod error;
pub mod format;
pub mod geojson;
pub mod palette;
pub mod projection;
pub mod types;

// Re-export commonly used types and functions
pub use classify::{classify_values, jenks_breaks, ClassBreaks, DEFAULT_CLASS_COUNT};
pub use error::{ChoroError, ChoroResult};
pub use format::NumberFormat;
pub use geojson::{load_category_map, load_regions, load_value_map, parse_feature_collection, RegionProps, RegionSet};
pub use palette::{CategoricalPalette, CategoryStyle, ColorRamp, ColorScheme, LegendEntry, LegendText};
pub use projection::{GeoBounds, PixelRect, Projector};
pub use types::{CategoryMap, Color, Geometry, LonLat, Polygon, Region, Ring, ValueMap};

/// Version information for the choro core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
