//! Export error type

use choro_core::ChoroError;
use thiserror::Error;

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Fatal failures of a single export. Per-feature problems never reach this type.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PNG encoding failed: {0}")]
    Encoding(#[from] image::ImageError),

    /// The encoder produced fewer bytes than the signature plus IHDR chunk.
    #[error("Encoded stream is {len} bytes, too short to carry a pHYs chunk")]
    ChunkInjection { len: usize },

    #[error("Cannot allocate a {width}x{height} raster")]
    RasterAlloc { width: u32, height: u32 },

    #[error(transparent)]
    Core(#[from] ChoroError),

    #[error("Export worker exited without a result")]
    WorkerLost,

    #[error("Font could not be loaded: {0}")]
    Font(String),
}
