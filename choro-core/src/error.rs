//! Error type shared by the choro core components

use thiserror::Error;

/// Result type for core operations
pub type ChoroResult<T> = Result<T, ChoroError>;

/// Errors that can occur while preparing map inputs
#[derive(Debug, Error)]
pub enum ChoroError {
    /// Nothing positive to classify. Callers render every region as no-data.
    #[error("No positive values to classify")]
    EmptyInput,

    /// A feature carries a geometry other than Polygon/MultiPolygon.
    #[error("Unsupported geometry in feature {index}: {kind}")]
    InvalidGeometry { index: usize, kind: String },

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
