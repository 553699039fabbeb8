//! Error handling for the choro CLI

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for choro CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Input/Output error: {message}")]
    Io { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid input in {file}: {message}")]
    InvalidInput { file: String, message: String },

    #[error("Export failed at {dpi} DPI: {message}")]
    Export { dpi: u32, message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl CliError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io { message: message.into() }
    }

    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    pub fn invalid_input<F: Into<String>, S: Into<String>>(file: F, message: S) -> Self {
        Self::InvalidInput { file: file.into(), message: message.into() }
    }

    pub fn export<S: Into<String>>(dpi: u32, message: S) -> Self {
        Self::Export { dpi, message: message.into() }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into() }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        Self::config(format!("TOML serialization error: {}", err))
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Provide helpful error messages and suggestions
pub fn format_error_with_suggestions(error: &CliError) -> String {
    let mut message = error.to_string();

    match error {
        CliError::FileNotFound { path } => {
            message.push_str(&format!(
                "\n\nSuggestions:\n\
                 • Check that the file path is correct: {}\n\
                 • Ensure you have read permissions for the file",
                path.display()
            ));
        }

        CliError::InvalidInput { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Boundaries must be a GeoJSON FeatureCollection of Polygon/MultiPolygon features\n\
                 • Value files are JSON objects mapping region id to a number\n\
                 • Check the [map.properties] keys match your GeoJSON property names"
            );
        }

        CliError::Config { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check your choro.toml configuration file\n\
                 • Use 'choro config --example' to generate a sample configuration\n\
                 • Colors are written as \"#rrggbb\" or \"#rrggbbaa\""
            );
        }

        CliError::Export { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Very high DPI values need a lot of memory; try --dpi 300\n\
                 • Ensure the output directory is writable"
            );
        }

        _ => {}
    }

    message
}

/// Print error with helpful suggestions and exit
pub fn print_error_and_exit(error: &CliError) -> ! {
    eprintln!("Error: {}", format_error_with_suggestions(error));
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = CliError::config("test message");
        assert!(matches!(err, CliError::Config { .. }));
        assert_eq!(err.to_string(), "Configuration error: test message");
    }

    #[test]
    fn test_error_suggestions() {
        let err = CliError::file_not_found(PathBuf::from("regions.geojson"));
        let formatted = format_error_with_suggestions(&err);
        assert!(formatted.contains("Suggestions:"));
        assert!(formatted.contains("Check that the file path is correct"));

        let err = CliError::config("bad");
        assert!(format_error_with_suggestions(&err).contains("choro config --example"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        assert!(matches!(cli_err, CliError::Io { .. }));
    }

    #[test]
    fn test_export_error_names_dpi() {
        let err = CliError::export(600, "Cannot allocate a 0x10 raster");
        assert_eq!(err.to_string(), "Export failed at 600 DPI: Cannot allocate a 0x10 raster");
        assert!(format_error_with_suggestions(&err).contains("--dpi 300"));
    }
}
