//! Configuration handling for the choro CLI
//!
//! Supports loading configuration from choro.toml files with CLI argument overrides.

use anyhow::{Context, Result};
use choro_core::{Color, ColorRamp, GeoBounds, NumberFormat, RegionProps, DEFAULT_CLASS_COUNT};
use choro_raster::{Attribution, ExportKind};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub attribution: AttributionConfig,
}

/// Page variant as written in config files and on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    /// Full A4 page with header, legend and footer
    A4,
    /// Map frame only
    Map,
}

impl From<PageKind> for ExportKind {
    fn from(kind: PageKind) -> Self {
        match kind {
            PageKind::A4 => ExportKind::FullPage,
            PageKind::Map => ExportKind::MapOnly,
        }
    }
}

/// Legend number style.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberKind {
    /// Head counts (man / eok units)
    Count,
    /// Densities (k suffix)
    Density,
}

impl From<NumberKind> for NumberFormat {
    fn from(kind: NumberKind) -> Self {
        match kind {
            NumberKind::Count => NumberFormat::count(),
            NumberKind::Density => NumberFormat::density(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Resolutions to export
    #[serde(default = "default_dpi")]
    pub dpi: Vec<u32>,

    /// Number of natural-breaks classes
    #[serde(default = "default_classes")]
    pub classes: usize,

    /// Page variant
    #[serde(default = "default_kind")]
    pub kind: PageKind,

    /// Legend number style
    #[serde(default = "default_number_format")]
    pub number_format: NumberKind,

    /// Directory that receives the PNG files
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapConfig {
    /// Reference extent; the same box is used at every DPI
    #[serde(default)]
    pub bounds: GeoBounds,

    /// GeoJSON property names for region id and name
    #[serde(default)]
    pub properties: RegionProps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Class colors, lightest first
    #[serde(default = "default_ramp")]
    pub ramp: Vec<Color>,

    /// Fill for regions without data
    #[serde(default = "default_no_data")]
    pub no_data: Color,

    /// Map background
    #[serde(default = "default_water")]
    pub water: Color,

    /// TrueType/OpenType font tried for characters the embedded font lacks,
    /// e.g. a Hangul font for Korean labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_font: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionConfig {
    #[serde(default = "default_primary")]
    pub primary: String,
    #[serde(default = "default_secondary")]
    pub secondary: String,
}

// Default value functions
fn default_dpi() -> Vec<u32> { vec![300] }
fn default_classes() -> usize { DEFAULT_CLASS_COUNT }
fn default_kind() -> PageKind { PageKind::A4 }
fn default_number_format() -> NumberKind { NumberKind::Count }
fn default_out_dir() -> PathBuf { PathBuf::from(".") }
fn default_ramp() -> Vec<Color> { ColorRamp::yl_or_rd().colors().to_vec() }
fn default_no_data() -> Color { ColorRamp::yl_or_rd().no_data() }
fn default_water() -> Color { choro_raster::Theme::default().water }
fn default_primary() -> String { Attribution::default().primary }
fn default_secondary() -> String { Attribution::default().secondary }

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: default_dpi(),
            classes: default_classes(),
            kind: default_kind(),
            number_format: default_number_format(),
            out_dir: default_out_dir(),
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self { ramp: default_ramp(), no_data: default_no_data(), water: default_water(), fallback_font: None }
    }
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self { primary: default_primary(), secondary: default_secondary() }
    }
}

impl From<&AttributionConfig> for Attribution {
    fn from(cfg: &AttributionConfig) -> Self {
        Attribution { primary: cfg.primary.clone(), secondary: cfg.secondary.clone() }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                // Try to find choro.toml in current directory
                let default_path = PathBuf::from("choro.toml");
                if default_path.exists() {
                    log::info!("Loading configuration from: choro.toml");
                    Self::load_from_file(&default_path)?
                } else {
                    log::debug!("Using default configuration");
                    Self::default()
                }
            }
        };

        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// Generate example configuration file content
    pub fn example_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default()).context("Failed to serialize default configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.render.dpi, vec![300]);
        assert_eq!(config.render.classes, 7);
        assert_eq!(config.render.kind, PageKind::A4);
        assert_eq!(config.map.properties.id_key, "adm_cd");
        assert_eq!(config.theme.ramp.len(), 7);
    }

    #[test]
    fn test_config_roundtrip() -> Result<()> {
        let mut config = Config::default();
        config.render.dpi = vec![96, 150];
        config.theme.no_data = Color::rgb(1, 2, 3);
        let temp_file = NamedTempFile::new()?;

        config.save_to_file(temp_file.path())?;
        let loaded = Config::load_from_file(temp_file.path())?;

        assert_eq!(loaded.render.dpi, vec![96, 150]);
        assert_eq!(loaded.theme.no_data, Color::rgb(1, 2, 3));
        assert_eq!(loaded.map.bounds, GeoBounds::korea());
        Ok(())
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r##"
            [render]
            dpi = [150]
            kind = "map"
            number_format = "density"

            [theme]
            no_data = "#eeeeee"
            "##,
        )
        .unwrap();
        assert_eq!(config.render.dpi, vec![150]);
        assert_eq!(config.render.kind, PageKind::Map);
        assert_eq!(config.render.number_format, NumberKind::Density);
        assert_eq!(config.render.classes, 7);
        assert_eq!(config.theme.no_data, Color::rgb(0xee, 0xee, 0xee));
        assert_eq!(config.theme.ramp.len(), 7);
        assert_eq!(config.theme.fallback_font, None);
        assert_eq!(config.attribution.secondary, "All rights reserved");
    }

    #[test]
    fn test_fallback_font_path() {
        let config: Config = toml::from_str("[theme]\nfallback_font = \"fonts/NanumGothic.ttf\"\n").unwrap();
        assert_eq!(config.theme.fallback_font, Some(PathBuf::from("fonts/NanumGothic.ttf")));
    }

    #[test]
    fn test_invalid_color_is_rejected() {
        let parsed: std::result::Result<Config, _> = toml::from_str("[theme]\nno_data = \"#zzzzzz\"\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_example_toml_generation() {
        let example = Config::example_toml().unwrap();
        assert!(example.contains("[render]"));
        assert!(example.contains("[map"));
        assert!(example.contains("[theme]"));
        assert!(example.contains("[attribution]"));
    }
}
