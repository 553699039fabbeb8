//! Render command implementation - export choropleth and hotspot maps as PNG

use std::fs;
use std::path::{Path, PathBuf};

use choro_core::{
    load_category_map, load_regions, load_value_map, CategoricalPalette, ChoroError, ColorRamp, ColorScheme,
};
use choro_raster::{ExportConfig, ExportKind, Fonts, MapExporter, Theme};

use crate::config::{Config, NumberKind, PageKind};
use crate::error::{CliError, CliResult};
use crate::PaletteKind;

/// Command-line values for `choro render`. Unset options fall back to the config file.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub geojson: PathBuf,
    pub values: Option<PathBuf>,
    pub categories: Option<PathBuf>,
    pub palette: PaletteKind,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub dpi: Vec<u32>,
    pub classes: Option<usize>,
    pub kind: Option<PageKind>,
    pub number_format: Option<NumberKind>,
    pub name: Option<String>,
    pub out_dir: Option<PathBuf>,
}

pub fn execute(config: &Config, opts: RenderOptions) -> CliResult<Vec<PathBuf>> {
    log::info!("Starting map export");
    log::info!("Boundaries: {}", opts.geojson.display());

    let dpis = if opts.dpi.is_empty() { config.render.dpi.clone() } else { opts.dpi.clone() };
    validate_dpis(&dpis)?;
    let classes = opts.classes.unwrap_or(config.render.classes);
    if opts.values.is_some() {
        validate_classes(classes)?;
    }

    let regions = load_regions(require_file(&opts.geojson)?, &config.map.properties)
        .map_err(|e| input_error(&opts.geojson, e))?;
    if regions.is_empty() {
        return Err(CliError::invalid_input(
            opts.geojson.display().to_string(),
            "no drawable Polygon/MultiPolygon features",
        ));
    }

    let scheme = build_scheme(config, &opts, classes)?;
    let export_config = build_export_config(config, &opts, load_fonts(config)?);
    warn_missing_glyphs(&export_config);
    log::info!(
        "Exporting '{}' at {:?} DPI ({:?})",
        export_config.base_name,
        dpis,
        export_config.kind
    );

    let out_dir = opts.out_dir.clone().unwrap_or_else(|| config.render.out_dir.clone());
    fs::create_dir_all(&out_dir)?;

    let exporter = MapExporter::new(export_config);
    let results = exporter.export_all_dpis(&dpis, &regions.regions, &scheme);

    let mut written = Vec::with_capacity(results.len());
    let mut first_failure = None;
    for (dpi, result) in dpis.iter().zip(results) {
        match result {
            Ok(image) => {
                let path = out_dir.join(&image.filename);
                fs::write(&path, &image.bytes)?;
                log::info!(
                    "Wrote {} ({}x{} px, {} DPI, {} bytes)",
                    path.display(),
                    image.width,
                    image.height,
                    image.dpi,
                    image.bytes.len()
                );
                written.push(path);
            }
            Err(err) => {
                log::error!("Export at {} DPI failed: {}", dpi, err);
                first_failure.get_or_insert_with(|| CliError::export(*dpi, err.to_string()));
            }
        }
    }

    match first_failure {
        Some(err) => Err(err),
        None => {
            log::info!("Map export completed successfully");
            Ok(written)
        }
    }
}

fn validate_dpis(dpis: &[u32]) -> CliResult<()> {
    if dpis.is_empty() {
        return Err(CliError::validation("at least one DPI value is required"));
    }
    if let Some(bad) = dpis.iter().find(|&&d| d == 0) {
        return Err(CliError::validation(format!("DPI must be positive, got {}", bad)));
    }
    Ok(())
}

fn validate_classes(classes: usize) -> CliResult<()> {
    if classes == 0 {
        return Err(CliError::validation("class count must be at least 1"));
    }
    Ok(())
}

/// Embedded fonts, extended with `[theme] fallback_font` when configured.
fn load_fonts(config: &Config) -> CliResult<Fonts> {
    let fonts = Fonts::embedded().map_err(|e| CliError::config(e.to_string()))?;
    let Some(path) = &config.theme.fallback_font else {
        return Ok(fonts);
    };
    let bytes = fs::read(require_file(path)?).map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))?;
    log::info!("Using fallback font {}", path.display());
    fonts.with_fallback(&bytes).map_err(|e| CliError::config(format!("{}: {}", path.display(), e)))
}

fn warn_missing_glyphs(cfg: &ExportConfig) {
    let texts = [Some(cfg.title.as_str()), cfg.subtitle.as_deref(), Some(cfg.attribution.primary.as_str())];
    let mut missing: Vec<char> = texts
        .into_iter()
        .flatten()
        .flat_map(str::chars)
        .filter(|ch| !ch.is_whitespace() && !cfg.fonts.has_glyph(*ch))
        .collect();
    missing.sort_unstable();
    missing.dedup();
    if !missing.is_empty() {
        let sample: String = missing.iter().take(8).collect();
        log::warn!(
            "{} characters have no glyph and will draw as boxes (e.g. \"{}\"); set [theme] fallback_font",
            missing.len(),
            sample
        );
    }
}

fn require_file(path: &Path) -> CliResult<&Path> {
    if path.exists() {
        Ok(path)
    } else {
        Err(CliError::file_not_found(path.to_path_buf()))
    }
}

fn input_error(path: &Path, err: ChoroError) -> CliError {
    match err {
        ChoroError::Io(e) => CliError::io(format!("{}: {}", path.display(), e)),
        other => CliError::invalid_input(path.display().to_string(), other.to_string()),
    }
}

fn build_scheme(config: &Config, opts: &RenderOptions, classes: usize) -> CliResult<ColorScheme> {
    match (&opts.values, &opts.categories) {
        (Some(values_path), None) => {
            let values = load_value_map(require_file(values_path)?).map_err(|e| input_error(values_path, e))?;
            let ramp = ColorRamp::new(config.theme.ramp.clone(), config.theme.no_data)
                .map_err(|e| CliError::config(e.to_string()))?;
            let format = opts.number_format.unwrap_or(config.render.number_format);
            log::info!("Classifying {} values into {} classes", values.len(), classes);
            Ok(ColorScheme::continuous(values, ramp, classes, format.into()))
        }
        (None, Some(categories_path)) => {
            let assignments =
                load_category_map(require_file(categories_path)?).map_err(|e| input_error(categories_path, e))?;
            let base = match opts.palette {
                PaletteKind::Gistar => CategoricalPalette::getis_ord(),
                PaletteKind::Moran => CategoricalPalette::local_moran(),
            };
            let palette = CategoricalPalette::new(base.categories().to_vec(), config.theme.no_data)
                .map_err(|e| CliError::config(e.to_string()))?;
            log::info!("Coloring {} regions with the {:?} palette", assignments.len(), opts.palette);
            Ok(ColorScheme::categorical(palette, assignments))
        }
        _ => Err(CliError::validation("exactly one of --values or --categories is required")),
    }
}

fn build_export_config(config: &Config, opts: &RenderOptions, fonts: Fonts) -> ExportConfig {
    let defaults = ExportConfig::default();
    let kind: ExportKind = opts.kind.unwrap_or(config.render.kind).into();

    // The data file names the output unless --name is given
    let base_name = opts
        .name
        .clone()
        .or_else(|| {
            opts.values
                .as_ref()
                .or(opts.categories.as_ref())
                .and_then(|p| p.file_stem())
                .map(|s| s.to_string_lossy().into_owned())
        })
        .unwrap_or(defaults.base_name);

    ExportConfig {
        kind,
        title: opts.title.clone().unwrap_or_else(|| base_name.clone()),
        subtitle: opts.subtitle.clone(),
        base_name,
        bounds: config.map.bounds,
        theme: Theme { water: config.theme.water, ..Theme::default() },
        attribution: (&config.attribution).into(),
        fonts,
        ..defaults
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const REGIONS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"adm_cd": "11010", "adm_nm": "Jongno"},
             "geometry": {"type": "Polygon", "coordinates": [[[126.9, 37.5], [127.1, 37.5], [127.1, 37.7], [126.9, 37.5]]]}},
            {"type": "Feature", "properties": {"adm_cd": "26010", "adm_nm": "Jung"},
             "geometry": {"type": "Polygon", "coordinates": [[[129.0, 35.0], [129.2, 35.0], [129.2, 35.2], [129.0, 35.0]]]}}
        ]
    }"#;

    fn options(dir: &TempDir) -> RenderOptions {
        let geojson = dir.path().join("regions.geojson");
        fs::write(&geojson, REGIONS).unwrap();
        RenderOptions {
            geojson,
            values: None,
            categories: None,
            palette: PaletteKind::Gistar,
            title: Some("Test".into()),
            subtitle: None,
            dpi: vec![96],
            classes: None,
            kind: Some(PageKind::Map),
            number_format: None,
            name: None,
            out_dir: Some(dir.path().join("out")),
        }
    }

    #[test]
    fn test_render_values_writes_one_file_per_dpi() {
        let dir = TempDir::new().unwrap();
        let values = dir.path().join("population.json");
        fs::write(&values, r#"{"11010": 1200, "26010": 98000}"#).unwrap();

        let opts = RenderOptions { values: Some(values), dpi: vec![96, 150], ..options(&dir) };
        let written = execute(&Config::default(), opts).unwrap();

        let names: Vec<_> = written.iter().map(|p| p.file_name().unwrap().to_string_lossy().into_owned()).collect();
        assert_eq!(names, vec!["population_96dpi.png", "population_150dpi.png"]);
        for path in &written {
            let bytes = fs::read(path).unwrap();
            assert_eq!(&bytes[37..41], b"pHYs");
        }
    }

    #[test]
    fn test_render_categories_full_page() {
        let dir = TempDir::new().unwrap();
        let labels = dir.path().join("hotspots.json");
        fs::write(&labels, r#"{"11010": "hot_99", "26010": "ns"}"#).unwrap();

        let opts = RenderOptions {
            categories: Some(labels),
            kind: Some(PageKind::A4),
            name: Some("gistar".into()),
            ..options(&dir)
        };
        let written = execute(&Config::default(), opts).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("gistar_A4_96dpi.png"));
    }

    #[test]
    fn test_missing_data_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let opts = RenderOptions { values: Some(dir.path().join("absent.json")), ..options(&dir) };
        let err = execute(&Config::default(), opts).unwrap_err();
        assert!(matches!(err, CliError::FileNotFound { .. }));
    }

    #[test]
    fn test_zero_dpi_is_rejected() {
        let dir = TempDir::new().unwrap();
        let values = dir.path().join("v.json");
        fs::write(&values, "{}").unwrap();
        let opts = RenderOptions { values: Some(values), dpi: vec![300, 0], ..options(&dir) };
        assert!(matches!(execute(&Config::default(), opts), Err(CliError::Validation { .. })));
    }

    #[test]
    fn test_zero_classes_is_rejected() {
        let dir = TempDir::new().unwrap();
        let values = dir.path().join("v.json");
        fs::write(&values, r#"{"11010": 1.0}"#).unwrap();
        let opts = RenderOptions { values: Some(values.clone()), classes: Some(0), ..options(&dir) };
        assert!(matches!(execute(&Config::default(), opts), Err(CliError::Validation { .. })));

        let mut config = Config::default();
        config.render.classes = 0;
        let opts = RenderOptions { values: Some(values), ..options(&dir) };
        assert!(matches!(execute(&config, opts), Err(CliError::Validation { .. })));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_empty_ramp_is_config_error() {
        let dir = TempDir::new().unwrap();
        let values = dir.path().join("v.json");
        fs::write(&values, r#"{"11010": 1.0}"#).unwrap();
        let mut config = Config::default();
        config.theme.ramp.clear();
        let opts = RenderOptions { values: Some(values), ..options(&dir) };
        assert!(matches!(execute(&config, opts), Err(CliError::Config { .. })));
    }

    #[test]
    fn test_unreadable_fallback_font_is_config_error() {
        let dir = TempDir::new().unwrap();
        let font = dir.path().join("broken.ttf");
        fs::write(&font, b"not a font").unwrap();
        let mut config = Config::default();
        config.theme.fallback_font = Some(font);
        assert!(matches!(load_fonts(&config), Err(CliError::Config { .. })));

        config.theme.fallback_font = Some(dir.path().join("absent.ttf"));
        assert!(matches!(load_fonts(&config), Err(CliError::FileNotFound { .. })));
    }

    #[test]
    fn test_korean_title_renders() {
        let dir = TempDir::new().unwrap();
        let values = dir.path().join("density.json");
        fs::write(&values, r#"{"11010": 1.5, "26010": 2.5}"#).unwrap();
        let opts = RenderOptions {
            values: Some(values),
            title: Some("인구 밀도".into()),
            kind: Some(PageKind::A4),
            ..options(&dir)
        };
        let written = execute(&Config::default(), opts).unwrap();
        assert!(written[0].ends_with("density_A4_96dpi.png"));
    }

    #[test]
    fn test_malformed_geojson_is_invalid_input() {
        let dir = TempDir::new().unwrap();
        let mut opts = options(&dir);
        fs::write(&opts.geojson, r#"{"type": "Feature"}"#).unwrap();
        let values = dir.path().join("v.json");
        fs::write(&values, "{}").unwrap();
        opts.values = Some(values);
        assert!(matches!(execute(&Config::default(), opts), Err(CliError::InvalidInput { .. })));
    }
}
