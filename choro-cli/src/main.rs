use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;
mod config;
mod error;

use commands::render::RenderOptions;
use config::{Config, NumberKind, PageKind};
use error::print_error_and_exit;

#[derive(Parser)]
#[command(name = "choro")]
#[command(about = "choro - print-quality choropleth and hotspot maps")]
#[command(version)]
#[command(long_about = "
choro classifies regional statistics with natural breaks (or colors precomputed
hotspot labels), draws them on a Mercator map and exports print PNG files that
carry their physical resolution.

Examples:
  choro render --geojson sigungu.geojson --values population.json --title 'Population 2024'
  choro render --geojson sigungu.geojson --categories gistar.json --palette gistar --dpi 96,150,300
  choro render --geojson sigungu.geojson --values density.json --kind map --number-format density
  choro config --example > choro.toml
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of threads to use
    #[arg(short, long, global = true)]
    pub threads: Option<usize>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export a map as PNG at one or more resolutions
    Render {
        /// Region boundaries (GeoJSON FeatureCollection)
        #[arg(long, required = true)]
        geojson: PathBuf,

        /// Numeric values per region id (JSON object)
        #[arg(long, conflicts_with = "categories", required_unless_present = "categories")]
        values: Option<PathBuf>,

        /// Category key per region id (JSON object)
        #[arg(long)]
        categories: Option<PathBuf>,

        /// Palette for --categories
        #[arg(long, default_value = "gistar")]
        palette: PaletteKind,

        /// Page title
        #[arg(long)]
        title: Option<String>,

        /// Page subtitle
        #[arg(long)]
        subtitle: Option<String>,

        /// Output resolutions, comma separated
        #[arg(long, value_delimiter = ',')]
        dpi: Vec<u32>,

        /// Number of natural-breaks classes
        #[arg(short = 'k', long)]
        classes: Option<usize>,

        /// Page variant
        #[arg(long)]
        kind: Option<PageKind>,

        /// Legend number style
        #[arg(long)]
        number_format: Option<NumberKind>,

        /// Base name for output files (defaults to the data file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Output directory
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config {
        /// Print a complete example choro.toml instead
        #[arg(long)]
        example: bool,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaletteKind {
    /// Getis-Ord Gi* confidence tiers
    Gistar,
    /// Local Moran's I quadrants
    Moran,
}

fn setup_logging(verbose: u8, quiet: bool) -> Result<()> {
    if quiet {
        std::env::set_var("RUST_LOG", "error");
    } else {
        let level = match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        std::env::set_var("RUST_LOG", level);
    }

    env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose, cli.quiet)?;

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    // Set global thread count if specified
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to set thread count")?;
    }

    // Execute the requested command
    let outcome = match cli.command {
        Commands::Render {
            geojson,
            values,
            categories,
            palette,
            title,
            subtitle,
            dpi,
            classes,
            kind,
            number_format,
            name,
            out_dir,
        } => {
            let opts = RenderOptions {
                geojson,
                values,
                categories,
                palette,
                title,
                subtitle,
                dpi,
                classes,
                kind,
                number_format,
                name,
                out_dir,
            };
            commands::render::execute(&config, opts).map(|written| {
                for path in written {
                    println!("{}", path.display());
                }
            })
        }

        Commands::Config { example, output } => {
            commands::config::execute(&config, example, output.as_deref()).map(|text| print!("{}", text))
        }
    };

    if let Err(err) = outcome {
        print_error_and_exit(&err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_dpi_list_parsing() {
        let cli = Cli::parse_from(["choro", "render", "--geojson", "a.geojson", "--values", "v.json", "--dpi", "96,150,300"]);
        match cli.command {
            Commands::Render { dpi, palette, .. } => {
                assert_eq!(dpi, vec![96, 150, 300]);
                assert_eq!(palette, PaletteKind::Gistar);
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn test_values_and_categories_conflict() {
        let parsed = Cli::try_parse_from([
            "choro", "render", "--geojson", "a.geojson", "--values", "v.json", "--categories", "c.json",
        ]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from(["choro", "render", "--geojson", "a.geojson"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_kind_and_palette_values() {
        let cli = Cli::parse_from([
            "choro", "render", "--geojson", "a.geojson", "--categories", "c.json", "--palette", "moran", "--kind", "map",
        ]);
        match cli.command {
            Commands::Render { palette, kind, .. } => {
                assert_eq!(palette, PaletteKind::Moran);
                assert_eq!(kind, Some(PageKind::Map));
            }
            _ => panic!("expected render"),
        }
    }
}
