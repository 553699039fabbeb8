//! Config command implementation - print or save the example or effective configuration

use std::path::Path;

use crate::config::Config;
use crate::error::{CliError, CliResult};

pub fn execute(config: &Config, example: bool, output: Option<&Path>) -> CliResult<String> {
    let chosen = if example { Config::default() } else { config.clone() };

    if let Some(path) = output {
        chosen.save_to_file(path).map_err(|e| CliError::config(format!("{:#}", e)))?;
        log::info!("Configuration written to {}", path.display());
        return Ok(String::new());
    }

    if example {
        return Config::example_toml().map_err(|e| CliError::config(format!("{:#}", e)));
    }
    Ok(toml::to_string_pretty(&chosen)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_effective_config_reflects_overrides() {
        let mut config = Config::default();
        config.render.dpi = vec![150, 600];
        let text = execute(&config, false, None).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.render.dpi, vec![150, 600]);
    }

    #[test]
    fn test_example_ignores_loaded_config() {
        let mut config = Config::default();
        config.render.classes = 3;
        let text = execute(&config, true, None).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.render.classes, 7);
    }

    #[test]
    fn test_output_file_is_loadable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("choro.toml");
        let printed = execute(&Config::default(), true, Some(path.as_path())).unwrap();
        assert!(printed.is_empty());
        let loaded = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(loaded.render.dpi, vec![300]);
    }
}
