//! Configuration loading and discovery for `pixelpipe.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::{OutputStyle, PipeConfig};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project configuration file
pub const CONFIG_FILE_NAME: &str = "pixelpipe.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse pixelpipe.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Verbose output (forces `debug` logging)
    pub verbose: Option<bool>,
    /// Override the LESS compiler executable
    pub less_program: Option<String>,
    /// Override the output style of both compile tasks
    pub output_style: Option<OutputStyle>,
}

/// Find pixelpipe.toml by walking up from the current working directory.
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find pixelpipe.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a pixelpipe.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns the default
/// configuration.
pub fn load_config(path: Option<&Path>) -> Result<PipeConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(default_config()),
    }
}

/// Load the configuration and determine the project root.
///
/// The project root is the directory holding the config file, or the
/// current directory when running on defaults.
pub fn load_project(path: Option<&Path>) -> Result<(PipeConfig, PathBuf), ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => {
            let config = load_config_file(&p)?;
            let root = match project_root(&p) {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => env::current_dir()?,
            };
            Ok((config, root))
        }
        None => Ok((default_config(), env::current_dir()?)),
    }
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<PipeConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: PipeConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Default configuration, equivalent to an empty pixelpipe.toml.
pub fn default_config() -> PipeConfig {
    PipeConfig::default()
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut PipeConfig, overrides: &CliOverrides) {
    if overrides.verbose == Some(true) {
        config.log.level = "debug".to_string();
    }

    if let Some(ref program) = overrides.less_program {
        config.less.program = program.clone();
    }

    if let Some(style) = overrides.output_style {
        config.less.output_style = style;
        config.sass.output_style = style;
    }
}

/// Get the project root directory from a config file path.
pub fn project_root(config_path: &Path) -> Option<&Path> {
    config_path.parent()
}

/// Resolve a path relative to the project root.
///
/// If the path is absolute, returns it unchanged.
/// If relative, joins it with the project root.
pub fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}
