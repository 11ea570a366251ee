//! Configuration module for pixelpipe
//!
//! Provides types and parsing for `pixelpipe.toml` project configuration.

pub mod loader;
pub mod schema;

pub use loader::{
    default_config, find_config, load_config, load_project, merge_cli_overrides, CliOverrides,
    ConfigError, CONFIG_FILE_NAME,
};
pub use schema::*;
