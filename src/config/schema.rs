//! Configuration schema types for `pixelpipe.toml`
//!
//! Every section is optional. The defaults reproduce the stock task file:
//! `less` compiles `./less/**/*.less` into `./css`, `sass` compiles every
//! `.scss` outside `node_modules` next to its source, and `sass:watch`
//! re-runs `sass` when any `.scss` file changes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output style of compiled CSS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    /// One declaration per line, indented
    #[default]
    Expanded,
    /// Minified, no insignificant whitespace
    Compressed,
}

impl OutputStyle {
    /// Parse an output style from string
    pub fn from_str(s: &str) -> Option<OutputStyle> {
        match s.to_lowercase().as_str() {
            "expanded" => Some(OutputStyle::Expanded),
            "compressed" | "compress" => Some(OutputStyle::Compressed),
            _ => None,
        }
    }
}

/// `[less]` section: the LESS to CSS task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessConfig {
    /// Source globs; entries starting with `!` exclude matches
    #[serde(default = "default_less_globs")]
    pub globs: Vec<String>,
    /// Destination directory for compiled `.css` files
    #[serde(default = "default_less_dest")]
    pub dest: PathBuf,
    /// Compiler executable, invoked as `<program> [args] <file>`
    #[serde(default = "default_less_program")]
    pub program: String,
    /// Extra arguments passed before the source path
    #[serde(default)]
    pub args: Vec<String>,
    /// Directories searched for `@import`
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,
    /// Output style (compressed output is minified with lightningcss)
    #[serde(default)]
    pub output_style: OutputStyle,
}

fn default_less_globs() -> Vec<String> {
    vec!["./less/**/*.less".to_string()]
}

fn default_less_dest() -> PathBuf {
    PathBuf::from("./css")
}

fn default_less_program() -> String {
    "lessc".to_string()
}

impl Default for LessConfig {
    fn default() -> Self {
        Self {
            globs: default_less_globs(),
            dest: default_less_dest(),
            program: default_less_program(),
            args: vec![],
            include_paths: vec![],
            output_style: OutputStyle::default(),
        }
    }
}

/// `[sass]` section: the SCSS to CSS task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SassConfig {
    /// Source globs; entries starting with `!` exclude matches
    #[serde(default = "default_sass_globs")]
    pub globs: Vec<String>,
    /// Destination directory; `./` writes each file next to its source
    #[serde(default = "default_sass_dest")]
    pub dest: PathBuf,
    /// Load paths for `@use` / `@import`
    #[serde(default = "default_sass_include_paths")]
    pub include_paths: Vec<PathBuf>,
    /// Output style
    #[serde(default)]
    pub output_style: OutputStyle,
}

fn default_sass_globs() -> Vec<String> {
    vec!["./**/*.scss".to_string(), "!node_modules/**/*".to_string()]
}

fn default_sass_dest() -> PathBuf {
    PathBuf::from("./")
}

fn default_sass_include_paths() -> Vec<PathBuf> {
    vec![PathBuf::from("node_modules")]
}

impl Default for SassConfig {
    fn default() -> Self {
        Self {
            globs: default_sass_globs(),
            dest: default_sass_dest(),
            include_paths: default_sass_include_paths(),
            output_style: OutputStyle::default(),
        }
    }
}

/// `[watch]` section: the `sass:watch` task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Globs whose changes trigger a run
    #[serde(default = "default_watch_globs")]
    pub globs: Vec<String>,
    /// Tasks run in series on each change
    #[serde(default = "default_watch_tasks")]
    pub tasks: Vec<String>,
    /// Debounce delay in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
    /// Clear terminal between runs
    #[serde(default)]
    pub clear_screen: bool,
}

fn default_watch_globs() -> Vec<String> {
    vec!["./**/*.scss".to_string()]
}

fn default_watch_tasks() -> Vec<String> {
    vec!["sass".to_string()]
}

fn default_debounce_ms() -> u32 {
    100
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            globs: default_watch_globs(),
            tasks: default_watch_tasks(),
            debounce_ms: default_debounce_ms(),
            clear_screen: false,
        }
    }
}

/// `[log]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default tracing level (`RUST_LOG` takes precedence)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

/// Complete `pixelpipe.toml` configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipeConfig {
    #[serde(default)]
    pub less: LessConfig,
    #[serde(default)]
    pub sass: SassConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "sass.globs")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pixelpipe.toml: '{}' {}", self.field, self.message)
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn has_positive_glob(globs: &[String]) -> bool {
    globs.iter().any(|g| !g.starts_with('!'))
}

impl PipeConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        for (field, globs) in [
            ("less.globs", &self.less.globs),
            ("sass.globs", &self.sass.globs),
            ("watch.globs", &self.watch.globs),
        ] {
            if !has_positive_glob(globs) {
                errors.push(ConfigValidationError {
                    field: field.to_string(),
                    message: "must contain at least one non-negated glob pattern".to_string(),
                });
            }
            for glob in globs {
                let pattern = glob.strip_prefix('!').unwrap_or(glob);
                if let Err(e) = glob::Pattern::new(pattern) {
                    errors.push(ConfigValidationError {
                        field: field.to_string(),
                        message: format!("invalid glob '{}': {}", glob, e),
                    });
                }
            }
        }

        if self.less.program.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "less.program".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        if self.watch.tasks.is_empty() {
            errors.push(ConfigValidationError {
                field: "watch.tasks".to_string(),
                message: "must name at least one task".to_string(),
            });
        }
        if self.watch.tasks.iter().any(|t| t == "sass:watch") {
            errors.push(ConfigValidationError {
                field: "watch.tasks".to_string(),
                message: "cannot include 'sass:watch' itself".to_string(),
            });
        }

        if self.watch.debounce_ms == 0 {
            errors.push(ConfigValidationError {
                field: "watch.debounce_ms".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        if !LOG_LEVELS.contains(&self.log.level.to_lowercase().as_str()) {
            errors.push(ConfigValidationError {
                field: "log.level".to_string(),
                message: format!("must be one of {}", LOG_LEVELS.join(", ")),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
