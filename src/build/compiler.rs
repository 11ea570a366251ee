//! Style compilers used by the compile tasks.
//!
//! SCSS is compiled in-process with `grass`. LESS is compiled by an
//! external `lessc`-compatible executable, invoked once per file with the
//! source path as its last argument and the CSS read from stdout.

use crate::build::FileEntry;
use crate::config::{LessConfig, OutputStyle};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use thiserror::Error;

/// Error produced while compiling a single stylesheet.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The compiler rejected the source
    #[error("{0}")]
    Syntax(String),
    /// Source file is not UTF-8
    #[error("source is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
    /// The compiler executable could not be started
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// The compiler executable exited unsuccessfully
    #[error("'{program}' exited with {status}: {stderr}")]
    Process { program: String, status: String, stderr: String },
    /// An include path cannot be passed on the command line
    #[error("invalid include path: {0}")]
    IncludePath(String),
    /// Minifying the compiler output failed
    #[error("failed to minify output: {0}")]
    Minify(String),
}

/// A transform from one stylesheet source file to CSS text.
pub trait StyleCompiler {
    /// Short name used in logs ("sass", "less")
    fn name(&self) -> &str;

    /// Extension of the written output files.
    fn output_extension(&self) -> &str {
        "css"
    }

    /// Whether `_`-prefixed partials are skipped as entry points.
    fn skips_partials(&self) -> bool {
        false
    }

    /// Whether `compile` uses [`FileEntry::contents`]. Compilers that read
    /// the file themselves return `false` and get entries without contents.
    fn reads_contents(&self) -> bool {
        true
    }

    /// Compile one file.
    fn compile(&self, entry: &FileEntry) -> Result<String, CompileError>;
}

/// Options for the SCSS compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SassOptions {
    /// Load paths for `@use` / `@import`, searched after the file's own directory
    pub include_paths: Vec<PathBuf>,
    /// Output style
    pub output_style: OutputStyle,
}

impl Default for SassOptions {
    /// No extra load paths, expanded output.
    fn default() -> Self {
        Self { include_paths: vec![], output_style: OutputStyle::Expanded }
    }
}

/// SCSS compiler backed by `grass`.
#[derive(Debug, Clone, Default)]
pub struct SassCompiler {
    options: SassOptions,
}

impl SassCompiler {
    pub fn new(options: SassOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SassOptions {
        &self.options
    }
}

impl StyleCompiler for SassCompiler {
    fn name(&self) -> &str {
        "sass"
    }

    fn skips_partials(&self) -> bool {
        true
    }

    fn compile(&self, entry: &FileEntry) -> Result<String, CompileError> {
        let source = String::from_utf8(entry.contents.clone())?;

        let style = match self.options.output_style {
            OutputStyle::Expanded => grass::OutputStyle::Expanded,
            OutputStyle::Compressed => grass::OutputStyle::Compressed,
        };
        let mut options = grass::Options::default().style(style);
        if let Some(parent) = entry.path.parent() {
            options = options.load_path(parent);
        }
        for path in &self.options.include_paths {
            options = options.load_path(path);
        }

        grass::from_string(source, &options).map_err(|e| CompileError::Syntax(e.to_string()))
    }
}

/// LESS compiler running an external `lessc`-compatible executable.
#[derive(Debug, Clone)]
pub struct LessCompiler {
    program: String,
    args: Vec<String>,
    include_paths: Vec<PathBuf>,
    output_style: OutputStyle,
}

impl LessCompiler {
    /// Create a compiler that runs `program` with no extra arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: vec![],
            include_paths: vec![],
            output_style: OutputStyle::Expanded,
        }
    }

    /// Create a compiler from the `[less]` section; include paths must
    /// already be resolved against the project root.
    pub fn from_config(config: &LessConfig, include_paths: Vec<PathBuf>) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            include_paths,
            output_style: config.output_style,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_output_style(mut self, style: OutputStyle) -> Self {
        self.output_style = style;
        self
    }

    fn command(&self, entry: &FileEntry) -> Result<Command, CompileError> {
        let mut cmd = Command::new(&self.program);
        cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd.args(&self.args);

        if !self.include_paths.is_empty() {
            let joined = std::env::join_paths(&self.include_paths)
                .map_err(|e| CompileError::IncludePath(e.to_string()))?;
            let mut arg = OsString::from("--include-path=");
            arg.push(joined);
            cmd.arg(arg);
        }

        cmd.arg(&entry.path);
        Ok(cmd)
    }
}

impl StyleCompiler for LessCompiler {
    fn name(&self) -> &str {
        "less"
    }

    fn reads_contents(&self) -> bool {
        false
    }

    fn compile(&self, entry: &FileEntry) -> Result<String, CompileError> {
        let out = self
            .command(entry)?
            .output()
            .map_err(|source| CompileError::Spawn { program: self.program.clone(), source })?;

        if !out.status.success() {
            return Err(CompileError::Process {
                program: self.program.clone(),
                status: out.status.to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }

        let css = String::from_utf8(out.stdout)?;
        match self.output_style {
            OutputStyle::Expanded => Ok(css),
            OutputStyle::Compressed => minify_css(&css, &entry.path.to_string_lossy()),
        }
    }
}

/// Minify CSS text with lightningcss.
pub fn minify_css(css: &str, filename: &str) -> Result<String, CompileError> {
    let options = ParserOptions { filename: filename.to_string(), ..ParserOptions::default() };
    let mut sheet =
        StyleSheet::parse(css, options).map_err(|e| CompileError::Minify(e.to_string()))?;
    sheet.minify(MinifyOptions::default()).map_err(|e| CompileError::Minify(e.to_string()))?;
    let printed = sheet
        .to_css(PrinterOptions { minify: true, ..PrinterOptions::default() })
        .map_err(|e| CompileError::Minify(e.to_string()))?;
    Ok(printed.code)
}
