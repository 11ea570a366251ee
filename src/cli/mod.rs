//! Command-line interface implementation
//!
//! This module contains the CLI structure and the command dispatch,
//! with each command's implementation in its own submodule.

mod build;
mod demo;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Pixelpipe - stylesheet build tasks and image canvas demos
#[derive(Parser)]
#[command(name = "ppipe")]
#[command(about = "Pixelpipe - compile LESS/SCSS stylesheets and render image canvas demos")]
#[command(version)]
pub struct Cli {
    /// Path to pixelpipe.toml (default: search upward from the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (also switches logging to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run tasks in series, stopping at the first failure
    Run {
        /// Task names (less, sass, sass:watch)
        #[arg(required = true)]
        tasks: Vec<String>,

        /// Override the output style of both compile tasks (expanded, compressed)
        #[arg(long)]
        style: Option<String>,

        /// Override the LESS compiler executable
        #[arg(long)]
        less_program: Option<String>,
    },

    /// List registered tasks
    Tasks,

    /// Render an image demo
    Demo {
        /// Demo name (see --list)
        name: Option<String>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit a full HTTP/1.1 response (status line, headers, body)
        #[arg(long)]
        http: bool,

        /// List available demos
        #[arg(long)]
        list: bool,
    },
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { tasks, style, less_program } => build::run_tasks(
            cli.config.as_deref(),
            cli.verbose,
            &tasks,
            style.as_deref(),
            less_program.as_deref(),
        ),
        Commands::Tasks => build::list_tasks(cli.config.as_deref(), cli.verbose),
        Commands::Demo { name, output, http, list } => {
            demo::run_demo(name.as_deref(), output.as_deref(), http, list, cli.verbose)
        }
    }
}
