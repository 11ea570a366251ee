//! Task commands (run, tasks)

use std::path::Path;
use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::build::{default_registry, BuildContext, Runner, TaskError};
use crate::config::{load_project, merge_cli_overrides, CliOverrides, ConfigError, OutputStyle};

/// Load config, apply overrides, start logging.
fn load_context(
    config_path: Option<&Path>,
    verbose: bool,
    overrides: &CliOverrides,
) -> Result<BuildContext, ConfigError> {
    let (mut config, root) = load_project(config_path)?;
    merge_cli_overrides(&mut config, overrides);
    crate::logging::init(&config.log.level);

    if verbose {
        match config_path {
            Some(p) => println!("Using config: {}", p.display()),
            None => println!("Project root: {}", root.display()),
        }
    }
    Ok(BuildContext::new(config, root).with_verbose(verbose))
}

/// Run the run command
pub fn run_tasks(
    config_path: Option<&Path>,
    verbose: bool,
    tasks: &[String],
    style: Option<&str>,
    less_program: Option<&str>,
) -> ExitCode {
    let output_style = match style {
        Some(s) => match OutputStyle::from_str(s) {
            Some(style) => Some(style),
            None => {
                eprintln!("Error: Unknown output style '{}' (expected expanded or compressed)", s);
                return ExitCode::from(EXIT_INVALID_ARGS);
            }
        },
        None => None,
    };

    let overrides = CliOverrides {
        verbose: Some(verbose),
        less_program: less_program.map(str::to_string),
        output_style,
    };
    let context = match load_context(config_path, verbose, &overrides) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let runner = Runner::new(default_registry(&context), context);
    match runner.run_series(tasks) {
        Ok(report) => {
            if verbose {
                println!("{}", report.summary());
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(TaskError::UnknownTask(name)) => {
            eprintln!("Error: Task '{}' is not in the task registry", name);
            eprintln!("Run 'ppipe tasks' to list available tasks");
            ExitCode::from(EXIT_INVALID_ARGS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the tasks command
pub fn list_tasks(config_path: Option<&Path>, verbose: bool) -> ExitCode {
    let overrides = CliOverrides { verbose: Some(verbose), ..Default::default() };
    let context = match load_context(config_path, verbose, &overrides) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let registry = default_registry(&context);
    println!("Tasks for {}", context.project_root().display());
    let width = registry.names().iter().map(|n| n.len()).max().unwrap_or(0);
    for (name, description) in registry.describe() {
        println!("  {:<width$}  {}", name, description, width = width);
    }
    ExitCode::from(EXIT_SUCCESS)
}
