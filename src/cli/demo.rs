//! Demo command implementation

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::demos::{self, server_error, DEMOS};

/// Run the demo command
pub fn run_demo(
    name: Option<&str>,
    output: Option<&Path>,
    http: bool,
    list: bool,
    verbose: bool,
) -> ExitCode {
    crate::logging::init(if verbose { "debug" } else { "warn" });

    if list {
        let width = DEMOS.iter().map(|d| d.name.len()).max().unwrap_or(0);
        for demo in DEMOS {
            println!("  {:<width$}  {}", demo.name, demo.description, width = width);
        }
        return ExitCode::from(EXIT_SUCCESS);
    }

    let Some(name) = name else {
        eprintln!("Error: No demo name given");
        eprintln!("Run 'ppipe demo --list' to list available demos");
        return ExitCode::from(EXIT_INVALID_ARGS);
    };

    let (response, code) = match demos::run(name) {
        None => {
            eprintln!("Error: Unknown demo '{}'", name);
            eprintln!("Run 'ppipe demo --list' to list available demos");
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
        Some(Ok(response)) => (response, EXIT_SUCCESS),
        Some(Err(e)) => {
            eprintln!("Error: {}", e);
            if !http {
                return ExitCode::from(EXIT_ERROR);
            }
            (server_error(&e.to_string()), EXIT_ERROR)
        }
    };

    let bytes = if http {
        let mut buf = Vec::new();
        if let Err(e) = response.write_http(&mut buf) {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
        buf
    } else {
        response.body
    };

    let written = match output {
        Some(path) => crate::build::write_output(path, &bytes).map_err(|e| e.to_string()),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes).and_then(|_| stdout.flush()).map_err(|e| e.to_string())
        }
    };

    match written {
        Ok(()) => {
            if let Some(path) = output {
                println!("Wrote {} ({}, {} bytes)", path.display(), response.content_type, bytes.len());
            }
            ExitCode::from(code)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
