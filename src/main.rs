//! ppipe - stylesheet build tasks and image canvas demos

use std::process::ExitCode;

use pixelpipe::cli;

fn main() -> ExitCode {
    cli::run()
}
