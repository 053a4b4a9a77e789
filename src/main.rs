//! sgr - Command-line tool for inspecting and resolving sprite group graphs

use std::process::ExitCode;

use spritegroup::cli;

fn main() -> ExitCode {
    cli::run()
}
