use std::process::ExitCode;

use activate_linux::cli::Cli;
use clap::Parser;

fn main() -> ExitCode {
    activate_linux::run(Cli::parse())
}
