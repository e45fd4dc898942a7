//! # action-synth CLI
//!
//! Binary entry point for the `action-synth` command-line tool.
//!
//! The binary parses arguments with `clap`, sets up logging, and dispatches
//! to one module per subcommand. All synthesis logic lives in the library
//! crate; the binary is a thin layer of argument handling and presentation.
//!
//! Any error returned from a command exits with status 1. Usage errors are
//! reported by `clap` with status 2.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
