//! Tasksmith CLI.
//!
//! Turns annotated Rust functions into installed command-line binaries.
//!
//! # Architecture
//!
//! The CLI is organized around subcommands:
//! - `build` - Rebuild changed packages and install their binaries
//! - `list` - Show discovered tasks
//! - `add` - Create starter task files
//! - `run` - Build, then execute a binary
//! - `completions` - Generate shell completions
//!
//! # Examples
//!
//! ```bash
//! # Build everything below the current directory
//! tasksmith build
//!
//! # Run the default task of the `ops` binary
//! tasksmith run ops
//! ```

use anyhow::Result;
use clap::Parser;
use tasksmith_cli::cli::Cli;
use tasksmith_cli::runner::{execute_command, init_logging};
use tasksmith_core::cli::OutputFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let output_format = cli
        .format
        .parse::<OutputFormat>()
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let exit_code = execute_command(cli.command, output_format).await?;

    std::process::exit(exit_code.as_i32());
}
