//! Command execution and runtime logic.
//!
//! Contains the command dispatch and logging initialization.

use anyhow::Result;
use tasksmith_core::cli::{ExitCode, OutputFormat};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Commands;
use crate::commands;
use crate::commands::common::BuildOverrides;

/// Initializes logging infrastructure.
///
/// `--verbose` forces the `debug` level; otherwise `RUST_LOG` applies,
/// falling back to `info`. Logs go to stderr so command output stays
/// parseable.
pub fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}

/// Executes the specified CLI command.
///
/// Routes commands to their respective handlers and returns an exit code.
pub async fn execute_command(command: Commands, output_format: OutputFormat) -> Result<ExitCode> {
    match command {
        Commands::Build {
            dir,
            cmd_dir,
            bin_dir,
            force,
            skip_build,
            skip_sub,
        } => {
            let overrides = BuildOverrides {
                cmd_dir,
                bin_dir,
                force,
                skip_build,
                skip_sub,
            };
            commands::build::run(&dir, &overrides, output_format).await
        }
        Commands::List { dir } => commands::list::run(&dir, output_format),
        Commands::Add {
            names,
            dir,
            package,
        } => commands::add::run(&dir, package.as_deref(), &names, output_format),
        Commands::Run {
            binary,
            args,
            dir,
            input,
        } => commands::run::run(&dir, &binary, &args, input.as_deref()).await,
        Commands::Completions { shell } => {
            use crate::cli::Cli;
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            commands::completions::run(shell, &mut cmd)
        }
    }
}
