//! CLI argument definitions and parsing.
//!
//! Defines the command-line interface structure using clap:
//! - `Cli` - Main CLI entry point
//! - `Commands` - Available subcommands

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Tasksmith - turn annotated Rust functions into command-line binaries.
///
/// Scans a directory and its immediate sub-directories for task files,
/// generates a wrapper crate per package and installs the compiled binary.
#[derive(Parser, Debug)]
#[command(name = "tasksmith")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (json, text, pretty)
    #[arg(long = "format", global = true, default_value = "pretty")]
    pub format: String,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build binaries for every changed package.
    ///
    /// Fingerprints the directory and its immediate sub-directories and
    /// rebuilds only the packages whose task files changed.
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Build the current directory
    /// tasksmith build
    ///
    /// # Generate sources only, keeping them for inspection
    /// tasksmith build --skip-build --cmd-dir target/tasksmith
    /// ```
    Build {
        /// Directory to build
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Intermediate directory for generated crates, relative to each package
        #[arg(long)]
        cmd_dir: Option<PathBuf>,

        /// Directory receiving the binaries
        #[arg(long)]
        bin_dir: Option<PathBuf>,

        /// Rebuild even when fingerprints are unchanged
        #[arg(short, long)]
        force: bool,

        /// Generate sources without compiling them
        #[arg(long)]
        skip_build: bool,

        /// Only build the root package
        #[arg(long)]
        skip_sub: bool,
    },

    /// List the tasks discovered in a directory tree.
    List {
        /// Directory to scan
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },

    /// Create starter task files.
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Adds deploy.rs and lint.rs to ./ops
    /// tasksmith add --package ops deploy lint
    /// ```
    Add {
        /// File names, with or without the `.rs` extension
        #[arg(required = true)]
        names: Vec<String>,

        /// Project directory
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Sub-directory (package) receiving the files
        #[arg(short, long)]
        package: Option<String>,
    },

    /// Build incrementally, then run a generated binary.
    ///
    /// # Examples
    ///
    /// ```bash
    /// tasksmith run ops deploy --release
    /// tasksmith run ops greet --in Rock
    /// ```
    Run {
        /// Binary name
        binary: String,

        /// Arguments passed to the binary
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,

        /// Project directory
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// One-off input value for the task
        #[arg(long = "in")]
        input: Option<String>,
    },

    /// Generate shell completions.
    ///
    /// Generates completion scripts for various shells that can be
    /// sourced or saved to enable tab completion for this CLI.
    Completions {
        /// Target shell for completion generation
        #[arg(value_enum)]
        shell: Shell,
    },
}
