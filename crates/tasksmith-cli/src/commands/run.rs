//! Run command implementation.
//!
//! Brings the tree up to date, then executes one of the installed binaries
//! with the caller's stdio.

use super::build::build_tree;
use super::common::{BuildOverrides, build_options, load_project};
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use tasksmith_core::cli::ExitCode;
use tokio::process::Command;
use tracing::{info, warn};

/// Path of `binary` inside `bin_dir`, adding the platform suffix if missing.
#[must_use]
pub fn binary_path(bin_dir: &Path, binary: &str, exe_suffix: &str) -> PathBuf {
    if exe_suffix.is_empty() || binary.ends_with(exe_suffix) {
        bin_dir.join(binary)
    } else {
        bin_dir.join(format!("{binary}{exe_suffix}"))
    }
}

/// Arguments handed to the binary.
#[must_use]
pub fn binary_args(input: Option<&str>, args: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len() + 2);
    if let Some(input) = input {
        out.push("--in".to_string());
        out.push(input.to_string());
    }
    out.extend(args.iter().cloned());
    out
}

/// Runs the run command.
///
/// The binary's exit status becomes the CLI's exit code.
pub async fn run(
    dir: &Path,
    binary: &str,
    args: &[String],
    input: Option<&str>,
) -> Result<ExitCode> {
    let overrides = BuildOverrides::default();
    let (report, _) = build_tree(dir, &overrides).await?;
    for (failed, error) in report.failures() {
        warn!(dir = failed, "package failed, its binary may be stale: {error}");
    }

    let (_, config) = load_project(dir)?;
    let options = build_options(&config, &overrides)?;
    let path = binary_path(&options.bin_dir, binary, config.discovery().exe_suffix());
    if !path.is_file() {
        bail!(
            "binary '{binary}' not found in {}; run `tasksmith list` to see available packages",
            options.bin_dir.display()
        );
    }

    let argv = binary_args(input, args);
    info!(binary = %path.display(), args = ?argv, "executing");
    let status = Command::new(&path)
        .args(&argv)
        .status()
        .await
        .with_context(|| format!("failed to execute {}", path.display()))?;

    Ok(ExitCode::from_i32(status.code().unwrap_or(1)))
}
