//! Build command implementation.
//!
//! Runs the incremental pipeline over a directory tree and reports the
//! outcome of every package.

use super::common::{BuildOverrides, build_options, load_project, run_pipeline};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tasksmith_build::{BuildReport, DirOutcome, gitignore};
use tasksmith_core::cli::{ExitCode, OutputFormat};
use tracing::{info, warn};

/// Result of a build run.
#[derive(Debug, Serialize)]
pub struct BuildSummary {
    /// Root directory
    pub root_dir: PathBuf,
    /// Outcome of the root package
    pub root: DirOutcome,
    /// Outcomes of sub-directories by name
    pub subs: BTreeMap<String, DirOutcome>,
    /// Files written across all packages
    pub files_written: usize,
    /// Number of failed sub-packages
    pub failed: usize,
    /// Whether `.gitignore` was updated
    pub gitignore_updated: bool,
}

impl BuildSummary {
    fn new(report: BuildReport, gitignore_updated: bool) -> Self {
        let files_written = report.files_written();
        let failed = report.failures().len();
        Self {
            root_dir: report.root_dir,
            root: report.root,
            subs: report.subs,
            files_written,
            failed,
            gitignore_updated,
        }
    }

    /// Exit code matching the outcome.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        if self.failed == 0 {
            ExitCode::SUCCESS
        } else {
            ExitCode::BUILD_FAILED
        }
    }
}

/// Builds `dir`, returning the raw report.
///
/// Shared with `run`, which builds before executing.
pub async fn build_tree(dir: &Path, overrides: &BuildOverrides) -> Result<(BuildReport, bool)> {
    let (root, config) = load_project(dir)?;
    let options = build_options(&config, overrides)?;

    let gitignore_updated = gitignore::ensure_ignored(&root)
        .with_context(|| format!("failed to update .gitignore in {}", root.display()))?;

    info!(
        root = %root.display(),
        bin_dir = %options.bin_dir.display(),
        force = options.force,
        "starting build"
    );
    let report = run_pipeline(root, options, config.compiler.clone()).await?;

    for (dir, error) in report.failures() {
        warn!(dir, "package failed: {error}");
    }
    Ok((report, gitignore_updated))
}

/// Runs the build command.
///
/// Sub-package failures are reported and turn into a non-zero exit code;
/// a root failure is returned as an error.
pub async fn run(
    dir: &Path,
    overrides: &BuildOverrides,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let (report, gitignore_updated) = build_tree(dir, overrides).await?;
    let summary = BuildSummary::new(report, gitignore_updated);

    let formatted = crate::formatters::format_output(&summary, output_format)?;
    println!("{formatted}");

    Ok(summary.exit_code())
}
