//! Add command implementation.
//!
//! Writes starter task files into the project or one of its packages.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tasksmith_build::{WriteDirective, WritePlan};
use tasksmith_codegen::PackageGenerator;
use tasksmith_core::TasksmithConfig;
use tasksmith_core::cli::{ExitCode, OutputFormat};
use tracing::info;

/// Result of scaffolding.
#[derive(Debug, Serialize)]
pub struct AddResult {
    /// Directory that received the files
    pub dir: PathBuf,
    /// Files created
    pub created: Vec<PathBuf>,
    /// Requested files that already existed
    pub skipped: Vec<String>,
}

/// Scaffolds `names` into `dir`, or into `dir/<package>` when given.
///
/// Existing files are never overwritten.
pub fn scaffold(dir: &Path, package: Option<&str>, names: &[String]) -> Result<AddResult> {
    let config = TasksmithConfig::load(dir)
        .with_context(|| format!("failed to load configuration in {}", dir.display()))?;

    let target = match package {
        Some(package) if package.contains(['/', '\\']) || package.starts_with('.') => {
            bail!("package must be a plain directory name, got '{package}'")
        }
        Some(package) => dir.join(package),
        None => dir.to_path_buf(),
    };
    std::fs::create_dir_all(&target)
        .with_context(|| format!("failed to create {}", target.display()))?;

    let generator = PackageGenerator::new()?;
    let plan = WritePlan::scaffold(&generator, &target, &config.build_tag, names)?;
    let created: Vec<PathBuf> = plan.directives.iter().map(WriteDirective::path).collect();
    plan.apply(&generator)?;

    let skipped = names
        .iter()
        .map(|name| name.strip_suffix(".rs").unwrap_or(name))
        .filter(|stem| !stem.is_empty())
        .map(|stem| format!("{stem}.rs"))
        .filter(|file| !created.iter().any(|path| path.ends_with(file)))
        .collect();

    info!(dir = %target.display(), created = created.len(), "scaffolded task files");
    Ok(AddResult {
        dir: target,
        created,
        skipped,
    })
}

/// Runs the add command.
pub fn run(
    dir: &Path,
    package: Option<&str>,
    names: &[String],
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let result = scaffold(dir, package, names)?;

    let formatted = crate::formatters::format_output(&result, output_format)?;
    println!("{formatted}");
    Ok(ExitCode::SUCCESS)
}
