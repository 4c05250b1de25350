//! Helpers shared by the build, list and run commands.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tasksmith_build::{BuildOptions, BuildReport, CargoCompiler, Pipeline};
use tasksmith_core::TasksmithConfig;
use tracing::debug;

/// Overrides taken from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct BuildOverrides {
    /// Replaces the configured intermediate directory
    pub cmd_dir: Option<PathBuf>,
    /// Replaces the configured binary directory
    pub bin_dir: Option<PathBuf>,
    /// Rebuild regardless of fingerprints
    pub force: bool,
    /// Generate without compiling
    pub skip_build: bool,
    /// Root package only
    pub skip_sub: bool,
}

/// Canonicalizes `dir` and loads its `Tasksmith.toml`.
///
/// # Errors
///
/// Returns an error if the directory does not exist or the configuration
/// is invalid.
pub fn load_project(dir: &Path) -> Result<(PathBuf, TasksmithConfig)> {
    let root = dir
        .canonicalize()
        .with_context(|| format!("directory {} not found", dir.display()))?;
    let config = TasksmithConfig::load(&root)
        .with_context(|| format!("failed to load configuration in {}", root.display()))?;
    debug!(root = %root.display(), build_tag = %config.build_tag, "loaded project");
    Ok((root, config))
}

/// Turns configuration plus flags into pipeline options.
///
/// # Errors
///
/// Returns an error if no binary directory can be resolved.
pub fn build_options(config: &TasksmithConfig, overrides: &BuildOverrides) -> Result<BuildOptions> {
    let bin_dir = match &overrides.bin_dir {
        Some(dir) => dir.clone(),
        None => config
            .resolve_bin_dir()
            .context("failed to resolve binary directory")?,
    };

    let mut options = BuildOptions::from_config(config, bin_dir);
    if let Some(cmd_dir) = &overrides.cmd_dir {
        options.cmd_dir.clone_from(cmd_dir);
    }
    options.force = overrides.force;
    options.skip_build = overrides.skip_build;
    options.skip_sub = overrides.skip_sub;
    Ok(options)
}

/// Runs the pipeline on a blocking worker thread.
///
/// # Errors
///
/// Returns an error if the root package fails or the worker panics.
pub async fn run_pipeline(
    root: PathBuf,
    options: BuildOptions,
    compiler: String,
) -> Result<BuildReport> {
    let display = root.display().to_string();
    tokio::task::spawn_blocking(move || {
        let pipeline = Pipeline::new(options, CargoCompiler::new(compiler))?;
        pipeline.run(&root)
    })
    .await
    .context("build worker panicked")?
    .with_context(|| format!("build failed in {display}"))
}
