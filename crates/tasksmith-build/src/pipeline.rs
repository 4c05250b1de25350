//! Incremental build pipeline.
//!
//! Each directory moves through
//! `Fingerprinting -> DecidingSkip -> Rendering -> Compiling -> CleaningUp -> Done`,
//! or ends in `Failed`. Sub-directories are processed first, in name order;
//! the root follows and is rebuilt whenever any sub-package was.
//!
//! A sub-package failure is recorded in the report and does not stop its
//! siblings or the root. A root failure fails the run.

use crate::compiler::{CompileJob, Compiler};
use crate::fingerprint::{fingerprint_dir, fingerprint_tree};
use crate::plan::WritePlan;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tasksmith_codegen::{GenerateOptions, PackageGenerator};
use tasksmith_core::{
    DirTree, DiscoveryConfig, Error, FingerprintRecord, Result, TasksmithConfig, WORK_DIR_NAME,
};
use tasksmith_discovery::discover;
use tracing::{debug, error, info, warn};

/// Sentinel file name inside the working directory.
pub const SENTINEL_FILE_NAME: &str = ".hashfile";

/// Pipeline stage, used for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Hashing eligible files
    Fingerprinting,
    /// Comparing against the sentinel
    DecidingSkip,
    /// Discovering and writing the wrapper crate
    Rendering,
    /// Running the compiler
    Compiling,
    /// Removing the wrapper crate
    CleaningUp,
    /// Finished successfully
    Done,
    /// Finished with an error
    Failed,
}

impl Stage {
    /// Stage name in snake case.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fingerprinting => "fingerprinting",
            Self::DecidingSkip => "deciding_skip",
            Self::Rendering => "rendering",
            Self::Compiling => "compiling",
            Self::CleaningUp => "cleaning_up",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn enter(dir: &Path, stage: Stage) {
    info!(dir = %dir.display(), stage = %stage, "pipeline stage");
}

/// Build settings for one run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Discovery settings, including the build tag
    pub discovery: DiscoveryConfig,
    /// Wrapper crate location, relative to each package directory
    pub cmd_dir: PathBuf,
    /// Where binaries are installed
    pub bin_dir: PathBuf,
    /// Manifest options
    pub generate: GenerateOptions,
    /// Rebuild even when fingerprints match
    pub force: bool,
    /// Write sources only; no compile, no cleanup, no sentinel
    pub skip_build: bool,
    /// Build only the root directory
    pub skip_sub: bool,
}

impl BuildOptions {
    /// Creates options from project configuration.
    #[must_use]
    pub fn from_config(config: &TasksmithConfig, bin_dir: impl Into<PathBuf>) -> Self {
        Self {
            discovery: config.discovery(),
            cmd_dir: config.cmd_dir.clone(),
            bin_dir: bin_dir.into(),
            generate: GenerateOptions::new(config.dependencies.clone()),
            force: false,
            skip_build: false,
            skip_sub: false,
        }
    }
}

/// What happened to one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DirOutcome {
    /// Fingerprint matched the sentinel
    UpToDate,
    /// Generated, compiled and installed
    Built {
        /// Installed binary
        binary: PathBuf,
        /// Files written
        files: usize,
    },
    /// Generated without compiling
    Generated {
        /// Generated crate directory
        crate_dir: PathBuf,
        /// Files written
        files: usize,
    },
    /// Nothing to build
    Skipped,
    /// Build failed
    Failed {
        /// Error description
        error: String,
    },
}

impl DirOutcome {
    /// Returns `true` if the directory's wrapper was regenerated.
    #[must_use]
    pub const fn is_rebuilt(&self) -> bool {
        matches!(self, Self::Built { .. } | Self::Generated { .. })
    }

    /// Returns `true` for [`DirOutcome::Failed`].
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Number of files written for this directory.
    #[must_use]
    pub const fn files_written(&self) -> usize {
        match self {
            Self::Built { files, .. } | Self::Generated { files, .. } => *files,
            _ => 0,
        }
    }
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// Root directory
    pub root_dir: PathBuf,
    /// Root outcome
    pub root: DirOutcome,
    /// Sub-directory outcomes keyed by normalized name
    pub subs: BTreeMap<String, DirOutcome>,
}

impl BuildReport {
    /// Every outcome, root first.
    pub fn outcomes(&self) -> impl Iterator<Item = (&str, &DirOutcome)> {
        std::iter::once((".", &self.root))
            .chain(self.subs.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Sub-directories that failed.
    #[must_use]
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.subs
            .iter()
            .filter_map(|(key, outcome)| match outcome {
                DirOutcome::Failed { error } => Some((key.as_str(), error.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Total files written across the run.
    #[must_use]
    pub fn files_written(&self) -> usize {
        self.outcomes().map(|(_, o)| o.files_written()).sum()
    }
}

/// Location of the sentinel file for `dir`.
#[must_use]
pub fn sentinel_path(dir: &Path) -> PathBuf {
    dir.join(WORK_DIR_NAME).join(SENTINEL_FILE_NAME)
}

/// Reads the trimmed sentinel hash; `None` when there is no sentinel.
///
/// # Errors
///
/// Returns [`Error::Io`] for read failures other than a missing file.
pub fn read_sentinel(dir: &Path) -> Result<Option<String>> {
    let path = sentinel_path(dir);
    match std::fs::read_to_string(&path) {
        Ok(text) => Ok(Some(text.trim().to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Writes `hash` as the sentinel for `dir`.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be written.
pub fn write_sentinel(dir: &Path, hash: &str) -> Result<()> {
    let path = sentinel_path(dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    std::fs::write(&path, hash).map_err(|e| Error::io(path, e))
}

/// The build pipeline.
#[derive(Debug)]
pub struct Pipeline<'a, C> {
    options: BuildOptions,
    compiler: C,
    generator: PackageGenerator<'a>,
}

impl<C: Compiler> Pipeline<'_, C> {
    /// Creates a pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if the generator cannot be initialized.
    pub fn new(options: BuildOptions, compiler: C) -> Result<Self> {
        Ok(Self {
            options,
            compiler,
            generator: PackageGenerator::new()?,
        })
    }

    /// Build settings.
    #[must_use]
    pub const fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Runs the pipeline on `root` and its immediate sub-directories.
    ///
    /// # Errors
    ///
    /// Returns an error when fingerprinting fails anywhere or when the root
    /// directory fails to build. Sub-directory failures are reported in the
    /// [`BuildReport`] instead.
    pub fn run(&self, root: &Path) -> Result<BuildReport> {
        let tag = &self.options.discovery.build_tag;

        enter(root, Stage::Fingerprinting);
        let fingerprints = if self.options.skip_sub {
            DirTree::new(fingerprint_dir(root, tag).map_err(|e| e.in_dir(root))?)
        } else {
            fingerprint_tree(root, tag)?
        };

        let mut subs = BTreeMap::new();
        for (key, record) in &fingerprints.subs {
            let outcome = match self.build_dir(&record.dir, record, self.options.force) {
                Ok(outcome) => outcome,
                Err(err) => {
                    let err = err.in_dir(&record.dir);
                    enter(&record.dir, Stage::Failed);
                    error!(dir = %record.dir.display(), "sub-package failed: {err}");
                    DirOutcome::Failed {
                        error: err.to_string(),
                    }
                }
            };
            subs.insert(key.clone(), outcome);
        }

        let sub_rebuilt = subs.values().any(DirOutcome::is_rebuilt);
        let root_outcome = self
            .build_dir(root, &fingerprints.root, self.options.force || sub_rebuilt)
            .map_err(|err| {
                enter(root, Stage::Failed);
                error!(dir = %root.display(), "root package failed: {err}");
                err.in_dir(root)
            })?;

        Ok(BuildReport {
            root_dir: root.to_path_buf(),
            root: root_outcome,
            subs,
        })
    }

    fn build_dir(&self, dir: &Path, record: &FingerprintRecord, force: bool) -> Result<DirOutcome> {
        if record.is_empty() {
            debug!(dir = %dir.display(), "no eligible source");
            return Ok(DirOutcome::Skipped);
        }

        enter(dir, Stage::DecidingSkip);
        if !force && read_sentinel(dir)?.as_deref() == Some(record.hash.as_str()) {
            info!(dir = %dir.display(), "up to date");
            return Ok(DirOutcome::UpToDate);
        }

        enter(dir, Stage::Rendering);
        let Some(catalog) = discover(dir, &self.options.discovery)?
            .into_catalog()
            .filter(|catalog| !catalog.is_empty())
        else {
            debug!(dir = %dir.display(), "no task functions");
            return Ok(DirOutcome::Skipped);
        };

        let crate_dir = dir.join(&self.options.cmd_dir).join(catalog.crate_name());
        let plan =
            WritePlan::for_catalog(&self.generator, &catalog, &self.options.generate, &crate_dir)?;
        let output = self.options.bin_dir.join(&catalog.binary_name);
        let job = CompileJob {
            package_dir: dir.to_path_buf(),
            manifest_path: plan.manifest_path(),
            work_dir: crate_dir.clone(),
            binary: catalog.crate_name().to_string(),
            output: output.clone(),
        };
        let plan = plan.with_compile(job);
        let files = plan.apply(&self.generator)?;

        if self.options.skip_build {
            info!(dir = %dir.display(), crate_dir = %crate_dir.display(), "sources generated");
            return Ok(DirOutcome::Generated { crate_dir, files });
        }

        if let Some(job) = &plan.compile {
            enter(dir, Stage::Compiling);
            self.compiler.compile(job)?;
        }

        enter(dir, Stage::CleaningUp);
        if let Err(e) = std::fs::remove_dir_all(&crate_dir) {
            warn!(dir = %crate_dir.display(), "failed to remove generated crate: {e}");
        }

        write_sentinel(dir, &record.hash)?;
        enter(dir, Stage::Done);
        info!(dir = %dir.display(), binary = %output.display(), "built");
        Ok(DirOutcome::Built {
            binary: output,
            files,
        })
    }
}
