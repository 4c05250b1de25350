//! Compiler invocation.
//!
//! The pipeline talks to the compiler through the [`Compiler`] trait so the
//! build step can be swapped out; [`CargoCompiler`] is the real one.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tasksmith_core::{Error, Result};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Everything needed to compile one generated package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileJob {
    /// Package directory the wrapper was generated for
    pub package_dir: PathBuf,
    /// Generated `Cargo.toml`
    pub manifest_path: PathBuf,
    /// Intermediate directory holding the generated crate
    pub work_dir: PathBuf,
    /// Crate (and binary target) name
    pub binary: String,
    /// Final location of the binary
    pub output: PathBuf,
}

impl CompileJob {
    /// Cargo target directory for this job.
    #[must_use]
    pub fn target_dir(&self) -> PathBuf {
        self.work_dir.join("target")
    }
}

/// Builds a generated package into a binary.
pub trait Compiler {
    /// Compiles `job`, placing the binary at `job.output` on success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Compile`] when compilation fails and [`Error::Io`]
    /// when the compiler cannot be started or the binary cannot be copied.
    fn compile(&self, job: &CompileJob) -> Result<()>;
}

impl<C: Compiler + ?Sized> Compiler for &C {
    fn compile(&self, job: &CompileJob) -> Result<()> {
        (**self).compile(job)
    }
}

/// Runs `cargo build --release` on the generated manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CargoCompiler {
    program: String,
}

impl CargoCompiler {
    /// Creates a compiler that runs `program` (normally `cargo`).
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Program this compiler runs.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    fn built_binary(job: &CompileJob) -> PathBuf {
        let file = format!("{}{}", job.binary, std::env::consts::EXE_SUFFIX);
        job.target_dir().join("release").join(file)
    }
}

impl Default for CargoCompiler {
    fn default() -> Self {
        Self::new("cargo")
    }
}

/// Copies `built` to `output` through a staged file in the same directory.
///
/// The binary only appears at `output` once it is complete; a failed copy
/// leaves whatever was there before.
fn install(built: &Path, output: &Path) -> Result<()> {
    let bin_dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(bin_dir).map_err(|e| Error::io(bin_dir, e))?;

    let mut source = File::open(built).map_err(|e| Error::io(built, e))?;
    let permissions = source
        .metadata()
        .map_err(|e| Error::io(built, e))?
        .permissions();

    let mut staged = NamedTempFile::new_in(bin_dir).map_err(|e| Error::io(bin_dir, e))?;
    io::copy(&mut source, staged.as_file_mut()).map_err(|e| Error::io(staged.path(), e))?;
    staged
        .as_file()
        .sync_all()
        .map_err(|e| Error::io(staged.path(), e))?;
    std::fs::set_permissions(staged.path(), permissions)
        .map_err(|e| Error::io(staged.path(), e))?;

    staged
        .persist(output)
        .map_err(|e| Error::io(output, e.error))?;
    Ok(())
}

impl Compiler for CargoCompiler {
    fn compile(&self, job: &CompileJob) -> Result<()> {
        info!(
            dir = %job.package_dir.display(),
            binary = %job.binary,
            "compiling"
        );

        let output = Command::new(&self.program)
            .arg("build")
            .arg("--release")
            .arg("--manifest-path")
            .arg(&job.manifest_path)
            .arg("--target-dir")
            .arg(job.target_dir())
            .current_dir(&job.work_dir)
            .output()
            .map_err(|e| Error::io(&self.program, e))?;

        if !output.status.success() {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(Error::Compile {
                dir: job.package_dir.clone(),
                code: output.status.code(),
                output: text,
            });
        }

        let built = Self::built_binary(job);
        debug!(from = %built.display(), to = %job.output.display(), "installing binary");
        install(&built, &job.output)
    }
}
