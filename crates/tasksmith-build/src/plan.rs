//! Write plans for generated packages.
//!
//! A plan lists every file of one wrapper crate as a deferred render.
//! Applying it renders and writes the files in order; the first failure
//! stops the batch and files already written stay on disk.

use crate::compiler::CompileJob;
use std::path::{Path, PathBuf};
use tasksmith_codegen::{GenerateOptions, PackageGenerator, RenderJob};
use tasksmith_core::{Error, PackageCatalog, Result};
use tracing::debug;

/// One file to render and write.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteDirective {
    /// Directory the file is written into
    pub dir: PathBuf,
    /// File name inside `dir`
    pub file_name: String,
    /// Render job producing the content
    pub job: RenderJob,
}

impl WriteDirective {
    /// Full path of the written file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

/// Every file of one wrapper crate, plus the compile step that follows.
#[derive(Debug, Clone, PartialEq)]
pub struct WritePlan {
    /// Root of the generated crate
    pub crate_dir: PathBuf,
    /// Files in write order
    pub directives: Vec<WriteDirective>,
    /// Compilation to run once every file is written
    pub compile: Option<CompileJob>,
}

impl WritePlan {
    /// Plans the wrapper crate for `catalog` under `crate_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if a template context cannot be built.
    pub fn for_catalog(
        generator: &PackageGenerator<'_>,
        catalog: &PackageCatalog,
        options: &GenerateOptions,
        crate_dir: &Path,
    ) -> Result<Self> {
        let directives = generator
            .jobs(catalog, options)?
            .into_iter()
            .map(|(relative, job)| {
                let (dir, file_name) = match relative.rsplit_once('/') {
                    Some((sub, name)) => (crate_dir.join(sub), name.to_string()),
                    None => (crate_dir.to_path_buf(), relative),
                };
                WriteDirective {
                    dir,
                    file_name,
                    job,
                }
            })
            .collect();

        Ok(Self {
            crate_dir: crate_dir.to_path_buf(),
            directives,
            compile: None,
        })
    }

    /// Plans starter task files in `dir`, one per file stem.
    ///
    /// Stems may carry an `.rs` extension. Files that already exist are left
    /// out of the plan so applying it never overwrites user code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if a context cannot be serialized.
    pub fn scaffold(
        generator: &PackageGenerator<'_>,
        dir: &Path,
        build_tag: &str,
        stems: &[String],
    ) -> Result<Self> {
        let binary = dir
            .file_name()
            .map_or_else(|| "tasks".to_string(), |n| n.to_string_lossy().into_owned());

        let mut directives = Vec::with_capacity(stems.len());
        for stem in stems {
            let stem = stem.strip_suffix(".rs").unwrap_or(stem);
            if stem.is_empty() {
                continue;
            }
            let file_name = format!("{stem}.rs");
            if dir.join(&file_name).exists() {
                debug!(file = %file_name, "task file exists, not scaffolding");
                continue;
            }
            directives.push(WriteDirective {
                dir: dir.to_path_buf(),
                file_name,
                job: generator.scaffold(build_tag, &binary, stem)?,
            });
        }

        Ok(Self {
            crate_dir: dir.to_path_buf(),
            directives,
            compile: None,
        })
    }

    /// Attaches the compile step.
    #[must_use]
    pub fn with_compile(mut self, job: CompileJob) -> Self {
        self.compile = Some(job);
        self
    }

    /// Path of the generated `Cargo.toml`.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.crate_dir.join("Cargo.toml")
    }

    /// Renders and writes every file in order.
    ///
    /// Returns the number of files written.
    ///
    /// # Errors
    ///
    /// Returns the first render or I/O failure; earlier files remain.
    pub fn apply(&self, generator: &PackageGenerator<'_>) -> Result<usize> {
        let mut written = 0;
        for directive in &self.directives {
            let content = generator.render(&directive.job)?;
            std::fs::create_dir_all(&directive.dir).map_err(|e| Error::io(&directive.dir, e))?;
            let path = directive.path();
            std::fs::write(&path, content).map_err(|e| Error::io(&path, e))?;
            debug!(path = %path.display(), "wrote file");
            written += 1;
        }
        Ok(written)
    }
}
