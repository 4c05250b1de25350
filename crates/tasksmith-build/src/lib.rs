//! Incremental build pipeline for tasksmith packages.
//!
//! Fingerprints a root directory and its immediate sub-directories,
//! regenerates the wrapper crate of every changed package, compiles it and
//! records the new fingerprint in a sentinel file so unchanged packages are
//! skipped next time.
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//! use tasksmith_build::{BuildOptions, CargoCompiler, Pipeline};
//! use tasksmith_core::TasksmithConfig;
//!
//! let config = TasksmithConfig::load(Path::new("."))?;
//! let options = BuildOptions::from_config(&config, config.resolve_bin_dir()?);
//! let pipeline = Pipeline::new(options, CargoCompiler::new(&config.compiler))?;
//!
//! let report = pipeline.run(Path::new("."))?;
//! for (dir, error) in report.failures() {
//!     eprintln!("{dir}: {error}");
//! }
//! # Ok::<(), tasksmith_core::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod compiler;
pub mod fingerprint;
pub mod gitignore;
pub mod pipeline;
pub mod plan;

pub use compiler::{CargoCompiler, CompileJob, Compiler};
pub use fingerprint::{fingerprint_dir, fingerprint_files, fingerprint_tree};
pub use pipeline::{BuildOptions, BuildReport, DirOutcome, Pipeline, Stage};
pub use plan::{WriteDirective, WritePlan};
