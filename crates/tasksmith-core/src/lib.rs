//! Core types, errors, and configuration for tasksmith.
//!
//! This crate provides the foundational types shared by every other crate
//! in the tasksmith workspace.
//!
//! # Architecture
//!
//! The core consists of:
//! - The discovery data model (`FunctionRecord`, `PackageCatalog`, `Signature`)
//! - Fingerprint records and per-directory trees
//! - Error hierarchy with contextual information
//! - Configuration loaded from `Tasksmith.toml`
//! - CLI newtypes (`OutputFormat`, `ExitCode`)

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod config;
mod error;
mod types;

pub mod cli;

pub use config::{
    BIN_DIR_ENV, COMPILER_ENV, CONFIG_FILE_NAME, DiscoveryConfig, TasksmithConfig, WORK_DIR_NAME,
};
pub use error::{Error, Result};
pub use types::{
    ArgumentBinding, ArgumentShape, ContextConvention, DirTree, Discovery, FingerprintRecord,
    FingerprintTree, FlagKind, FlagSpec, FunctionRecord, ImportedType, PackageCatalog, ParamBinding,
    PassMode, ReturnDescriptor, ReturnShape, Signature, SourceFile, TypeDescriptor, TypeKind,
    normalize_key,
};
