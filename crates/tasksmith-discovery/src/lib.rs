//! Task function discovery for tasksmith.
//!
//! Discovery turns a directory of Rust sources into a [`PackageCatalog`]:
//!
//! 1. [`parser`] selects files tagged with `#![cfg(<build_tag>)]` and parses them
//! 2. [`describe`] reduces each parameter type to a [`TypeDescriptor`]
//! 3. [`classifier`] maps descriptors onto the closed shape set
//! 4. [`annotations`] resolves `@default`, `@flag` and `@binaryName` markers
//! 5. [`registry`] assembles the catalog
//!
//! [`walker`] applies an operation to a root directory and each of its
//! immediate sub-directories.
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//! use tasksmith_core::DiscoveryConfig;
//! use tasksmith_discovery::discover;
//!
//! let discovery = discover(Path::new("tasks"), &DiscoveryConfig::default())?;
//! if let Some(catalog) = discovery.catalog() {
//!     for function in &catalog.functions {
//!         println!("{} {}", function.command, function.signature);
//!     }
//! }
//! # Ok::<(), tasksmith_core::Error>(())
//! ```
//!
//! [`PackageCatalog`]: tasksmith_core::PackageCatalog
//! [`TypeDescriptor`]: tasksmith_core::TypeDescriptor

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod annotations;
pub mod classifier;
pub mod describe;
pub mod parser;
pub mod registry;
pub mod walker;

pub use annotations::{Annotations, Marker};
pub use classifier::{Classification, classify};
pub use parser::{ParsedFile, ParsedPackage};
pub use registry::{build_catalog, discover};
pub use walker::{discover_tree, walk_surface};
