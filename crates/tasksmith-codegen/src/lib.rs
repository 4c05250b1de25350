//! Wrapper crate generation for tasksmith.
//!
//! Renders a discovered [`PackageCatalog`](tasksmith_core::PackageCatalog)
//! into a standalone cargo crate whose binary dispatches to the package's
//! task functions. Templates are Handlebars files embedded at compile time.
//!
//! # Examples
//!
//! ```
//! use tasksmith_codegen::{GenerateOptions, PackageGenerator};
//! use tasksmith_core::PackageCatalog;
//!
//! let generator = PackageGenerator::new().unwrap();
//! let catalog = PackageCatalog::new("ops", "/tmp/ops");
//! let code = generator.generate(&catalog, &GenerateOptions::default()).unwrap();
//! assert!(code.get("src/main.rs").is_some());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod call;
pub mod generator;
pub mod template_engine;
pub mod types;

pub use generator::{GenerateOptions, PackageGenerator, dependencies_toml, function_ident};
pub use template_engine::TemplateEngine;
pub use types::{GeneratedCode, GeneratedFile, RenderJob};
