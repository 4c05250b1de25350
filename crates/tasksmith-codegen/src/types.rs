//! Types for wrapper generation.
//!
//! Template contexts mirror the variables each built-in template reads;
//! the engine runs in strict mode, so a missing field is a render error.
//!
//! # Examples
//!
//! ```
//! use tasksmith_codegen::{GeneratedCode, GeneratedFile};
//!
//! let mut code = GeneratedCode::new();
//! code.add_file(GeneratedFile {
//!     path: "src/main.rs".to_string(),
//!     content: "fn main() {}".to_string(),
//! });
//!
//! assert_eq!(code.file_count(), 1);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of generating one package: every file of the wrapper crate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedCode {
    /// Generated files with crate-relative paths
    pub files: Vec<GeneratedFile>,
}

impl GeneratedCode {
    /// Creates an empty container.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Adds a generated file.
    pub fn add_file(&mut self, file: GeneratedFile) {
        self.files.push(file);
    }

    /// Returns the number of generated files.
    #[inline]
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Looks up a file by its relative path.
    ///
    /// # Examples
    ///
    /// ```
    /// use tasksmith_codegen::{GeneratedCode, GeneratedFile};
    ///
    /// let mut code = GeneratedCode::new();
    /// code.add_file(GeneratedFile {
    ///     path: "Cargo.toml".to_string(),
    ///     content: String::new(),
    /// });
    ///
    /// assert!(code.get("Cargo.toml").is_some());
    /// assert!(code.get("missing").is_none());
    /// ```
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.path == path)
    }
}

/// A single generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    /// Path relative to the wrapper crate root, `/`-separated
    pub path: String,
    /// File content
    pub content: String,
}

/// A deferred render: template name plus its serialized context.
///
/// Build plans carry jobs instead of rendered text so that rendering and
/// writing happen together, one file at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderJob {
    /// Registered template name
    pub template: String,
    /// Template context
    pub context: Value,
}

/// Context for the `manifest` template.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestContext {
    /// Crate and binary name
    pub crate_name: String,
    /// Pre-rendered `[dependencies]` table
    pub dependencies_toml: String,
}

/// One generated shim.
#[derive(Debug, Clone, Serialize)]
pub struct ShimContext {
    /// Function identifier as written in source
    pub name: String,
    /// Indented body statements
    pub body: String,
}

/// Context for the `task_file` template.
#[derive(Debug, Clone, Serialize)]
pub struct TaskFileContext {
    /// Original file name
    pub file_name: String,
    /// Stripped original source
    pub source: String,
    /// Shims for functions declared in this file
    pub shims: Vec<ShimContext>,
}

/// One flag entry of the registry.
#[derive(Debug, Clone, Serialize)]
pub struct FlagContext {
    /// Flag name literal
    pub name_literal: String,
    /// Environment variable literal
    pub env_literal: String,
    /// `FlagKind` variant name
    pub kind: String,
    /// Description literal
    pub description_literal: String,
}

/// One task entry of the registry.
#[derive(Debug, Clone, Serialize)]
pub struct TaskContext {
    /// Module holding the function
    pub module: String,
    /// Function identifier
    pub name: String,
    /// Command name, unquoted
    pub command: String,
    /// First description line, unquoted
    pub synopsis: String,
    /// Command name literal
    pub command_literal: String,
    /// Synopsis literal
    pub synopsis_literal: String,
    /// Description literal
    pub description_literal: String,
    /// Function source literal
    pub source_literal: String,
    /// Signature literal
    pub signature_literal: String,
    /// Marked `@default`
    pub default: bool,
    /// Declared flags
    pub flags: Vec<FlagContext>,
}

/// Context for the `registry` template.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryContext {
    /// Binary name for the module docs
    pub binary_name: String,
    /// Module names, in file order
    pub modules: Vec<String>,
    /// Registered tasks
    pub tasks: Vec<TaskContext>,
    /// Width of the command column
    pub name_width: usize,
}

/// Context for the `main` template.
#[derive(Debug, Clone, Serialize)]
pub struct MainContext {
    /// Binary name literal
    pub binary_literal: String,
    /// Width of the command column
    pub name_width: usize,
    /// Whether any task takes a cancellation context
    pub uses_context: bool,
}

/// Context for the `scaffold` template.
#[derive(Debug, Clone, Serialize)]
pub struct ScaffoldContext {
    /// Build tag gating the file
    pub build_tag: String,
    /// Binary the task ends up in
    pub binary: String,
    /// Function identifier
    pub function: String,
    /// Command name
    pub command: String,
    /// Doc comment line
    pub synopsis: String,
}
