//! Configuration for discovery and builds.
//!
//! Settings are read from an optional `Tasksmith.toml` in the target
//! directory. Every field has a default, so an absent file is equivalent
//! to an empty one. Two environment variables override the file:
//! `TASKSMITH_BIN` (output directory) and `TASKSMITH_COMPILER`.
//!
//! # Examples
//!
//! ```
//! use tasksmith_core::TasksmithConfig;
//!
//! let config = TasksmithConfig::from_toml_str(r#"
//!     build_tag = "ops"
//!     custom_context_types = ["OpsContext"]
//!
//!     [dependencies]
//!     anyhow = "1"
//! "#).unwrap();
//!
//! assert_eq!(config.build_tag, "ops");
//! assert_eq!(config.compiler, "cargo");
//! assert!(config.dependencies.contains_key("anyhow"));
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the optional configuration file.
pub const CONFIG_FILE_NAME: &str = "Tasksmith.toml";

/// Per-directory working directory holding generated sources and the sentinel.
pub const WORK_DIR_NAME: &str = ".tasksmith";

/// Overrides the binary output directory.
pub const BIN_DIR_ENV: &str = "TASKSMITH_BIN";

/// Overrides the compiler program.
pub const COMPILER_ENV: &str = "TASKSMITH_COMPILER";

/// Project configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TasksmithConfig {
    /// Files must carry `#![cfg(<build_tag>)]` to be scanned.
    ///
    /// Default: `tasksmith`
    pub build_tag: String,

    /// Intermediate directory for generated packages, relative to each
    /// package directory.
    ///
    /// Default: `.tasksmith/cmd`
    pub cmd_dir: PathBuf,

    /// Where compiled binaries are placed.
    ///
    /// Default: `TASKSMITH_BIN`, then `$CARGO_HOME/bin`, then `~/.cargo/bin`
    pub bin_dir: Option<PathBuf>,

    /// Last path segments recognised as custom context types.
    ///
    /// Default: `["TaskContext"]`
    pub custom_context_types: Vec<String>,

    /// Compiler program.
    ///
    /// Default: `cargo`
    pub compiler: String,

    /// Operating system binaries are built for.
    ///
    /// Default: the host OS
    pub target_os: String,

    /// Extra dependencies copied into every generated manifest.
    pub dependencies: toml::Table,

    /// Harness timeout for cancelable conventions, in seconds.
    ///
    /// Default: 5
    pub harness_timeout_secs: u64,
}

impl Default for TasksmithConfig {
    fn default() -> Self {
        Self {
            build_tag: "tasksmith".to_string(),
            cmd_dir: PathBuf::from(WORK_DIR_NAME).join("cmd"),
            bin_dir: None,
            custom_context_types: vec!["TaskContext".to_string()],
            compiler: "cargo".to_string(),
            target_os: std::env::consts::OS.to_string(),
            dependencies: toml::Table::new(),
            harness_timeout_secs: 5,
        }
    }
}

impl TasksmithConfig {
    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the text is not valid TOML, has unknown
    /// keys, or fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `Tasksmith.toml` from `dir` and applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        let config = if path.is_file() {
            debug!(path = %path.display(), "loading configuration");
            let text = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
            Self::from_toml_str(&text)?
        } else {
            Self::default()
        };

        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Applies environment overrides read through `lookup`.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(bin) = lookup(BIN_DIR_ENV).filter(|v| !v.is_empty()) {
            self.bin_dir = Some(PathBuf::from(bin));
        }
        if let Some(compiler) = lookup(COMPILER_ENV).filter(|v| !v.is_empty()) {
            self.compiler = compiler;
        }
        self
    }

    /// Validates field values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the build tag is not an identifier,
    /// the compiler is empty, or the intermediate directory is absolute.
    pub fn validate(&self) -> Result<()> {
        let tag_ok = self
            .build_tag
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && self
                .build_tag
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !tag_ok {
            return Err(Error::Config {
                message: format!("build_tag '{}' is not an identifier", self.build_tag),
            });
        }
        if self.compiler.trim().is_empty() {
            return Err(Error::Config {
                message: "compiler cannot be empty".to_string(),
            });
        }
        if self.cmd_dir.is_absolute() {
            return Err(Error::Config {
                message: format!(
                    "cmd_dir must be relative to the package, got {}",
                    self.cmd_dir.display()
                ),
            });
        }
        Ok(())
    }

    /// Resolves the binary output directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no directory is configured and no home
    /// directory can be determined.
    pub fn resolve_bin_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.bin_dir {
            return Ok(dir.clone());
        }
        if let Some(cargo_home) = std::env::var_os("CARGO_HOME") {
            return Ok(PathBuf::from(cargo_home).join("bin"));
        }
        dirs::home_dir()
            .map(|home| home.join(".cargo").join("bin"))
            .ok_or_else(|| Error::Config {
                message: format!("cannot determine a binary directory; set {BIN_DIR_ENV}"),
            })
    }

    /// Discovery settings derived from this configuration.
    #[must_use]
    pub fn discovery(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            build_tag: self.build_tag.clone(),
            custom_context_types: self.custom_context_types.clone(),
            target_os: self.target_os.clone(),
        }
    }
}

/// Settings consumed by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Required file-level `cfg` tag
    pub build_tag: String,
    /// Custom context type names
    pub custom_context_types: Vec<String>,
    /// Target operating system
    pub target_os: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        TasksmithConfig::default().discovery()
    }
}

impl DiscoveryConfig {
    /// Returns `true` if `name` is a configured custom context type.
    #[must_use]
    pub fn is_custom_context(&self, name: &str) -> bool {
        self.custom_context_types.iter().any(|t| t == name)
    }

    /// Suffix appended to binary names for the target OS.
    #[must_use]
    pub fn exe_suffix(&self) -> &'static str {
        if self.target_os == "windows" {
            ".exe"
        } else {
            ""
        }
    }
}
