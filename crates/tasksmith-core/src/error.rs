//! Error types for tasksmith.
//!
//! A single error hierarchy is shared by discovery, generation, and the
//! build pipeline. Each variant carries the context needed to report the
//! failure to a user: the function, marker, directory, or file involved.
//!
//! Errors are either *soft* (the offending item is skipped and the package
//! continues) or *hard* (the enclosing package or directory is aborted).
//!
//! # Examples
//!
//! ```
//! use tasksmith_core::{Error, Result};
//!
//! fn check_tag(tag: &str) -> Result<()> {
//!     if tag.is_empty() {
//!         return Err(Error::Config {
//!             message: "build tag cannot be empty".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//!
//! let err = check_tag("").unwrap_err();
//! assert!(err.is_config_error());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tasksmith.
///
/// All library crates return this type, providing consistent error handling
/// across the workspace.
#[derive(Error, Debug)]
pub enum Error {
    /// Function signature is outside the closed shape set.
    ///
    /// This is a soft error: the function is skipped and the rest of the
    /// package is still processed.
    #[error("unsupported signature for '{function}': {reason}")]
    UnsupportedSignature {
        /// Name of the function that could not be classified
        function: String,
        /// Why the signature was rejected
        reason: String,
    },

    /// Doc-comment marker is malformed or misses a required key.
    ///
    /// Aborts generation for the enclosing package.
    #[error("invalid marker '@{marker}' at {location}: {reason}")]
    InvalidMarker {
        /// Marker name without the leading `@`
        marker: String,
        /// Where the marker was found (`file::function` or `file`)
        location: String,
        /// Description of the problem
        reason: String,
    },

    /// More than one function in a package is marked `@default`.
    #[error("package '{package}' has more than one default: '{first}' and '{second}'")]
    DuplicateDefault {
        /// Package name
        package: String,
        /// First function marked as default
        first: String,
        /// Second function marked as default
        second: String,
    },

    /// Filesystem failure while reading sources or writing artifacts.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Source file could not be parsed.
    #[error("failed to parse {}: {message}", path.display())]
    Parse {
        /// File that failed to parse
        path: PathBuf,
        /// Parser diagnostic
        message: String,
    },

    /// External compiler exited unsuccessfully.
    ///
    /// The combined compiler output is kept verbatim for display.
    #[error("compilation failed in {} (exit code {}):\n{output}", dir.display(), code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    Compile {
        /// Package directory being built
        dir: PathBuf,
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
        /// Combined stdout and stderr of the compiler
        output: String,
    },

    /// Template registration or rendering failed.
    #[error("template error: {message}")]
    Template {
        /// Description of the template failure
        message: String,
    },

    /// Configuration is invalid or could not be loaded.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Wraps a cause with the directory it occurred in.
    #[error("{}: {source}", dir.display())]
    Directory {
        /// Directory that failed
        dir: PathBuf,
        /// Underlying cause
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Creates an I/O error bound to `path`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tasksmith_core::Error;
    ///
    /// let err = Error::io("/tmp/missing.rs", std::io::ErrorKind::NotFound.into());
    /// assert!(err.is_io_error());
    /// ```
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attaches the offending directory to this error.
    ///
    /// Errors that already carry a directory are returned unchanged.
    #[must_use]
    pub fn in_dir(self, dir: impl Into<PathBuf>) -> Self {
        match self {
            Self::Directory { .. } => self,
            other => Self::Directory {
                dir: dir.into(),
                source: Box::new(other),
            },
        }
    }

    /// Returns the innermost error, unwrapping directory context.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Directory { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns `true` if the caller should skip the item and continue.
    ///
    /// # Examples
    ///
    /// ```
    /// use tasksmith_core::Error;
    ///
    /// let err = Error::UnsupportedSignature {
    ///     function: "greet".to_string(),
    ///     reason: "two string parameters".to_string(),
    /// };
    /// assert!(err.is_soft());
    /// ```
    #[must_use]
    pub const fn is_soft(&self) -> bool {
        matches!(self, Self::UnsupportedSignature { .. })
    }

    /// Returns `true` if this is an unsupported signature error.
    #[must_use]
    pub fn is_unsupported_signature(&self) -> bool {
        matches!(self.root_cause(), Self::UnsupportedSignature { .. })
    }

    /// Returns `true` if this is an invalid marker error.
    ///
    /// # Examples
    ///
    /// ```
    /// use tasksmith_core::Error;
    ///
    /// let err = Error::InvalidMarker {
    ///     marker: "flag".to_string(),
    ///     location: "tasks.rs::build".to_string(),
    ///     reason: "missing required key 'name'".to_string(),
    /// };
    /// assert!(err.is_invalid_marker());
    /// ```
    #[must_use]
    pub fn is_invalid_marker(&self) -> bool {
        matches!(self.root_cause(), Self::InvalidMarker { .. })
    }

    /// Returns `true` if this is a duplicate default error.
    #[must_use]
    pub fn is_duplicate_default(&self) -> bool {
        matches!(self.root_cause(), Self::DuplicateDefault { .. })
    }

    /// Returns `true` if this is an I/O error.
    #[must_use]
    pub fn is_io_error(&self) -> bool {
        matches!(self.root_cause(), Self::Io { .. })
    }

    /// Returns `true` if this is a compilation error.
    ///
    /// # Examples
    ///
    /// ```
    /// use tasksmith_core::Error;
    ///
    /// let err = Error::Compile {
    ///     dir: "tasks".into(),
    ///     code: Some(101),
    ///     output: "error[E0425]".to_string(),
    /// };
    /// assert!(err.is_compile_error());
    /// assert!(err.in_dir("tasks").is_compile_error());
    /// ```
    #[must_use]
    pub fn is_compile_error(&self) -> bool {
        matches!(self.root_cause(), Self::Compile { .. })
    }

    /// Returns `true` if this is a parse error.
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        matches!(self.root_cause(), Self::Parse { .. })
    }

    /// Returns `true` if this is a template error.
    #[must_use]
    pub fn is_template_error(&self) -> bool {
        matches!(self.root_cause(), Self::Template { .. })
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self.root_cause(), Self::Config { .. })
    }
}

/// Result type alias for tasksmith operations.
///
/// # Examples
///
/// ```
/// use tasksmith_core::{Error, Result};
///
/// fn validate(value: i32) -> Result<i32> {
///     if value < 0 {
///         return Err(Error::Config {
///             message: "value must be non-negative".to_string(),
///         });
///     }
///     Ok(value)
/// }
///
/// assert!(validate(5).is_ok());
/// assert!(validate(-1).is_err());
/// ```
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_signature_is_soft() {
        let err = Error::UnsupportedSignature {
            function: "f".to_string(),
            reason: "two strings".to_string(),
        };
        assert!(err.is_soft());
        assert!(err.is_unsupported_signature());
        assert!(!err.is_invalid_marker());
    }

    #[test]
    fn test_hard_errors_are_not_soft() {
        let err = Error::DuplicateDefault {
            package: "tasks".to_string(),
            first: "a".to_string(),
            second: "b".to_string(),
        };
        assert!(!err.is_soft());
        assert!(err.is_duplicate_default());
    }

    #[test]
    fn test_in_dir_wraps_once() {
        let err = Error::Config {
            message: "bad".to_string(),
        }
        .in_dir("root")
        .in_dir("other");

        match &err {
            Error::Directory { dir, .. } => assert_eq!(dir, &PathBuf::from("root")),
            other => panic!("expected directory error, got {other:?}"),
        }
        assert!(err.is_config_error());
    }

    #[test]
    fn test_directory_display_includes_path_and_cause() {
        let err = Error::io("a/b.rs", std::io::ErrorKind::NotFound.into()).in_dir("pkg");
        let display = err.to_string();
        assert!(display.starts_with("pkg: "));
        assert!(display.contains("a/b.rs"));
    }

    #[test]
    fn test_compile_display_keeps_output() {
        let err = Error::Compile {
            dir: PathBuf::from("sub"),
            code: None,
            output: "linker failed".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("exit code none"));
        assert!(display.contains("linker failed"));
    }

    #[test]
    fn test_result_alias() {
        #[allow(clippy::unnecessary_wraps)]
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        assert_eq!(returns_ok().unwrap(), 42);
    }
}
