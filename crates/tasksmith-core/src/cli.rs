//! Output selection and process exit status for the `tasksmith` binary.
//!
//! # Examples
//!
//! ```
//! use tasksmith_core::cli::{ExitCode, OutputFormat};
//!
//! let format: OutputFormat = "json".parse().unwrap();
//! assert_eq!(format, OutputFormat::Json);
//! assert_eq!(ExitCode::BUILD_FAILED.as_i32(), 3);
//! ```

use std::str::FromStr;

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Indented JSON
    Json,
    /// Flat `path: value` lines
    Text,
    /// Colored tree
    Pretty,
}

impl OutputFormat {
    /// Name accepted by `--format`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
            Self::Pretty => "pretty",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Json, Self::Text, Self::Pretty]
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::Error::Config {
                message: format!("unknown output format '{s}', expected json, text or pretty"),
            })
    }
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Everything succeeded.
    pub const SUCCESS: Self = Self(0);

    /// At least one sub-package failed to build.
    pub const BUILD_FAILED: Self = Self(3);

    /// Wraps a child process status.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        Self(code)
    }

    /// Value handed to [`std::process::exit`].
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}
