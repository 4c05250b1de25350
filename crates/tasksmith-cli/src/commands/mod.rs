//! Command implementations for the tasksmith CLI.
//!
//! Each command loads the project, performs its operation and formats
//! output according to the requested format.

pub mod add;
pub mod build;
pub mod common;
pub mod completions;
pub mod list;
pub mod run;
