//! Tasksmith CLI library.
//!
//! Exposes the argument definitions, commands and formatters behind the
//! `tasksmith` binary so they can be tested without spawning it.

#![allow(clippy::format_push_string)]
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod commands;
pub mod formatters;
pub mod runner;

pub use cli::{Cli, Commands};
