//! Invocation harness for classified task functions.
//!
//! Pairs a [`FunctionRecord`](tasksmith_core::FunctionRecord) with a live
//! [`Callable`] of the same shape and calls it with fixed synthetic input,
//! so a classification can be checked against the function it describes.
//!
//! # Examples
//!
//! ```
//! use tasksmith_core::{ArgumentShape, ContextConvention, FunctionRecord, ReturnShape, Signature};
//! use tasksmith_harness::{Callable, Harness};
//!
//! let record = FunctionRecord::new(
//!     "tasks",
//!     "hello",
//!     Signature {
//!         argument: ArgumentShape::Writer,
//!         context: ContextConvention::None,
//!         returns: ReturnShape::Error,
//!     },
//! );
//! let callable = Callable::Writer(Box::new(|_, out| {
//!     writeln!(out, "hello")?;
//!     Ok(())
//! }));
//!
//! assert!(Harness::default().check(&record, &callable).passed);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod callable;
pub mod harness;

pub use callable::{BoxError, CallResult, Callable, JsonMap, Token};
pub use harness::{Harness, HarnessReport, SAMPLE_DOCUMENT, SAMPLE_STRING};
