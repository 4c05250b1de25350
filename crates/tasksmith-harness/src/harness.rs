//! Synthetic invocation of classified task functions.

use crate::callable::{BoxError, Callable, CallResult, JsonMap, Token};
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::io::Cursor;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;
use tasksmith_core::{ArgumentShape, FunctionRecord, TasksmithConfig};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// String handed to string-shaped functions.
pub const SAMPLE_STRING: &str = "Rock";

/// JSON document decoded for map, struct and imported shapes, and fed to
/// readers as raw bytes.
pub const SAMPLE_DOCUMENT: &str = r#"{"name":"Rock"}"#;

/// Outcome of checking one function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarnessReport {
    /// Function name
    pub name: String,
    /// Shape the record was classified with
    pub shape: ArgumentShape,
    /// Whether the call matched its contract
    pub passed: bool,
    /// What happened
    pub message: String,
}

impl HarnessReport {
    fn pass(record: &FunctionRecord, message: impl Into<String>) -> Self {
        Self {
            name: record.name.clone(),
            shape: record.signature.argument,
            passed: true,
            message: message.into(),
        }
    }

    fn fail(record: &FunctionRecord, message: impl Into<String>) -> Self {
        Self {
            passed: false,
            ..Self::pass(record, message)
        }
    }
}

impl fmt::Display for HarnessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed { "ok" } else { "FAILED" };
        write!(f, "{} ({}): {status}: {}", self.name, self.shape, self.message)
    }
}

/// Cancels a token once the timeout elapses unless dropped first.
///
/// Dropping the deadline stops and joins the timer thread.
struct Deadline {
    stop: Option<Sender<()>>,
    timer: Option<JoinHandle<()>>,
}

impl Deadline {
    fn start(token: CancellationToken, timeout: Duration) -> Self {
        let (stop, rx) = mpsc::channel::<()>();
        let timer = std::thread::spawn(move || {
            if rx.recv_timeout(timeout) == Err(RecvTimeoutError::Timeout) {
                token.cancel();
            }
        });
        Self {
            stop: Some(stop),
            timer: Some(timer),
        }
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.stop.take();
        if let Some(timer) = self.timer.take() {
            let _ = timer.join();
        }
    }
}

/// Invokes callables with inputs matching their classified shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Harness {
    timeout: Duration,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT)
    }
}

impl Harness {
    /// Timeout applied to context-taking functions unless configured.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a harness cancelling context-taking calls after `timeout`.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Creates a harness using `harness_timeout_secs` from the config.
    #[must_use]
    pub const fn from_config(config: &TasksmithConfig) -> Self {
        Self::new(Duration::from_secs(config.harness_timeout_secs))
    }

    /// Timeout applied to context-taking functions.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Calls `callable` with synthetic input and reports whether it honoured
    /// the contract of `record`.
    ///
    /// A callable whose variant disagrees with the record's shape fails
    /// without being called. Errors and panics raised by the call become
    /// failed reports.
    ///
    /// # Examples
    ///
    /// ```
    /// use tasksmith_core::{ArgumentShape, ContextConvention, FunctionRecord, ReturnShape, Signature};
    /// use tasksmith_harness::{Callable, Harness};
    ///
    /// let record = FunctionRecord::new(
    ///     "tasks",
    ///     "greet",
    ///     Signature {
    ///         argument: ArgumentShape::String,
    ///         context: ContextConvention::None,
    ///         returns: ReturnShape::None,
    ///     },
    /// );
    /// let callable = Callable::String(Box::new(|_, name| {
    ///     assert_eq!(name, "Rock");
    ///     Ok(())
    /// }));
    ///
    /// let report = Harness::default().check(&record, &callable);
    /// assert!(report.passed, "{report}");
    /// ```
    #[must_use]
    pub fn check(&self, record: &FunctionRecord, callable: &Callable) -> HarnessReport {
        let expected = record.signature.argument;
        if callable.shape() != expected {
            warn!(
                function = %record.name,
                expected = %expected,
                actual = %callable.shape(),
                "callable does not match classified shape"
            );
            return HarnessReport::fail(
                record,
                format!("expected a {expected} callable, got {}", callable.shape()),
            );
        }

        let token = record
            .signature
            .context
            .is_cancelable()
            .then(CancellationToken::new);
        let _deadline = token
            .clone()
            .map(|token| Deadline::start(token, self.timeout));

        let mut sink = Vec::new();
        let outcome = catch_unwind(AssertUnwindSafe(|| invoke(callable, token, &mut sink)));

        let report = match outcome {
            Err(payload) => HarnessReport::fail(record, format!("panicked: {}", panic_message(&*payload))),
            Ok(Err(e)) => HarnessReport::fail(record, format!("returned error: {e}")),
            Ok(Ok(())) if expected.takes_writer() && sink.is_empty() => {
                HarnessReport::fail(record, "wrote nothing to the writer")
            }
            Ok(Ok(())) if expected.takes_writer() => {
                HarnessReport::pass(record, format!("wrote {} bytes", sink.len()))
            }
            Ok(Ok(())) => HarnessReport::pass(record, "completed"),
        };

        if report.passed {
            debug!(function = %record.name, shape = %expected, "harness check passed");
        } else {
            warn!(function = %record.name, shape = %expected, message = %report.message, "harness check failed");
        }
        report
    }

    /// Checks each record against its callable, in order.
    #[must_use]
    pub fn check_all<'a, I>(&self, pairs: I) -> Vec<HarnessReport>
    where
        I: IntoIterator<Item = (&'a FunctionRecord, &'a Callable)>,
    {
        pairs
            .into_iter()
            .map(|(record, callable)| self.check(record, callable))
            .collect()
    }
}

fn sample_value() -> Result<Value, BoxError> {
    Ok(serde_json::from_str(SAMPLE_DOCUMENT)?)
}

fn sample_map() -> Result<JsonMap, BoxError> {
    Ok(serde_json::from_str(SAMPLE_DOCUMENT)?)
}

fn sample_reader() -> Cursor<&'static [u8]> {
    Cursor::new(SAMPLE_DOCUMENT.as_bytes())
}

fn invoke(callable: &Callable, token: Token, sink: &mut Vec<u8>) -> CallResult {
    match callable {
        Callable::NoArgument(f) => f(token),
        Callable::String(f) => f(token, SAMPLE_STRING.to_string()),
        Callable::Map(f) => f(token, sample_map()?),
        Callable::Struct(f) | Callable::StructPointer(f) | Callable::Imported(f) => {
            f(token, sample_value()?)
        }
        Callable::Reader(f) => f(token, &mut sample_reader()),
        Callable::Writer(f) => f(token, sink),
        Callable::StringWithWriter(f) => f(token, SAMPLE_STRING.to_string(), sink),
        Callable::MapWithWriter(f) => f(token, sample_map()?, sink),
        Callable::StructWithWriter(f) | Callable::ImportedWithWriter(f) => {
            f(token, sample_value()?, sink)
        }
        Callable::ReaderWithWriter(f) => f(token, &mut sample_reader(), sink),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use tasksmith_core::{ContextConvention, ReturnShape, Signature};

    fn record(argument: ArgumentShape, context: ContextConvention) -> FunctionRecord {
        FunctionRecord::new(
            "tasks",
            "sample",
            Signature {
                argument,
                context,
                returns: ReturnShape::Error,
            },
        )
    }

    #[test]
    fn test_reader_with_writer_echoes_document() {
        let callable = Callable::ReaderWithWriter(Box::new(|_, reader, writer| {
            let mut text = String::new();
            reader.read_to_string(&mut text)?;
            writer.write_all(text.as_bytes())?;
            Ok(())
        }));

        let report = Harness::default().check(
            &record(ArgumentShape::ReaderWithWriter, ContextConvention::None),
            &callable,
        );
        assert!(report.passed, "{report}");
        assert_eq!(report.message, format!("wrote {} bytes", SAMPLE_DOCUMENT.len()));
    }

    #[test]
    fn test_map_input_is_decoded() {
        let callable = Callable::Map(Box::new(|_, map| {
            if map.get("name").and_then(Value::as_str) == Some("Rock") {
                Ok(())
            } else {
                Err("missing name".into())
            }
        }));
        let report =
            Harness::default().check(&record(ArgumentShape::Map, ContextConvention::None), &callable);
        assert!(report.passed, "{report}");
    }

    #[test]
    fn test_context_only_for_cancelable_conventions() {
        let without = Callable::NoArgument(Box::new(|token| {
            assert!(token.is_none());
            Ok(())
        }));
        let with = Callable::NoArgument(Box::new(|token| {
            assert!(token.is_some_and(|t| !t.is_cancelled()));
            Ok(())
        }));

        let harness = Harness::default();
        assert!(harness.check(&record(ArgumentShape::NoArgument, ContextConvention::None), &without).passed);
        assert!(harness.check(&record(ArgumentShape::NoArgument, ContextConvention::Standard), &with).passed);
        assert!(harness.check(&record(ArgumentShape::NoArgument, ContextConvention::Custom), &with).passed);
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(&*payload), "static message");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(&*payload), "owned message");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(&*payload), "non-string panic payload");
    }

    #[test]
    fn test_from_config_uses_timeout() {
        let config = TasksmithConfig {
            harness_timeout_secs: 2,
            ..TasksmithConfig::default()
        };
        assert_eq!(Harness::from_config(&config).timeout(), Duration::from_secs(2));
        assert_eq!(Harness::default().timeout(), Harness::DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_writer_flush_counts_bytes() {
        let callable = Callable::Writer(Box::new(|_, writer| {
            writer.write_all(b"ok")?;
            writer.flush()?;
            Ok(())
        }));
        let report =
            Harness::default().check(&record(ArgumentShape::Writer, ContextConvention::None), &callable);
        assert_eq!(report.message, "wrote 2 bytes");
    }
}
