//! Output formatters for CLI commands.
//!
//! Every command serializes its result once and picks a presentation here:
//! indented JSON, flat `key: value` lines for scripts, or a colored tree.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use tasksmith_core::cli::OutputFormat;

/// Format data according to the specified output format.
///
/// # Errors
///
/// Returns an error if the data cannot be serialized.
///
/// # Examples
///
/// ```
/// use serde::Serialize;
/// use tasksmith_cli::formatters::format_output;
/// use tasksmith_core::cli::OutputFormat;
///
/// #[derive(Serialize)]
/// struct Built {
///     binary: String,
///     files: usize,
/// }
///
/// let built = Built { binary: "ops".to_string(), files: 4 };
/// let output = format_output(&built, OutputFormat::Text)?;
/// assert_eq!(output, "binary: ops\nfiles: 4");
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn format_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json::format(data),
        OutputFormat::Text => text::format(data),
        OutputFormat::Pretty => pretty::format(data),
    }
}

/// JSON output formatting.
pub mod json {
    use super::{Result, Serialize};

    /// Format data as indented JSON.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }
}

/// Plain text output formatting.
pub mod text {
    use super::{Result, Serialize, Value};

    /// Format data as one `path: value` line per scalar.
    ///
    /// Nested keys are joined with `.`, array items use their index.
    /// Empty containers print as `[]` or `{}`.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        let value = serde_json::to_value(data)?;
        let mut lines = Vec::new();
        flatten("", &value, &mut lines);
        Ok(lines.join("\n"))
    }

    fn join(prefix: &str, key: &str) -> String {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        }
    }

    fn flatten(prefix: &str, value: &Value, lines: &mut Vec<String>) {
        match value {
            Value::Object(map) if !map.is_empty() => {
                for (key, item) in map {
                    flatten(&join(prefix, key), item, lines);
                }
            }
            Value::Array(items) if !items.is_empty() => {
                for (index, item) in items.iter().enumerate() {
                    flatten(&join(prefix, &index.to_string()), item, lines);
                }
            }
            other => {
                let scalar = match other {
                    Value::String(s) => s.clone(),
                    Value::Object(_) => "{}".to_string(),
                    Value::Array(_) => "[]".to_string(),
                    v => v.to_string(),
                };
                if prefix.is_empty() {
                    lines.push(scalar);
                } else {
                    lines.push(format!("{prefix}: {scalar}"));
                }
            }
        }
    }
}

/// Pretty (human-readable) output formatting.
pub mod pretty {
    use super::{Colorize, Result, Serialize, Value};

    /// Format data as a colored, indented tree.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        let value = serde_json::to_value(data)?;
        let mut out = String::new();
        render(&value, 0, &mut out);
        Ok(out.trim_end().to_string())
    }

    fn scalar(value: &Value) -> String {
        match value {
            Value::Null => "-".dimmed().to_string(),
            Value::Bool(true) => "yes".green().to_string(),
            Value::Bool(false) => "no".yellow().to_string(),
            Value::Number(n) => n.to_string().cyan().to_string(),
            Value::String(s) if s == "failed" || s == "invalid" => s.red().bold().to_string(),
            Value::String(s) => s.clone(),
            Value::Array(_) => "(none)".dimmed().to_string(),
            Value::Object(_) => "{}".dimmed().to_string(),
        }
    }

    fn is_leaf(value: &Value) -> bool {
        match value {
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => true,
        }
    }

    fn render(value: &Value, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        match value {
            Value::Object(map) if !map.is_empty() => {
                for (key, item) in map {
                    if is_leaf(item) {
                        out.push_str(&format!("{indent}{}: {}\n", key.bold(), scalar(item)));
                    } else {
                        out.push_str(&format!("{indent}{}\n", key.blue().bold()));
                        render(item, depth + 1, out);
                    }
                }
            }
            Value::Array(items) if !items.is_empty() => {
                for item in items {
                    if is_leaf(item) {
                        out.push_str(&format!("{indent}- {}\n", scalar(item)));
                    } else {
                        out.push_str(&format!("{indent}-\n"));
                        render(item, depth + 1, out);
                    }
                }
            }
            leaf => out.push_str(&format!("{indent}{}\n", scalar(leaf))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Task {
        command: String,
        flags: Vec<String>,
    }

    #[derive(Serialize)]
    struct Package {
        binary: String,
        rebuilt: bool,
        tasks: Vec<Task>,
    }

    fn package() -> Package {
        Package {
            binary: "ops".to_string(),
            rebuilt: true,
            tasks: vec![
                Task {
                    command: "deploy".to_string(),
                    flags: vec!["release".to_string()],
                },
                Task {
                    command: "lint".to_string(),
                    flags: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn test_json_format() {
        let output = json::format(&package()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["tasks"][0]["command"], "deploy");
        assert!(output.contains('\n'));
    }

    #[test]
    fn test_text_format_flattens_paths() {
        let output = text::format(&package()).unwrap();
        assert_eq!(
            output,
            "binary: ops\n\
             rebuilt: true\n\
             tasks.0.command: deploy\n\
             tasks.0.flags.0: release\n\
             tasks.1.command: lint\n\
             tasks.1.flags: []"
        );
    }

    #[test]
    fn test_text_format_scalar_root() {
        assert_eq!(text::format(&"done").unwrap(), "done");
    }

    #[test]
    fn test_pretty_format() {
        colored::control::set_override(false);
        let output = pretty::format(&package()).unwrap();
        assert!(output.starts_with("binary: ops\nrebuilt: yes\ntasks\n"));
        assert!(output.contains("  -\n    command: deploy\n    flags\n      - release"));
        assert!(output.contains("    flags: (none)"));
    }

    #[test]
    fn test_format_output_dispatch() {
        let data = package();
        assert!(format_output(&data, OutputFormat::Json).unwrap().starts_with('{'));
        assert!(format_output(&data, OutputFormat::Text).unwrap().starts_with("binary: ops"));
        assert!(format_output(&data, OutputFormat::Pretty).unwrap().contains("deploy"));
    }
}
