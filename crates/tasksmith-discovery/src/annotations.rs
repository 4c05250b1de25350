//! Doc-comment marker parsing.
//!
//! Markers occupy a whole doc line and take the form
//!
//! ```text
//! /// @default
//! /// @flag(name => timeout, type => duration, env => DEPLOY_TIMEOUT, desc => how long to wait)
//! /// @binaryName(name => ops)
//! ```
//!
//! Inside the parentheses a comma only starts a new pair when the text
//! after it contains `=>`, so values may themselves contain commas.

use regex::Regex;
use std::sync::LazyLock;
use tasksmith_core::{Error, FlagKind, FlagSpec, Result};
use tracing::debug;

static MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@([A-Za-z][A-Za-z0-9_]*)\s*(?:\((.*)\))?\s*$").expect("valid regex")
});
static OPEN_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([A-Za-z][A-Za-z0-9_]*)\s*\(").expect("valid regex"));

/// One parsed marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Marker name without `@`
    pub name: String,
    /// Key/value pairs in declaration order
    pub args: Vec<(String, String)>,
}

impl Marker {
    /// Returns the first value stored under `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tasksmith_discovery::annotations::parse_markers;
    ///
    /// let markers = parse_markers("@flag(name => timeout)", "tasks.rs").unwrap();
    /// assert_eq!(markers[0].get("name"), Some("timeout"));
    /// ```
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Annotations resolved for one function or file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    /// Marked `@default`
    pub default: bool,
    /// Declared flags
    pub flags: Vec<FlagSpec>,
    /// `@binaryName` value, if any
    pub binary_name: Option<String>,
}

/// Collects the text of `#[doc = "..."]` attributes.
///
/// One leading space is removed from every line, matching how `///` is
/// written.
#[must_use]
pub fn doc_text(attrs: &[syn::Attribute]) -> String {
    let mut lines = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }
        if let syn::Meta::NameValue(nv) = &attr.meta
            && let syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(s),
                ..
            }) = &nv.value
        {
            for line in s.value().split('\n') {
                lines.push(line.strip_prefix(' ').unwrap_or(line).to_string());
            }
        }
    }
    lines.join("\n")
}

fn parse_args(name: &str, body: &str, location: &str) -> Result<Vec<(String, String)>> {
    let invalid = |reason: String| Error::InvalidMarker {
        marker: name.to_string(),
        location: location.to_string(),
        reason,
    };

    let mut args: Vec<(String, String)> = Vec::new();
    for fragment in body.split(',') {
        if let Some((key, value)) = fragment.split_once("=>") {
            let key = key.trim();
            if key.is_empty() {
                return Err(invalid("empty key before '=>'".to_string()));
            }
            args.push((key.to_string(), value.trim().to_string()));
        } else if let Some((_, value)) = args.last_mut() {
            value.push(',');
            value.push_str(fragment.trim_end());
        } else if !fragment.trim().is_empty() {
            return Err(invalid(format!(
                "expected 'key => value', found '{}'",
                fragment.trim()
            )));
        }
    }
    Ok(args)
}

/// Parses every marker line in `doc`.
///
/// # Errors
///
/// Returns [`Error::InvalidMarker`] for unterminated argument lists and for
/// fragments that are not `key => value` pairs.
pub fn parse_markers(doc: &str, location: &str) -> Result<Vec<Marker>> {
    let mut markers = Vec::new();
    for line in doc.lines().map(str::trim) {
        if !line.starts_with('@') {
            continue;
        }
        if let Some(caps) = MARKER_REGEX.captures(line) {
            let name = caps[1].to_string();
            let args = match caps.get(2) {
                Some(body) => parse_args(&name, body.as_str(), location)?,
                None => Vec::new(),
            };
            markers.push(Marker { name, args });
        } else if let Some(caps) = OPEN_MARKER_REGEX.captures(line) {
            return Err(Error::InvalidMarker {
                marker: caps[1].to_string(),
                location: location.to_string(),
                reason: "unterminated argument list".to_string(),
            });
        }
    }
    Ok(markers)
}

/// Removes marker lines from `doc` and trims surrounding blank lines.
#[must_use]
pub fn strip_markers(doc: &str) -> String {
    doc.lines()
        .filter(|line| !MARKER_REGEX.is_match(line.trim()))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn required<'a>(marker: &'a Marker, key: &str, location: &str) -> Result<&'a str> {
    marker
        .get(key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::InvalidMarker {
            marker: marker.name.clone(),
            location: location.to_string(),
            reason: format!("missing required key '{key}'"),
        })
}

/// Resolves markers into [`Annotations`].
///
/// # Errors
///
/// Returns [`Error::InvalidMarker`] when `@flag` or `@binaryName` misses its
/// `name`, or when a flag declares an unknown type.
///
/// # Examples
///
/// ```
/// use tasksmith_discovery::annotations::{parse_markers, resolve};
///
/// let markers = parse_markers("@default\n@flag(name => verbose, type => bool)", "a.rs").unwrap();
/// let annotations = resolve(&markers, "a.rs").unwrap();
/// assert!(annotations.default);
/// assert_eq!(annotations.flags[0].name, "verbose");
///
/// let markers = parse_markers("@flag()", "a.rs").unwrap();
/// assert!(resolve(&markers, "a.rs").unwrap_err().is_invalid_marker());
/// ```
pub fn resolve(markers: &[Marker], location: &str) -> Result<Annotations> {
    let mut annotations = Annotations::default();

    for marker in markers {
        match marker.name.as_str() {
            "default" => annotations.default = true,
            "flag" => {
                let name = required(marker, "name", location)?;
                let kind = match marker.get("type") {
                    None => FlagKind::String,
                    Some(kind) => FlagKind::parse(kind).ok_or_else(|| Error::InvalidMarker {
                        marker: marker.name.clone(),
                        location: location.to_string(),
                        reason: format!("unknown flag type '{kind}'"),
                    })?,
                };
                annotations.flags.push(FlagSpec {
                    name: name.to_string(),
                    env: marker.get("env").map(str::to_string),
                    kind,
                    description: marker.get("desc").map(str::to_string),
                });
            }
            "binaryName" => {
                let name = required(marker, "name", location)?;
                if annotations.binary_name.is_none() {
                    annotations.binary_name = Some(name.to_string());
                }
            }
            other => debug!(marker = other, location, "ignoring unknown marker"),
        }
    }

    Ok(annotations)
}
