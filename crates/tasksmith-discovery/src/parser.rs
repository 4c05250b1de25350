//! Directory-to-package parsing.
//!
//! A package is the set of `*.rs` files directly inside one directory that
//! opt in with the file-level attribute `#![cfg(<build_tag>)]`. Files are
//! returned sorted by name; fingerprinting and discovery both rely on that
//! order.

use proc_macro2::LineColumn;
use regex::Regex;
use std::ops::Range;
use std::path::{Path, PathBuf};
use syn::spanned::Spanned;
use tasksmith_core::{Error, Result};
use tracing::debug;
use walkdir::WalkDir;

/// One eligible, parsed source file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Path as found under the package directory
    pub path: PathBuf,
    /// File name, e.g. `deploy.rs`
    pub file_name: String,
    /// Raw file contents
    pub text: String,
    /// Parsed syntax tree
    pub ast: syn::File,
}

impl ParsedFile {
    /// Returns the source lines covered by `node`, joined with newlines.
    #[must_use]
    pub fn source_of(&self, node: &impl Spanned) -> String {
        let span = node.span();
        let (start, end) = (span.start().line, span.end().line);
        self.text
            .lines()
            .skip(start.saturating_sub(1))
            .take(end.saturating_sub(start) + 1)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns the file contents without file-level attributes and docs.
    ///
    /// Inner attributes (`#![...]`, `//!`, `/*! */`) and a shebang line are
    /// cut out by their spans; a line left blank by a cut is dropped, as are
    /// leading blank lines.
    #[must_use]
    pub fn stripped_source(&self) -> String {
        self.edited_source(false)
    }

    /// Returns [`Self::stripped_source`] with private items opened up.
    ///
    /// Top-level items, struct fields and inherent methods without a
    /// visibility become `pub(crate)`, so every file of the package can use
    /// what its siblings declare once each is embedded as its own module.
    #[must_use]
    pub fn embedded_source(&self) -> String {
        self.edited_source(true)
    }

    fn edited_source(&self, promote: bool) -> String {
        let body = self.text.strip_prefix('\u{feff}').unwrap_or(&self.text);
        let index = LineIndex::new(body);

        let mut edits: Vec<(Range<usize>, &str)> = Vec::new();
        if self.ast.shebang.is_some() {
            let end = body.find('\n').unwrap_or(body.len());
            edits.push((index.whole_lines(0..end), ""));
        }
        for attr in &self.ast.attrs {
            let span = attr.span();
            let range = index.offset(span.start())..index.offset(span.end());
            edits.push((index.whole_lines(range), ""));
        }
        if promote {
            for at in promotion_points(&self.ast.items) {
                let offset = index.offset(at);
                edits.push((offset..offset, "pub(crate) "));
            }
        }
        edits.sort_by_key(|(range, _)| (range.start, range.end));

        let mut out = String::with_capacity(body.len() + edits.len() * 12);
        let mut cursor = 0;
        for (range, replacement) in edits {
            if range.start < cursor {
                cursor = cursor.max(range.end);
                continue;
            }
            out.push_str(&body[cursor..range.start]);
            out.push_str(replacement);
            cursor = range.end;
        }
        out.push_str(&body[cursor..]);

        let mut source = out
            .lines()
            .skip_while(|line| line.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        source.push('\n');
        source
    }
}

/// Maps `proc-macro2` line/column positions onto byte offsets.
struct LineIndex<'a> {
    text: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(text: &'a str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { text, starts }
    }

    /// Lines are 1-based, columns count characters from 0.
    fn offset(&self, at: LineColumn) -> usize {
        let Some(&start) = self.starts.get(at.line.saturating_sub(1)) else {
            return self.text.len();
        };
        self.text[start..]
            .char_indices()
            .nth(at.column)
            .map_or(self.text.len(), |(i, _)| start + i)
    }

    /// Widens `range` to its full lines, newline included, when nothing
    /// else shares them.
    fn whole_lines(&self, range: Range<usize>) -> Range<usize> {
        let line_start = self.text[..range.start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = self.text[range.end..]
            .find('\n')
            .map_or(self.text.len(), |i| range.end + i + 1);
        let alone = self.text[line_start..range.start].trim().is_empty()
            && self.text[range.end..line_end].trim().is_empty();
        if alone { line_start..line_end } else { range }
    }
}

fn is_private(vis: &syn::Visibility) -> bool {
    matches!(vis, syn::Visibility::Inherited)
}

fn private_fields<'a>(
    fields: impl IntoIterator<Item = &'a syn::Field>,
    points: &mut Vec<LineColumn>,
) {
    for field in fields {
        if is_private(&field.vis) {
            let at = field
                .ident
                .as_ref()
                .map_or_else(|| field.ty.span().start(), |ident| ident.span().start());
            points.push(at);
        }
    }
}

/// Positions where `pub(crate) ` turns a private declaration crate-visible.
fn promotion_points(items: &[syn::Item]) -> Vec<LineColumn> {
    let mut points = Vec::new();
    for item in items {
        match item {
            syn::Item::Fn(i) if is_private(&i.vis) => points.push(i.sig.span().start()),
            syn::Item::Const(i) if is_private(&i.vis) => points.push(i.const_token.span.start()),
            syn::Item::Static(i) if is_private(&i.vis) => {
                points.push(i.static_token.span.start());
            }
            syn::Item::Type(i) if is_private(&i.vis) => points.push(i.type_token.span.start()),
            syn::Item::Enum(i) if is_private(&i.vis) => points.push(i.enum_token.span.start()),
            syn::Item::Trait(i) if is_private(&i.vis) => {
                let at = i.unsafety.map_or(i.trait_token.span, |u| u.span);
                points.push(at.start());
            }
            syn::Item::Struct(i) => {
                if is_private(&i.vis) {
                    points.push(i.struct_token.span.start());
                }
                private_fields(&i.fields, &mut points);
            }
            syn::Item::Union(i) => {
                if is_private(&i.vis) {
                    points.push(i.union_token.span.start());
                }
                private_fields(&i.fields.named, &mut points);
            }
            syn::Item::Impl(i) if i.trait_.is_none() => {
                for impl_item in &i.items {
                    match impl_item {
                        syn::ImplItem::Fn(f) if is_private(&f.vis) && f.defaultness.is_none() => {
                            points.push(f.sig.span().start());
                        }
                        syn::ImplItem::Const(c) if is_private(&c.vis) && c.defaultness.is_none() => {
                            points.push(c.const_token.span.start());
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    points
}

/// All eligible files of one directory.
#[derive(Debug, Clone)]
pub struct ParsedPackage {
    /// Package name derived from the directory
    pub name: String,
    /// Package directory
    pub dir: PathBuf,
    /// Parsed files, sorted by name
    pub files: Vec<ParsedFile>,
}

/// Derives the package name from a directory.
///
/// The directory name is lower-cased and every character that is not
/// alphanumeric or `_` is dropped. Names that would start with a digit
/// are prefixed with `tasks_`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use tasksmith_discovery::parser::package_name;
///
/// assert_eq!(package_name(Path::new("/work/Deploy-Tools")), "deploytools");
/// assert_eq!(package_name(Path::new("/work/2fa")), "tasks_2fa");
/// ```
#[must_use]
pub fn package_name(dir: &Path) -> String {
    let base = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .or_else(|| {
            dir.canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
        .unwrap_or_default();

    let name: String = base
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    match name.chars().next() {
        None => "tasks".to_string(),
        Some(c) if c.is_ascii_digit() => format!("tasks_{name}"),
        Some(_) => name,
    }
}

fn build_tag_pattern(build_tag: &str) -> Result<Regex> {
    Regex::new(&format!(
        r"(?m)^\s*#!\[\s*cfg\s*\(\s*{}\s*\)\s*\]",
        regex::escape(build_tag)
    ))
    .map_err(|e| Error::Config {
        message: format!("invalid build tag '{build_tag}': {e}"),
    })
}

/// Lists eligible files directly inside `dir`, sorted by file name.
///
/// # Errors
///
/// Returns [`Error::Io`] if the directory or a candidate file cannot be read.
pub fn eligible_files(dir: &Path, build_tag: &str) -> Result<Vec<PathBuf>> {
    Ok(scan(dir, build_tag)?
        .into_iter()
        .map(|(path, _)| path)
        .collect())
}

fn scan(dir: &Path, build_tag: &str) -> Result<Vec<(PathBuf, String)>> {
    let pattern = build_tag_pattern(build_tag)?;
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            Error::io(path, e.into())
        })?;
        let path = entry.path();
        let is_source = entry.file_type().is_file()
            && path.extension().is_some_and(|ext| ext == "rs")
            && !entry.file_name().to_string_lossy().starts_with('.');
        if !is_source {
            continue;
        }

        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        if pattern.is_match(&text) {
            files.push((path.to_path_buf(), text));
        } else {
            debug!(path = %path.display(), build_tag, "skipping untagged file");
        }
    }

    Ok(files)
}

/// Parses the package in `dir`.
///
/// Returns `Ok(None)` when the directory holds no eligible file.
///
/// # Errors
///
/// Returns [`Error::Io`] on read failures and [`Error::Parse`] when an
/// eligible file is not valid Rust.
pub fn parse_package(dir: &Path, build_tag: &str) -> Result<Option<ParsedPackage>> {
    let sources = scan(dir, build_tag)?;
    if sources.is_empty() {
        return Ok(None);
    }

    let files = sources
        .into_iter()
        .map(|(path, text)| {
            let ast = syn::parse_file(&text).map_err(|e| Error::Parse {
                path: path.clone(),
                message: format!(
                    "{e} (line {}, column {})",
                    e.span().start().line,
                    e.span().start().column
                ),
            })?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(ParsedFile {
                path,
                file_name,
                text,
                ast,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(ParsedPackage {
        name: package_name(dir),
        dir: dir.to_path_buf(),
        files,
    }))
}
