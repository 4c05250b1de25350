//! Function registry construction.
//!
//! Builds a [`PackageCatalog`] from a parsed package: every top-level
//! `pub fn` is classified, its markers are resolved, and the package-wide
//! invariants (single default, binary name) are enforced.

use crate::annotations::{self, Annotations};
use crate::classifier::classify;
use crate::describe::{TypeScope, describe_return, describe_type};
use crate::parser::{self, ParsedFile, ParsedPackage};
use std::collections::BTreeSet;
use std::path::Path;
use tasksmith_core::{
    Discovery, DiscoveryConfig, Error, FunctionRecord, PackageCatalog, Result, SourceFile,
};
use tracing::{debug, warn};

const RESERVED_MODULES: [&str; 6] = ["main", "mod", "lib", "crate", "self", "super"];

/// Rust keywords that cannot be used as a module name.
const KEYWORDS: [&str; 38] = [
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "move", "mut", "pub", "ref",
    "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while",
    "abstract", "become", "box", "do", "gen",
];

fn module_ident(file_name: &str, taken: &mut BTreeSet<String>) -> String {
    let stem = file_name.strip_suffix(".rs").unwrap_or(file_name);
    let mut ident: String = stem
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if ident.is_empty()
        || ident.starts_with(|c: char| c.is_ascii_digit())
        || RESERVED_MODULES.contains(&ident.as_str())
        || KEYWORDS.contains(&ident.as_str())
    {
        ident = format!("task_{ident}");
    }

    let mut candidate = ident.clone();
    let mut n = 2;
    while !taken.insert(candidate.clone()) {
        candidate = format!("{ident}_{n}");
        n += 1;
    }
    candidate
}

/// Returns `true` for functions the generated wrapper can call directly.
fn is_task_candidate(item: &syn::ItemFn) -> bool {
    let sig = &item.sig;
    matches!(item.vis, syn::Visibility::Public(_))
        && sig.asyncness.is_none()
        && sig.unsafety.is_none()
        && sig.constness.is_none()
        && sig.abi.is_none()
        && sig.variadic.is_none()
        && sig
            .generics
            .params
            .iter()
            .all(|p| matches!(p, syn::GenericParam::Lifetime(_)))
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Lower-cases a `@binaryName` value, keeping characters valid in a crate name.
fn binary_stem(requested: Option<&str>, package: &str) -> String {
    let stem: String = requested
        .unwrap_or(package)
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        .collect();
    if stem.is_empty() {
        package.to_string()
    } else {
        stem
    }
}

/// Returns a label and the attributes of items that can carry doc markers.
fn documented(item: &syn::Item) -> Option<(String, &[syn::Attribute])> {
    let (label, attrs) = match item {
        syn::Item::Fn(i) => (i.sig.ident.to_string(), &i.attrs),
        syn::Item::Struct(i) => (i.ident.to_string(), &i.attrs),
        syn::Item::Enum(i) => (i.ident.to_string(), &i.attrs),
        syn::Item::Union(i) => (i.ident.to_string(), &i.attrs),
        syn::Item::Type(i) => (i.ident.to_string(), &i.attrs),
        syn::Item::Trait(i) => (i.ident.to_string(), &i.attrs),
        syn::Item::Const(i) => (i.ident.to_string(), &i.attrs),
        syn::Item::Static(i) => (i.ident.to_string(), &i.attrs),
        syn::Item::Mod(i) => (i.ident.to_string(), &i.attrs),
        syn::Item::Impl(i) => ("impl".to_string(), &i.attrs),
        _ => return None,
    };
    attrs
        .iter()
        .any(|attr| attr.path().is_ident("doc"))
        .then_some((label, attrs.as_slice()))
}

struct FileScan<'a> {
    package: &'a ParsedPackage,
    scope: TypeScope,
    binary_name: Option<String>,
    default: Option<String>,
    functions: Vec<FunctionRecord>,
}

impl FileScan<'_> {
    fn note_binary_name(&mut self, annotations: &Annotations) {
        if self.binary_name.is_none() {
            self.binary_name.clone_from(&annotations.binary_name);
        }
    }

    fn scan_file(&mut self, file: &ParsedFile) -> Result<()> {
        self.scope.set_imports(&file.ast);

        let file_doc = annotations::doc_text(&file.ast.attrs);
        let file_markers = annotations::parse_markers(&file_doc, &file.file_name)?;
        let file_annotations = annotations::resolve(&file_markers, &file.file_name)?;
        self.note_binary_name(&file_annotations);

        for item in &file.ast.items {
            let Some((label, attrs)) = documented(item) else {
                continue;
            };
            let location = format!("{}::{label}", file.file_name);
            let doc = annotations::doc_text(attrs);
            let markers = annotations::parse_markers(&doc, &location)?;
            let resolved = annotations::resolve(&markers, &location)?;
            self.note_binary_name(&resolved);

            match item {
                syn::Item::Fn(item_fn) if is_task_candidate(item_fn) => {
                    self.scan_function(file, item_fn, &doc, resolved)?;
                }
                _ if resolved.default || !resolved.flags.is_empty() => {
                    debug!(item = %location, "markers on a non-task item are ignored");
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn scan_function(
        &mut self,
        file: &ParsedFile,
        item_fn: &syn::ItemFn,
        doc: &str,
        resolved: Annotations,
    ) -> Result<()> {
        let name = item_fn.sig.ident.to_string();
        let location = format!("{}::{name}", file.file_name);

        let params: Vec<_> = item_fn
            .sig
            .inputs
            .iter()
            .filter_map(|input| match input {
                syn::FnArg::Typed(pat) => Some(describe_type(&pat.ty, &self.scope)),
                syn::FnArg::Receiver(_) => None,
            })
            .collect();
        let returns = describe_return(&item_fn.sig.output);

        let classification = match classify(&name, &params, &returns) {
            Ok(classification) => classification,
            Err(err) if err.is_soft() => {
                warn!(package = %self.package.name, function = %location, "skipping: {err}");
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        if resolved.default {
            if let Some(first) = &self.default {
                return Err(Error::DuplicateDefault {
                    package: self.package.name.clone(),
                    first: first.clone(),
                    second: name,
                });
            }
            self.default = Some(name.clone());
        }

        let description = annotations::strip_markers(doc);
        let mut record = FunctionRecord::new(&self.package.name, name, classification.signature);
        record.package_path.clone_from(&self.package.dir);
        record.file.clone_from(&file.file_name);
        record.synopsis = first_line(&description);
        record.description = description;
        record.default = resolved.default;
        record.binary_name = resolved.binary_name;
        record.source = file.source_of(item_fn);
        record.flags = resolved.flags;
        record.imported = classification.imported;
        record.struct_exported = classification.struct_exported;
        record.binding = classification.binding;

        debug!(
            package = %self.package.name,
            function = %location,
            signature = %record.signature,
            "classified function"
        );
        self.functions.push(record);
        Ok(())
    }
}

/// Builds the catalog for a parsed package.
///
/// # Errors
///
/// Returns [`Error::InvalidMarker`] or [`Error::DuplicateDefault`]; functions
/// with unsupported signatures are skipped, not reported as errors.
pub fn build_catalog(package: &ParsedPackage, config: &DiscoveryConfig) -> Result<Discovery> {
    let mut scope = TypeScope::new(config);
    for file in &package.files {
        scope.add_locals(&file.ast);
    }

    let mut scan = FileScan {
        package,
        scope,
        binary_name: None,
        default: None,
        functions: Vec::new(),
    };
    for file in &package.files {
        scan.scan_file(file)?;
    }

    let mut taken = BTreeSet::new();
    let files = package
        .files
        .iter()
        .map(|file| SourceFile {
            file_name: file.file_name.clone(),
            module: module_ident(&file.file_name, &mut taken),
            path: file.path.clone(),
            source: file.embedded_source(),
        })
        .collect();

    let binary_name = format!(
        "{}{}",
        binary_stem(scan.binary_name.as_deref(), &package.name),
        config.exe_suffix()
    );

    let mut catalog = PackageCatalog::new(&package.name, &package.dir);
    catalog.binary_name = binary_name;
    catalog.max_name_len = scan
        .functions
        .iter()
        .map(|f| f.command.len())
        .max()
        .unwrap_or(0);
    catalog.functions = scan.functions;
    catalog.files = files;

    debug!(
        package = %catalog.name,
        binary = %catalog.binary_name,
        functions = catalog.functions.len(),
        "built catalog"
    );
    Ok(Discovery::Catalog(catalog))
}

/// Parses `dir` and builds its catalog.
///
/// # Errors
///
/// Returns the parser's I/O and parse errors and the registry's hard errors.
pub fn discover(dir: &Path, config: &DiscoveryConfig) -> Result<Discovery> {
    match parser::parse_package(dir, &config.build_tag)? {
        None => {
            debug!(dir = %dir.display(), "no eligible source");
            Ok(Discovery::NoSource)
        }
        Some(package) => build_catalog(&package, config),
    }
}
