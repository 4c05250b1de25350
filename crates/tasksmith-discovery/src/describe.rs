//! Reduces `syn` types to parser-independent descriptors.
//!
//! The classifier never looks at `syn` directly; it works on the
//! [`TypeDescriptor`] values produced here. Resolution uses the package's
//! declared types and the `use` items of the declaring file.

use quote::ToTokens;
use std::collections::BTreeMap;
use syn::{GenericArgument, PathArguments, ReturnType, Type, TypeParamBound, UseTree};
use tasksmith_core::{
    DiscoveryConfig, ImportedType, PassMode, ReturnDescriptor, TypeDescriptor, TypeKind,
};

const STANDARD_CONTEXT: &str = "CancellationToken";
const MAP_TYPES: [&str; 3] = ["HashMap", "BTreeMap", "Map"];
const STD_ROOTS: [&str; 3] = ["std", "core", "alloc"];
const CRATE_ROOTS: [&str; 3] = ["crate", "self", "super"];

/// Resolves a type reached through `module::name`.
///
/// Standard library types are never imported arguments. Types rooted in
/// the declaring crate are not exported: the generated wrapper cannot
/// reach them.
fn imported(module: &[String], name: String, alias: Option<String>) -> Option<ImportedType> {
    let root = module.first()?.as_str();
    if STD_ROOTS.contains(&root) {
        return None;
    }
    Some(ImportedType {
        path: module.join("::"),
        alias,
        name,
        exported: !CRATE_ROOTS.contains(&root),
    })
}

/// Name resolution scope for one file.
#[derive(Debug, Clone, Default)]
pub struct TypeScope {
    /// Types declared in the package: name to `pub`
    pub locals: BTreeMap<String, bool>,
    /// Names brought in by `use` items of the file
    pub imports: BTreeMap<String, ImportedType>,
    /// Configured custom context names
    pub custom_contexts: Vec<String>,
}

impl TypeScope {
    /// Creates a scope with the custom context names from `config`.
    #[must_use]
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self {
            custom_contexts: config.custom_context_types.clone(),
            ..Self::default()
        }
    }

    /// Records the structs and enums declared in `file`.
    pub fn add_locals(&mut self, file: &syn::File) {
        for item in &file.items {
            let (ident, vis) = match item {
                syn::Item::Struct(s) => (&s.ident, &s.vis),
                syn::Item::Enum(e) => (&e.ident, &e.vis),
                syn::Item::Type(t) => (&t.ident, &t.vis),
                _ => continue,
            };
            self.locals
                .insert(ident.to_string(), matches!(vis, syn::Visibility::Public(_)));
        }
    }

    /// Replaces the imports with the `use` items of `file`.
    pub fn set_imports(&mut self, file: &syn::File) {
        self.imports.clear();
        for item in &file.items {
            if let syn::Item::Use(item_use) = item {
                collect_use(&item_use.tree, &mut Vec::new(), &mut self.imports);
            }
        }
    }
}

fn collect_use(tree: &UseTree, prefix: &mut Vec<String>, out: &mut BTreeMap<String, ImportedType>) {
    match tree {
        UseTree::Path(path) => {
            prefix.push(path.ident.to_string());
            collect_use(&path.tree, prefix, out);
            prefix.pop();
        }
        UseTree::Name(name) => {
            let ident = name.ident.to_string();
            if ident == "self" {
                return;
            }
            if let Some(found) = imported(prefix, ident.clone(), None) {
                out.insert(ident, found);
            }
        }
        UseTree::Rename(rename) => {
            let alias = rename.rename.to_string();
            if let Some(found) = imported(prefix, rename.ident.to_string(), Some(alias.clone())) {
                out.insert(alias, found);
            }
        }
        UseTree::Group(group) => {
            for item in &group.items {
                collect_use(item, prefix, out);
            }
        }
        UseTree::Glob(_) => {}
    }
}

/// Renders a type as compact source text.
///
/// # Examples
///
/// ```
/// use tasksmith_discovery::describe::type_text;
///
/// let ty: syn::Type = syn::parse_str("HashMap<String, serde_json::Value>").unwrap();
/// assert_eq!(type_text(&ty), "HashMap<String, serde_json::Value>");
/// ```
#[must_use]
pub fn type_text(ty: &Type) -> String {
    ty.to_token_stream()
        .to_string()
        .replace(" :: ", "::")
        .replace(":: ", "::")
        .replace(" ::", "::")
        .replace(" <", "<")
        .replace("< ", "<")
        .replace(" >", ">")
        .replace(" ,", ",")
        .replace("& ", "&")
}

fn last_segment(path: &syn::Path) -> Option<&syn::PathSegment> {
    path.segments.last()
}

fn generic_types(segment: &syn::PathSegment) -> Vec<&Type> {
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .filter_map(|arg| match arg {
                GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn is_named(ty: &Type, name: &str) -> bool {
    matches!(ty, Type::Path(p) if p.qself.is_none()
        && last_segment(&p.path).is_some_and(|s| s.ident == name && s.arguments.is_empty()))
}

fn stream_trait<'a>(bounds: impl IntoIterator<Item = &'a TypeParamBound>) -> Option<TypeKind> {
    bounds.into_iter().find_map(|bound| match bound {
        TypeParamBound::Trait(t) => match last_segment(&t.path)?.ident.to_string().as_str() {
            "Read" => Some(TypeKind::Reader),
            "Write" => Some(TypeKind::Writer),
            _ => None,
        },
        _ => None,
    })
}

/// Describes one parameter type.
///
/// # Examples
///
/// ```
/// use tasksmith_core::{DiscoveryConfig, PassMode, TypeKind};
/// use tasksmith_discovery::describe::{TypeScope, describe_type};
///
/// let scope = TypeScope::new(&DiscoveryConfig::default());
/// let ty: syn::Type = syn::parse_str("&mut dyn std::io::Write").unwrap();
/// let descriptor = describe_type(&ty, &scope);
/// assert_eq!(descriptor.kind, TypeKind::Writer);
/// assert_eq!(descriptor.pass, PassMode::MutRef);
/// ```
#[must_use]
pub fn describe_type(ty: &Type, scope: &TypeScope) -> TypeDescriptor {
    match ty {
        Type::Reference(reference) => {
            let pass = if reference.mutability.is_some() {
                PassMode::MutRef
            } else {
                PassMode::Ref
            };
            describe_inner(&reference.elem, pass, scope)
        }
        Type::Paren(paren) => describe_type(&paren.elem, scope),
        Type::Group(group) => describe_type(&group.elem, scope),
        other => describe_inner(other, PassMode::Owned, scope),
    }
}

fn describe_inner(ty: &Type, pass: PassMode, scope: &TypeScope) -> TypeDescriptor {
    let text = type_text(ty);
    let other = || TypeDescriptor::new(TypeKind::Other, pass, type_text(ty));

    match ty {
        // `&mut dyn Read`; a shared reference cannot drive `Read`/`Write`
        Type::TraitObject(object) => match stream_trait(&object.bounds) {
            Some(kind) if pass == PassMode::MutRef => TypeDescriptor::new(kind, pass, text),
            _ => other(),
        },
        // `impl Read` or `&mut impl Read`
        Type::ImplTrait(imp) => match stream_trait(&imp.bounds) {
            Some(kind) if pass != PassMode::Ref => TypeDescriptor::new(kind, pass, text),
            _ => other(),
        },
        Type::Path(type_path) if type_path.qself.is_none() => {
            let path = &type_path.path;
            let Some(segment) = last_segment(path) else {
                return other();
            };
            let ident = segment.ident.to_string();

            if ident == STANDARD_CONTEXT && segment.arguments.is_empty() {
                return if pass == PassMode::MutRef {
                    other()
                } else {
                    TypeDescriptor::new(TypeKind::StandardContext, pass, text)
                };
            }
            if scope.custom_contexts.iter().any(|c| *c == ident) {
                return if pass == PassMode::MutRef {
                    other()
                } else {
                    TypeDescriptor::new(TypeKind::CustomContext, pass, text)
                };
            }
            if (ident == "String" && segment.arguments.is_empty())
                || (ident == "str" && pass == PassMode::Ref)
            {
                return TypeDescriptor::new(TypeKind::Str, pass, text);
            }
            if MAP_TYPES.contains(&ident.as_str()) {
                let args = generic_types(segment);
                return if args.len() == 2 && is_named(args[0], "String") && is_named(args[1], "Value")
                {
                    TypeDescriptor::new(TypeKind::StringMap, pass, text)
                } else {
                    other()
                };
            }
            if ident == "Box" {
                return match generic_types(segment).first() {
                    Some(Type::TraitObject(object)) if pass == PassMode::Owned => {
                        stream_trait(&object.bounds)
                            .map_or_else(other, |kind| TypeDescriptor::new(kind, pass, text))
                    }
                    _ => other(),
                };
            }

            if path.segments.len() == 1 {
                if let Some(exported) = scope.locals.get(&ident) {
                    return TypeDescriptor::new(
                        TypeKind::LocalType {
                            name: ident,
                            exported: *exported,
                        },
                        pass,
                        text,
                    );
                }
                if let Some(imported) = scope.imports.get(&ident) {
                    return TypeDescriptor::new(TypeKind::Imported(imported.clone()), pass, text);
                }
                return other();
            }

            let module: Vec<String> = path
                .segments
                .iter()
                .take(path.segments.len() - 1)
                .map(|s| s.ident.to_string())
                .collect();
            imported(&module, ident, None).map_or_else(other, |found| {
                TypeDescriptor::new(TypeKind::Imported(found), pass, text)
            })
        }
        _ => other(),
    }
}

/// Describes a return type.
///
/// # Examples
///
/// ```
/// use tasksmith_core::ReturnDescriptor;
/// use tasksmith_discovery::describe::describe_return;
///
/// let item: syn::ItemFn = syn::parse_str("fn f() -> std::io::Result<()> { Ok(()) }").unwrap();
/// assert_eq!(describe_return(&item.sig.output), ReturnDescriptor::UnitResult);
/// ```
#[must_use]
pub fn describe_return(output: &ReturnType) -> ReturnDescriptor {
    let ReturnType::Type(_, ty) = output else {
        return ReturnDescriptor::Unit;
    };
    match ty.as_ref() {
        Type::Tuple(tuple) if tuple.elems.is_empty() => ReturnDescriptor::Unit,
        Type::Path(type_path) => {
            let ok_is_unit = last_segment(&type_path.path)
                .filter(|s| s.ident == "Result")
                .and_then(|s| generic_types(s).first().copied())
                .is_some_and(|ok| matches!(ok, Type::Tuple(t) if t.elems.is_empty()));
            if ok_is_unit {
                ReturnDescriptor::UnitResult
            } else {
                ReturnDescriptor::Other(type_text(ty))
            }
        }
        other => ReturnDescriptor::Other(type_text(other)),
    }
}
