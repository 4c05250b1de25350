//! Signature classification.
//!
//! Maps an ordered list of parameter descriptors and a return descriptor
//! onto exactly one `(argument shape, context convention, return shape)`
//! triple, or rejects the signature.
//!
//! Only the first parameter may be a context. The remaining parameters are
//! matched against the closed shape set in a fixed precedence order; the
//! first match wins and anything else is unsupported.

use tasksmith_core::{
    ArgumentBinding, ArgumentShape, ContextConvention, Error, ImportedType, ParamBinding,
    PassMode, Result, ReturnDescriptor, ReturnShape, Signature, TypeDescriptor, TypeKind,
};

/// Outcome of classifying one function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Classified signature
    pub signature: Signature,
    /// Call-site bindings in declaration order
    pub binding: ArgumentBinding,
    /// Imported argument type, for the imported shapes
    pub imported: Option<ImportedType>,
    /// Whether a package struct argument is `pub`
    pub struct_exported: Option<bool>,
}

/// Argument category after pass-mode validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Str,
    Map,
    Struct { by_ref: bool },
    Imported,
    Reader,
    Writer,
}

fn slot(descriptor: &TypeDescriptor) -> Option<Slot> {
    let by_value_or_ref = descriptor.pass != PassMode::MutRef;
    match &descriptor.kind {
        TypeKind::Str if by_value_or_ref => Some(Slot::Str),
        TypeKind::StringMap if by_value_or_ref => Some(Slot::Map),
        TypeKind::LocalType { .. } if by_value_or_ref => Some(Slot::Struct {
            by_ref: descriptor.pass == PassMode::Ref,
        }),
        TypeKind::Imported(_) if by_value_or_ref => Some(Slot::Imported),
        TypeKind::Reader => Some(Slot::Reader),
        TypeKind::Writer => Some(Slot::Writer),
        _ => None,
    }
}

fn shape(slots: &[Slot]) -> Option<ArgumentShape> {
    use ArgumentShape as S;

    let shape = match slots {
        [] => S::NoArgument,
        [Slot::Reader, Slot::Writer] => S::ReaderWithWriter,
        [Slot::Str, Slot::Writer] => S::StringWithWriter,
        [Slot::Map, Slot::Writer] => S::MapWithWriter,
        [Slot::Struct { .. }, Slot::Writer] => S::StructWithWriter,
        [Slot::Imported, Slot::Writer] => S::ImportedWithWriter,
        [Slot::Str] => S::String,
        [Slot::Map] => S::Map,
        [Slot::Struct { by_ref: false }] => S::Struct,
        [Slot::Struct { by_ref: true }] => S::StructPointer,
        [Slot::Imported] => S::Imported,
        [Slot::Reader] => S::Reader,
        [Slot::Writer] => S::Writer,
        _ => return None,
    };
    Some(shape)
}

/// Classifies a function signature.
///
/// # Errors
///
/// Returns [`Error::UnsupportedSignature`] when the parameters or the return
/// type fall outside the closed set.
///
/// # Examples
///
/// ```
/// use tasksmith_core::{
///     ArgumentShape, ContextConvention, PassMode, ReturnDescriptor, ReturnShape,
///     TypeDescriptor, TypeKind,
/// };
/// use tasksmith_discovery::classify;
///
/// let params = [
///     TypeDescriptor::new(TypeKind::StandardContext, PassMode::Owned, "CancellationToken"),
///     TypeDescriptor::new(TypeKind::Str, PassMode::Ref, "str"),
/// ];
/// let classification = classify("greet", &params, &ReturnDescriptor::Unit).unwrap();
///
/// assert_eq!(classification.signature.argument, ArgumentShape::String);
/// assert_eq!(classification.signature.context, ContextConvention::Standard);
/// assert_eq!(classification.signature.returns, ReturnShape::None);
/// ```
pub fn classify(
    function: &str,
    params: &[TypeDescriptor],
    returns: &ReturnDescriptor,
) -> Result<Classification> {
    let unsupported = |reason: String| Error::UnsupportedSignature {
        function: function.to_string(),
        reason,
    };

    let returns = match returns {
        ReturnDescriptor::Unit => ReturnShape::None,
        ReturnDescriptor::UnitResult => ReturnShape::Error,
        ReturnDescriptor::Other(text) => {
            return Err(unsupported(format!(
                "return type `{text}` is neither `()` nor `Result<(), E>`"
            )));
        }
    };

    let (context, rest) = match params.split_first() {
        Some((first, rest)) if first.kind == TypeKind::StandardContext => {
            (ContextConvention::Standard, rest)
        }
        Some((first, rest)) if first.kind == TypeKind::CustomContext => {
            (ContextConvention::Custom, rest)
        }
        _ => (ContextConvention::None, params),
    };

    if let Some(misplaced) = rest.iter().find(|p| p.is_context()) {
        return Err(unsupported(format!(
            "context `{}` must be the first parameter",
            misplaced.text
        )));
    }

    let slots = rest
        .iter()
        .map(|p| slot(p).ok_or_else(|| unsupported(format!("parameter type `{}` is not supported", p.text))))
        .collect::<Result<Vec<_>>>()?;

    let argument = shape(&slots).ok_or_else(|| {
        let texts: Vec<&str> = rest.iter().map(|p| p.text.as_str()).collect();
        unsupported(format!("parameter list ({}) matches no shape", texts.join(", ")))
    })?;

    let imported = rest.iter().find_map(|p| match &p.kind {
        TypeKind::Imported(imported) => Some(imported.clone()),
        _ => None,
    });
    let struct_exported = rest.iter().find_map(|p| match &p.kind {
        TypeKind::LocalType { exported, .. } => Some(*exported),
        _ => None,
    });

    let binding = ArgumentBinding {
        context: (context != ContextConvention::None)
            .then(|| params.first().map(ParamBinding::from))
            .flatten(),
        args: rest.iter().map(ParamBinding::from).collect(),
    };

    Ok(Classification {
        signature: Signature {
            argument,
            context,
            returns,
        },
        binding,
        imported,
        struct_exported,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(kind: TypeKind, pass: PassMode) -> TypeDescriptor {
        TypeDescriptor::new(kind, pass, "T")
    }

    fn ctx() -> TypeDescriptor {
        d(TypeKind::StandardContext, PassMode::Owned)
    }

    fn custom() -> TypeDescriptor {
        d(TypeKind::CustomContext, PassMode::Ref)
    }

    fn string() -> TypeDescriptor {
        d(TypeKind::Str, PassMode::Owned)
    }

    fn map() -> TypeDescriptor {
        d(TypeKind::StringMap, PassMode::Ref)
    }

    fn local(pass: PassMode) -> TypeDescriptor {
        d(
            TypeKind::LocalType {
                name: "Movie".to_string(),
                exported: true,
            },
            pass,
        )
    }

    fn imported() -> TypeDescriptor {
        d(
            TypeKind::Imported(ImportedType {
                path: "crate::ty".to_string(),
                alias: None,
                name: "Woofer".to_string(),
                exported: true,
            }),
            PassMode::Owned,
        )
    }

    fn reader() -> TypeDescriptor {
        d(TypeKind::Reader, PassMode::MutRef)
    }

    fn writer() -> TypeDescriptor {
        d(TypeKind::Writer, PassMode::MutRef)
    }

    fn shape_of(params: &[TypeDescriptor]) -> ArgumentShape {
        classify("f", params, &ReturnDescriptor::Unit)
            .unwrap()
            .signature
            .argument
    }

    // ========================================================================
    // Shape table
    // ========================================================================

    #[test]
    fn test_every_shape_is_reachable() {
        let cases: Vec<(Vec<TypeDescriptor>, ArgumentShape)> = vec![
            (vec![], ArgumentShape::NoArgument),
            (vec![string()], ArgumentShape::String),
            (vec![map()], ArgumentShape::Map),
            (vec![local(PassMode::Owned)], ArgumentShape::Struct),
            (vec![local(PassMode::Ref)], ArgumentShape::StructPointer),
            (vec![imported()], ArgumentShape::Imported),
            (vec![reader()], ArgumentShape::Reader),
            (vec![writer()], ArgumentShape::Writer),
            (vec![string(), writer()], ArgumentShape::StringWithWriter),
            (vec![map(), writer()], ArgumentShape::MapWithWriter),
            (vec![local(PassMode::Owned), writer()], ArgumentShape::StructWithWriter),
            (vec![local(PassMode::Ref), writer()], ArgumentShape::StructWithWriter),
            (vec![imported(), writer()], ArgumentShape::ImportedWithWriter),
            (vec![reader(), writer()], ArgumentShape::ReaderWithWriter),
        ];

        for (params, expected) in cases {
            assert_eq!(shape_of(&params), expected);
        }
    }

    #[test]
    fn test_context_is_stripped() {
        let with_ctx = classify("f", &[ctx(), string(), writer()], &ReturnDescriptor::UnitResult)
            .unwrap();
        assert_eq!(with_ctx.signature.argument, ArgumentShape::StringWithWriter);
        assert_eq!(with_ctx.signature.context, ContextConvention::Standard);
        assert_eq!(with_ctx.signature.returns, ReturnShape::Error);
        assert!(with_ctx.binding.context.is_some());
        assert_eq!(with_ctx.binding.args.len(), 2);

        let with_custom = classify("f", &[custom()], &ReturnDescriptor::Unit).unwrap();
        assert_eq!(with_custom.signature.argument, ArgumentShape::NoArgument);
        assert_eq!(with_custom.signature.context, ContextConvention::Custom);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let params = [ctx(), map(), writer()];
        let first = classify("f", &params, &ReturnDescriptor::Unit).unwrap();
        let second = classify("f", &params, &ReturnDescriptor::Unit).unwrap();
        assert_eq!(first, second);
    }

    // ========================================================================
    // Rejections
    // ========================================================================

    #[test]
    fn test_unsupported_sequences() {
        let cases: Vec<Vec<TypeDescriptor>> = vec![
            vec![string(), string()],
            vec![writer(), string()],
            vec![writer(), writer()],
            vec![string(), ctx()],
            vec![ctx(), ctx()],
            vec![d(TypeKind::Other, PassMode::Owned)],
            vec![d(TypeKind::Str, PassMode::MutRef)],
            vec![local(PassMode::MutRef)],
            vec![string(), writer(), writer()],
            vec![reader(), reader()],
        ];

        for params in cases {
            let err = classify("f", &params, &ReturnDescriptor::Unit).unwrap_err();
            assert!(err.is_unsupported_signature(), "{params:?}");
            assert!(err.is_soft());
        }
    }

    #[test]
    fn test_unsupported_return() {
        let err = classify("f", &[], &ReturnDescriptor::Other("u8".to_string())).unwrap_err();
        assert!(err.to_string().contains("u8"));
    }

    #[test]
    fn test_imported_and_struct_metadata() {
        let with_import = classify("f", &[imported(), writer()], &ReturnDescriptor::Unit).unwrap();
        assert_eq!(
            with_import.imported.map(|i| i.name),
            Some("Woofer".to_string())
        );

        let with_struct = classify("f", &[local(PassMode::Ref)], &ReturnDescriptor::Unit).unwrap();
        assert_eq!(with_struct.struct_exported, Some(true));
        assert!(with_struct.imported.is_none());
    }
}
