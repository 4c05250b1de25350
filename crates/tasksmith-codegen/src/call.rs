//! Shim body rendering.
//!
//! Each task function gets a shim with the uniform signature
//! `fn(&mut crate::Invocation) -> crate::Outcome`. The body obtains the
//! context and arguments from the invocation in the order the function
//! declares them, calls it, and converts its result.

use tasksmith_core::{
    ArgumentShape, ContextConvention, FunctionRecord, ParamBinding, PassMode, ReturnShape,
};

const INDENT: &str = "    ";

/// Renders `value` as a Rust string literal.
///
/// # Examples
///
/// ```
/// use tasksmith_codegen::call::rust_literal;
///
/// assert_eq!(rust_literal("say \"hi\"\n"), r#""say \"hi\"\n""#);
/// ```
#[must_use]
pub fn rust_literal(value: &str) -> String {
    format!("{value:?}")
}

fn pass(binding: &ParamBinding, var: &str) -> String {
    match binding.pass {
        PassMode::Owned => var.to_string(),
        PassMode::Ref => format!("&{var}"),
        PassMode::MutRef => format!("&mut {var}"),
    }
}

/// What a positional argument slot holds, decided by the record's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Reader,
    Writer,
    Str,
    Json,
}

fn slot(shape: ArgumentShape, index: usize) -> Slot {
    use ArgumentShape as S;

    match (shape, index) {
        (S::Reader | S::ReaderWithWriter, 0) => Slot::Reader,
        (S::Writer, 0) | (_, 1) => Slot::Writer,
        (S::String | S::StringWithWriter, 0) => Slot::Str,
        _ => Slot::Json,
    }
}

/// Renders the statements of a shim body, one per line, indented.
///
/// # Examples
///
/// ```
/// use tasksmith_core::{
///     ArgumentShape, ContextConvention, FunctionRecord, ParamBinding, PassMode, ReturnShape,
///     Signature,
/// };
/// use tasksmith_codegen::call::render_body;
///
/// let signature = Signature {
///     argument: ArgumentShape::String,
///     context: ContextConvention::None,
///     returns: ReturnShape::None,
/// };
/// let mut record = FunctionRecord::new("ops", "greet", signature);
/// record.binding.args.push(ParamBinding { pass: PassMode::Ref, type_text: "str".into() });
///
/// let body = render_body(&record);
/// assert!(body.contains("let input = inv.input_string()?;"));
/// assert!(body.contains("greet(&input);"));
/// ```
#[must_use]
pub fn render_body(record: &FunctionRecord) -> String {
    let mut lines = Vec::new();
    let mut call_args = Vec::new();

    if let Some(context) = &record.binding.context {
        match record.signature.context {
            ContextConvention::Custom => lines.push(format!(
                "let ctx = <{}>::from(inv.token());",
                context.type_text
            )),
            _ => lines.push("let ctx = inv.token();".to_string()),
        }
        call_args.push(pass(context, "ctx"));
    }

    let mut flush_writer = false;
    for (index, binding) in record.binding.args.iter().enumerate() {
        let mutable = if binding.pass == PassMode::MutRef { "mut " } else { "" };
        match slot(record.signature.argument, index) {
            Slot::Reader => {
                lines.push(format!("let {mutable}reader = inv.reader();"));
                call_args.push(pass(binding, "reader"));
            }
            Slot::Writer => {
                lines.push(format!("let {mutable}writer = inv.writer();"));
                call_args.push(pass(binding, "writer"));
                flush_writer = binding.pass == PassMode::MutRef;
            }
            Slot::Str => {
                lines.push("let input = inv.input_string()?;".to_string());
                call_args.push(pass(binding, "input"));
            }
            Slot::Json => {
                lines.push(format!(
                    "let input = inv.input_json::<{}>()?;",
                    binding.type_text
                ));
                call_args.push(pass(binding, "input"));
            }
        }
    }

    let call = format!("{}({})", record.name, call_args.join(", "));
    match record.signature.returns {
        ReturnShape::Error => lines.push(format!("{call}.map_err(|e| e.to_string())?;")),
        ReturnShape::None => lines.push(format!("{call};")),
    }
    if flush_writer {
        lines.push("std::io::Write::flush(&mut writer)?;".to_string());
    }
    lines.push("Ok(())".to_string());

    lines
        .iter()
        .map(|line| format!("{INDENT}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
