//! Callable task functions, one variant per argument shape.
//!
//! Each variant stores a boxed closure taking the optional cancellation
//! token first, followed by the inputs its shape implies. The variant is
//! the dispatch key; nothing is inferred from the closure at call time.
//!
//! # Examples
//!
//! ```
//! use serde::Deserialize;
//! use tasksmith_harness::Callable;
//! use tasksmith_core::ArgumentShape;
//!
//! #[derive(Deserialize)]
//! struct Movie {
//!     name: String,
//! }
//!
//! let callable = Callable::from_struct(|_token, movie: Movie| {
//!     assert_eq!(movie.name, "Rock");
//!     Ok(())
//! });
//! assert_eq!(callable.shape(), ArgumentShape::Struct);
//! ```

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};
use tasksmith_core::ArgumentShape;
use tokio_util::sync::CancellationToken;

/// Error produced by a task function.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result of calling a task function.
pub type CallResult = Result<(), BoxError>;

/// Optional cancellation token handed to every callable.
pub type Token = Option<CancellationToken>;

/// String-keyed JSON map.
pub type JsonMap = HashMap<String, Value>;

type NoArgFn = Box<dyn Fn(Token) -> CallResult>;
type StringFn = Box<dyn Fn(Token, String) -> CallResult>;
type MapFn = Box<dyn Fn(Token, JsonMap) -> CallResult>;
type ValueFn = Box<dyn Fn(Token, Value) -> CallResult>;
type ReaderFn = Box<dyn Fn(Token, &mut dyn Read) -> CallResult>;
type WriterFn = Box<dyn Fn(Token, &mut dyn Write) -> CallResult>;
type StringWriterFn = Box<dyn Fn(Token, String, &mut dyn Write) -> CallResult>;
type MapWriterFn = Box<dyn Fn(Token, JsonMap, &mut dyn Write) -> CallResult>;
type ValueWriterFn = Box<dyn Fn(Token, Value, &mut dyn Write) -> CallResult>;
type ReaderWriterFn = Box<dyn Fn(Token, &mut dyn Read, &mut dyn Write) -> CallResult>;

/// A task function wrapped for the harness.
///
/// Struct, struct-pointer and imported shapes receive the decoded JSON
/// document; the `from_*` constructors deserialize it into a concrete type.
pub enum Callable {
    /// No argument
    NoArgument(NoArgFn),
    /// Plain string
    String(StringFn),
    /// String-keyed map
    Map(MapFn),
    /// Local struct by value
    Struct(ValueFn),
    /// Local struct by reference
    StructPointer(ValueFn),
    /// Imported type
    Imported(ValueFn),
    /// Reader
    Reader(ReaderFn),
    /// Writer
    Writer(WriterFn),
    /// String plus writer
    StringWithWriter(StringWriterFn),
    /// Map plus writer
    MapWithWriter(MapWriterFn),
    /// Local struct plus writer
    StructWithWriter(ValueWriterFn),
    /// Imported type plus writer
    ImportedWithWriter(ValueWriterFn),
    /// Reader plus writer
    ReaderWithWriter(ReaderWriterFn),
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, BoxError> {
    serde_json::from_value(value).map_err(|e| format!("failed to decode input: {e}").into())
}

impl Callable {
    /// Shape this callable implements.
    #[must_use]
    pub const fn shape(&self) -> ArgumentShape {
        match self {
            Self::NoArgument(_) => ArgumentShape::NoArgument,
            Self::String(_) => ArgumentShape::String,
            Self::Map(_) => ArgumentShape::Map,
            Self::Struct(_) => ArgumentShape::Struct,
            Self::StructPointer(_) => ArgumentShape::StructPointer,
            Self::Imported(_) => ArgumentShape::Imported,
            Self::Reader(_) => ArgumentShape::Reader,
            Self::Writer(_) => ArgumentShape::Writer,
            Self::StringWithWriter(_) => ArgumentShape::StringWithWriter,
            Self::MapWithWriter(_) => ArgumentShape::MapWithWriter,
            Self::StructWithWriter(_) => ArgumentShape::StructWithWriter,
            Self::ImportedWithWriter(_) => ArgumentShape::ImportedWithWriter,
            Self::ReaderWithWriter(_) => ArgumentShape::ReaderWithWriter,
        }
    }

    /// Wraps a function taking a local struct by value.
    pub fn from_struct<T, F>(f: F) -> Self
    where
        T: DeserializeOwned,
        F: Fn(Token, T) -> CallResult + 'static,
    {
        Self::Struct(Box::new(move |token, value| f(token, decode(value)?)))
    }

    /// Wraps a function taking a local struct by reference.
    pub fn from_struct_ref<T, F>(f: F) -> Self
    where
        T: DeserializeOwned,
        F: Fn(Token, &T) -> CallResult + 'static,
    {
        Self::StructPointer(Box::new(move |token, value| f(token, &decode(value)?)))
    }

    /// Wraps a function taking an imported type.
    pub fn from_imported<T, F>(f: F) -> Self
    where
        T: DeserializeOwned,
        F: Fn(Token, T) -> CallResult + 'static,
    {
        Self::Imported(Box::new(move |token, value| f(token, decode(value)?)))
    }

    /// Wraps a function taking a local struct and a writer.
    pub fn from_struct_with_writer<T, F>(f: F) -> Self
    where
        T: DeserializeOwned,
        F: Fn(Token, T, &mut dyn Write) -> CallResult + 'static,
    {
        Self::StructWithWriter(Box::new(move |token, value, writer| {
            f(token, decode(value)?, writer)
        }))
    }

    /// Wraps a function taking an imported type and a writer.
    pub fn from_imported_with_writer<T, F>(f: F) -> Self
    where
        T: DeserializeOwned,
        F: Fn(Token, T, &mut dyn Write) -> CallResult + 'static,
    {
        Self::ImportedWithWriter(Box::new(move |token, value, writer| {
            f(token, decode(value)?, writer)
        }))
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callable").field(&self.shape()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Movie {
        name: String,
    }

    #[test]
    fn test_every_variant_reports_its_shape() {
        let callables = vec![
            Callable::NoArgument(Box::new(|_| Ok(()))),
            Callable::String(Box::new(|_, _| Ok(()))),
            Callable::Map(Box::new(|_, _| Ok(()))),
            Callable::Struct(Box::new(|_, _| Ok(()))),
            Callable::StructPointer(Box::new(|_, _| Ok(()))),
            Callable::Imported(Box::new(|_, _| Ok(()))),
            Callable::Reader(Box::new(|_, _| Ok(()))),
            Callable::Writer(Box::new(|_, _| Ok(()))),
            Callable::StringWithWriter(Box::new(|_, _, _| Ok(()))),
            Callable::MapWithWriter(Box::new(|_, _, _| Ok(()))),
            Callable::StructWithWriter(Box::new(|_, _, _| Ok(()))),
            Callable::ImportedWithWriter(Box::new(|_, _, _| Ok(()))),
            Callable::ReaderWithWriter(Box::new(|_, _, _| Ok(()))),
        ];

        let shapes: Vec<_> = callables.iter().map(Callable::shape).collect();
        assert_eq!(shapes.len(), ArgumentShape::ALL.len());
        for shape in ArgumentShape::ALL {
            assert!(shapes.contains(&shape), "{shape}");
        }
    }

    #[test]
    fn test_struct_constructor_decodes() {
        let callable = Callable::from_struct_ref(|_, movie: &Movie| {
            if movie.name == "Rock" {
                Ok(())
            } else {
                Err("wrong movie".into())
            }
        });
        let Callable::StructPointer(f) = callable else {
            panic!("expected struct pointer");
        };
        assert!(f(None, serde_json::json!({"name": "Rock"})).is_ok());
        assert!(f(None, serde_json::json!({"name": "Jaws"})).is_err());
        assert!(f(None, serde_json::json!([1, 2])).is_err());
    }

    #[test]
    fn test_debug_shows_shape() {
        let callable = Callable::NoArgument(Box::new(|_| Ok(())));
        assert_eq!(format!("{callable:?}"), "Callable(NoArgument)");
    }
}
