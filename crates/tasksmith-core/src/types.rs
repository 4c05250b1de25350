//! Discovery and build data model.
//!
//! Types in this module are produced once per run by discovery and then
//! only read: a [`FunctionRecord`] describes one invocable function, a
//! [`PackageCatalog`] groups the records of one directory, and a
//! [`FingerprintRecord`] captures the content hash of that directory.
//!
//! # Examples
//!
//! ```
//! use tasksmith_core::{ArgumentShape, ContextConvention, ReturnShape, Signature};
//!
//! let signature = Signature {
//!     argument: ArgumentShape::StringWithWriter,
//!     context: ContextConvention::Standard,
//!     returns: ReturnShape::Error,
//! };
//! assert!(signature.argument.takes_writer());
//! assert_eq!(signature.to_string(), "string_with_writer/standard/error");
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Closed set of argument patterns a task function may take.
///
/// The context parameter, when present, is not part of the shape; see
/// [`ContextConvention`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentShape {
    /// No arguments
    NoArgument,
    /// A plain string (`String` or `&str`)
    String,
    /// A string-keyed dynamic map
    Map,
    /// A struct declared in the same package, by value
    Struct,
    /// A struct declared in the same package, by reference
    StructPointer,
    /// A type imported from another module or crate
    Imported,
    /// A byte reader
    Reader,
    /// A byte writer
    Writer,
    /// A plain string followed by a writer
    StringWithWriter,
    /// A map followed by a writer
    MapWithWriter,
    /// A package struct (value or reference) followed by a writer
    StructWithWriter,
    /// An imported type followed by a writer
    ImportedWithWriter,
    /// A reader followed by a writer
    ReaderWithWriter,
}

impl ArgumentShape {
    /// Every shape, in classifier precedence order.
    pub const ALL: [Self; 13] = [
        Self::NoArgument,
        Self::ReaderWithWriter,
        Self::StringWithWriter,
        Self::MapWithWriter,
        Self::StructWithWriter,
        Self::ImportedWithWriter,
        Self::String,
        Self::Map,
        Self::Struct,
        Self::StructPointer,
        Self::Imported,
        Self::Reader,
        Self::Writer,
    ];

    /// Returns the stable name of the shape.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoArgument => "none",
            Self::String => "string",
            Self::Map => "map",
            Self::Struct => "struct",
            Self::StructPointer => "struct_pointer",
            Self::Imported => "imported",
            Self::Reader => "reader",
            Self::Writer => "writer",
            Self::StringWithWriter => "string_with_writer",
            Self::MapWithWriter => "map_with_writer",
            Self::StructWithWriter => "struct_with_writer",
            Self::ImportedWithWriter => "imported_with_writer",
            Self::ReaderWithWriter => "reader_with_writer",
        }
    }

    /// Returns `true` if the function receives an output writer.
    #[must_use]
    pub const fn takes_writer(&self) -> bool {
        matches!(
            self,
            Self::Writer
                | Self::StringWithWriter
                | Self::MapWithWriter
                | Self::StructWithWriter
                | Self::ImportedWithWriter
                | Self::ReaderWithWriter
        )
    }

    /// Returns `true` if the function consumes invocation input.
    #[must_use]
    pub const fn takes_input(&self) -> bool {
        !matches!(self, Self::NoArgument | Self::Writer)
    }

    /// Returns `true` if the input is decoded from JSON.
    #[must_use]
    pub const fn takes_json(&self) -> bool {
        matches!(
            self,
            Self::Map
                | Self::Struct
                | Self::StructPointer
                | Self::Imported
                | Self::MapWithWriter
                | Self::StructWithWriter
                | Self::ImportedWithWriter
        )
    }
}

impl fmt::Display for ArgumentShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cancellation convention of a task function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextConvention {
    /// No context parameter
    #[default]
    None,
    /// First parameter is a `CancellationToken`
    Standard,
    /// First parameter is a configured custom context type
    Custom,
}

impl ContextConvention {
    /// Returns the stable name of the convention.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Standard => "standard",
            Self::Custom => "custom",
        }
    }

    /// Returns `true` if the function receives a context.
    #[must_use]
    pub const fn is_cancelable(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for ContextConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Return pattern of a task function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnShape {
    /// Returns `()`
    #[default]
    None,
    /// Returns `Result<(), E>`
    Error,
}

impl ReturnShape {
    /// Returns the stable name of the return shape.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ReturnShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified signature: argument shape, context convention, return shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    /// Argument shape
    pub argument: ArgumentShape,
    /// Context convention
    pub context: ContextConvention,
    /// Return shape
    pub returns: ReturnShape,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.argument, self.context, self.returns)
    }
}

/// How a parameter is passed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassMode {
    /// By value (includes `impl Trait` and `Box<dyn Trait>`)
    #[default]
    Owned,
    /// By shared reference
    Ref,
    /// By mutable reference
    MutRef,
}

/// A type reached through a `use` item or a qualified path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportedType {
    /// Module path the type lives in, e.g. `crate::models` or `chrono`
    pub path: String,
    /// Local alias when imported with `use ... as Alias`
    pub alias: Option<String>,
    /// Type name as declared in its module
    pub name: String,
    /// Whether the name is usable from outside its module
    pub exported: bool,
}

/// Category of a parameter type as seen by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    /// `tokio_util::sync::CancellationToken`
    StandardContext,
    /// A configured custom context type
    CustomContext,
    /// `String` or `str`
    Str,
    /// String-keyed map of JSON values
    StringMap,
    /// Struct or enum declared in the scanned package
    LocalType {
        /// Type name
        name: String,
        /// Whether the type is `pub`
        exported: bool,
    },
    /// Type imported from elsewhere
    Imported(ImportedType),
    /// `Read` implementor
    Reader,
    /// `Write` implementor
    Writer,
    /// Anything else
    Other,
}

/// One parameter type, described independently of the parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Type category
    pub kind: TypeKind,
    /// How the value is passed
    pub pass: PassMode,
    /// Type text without the outer reference, e.g. `Movie` for `&Movie`
    pub text: String,
}

impl TypeDescriptor {
    /// Creates a descriptor.
    #[must_use]
    pub fn new(kind: TypeKind, pass: PassMode, text: impl Into<String>) -> Self {
        Self {
            kind,
            pass,
            text: text.into(),
        }
    }

    /// Returns `true` for either context kind.
    #[must_use]
    pub const fn is_context(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::StandardContext | TypeKind::CustomContext
        )
    }
}

/// Return type, described independently of the parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnDescriptor {
    /// No return type or `()`
    Unit,
    /// `Result<(), E>` for any `E`
    UnitResult,
    /// Anything else, with its text
    Other(String),
}

/// How one argument is passed at the call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamBinding {
    /// Pass mode
    pub pass: PassMode,
    /// Type text without the outer reference
    pub type_text: String,
}

impl From<&TypeDescriptor> for ParamBinding {
    fn from(descriptor: &TypeDescriptor) -> Self {
        Self {
            pass: descriptor.pass,
            type_text: descriptor.text.clone(),
        }
    }
}

/// Call-site bindings for a classified function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArgumentBinding {
    /// Context parameter, if any
    pub context: Option<ParamBinding>,
    /// Remaining parameters in declaration order
    pub args: Vec<ParamBinding>,
}

/// Value type of a declared flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    /// Free-form string
    #[default]
    String,
    /// `true` or `false`
    Bool,
    /// Signed integer
    Int,
    /// Floating point number
    Float,
    /// Duration such as `30s`, `5m`, `1h`, `250ms`
    Duration,
}

impl FlagKind {
    /// Parses a flag type name, case-insensitively.
    ///
    /// # Examples
    ///
    /// ```
    /// use tasksmith_core::FlagKind;
    ///
    /// assert_eq!(FlagKind::parse("Bool"), Some(FlagKind::Bool));
    /// assert_eq!(FlagKind::parse("uuid"), None);
    /// ```
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" | "str" => Some(Self::String),
            "bool" | "boolean" => Some(Self::Bool),
            "int" | "integer" => Some(Self::Int),
            "float" | "number" => Some(Self::Float),
            "duration" => Some(Self::Duration),
            _ => None,
        }
    }

    /// Returns the stable name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Duration => "duration",
        }
    }
}

/// Flag declared with `@flag(name => ..., env => ..., type => ..., desc => ...)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlagSpec {
    /// Flag name, used as `--name`
    pub name: String,
    /// Environment variable consulted when the flag is absent
    pub env: Option<String>,
    /// Value type
    pub kind: FlagKind,
    /// Help text
    pub description: Option<String>,
}

impl FlagSpec {
    /// Environment variable the resolved value is exported under.
    ///
    /// # Examples
    ///
    /// ```
    /// use tasksmith_core::{FlagKind, FlagSpec};
    ///
    /// let flag = FlagSpec {
    ///     name: "dry-run".to_string(),
    ///     env: None,
    ///     kind: FlagKind::Bool,
    ///     description: None,
    /// };
    /// assert_eq!(flag.env_var(), "TASKSMITH_FLAG_DRY_RUN");
    /// ```
    #[must_use]
    pub fn env_var(&self) -> String {
        self.env.clone().unwrap_or_else(|| {
            let name: String = self
                .name
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() {
                        c.to_ascii_uppercase()
                    } else {
                        '_'
                    }
                })
                .collect();
            format!("TASKSMITH_FLAG_{name}")
        })
    }
}

/// One discovered, classified, invocable function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    /// Declaring package name
    pub package: String,
    /// Declaring package directory
    pub package_path: PathBuf,
    /// Declaring file name
    pub file: String,
    /// Rust identifier
    pub name: String,
    /// Command name shown to users (kebab-case)
    pub command: String,
    /// First line of the doc comment
    pub synopsis: String,
    /// Full doc comment with markers removed
    pub description: String,
    /// Classified signature
    pub signature: Signature,
    /// Marked with `@default`
    pub default: bool,
    /// `@binaryName` seen on this function
    pub binary_name: Option<String>,
    /// Function source text
    pub source: String,
    /// Declared flags
    pub flags: Vec<FlagSpec>,
    /// Imported argument type, for the imported shapes
    pub imported: Option<ImportedType>,
    /// Whether the struct argument's type is `pub`, for the struct shapes
    pub struct_exported: Option<bool>,
    /// Call-site bindings
    pub binding: ArgumentBinding,
}

impl FunctionRecord {
    /// Creates a record with empty documentation and no markers.
    ///
    /// # Examples
    ///
    /// ```
    /// use tasksmith_core::{ArgumentShape, ContextConvention, FunctionRecord, ReturnShape, Signature};
    ///
    /// let record = FunctionRecord::new(
    ///     "tasks",
    ///     "build_all",
    ///     Signature {
    ///         argument: ArgumentShape::NoArgument,
    ///         context: ContextConvention::None,
    ///         returns: ReturnShape::Error,
    ///     },
    /// );
    /// assert_eq!(record.command, "build-all");
    /// ```
    #[must_use]
    pub fn new(package: impl Into<String>, name: impl Into<String>, signature: Signature) -> Self {
        let name = name.into();
        Self {
            package: package.into(),
            package_path: PathBuf::new(),
            file: String::new(),
            command: command_name(&name),
            name,
            synopsis: String::new(),
            description: String::new(),
            signature,
            default: false,
            binary_name: None,
            source: String::new(),
            flags: Vec::new(),
            imported: None,
            struct_exported: None,
            binding: ArgumentBinding::default(),
        }
    }
}

/// Converts a Rust identifier into a command name.
fn command_name(ident: &str) -> String {
    ident.trim_start_matches("r#").replace('_', "-")
}

/// One source file embedded into a generated package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// File name, e.g. `deploy.rs`
    pub file_name: String,
    /// Module identifier the file is embedded as
    pub module: String,
    /// Absolute or walked path of the original file
    pub path: PathBuf,
    /// Source with file-level attributes and docs stripped
    pub source: String,
}

/// All invocable functions discovered in one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageCatalog {
    /// Package name
    pub name: String,
    /// Package directory
    pub dir: PathBuf,
    /// Output binary name, including the platform suffix
    pub binary_name: String,
    /// Records in file order, then declaration order
    pub functions: Vec<FunctionRecord>,
    /// Files embedded into the generated package
    pub files: Vec<SourceFile>,
    /// Longest command name, for column alignment
    pub max_name_len: usize,
}

impl PackageCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        let name = name.into();
        Self {
            binary_name: name.clone(),
            name,
            dir: dir.into(),
            functions: Vec::new(),
            files: Vec::new(),
            max_name_len: 0,
        }
    }

    /// Returns `true` when no function was discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Binary name without a platform suffix, used as the generated crate name.
    #[must_use]
    pub fn crate_name(&self) -> &str {
        self.binary_name
            .strip_suffix(".exe")
            .unwrap_or(&self.binary_name)
    }

    /// Imported argument types, sorted and de-duplicated by module path.
    #[must_use]
    pub fn imports(&self) -> BTreeMap<String, Option<String>> {
        self.functions
            .iter()
            .filter_map(|f| f.imported.as_ref())
            .map(|imported| (imported.path.clone(), imported.alias.clone()))
            .collect()
    }

    /// Returns `true` if any function uses the given context convention.
    #[must_use]
    pub fn uses_context(&self, convention: ContextConvention) -> bool {
        self.functions
            .iter()
            .any(|f| f.signature.context == convention)
    }

    /// Returns the function marked `@default`, if any.
    #[must_use]
    pub fn default_function(&self) -> Option<&FunctionRecord> {
        self.functions.iter().find(|f| f.default)
    }

    /// Looks up a function by command name or identifier.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&FunctionRecord> {
        self.functions
            .iter()
            .find(|f| f.command == name || f.name == name)
    }
}

/// Result of discovering one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Discovery {
    /// The directory holds no eligible source file
    NoSource,
    /// A catalog, possibly without functions
    Catalog(PackageCatalog),
}

impl Discovery {
    /// Returns the catalog, if any.
    #[must_use]
    pub const fn catalog(&self) -> Option<&PackageCatalog> {
        match self {
            Self::NoSource => None,
            Self::Catalog(catalog) => Some(catalog),
        }
    }

    /// Consumes the result and returns the catalog, if any.
    #[must_use]
    pub fn into_catalog(self) -> Option<PackageCatalog> {
        match self {
            Self::NoSource => None,
            Self::Catalog(catalog) => Some(catalog),
        }
    }

    /// Returns `true` when there is nothing to build.
    #[must_use]
    pub fn is_buildable(&self) -> bool {
        self.catalog().is_some_and(|c| !c.is_empty())
    }
}

/// Content hash of one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    /// Directory as walked
    pub dir: PathBuf,
    /// Fingerprint of the directory's eligible files, empty when there are none
    pub hash: String,
    /// Digest of each eligible file, keyed by file name
    pub files: BTreeMap<String, String>,
}

impl FingerprintRecord {
    /// Returns `true` when the directory had no eligible files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hash.is_empty()
    }
}

/// A root directory value plus one value per immediate sub-directory.
///
/// Sub-directory keys are normalized with [`normalize_key`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirTree<T> {
    /// Value for the root directory
    pub root: T,
    /// Values keyed by normalized sub-directory name
    pub subs: BTreeMap<String, T>,
}

impl<T> DirTree<T> {
    /// Creates a tree with only a root value.
    #[must_use]
    pub const fn new(root: T) -> Self {
        Self {
            root,
            subs: BTreeMap::new(),
        }
    }

    /// Applies `f` to every value, preserving keys.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> DirTree<U> {
        DirTree {
            root: f(self.root),
            subs: self.subs.into_iter().map(|(k, v)| (k, f(v))).collect(),
        }
    }

    /// Number of directories in the tree, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subs.len() + 1
    }

    /// Always `false`; a tree has at least its root.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

/// Fingerprints of a root and its immediate sub-directories.
pub type FingerprintTree = DirTree<FingerprintRecord>;

/// Normalizes a relative directory path into a tree key.
///
/// Backslashes become `/` and a leading `./` is removed.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use tasksmith_core::normalize_key;
///
/// assert_eq!(normalize_key(Path::new("./tools")), "tools");
/// assert_eq!(normalize_key(Path::new("nested\\tools")), "nested/tools");
/// ```
#[must_use]
pub fn normalize_key(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let mut key = raw.as_str();
    while let Some(rest) = key.strip_prefix("./") {
        key = rest;
    }
    key.trim_end_matches('/').to_string()
}
