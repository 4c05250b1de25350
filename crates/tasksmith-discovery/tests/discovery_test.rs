//! End-to-end discovery tests over scratch package directories.

use std::path::Path;
use tasksmith_core::{
    ArgumentShape, ContextConvention, Discovery, DiscoveryConfig, FlagKind, PackageCatalog,
    PassMode, ReturnShape,
};
use tasksmith_discovery::{discover, discover_tree};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, text: &str) {
    std::fs::write(dir.join(name), text).unwrap();
}

fn catalog(dir: &Path) -> PackageCatalog {
    discover(dir, &DiscoveryConfig::default())
        .unwrap()
        .into_catalog()
        .expect("directory has eligible sources")
}

#[test]
fn test_single_default_function() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "katana.rs",
        r#"#![cfg(tasksmith)]

/// Slashes things.
/// @default
pub fn slash() -> Result<(), std::io::Error> {
    Ok(())
}
"#,
    );

    let catalog = catalog(dir.path());
    assert_eq!(catalog.functions.len(), 1);

    let slash = &catalog.functions[0];
    assert_eq!(slash.name, "slash");
    assert_eq!(slash.signature.argument, ArgumentShape::NoArgument);
    assert_eq!(slash.signature.returns, ReturnShape::Error);
    assert!(slash.default);
    assert_eq!(slash.synopsis, "Slashes things.");
    assert_eq!(slash.description, "Slashes things.");
    assert_eq!(catalog.default_function().map(|f| f.name.as_str()), Some("slash"));
}

#[test]
fn test_context_with_string_argument() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "greet.rs",
        r#"#![cfg(tasksmith)]
use tokio_util::sync::CancellationToken;

pub fn greet(ctx: CancellationToken, name: &str) {
    let _ = (ctx, name);
}
"#,
    );

    let catalog = catalog(dir.path());
    let greet = &catalog.functions[0];
    assert_eq!(greet.signature.argument, ArgumentShape::String);
    assert_eq!(greet.signature.context, ContextConvention::Standard);
    assert_eq!(greet.signature.returns, ReturnShape::None);
    assert_eq!(greet.binding.args[0].pass, PassMode::Ref);
    assert!(catalog.uses_context(ContextConvention::Standard));
}

#[test]
fn test_two_defaults_fail() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "a.rs",
        "#![cfg(tasksmith)]\n/// @default\npub fn one() {}\n",
    );
    write(
        dir.path(),
        "b.rs",
        "#![cfg(tasksmith)]\n/// @default\npub fn two() {}\n",
    );

    let err = discover(dir.path(), &DiscoveryConfig::default()).unwrap_err();
    assert!(err.is_duplicate_default());
    let message = err.to_string();
    assert!(message.contains("one") && message.contains("two"));
}

#[test]
fn test_zero_defaults_succeed() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.rs", "#![cfg(tasksmith)]\npub fn one() {}\npub fn two() {}\n");

    let catalog = catalog(dir.path());
    assert_eq!(catalog.functions.len(), 2);
    assert!(catalog.default_function().is_none());
}

#[test]
fn test_flag_marker_requirements() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "a.rs",
        "#![cfg(tasksmith)]\n/// @flag()\npub fn broken() {}\n",
    );
    let err = discover(dir.path(), &DiscoveryConfig::default()).unwrap_err();
    assert!(err.is_invalid_marker());

    write(
        dir.path(),
        "a.rs",
        "#![cfg(tasksmith)]\n/// Waits.\n/// @flag(name => timeout, type => duration)\npub fn wait() {}\n",
    );
    let catalog = catalog(dir.path());
    let flag = &catalog.functions[0].flags[0];
    assert_eq!(flag.name, "timeout");
    assert_eq!(flag.kind, FlagKind::Duration);
    assert_eq!(catalog.functions[0].description, "Waits.");
}

#[test]
fn test_unsupported_functions_are_skipped() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "a.rs",
        r#"#![cfg(tasksmith)]
pub fn pair(a: String, b: String) { let _ = (a, b); }
pub fn count() -> usize { 0 }
fn private_helper() {}
pub fn ok(input: String) { let _ = input; }
"#,
    );

    let catalog = catalog(dir.path());
    let names: Vec<_> = catalog.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["ok"]);
}

#[test]
fn test_every_shape_from_source() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "shapes.rs",
        r#"#![cfg(tasksmith)]
use std::collections::HashMap;
use std::io::{Read, Write};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use crate::models::Woofer;

#[derive(serde::Deserialize)]
pub struct Movie { pub name: String }

pub struct TaskContext;

pub fn none() {}
pub fn string(s: String) {}
pub fn map(m: HashMap<String, Value>) {}
pub fn by_value(m: Movie) {}
pub fn by_ref(m: &Movie) {}
pub fn imported(w: Woofer) {}
pub fn reader(r: &mut dyn Read) {}
pub fn writer(w: &mut dyn Write) {}
pub fn string_writer(s: &str, w: &mut impl Write) {}
pub fn map_writer(m: &HashMap<String, Value>, w: &mut dyn Write) {}
pub fn struct_writer(m: &Movie, w: Box<dyn Write>) {}
pub fn imported_writer(w: &Woofer, out: &mut dyn Write) {}
pub fn reader_writer(r: impl Read, w: impl Write) {}
pub fn custom(ctx: &TaskContext) -> anyhow::Result<()> { Ok(()) }
pub fn standard(ctx: CancellationToken, w: &mut dyn Write) {}
"#,
    );

    let catalog = catalog(dir.path());
    let shape = |name: &str| catalog.find(name).unwrap().signature.argument;

    assert_eq!(shape("none"), ArgumentShape::NoArgument);
    assert_eq!(shape("string"), ArgumentShape::String);
    assert_eq!(shape("map"), ArgumentShape::Map);
    assert_eq!(shape("by_value"), ArgumentShape::Struct);
    assert_eq!(shape("by_ref"), ArgumentShape::StructPointer);
    assert_eq!(shape("imported"), ArgumentShape::Imported);
    assert_eq!(shape("reader"), ArgumentShape::Reader);
    assert_eq!(shape("writer"), ArgumentShape::Writer);
    assert_eq!(shape("string_writer"), ArgumentShape::StringWithWriter);
    assert_eq!(shape("map_writer"), ArgumentShape::MapWithWriter);
    assert_eq!(shape("struct_writer"), ArgumentShape::StructWithWriter);
    assert_eq!(shape("imported_writer"), ArgumentShape::ImportedWithWriter);
    assert_eq!(shape("reader_writer"), ArgumentShape::ReaderWithWriter);

    let custom = catalog.find("custom").unwrap();
    assert_eq!(custom.signature.context, ContextConvention::Custom);
    assert_eq!(custom.signature.returns, ReturnShape::Error);
    assert_eq!(
        catalog.find("standard").unwrap().signature.context,
        ContextConvention::Standard
    );

    let imports = catalog.imports();
    assert_eq!(imports.len(), 1);
    assert!(imports.contains_key("crate::models"));

    assert_eq!(catalog.max_name_len, "imported-writer".len());
    assert_eq!(catalog.find("string-writer").unwrap().name, "string_writer");
}

#[test]
fn test_binary_name_first_wins_in_file_order() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "b.rs",
        "//! @binaryName(name => Second)\n#![cfg(tasksmith)]\npub fn b() {}\n",
    );
    write(
        dir.path(),
        "a.rs",
        "#![cfg(tasksmith)]\n/// @binaryName(name => First)\npub fn a() {}\n",
    );

    let catalog = catalog(dir.path());
    assert_eq!(catalog.binary_name, "first");
    assert_eq!(catalog.functions[0].binary_name.as_deref(), Some("First"));
}

#[test]
fn test_binary_name_on_non_task_items_is_kept() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "a.rs",
        "#![cfg(tasksmith)]\n/// @binaryName(name => helper-bin)\nfn helper() {}\n",
    );
    write(
        dir.path(),
        "b.rs",
        "#![cfg(tasksmith)]\n/// @binaryName(name => skipped)\npub fn pair(a: String, b: String) { let _ = (a, b); }\npub fn run() {}\n",
    );

    let catalog = catalog(dir.path());
    assert_eq!(catalog.binary_name, "helper-bin");
    assert_eq!(catalog.functions.len(), 1);
}

#[test]
fn test_malformed_markers_on_skipped_items_fail() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "a.rs",
        "#![cfg(tasksmith)]\n/// @flag()\npub fn pair(a: String, b: String) { let _ = (a, b); }\n",
    );
    let err = discover(dir.path(), &DiscoveryConfig::default()).unwrap_err();
    assert!(err.is_invalid_marker());
    assert!(err.to_string().contains("a.rs::pair"));

    write(
        dir.path(),
        "a.rs",
        "#![cfg(tasksmith)]\n/// @binaryName(title => ops)\nstruct Settings;\npub fn run() {}\n",
    );
    let err = discover(dir.path(), &DiscoveryConfig::default()).unwrap_err();
    assert!(err.is_invalid_marker());
}

#[test]
fn test_struct_exported_is_recorded() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "a.rs",
        "#![cfg(tasksmith)]\npub struct Movie { pub name: String }\nstruct Draft { name: String }\n",
    );
    write(
        dir.path(),
        "b.rs",
        "#![cfg(tasksmith)]\npub fn watch(m: Movie) { let _ = m; }\npub fn edit(d: &Draft) { let _ = d; }\npub fn greet(name: String) { let _ = name; }\n",
    );

    let catalog = catalog(dir.path());
    assert_eq!(catalog.find("watch").unwrap().struct_exported, Some(true));
    assert_eq!(catalog.find("edit").unwrap().struct_exported, Some(false));
    assert_eq!(catalog.find("greet").unwrap().struct_exported, None);
}

#[test]
fn test_binary_name_defaults_to_package_with_windows_suffix() {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("Ops-Tasks");
    std::fs::create_dir(&dir).unwrap();
    write(&dir, "a.rs", "#![cfg(tasksmith)]\npub fn a() {}\n");

    let config = DiscoveryConfig {
        target_os: "windows".to_string(),
        ..DiscoveryConfig::default()
    };
    let catalog = discover(&dir, &config).unwrap().into_catalog().unwrap();
    assert_eq!(catalog.name, "opstasks");
    assert_eq!(catalog.binary_name, "opstasks.exe");
    assert_eq!(catalog.crate_name(), "opstasks");
}

#[test]
fn test_embedded_sources_are_stripped() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "mod.rs",
        "//! Package docs.\n#![cfg(tasksmith)]\n\npub fn a() {}\n",
    );

    let catalog = catalog(dir.path());
    let file = &catalog.files[0];
    assert_eq!(file.module, "task_mod");
    assert_eq!(file.source, "pub fn a() {}\n");
}

#[test]
fn test_no_source_and_empty_catalog_are_distinct() {
    let dir = TempDir::new().unwrap();
    assert_eq!(
        discover(dir.path(), &DiscoveryConfig::default()).unwrap(),
        Discovery::NoSource
    );

    write(dir.path(), "a.rs", "#![cfg(tasksmith)]\nfn hidden() {}\n");
    let discovery = discover(dir.path(), &DiscoveryConfig::default()).unwrap();
    assert!(discovery.catalog().is_some_and(PackageCatalog::is_empty));
    assert!(!discovery.is_buildable());
}

#[test]
fn test_discover_tree_keys_subpackages() {
    let root = TempDir::new().unwrap();
    write(root.path(), "root.rs", "#![cfg(tasksmith)]\npub fn top() {}\n");
    let sub = root.path().join("db");
    std::fs::create_dir(&sub).unwrap();
    write(&sub, "db.rs", "#![cfg(tasksmith)]\npub fn migrate() {}\n");
    std::fs::create_dir(root.path().join("docs")).unwrap();

    let tree = discover_tree(root.path(), &DiscoveryConfig::default()).unwrap();
    assert!(tree.root.is_buildable());
    assert!(tree.subs["db"].is_buildable());
    assert_eq!(tree.subs["docs"], Discovery::NoSource);
}
