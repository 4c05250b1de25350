//! List command implementation.
//!
//! Shows every task discovered in a directory and its immediate
//! sub-directories without generating anything.

use super::common::load_project;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tasksmith_core::cli::{ExitCode, OutputFormat};
use tasksmith_core::{Discovery, DiscoveryConfig, FunctionRecord, PackageCatalog};
use tasksmith_discovery::{discover, walk_surface};
use tracing::info;

/// One discovered task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskListing {
    /// Command name
    pub command: String,
    /// Classified signature, `argument/context/return`
    pub signature: String,
    /// Marked as the default task
    pub default: bool,
    /// First doc line
    pub synopsis: String,
    /// Declared flag names
    pub flags: Vec<String>,
    /// Declaring file
    pub file: String,
}

impl From<&FunctionRecord> for TaskListing {
    fn from(record: &FunctionRecord) -> Self {
        Self {
            command: record.command.clone(),
            signature: record.signature.to_string(),
            default: record.default,
            synopsis: record.synopsis.clone(),
            flags: record.flags.iter().map(|f| f.name.clone()).collect(),
            file: record.file.clone(),
        }
    }
}

/// Discovery result for one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PackageListing {
    /// No eligible source file
    NoSource,
    /// Eligible files were found
    Package {
        /// Package name
        package: String,
        /// Binary the package builds into
        binary: String,
        /// Discovered tasks
        tasks: Vec<TaskListing>,
    },
    /// Discovery failed for this directory
    Invalid {
        /// Failure description
        error: String,
    },
}

impl From<&PackageCatalog> for PackageListing {
    fn from(catalog: &PackageCatalog) -> Self {
        Self::Package {
            package: catalog.name.clone(),
            binary: catalog.binary_name.clone(),
            tasks: catalog.functions.iter().map(TaskListing::from).collect(),
        }
    }
}

/// Listing of a whole tree.
#[derive(Debug, Serialize)]
pub struct TreeListing {
    /// Root directory
    pub root_dir: PathBuf,
    /// Root package
    pub root: PackageListing,
    /// Sub-directories by name
    pub subs: BTreeMap<String, PackageListing>,
}

impl TreeListing {
    /// Total number of tasks across the tree.
    #[must_use]
    pub fn task_count(&self) -> usize {
        std::iter::once(&self.root)
            .chain(self.subs.values())
            .map(|listing| match listing {
                PackageListing::Package { tasks, .. } => tasks.len(),
                _ => 0,
            })
            .sum()
    }
}

/// Discovers `root` and its sub-directories, keeping per-directory failures.
///
/// # Errors
///
/// Returns an error only if the tree itself cannot be walked.
pub fn list_tree(root: &Path, config: &DiscoveryConfig) -> Result<TreeListing> {
    let tree = walk_surface(root, |dir| {
        Ok(match discover(dir, config) {
            Ok(Discovery::NoSource) => PackageListing::NoSource,
            Ok(Discovery::Catalog(catalog)) => PackageListing::from(&catalog),
            Err(e) => PackageListing::Invalid {
                error: e.to_string(),
            },
        })
    })
    .with_context(|| format!("failed to scan {}", root.display()))?;

    Ok(TreeListing {
        root_dir: root.to_path_buf(),
        root: tree.root,
        subs: tree.subs,
    })
}

/// Runs the list command.
pub fn run(dir: &Path, output_format: OutputFormat) -> Result<ExitCode> {
    let (root, config) = load_project(dir)?;
    let listing = list_tree(&root, &config.discovery())?;
    info!(root = %root.display(), tasks = listing.task_count(), "listed tasks");

    let formatted = crate::formatters::format_output(&listing, output_format)?;
    println!("{formatted}");
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_tree_keeps_invalid_directories() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("root.rs"),
            "#![cfg(tasksmith)]\n/// Says hi.\n/// @default\npub fn hi() {}\n",
        )
        .unwrap();
        let dup = dir.path().join("dup");
        std::fs::create_dir(&dup).unwrap();
        std::fs::write(
            dup.join("dup.rs"),
            "#![cfg(tasksmith)]\n/// @default\npub fn a() {}\n/// @default\npub fn b() {}\n",
        )
        .unwrap();
        std::fs::create_dir(dir.path().join("notes")).unwrap();

        let listing = list_tree(dir.path(), &DiscoveryConfig::default()).unwrap();

        let PackageListing::Package { tasks, .. } = &listing.root else {
            panic!("expected root package, got {:?}", listing.root);
        };
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].command, "hi");
        assert!(tasks[0].default);
        assert_eq!(tasks[0].synopsis, "Says hi.");
        assert_eq!(tasks[0].signature, "none/none/none");

        assert!(matches!(listing.subs["dup"], PackageListing::Invalid { .. }));
        assert_eq!(listing.subs["notes"], PackageListing::NoSource);
        assert_eq!(listing.task_count(), 1);
    }

    #[test]
    fn test_listing_serializes_with_status_tag() {
        let value = serde_json::to_value(PackageListing::NoSource).unwrap();
        assert_eq!(value["status"], "no_source");
    }
}
