//! Root plus immediate sub-directory traversal.
//!
//! The walk is one level deep: the root, then each direct child directory
//! in name order. Hidden directories and `target` are skipped. The first
//! failure stops the walk and is returned with its directory attached.

use crate::registry::discover;
use std::path::{Path, PathBuf};
use tasksmith_core::{DirTree, Discovery, DiscoveryConfig, Error, Result, normalize_key};
use tracing::debug;
use walkdir::WalkDir;

fn is_skipped(name: &str) -> bool {
    name.starts_with('.') || name == "target"
}

/// Lists the immediate sub-directories of `root` in name order.
///
/// # Errors
///
/// Returns [`Error::Io`] if `root` cannot be read.
pub fn sub_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            Error::io(path, e.into())
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if is_skipped(&name) {
            debug!(dir = %entry.path().display(), "skipping directory");
            continue;
        }
        dirs.push(entry.into_path());
    }
    Ok(dirs)
}

/// Applies `op` to `root` and to each immediate sub-directory.
///
/// Sub-directory results are keyed by their normalized relative name.
///
/// # Errors
///
/// Returns the first error produced by `op`, wrapped with the offending
/// directory, or an I/O error listing `root`.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use tasksmith_discovery::walk_surface;
///
/// let tree = walk_surface(Path::new("."), |dir| Ok(dir.display().to_string()))?;
/// println!("{} directories", tree.len());
/// # Ok::<(), tasksmith_core::Error>(())
/// ```
pub fn walk_surface<T>(root: &Path, mut op: impl FnMut(&Path) -> Result<T>) -> Result<DirTree<T>> {
    let root_value = op(root).map_err(|e| e.in_dir(root))?;
    let mut tree = DirTree::new(root_value);

    for dir in sub_dirs(root)? {
        let key = normalize_key(dir.strip_prefix(root).unwrap_or(&dir));
        let value = op(&dir).map_err(|e| e.in_dir(&dir))?;
        tree.subs.insert(key, value);
    }

    Ok(tree)
}

/// Discovers the root and every immediate sub-directory.
///
/// # Errors
///
/// Fails fast on the first directory that fails discovery.
pub fn discover_tree(root: &Path, config: &DiscoveryConfig) -> Result<DirTree<Discovery>> {
    walk_surface(root, |dir| discover(dir, config))
}
