//! Content fingerprints.
//!
//! A fingerprint is the base64 (standard alphabet) encoding of the
//! concatenated BLAKE3 digests of a directory's eligible files, in scan
//! order. Paths never enter the hash, so moving a tree does not force a
//! rebuild, while reordering or editing files does.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tasksmith_core::{Error, FingerprintRecord, FingerprintTree, Result};
use tasksmith_discovery::{parser, walk_surface};

fn digest_file(path: &Path) -> Result<blake3::Hash> {
    let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut hasher = blake3::Hasher::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| Error::io(path, e))?;
    Ok(hasher.finalize())
}

/// Fingerprints `files` in the given order.
///
/// # Errors
///
/// Returns [`Error::Io`] naming the first file that cannot be opened or
/// read; no partial fingerprint is produced.
///
/// # Examples
///
/// ```
/// use tasksmith_build::fingerprint::fingerprint_files;
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("a.rs");
/// std::fs::write(&path, "pub fn a() {}").unwrap();
///
/// let first = fingerprint_files(&[path.clone()]).unwrap();
/// assert_eq!(first, fingerprint_files(&[path]).unwrap());
/// assert_eq!(fingerprint_files(&[]).unwrap(), "");
/// ```
pub fn fingerprint_files(files: &[PathBuf]) -> Result<String> {
    let mut digests = Vec::with_capacity(files.len() * blake3::OUT_LEN);
    for path in files {
        digests.extend_from_slice(digest_file(path)?.as_bytes());
    }
    Ok(STANDARD.encode(digests))
}

/// Fingerprints the eligible files of one directory.
///
/// # Errors
///
/// Returns [`Error::Io`] if the directory or one of its files cannot be read.
pub fn fingerprint_dir(dir: &Path, build_tag: &str) -> Result<FingerprintRecord> {
    let files = parser::eligible_files(dir, build_tag)?;

    let mut digests = Vec::with_capacity(files.len() * blake3::OUT_LEN);
    let mut per_file = BTreeMap::new();
    for path in &files {
        let digest = digest_file(path)?;
        digests.extend_from_slice(digest.as_bytes());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        per_file.insert(name, STANDARD.encode(digest.as_bytes()));
    }

    Ok(FingerprintRecord {
        dir: dir.to_path_buf(),
        hash: STANDARD.encode(digests),
        files: per_file,
    })
}

/// Fingerprints the root and each immediate sub-directory.
///
/// # Errors
///
/// Fails fast on the first unreadable directory, with the directory attached.
pub fn fingerprint_tree(root: &Path, build_tag: &str) -> Result<FingerprintTree> {
    walk_surface(root, |dir| fingerprint_dir(dir, build_tag))
}
