//! `.gitignore` maintenance.

use std::io::Write;
use std::path::Path;
use tasksmith_core::{Error, Result, WORK_DIR_NAME};
use tracing::debug;

fn is_covered(line: &str) -> bool {
    let entry = line.trim().trim_start_matches('/').trim_end_matches('/');
    entry == WORK_DIR_NAME
}

/// Appends the working directory name to `dir/.gitignore` unless an
/// existing entry already covers it. The file is created when missing.
///
/// Returns `true` when the file was changed.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read or written.
///
/// # Examples
///
/// ```
/// use tasksmith_build::gitignore::ensure_ignored;
///
/// let dir = tempfile::tempdir().unwrap();
/// assert!(ensure_ignored(dir.path()).unwrap());
/// assert!(!ensure_ignored(dir.path()).unwrap());
/// ```
pub fn ensure_ignored(dir: &Path) -> Result<bool> {
    let path = dir.join(".gitignore");
    let existing = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(Error::io(&path, e)),
    };

    if existing.lines().any(is_covered) {
        return Ok(false);
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| Error::io(&path, e))?;
    let separator = if existing.is_empty() || existing.ends_with('\n') {
        ""
    } else {
        "\n"
    };
    writeln!(file, "{separator}{WORK_DIR_NAME}").map_err(|e| Error::io(&path, e))?;

    debug!(path = %path.display(), "added {WORK_DIR_NAME} to .gitignore");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_appends_to_existing_file_without_newline() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "/target").unwrap();

        assert!(ensure_ignored(dir.path()).unwrap());
        let text = std::fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert_eq!(text, "/target\n.tasksmith\n");
    }

    #[test]
    fn test_existing_entry_variants() {
        for entry in [".tasksmith", "/.tasksmith", ".tasksmith/", "  .tasksmith  "] {
            let dir = TempDir::new().unwrap();
            std::fs::write(dir.path().join(".gitignore"), format!("target\n{entry}\n")).unwrap();
            assert!(!ensure_ignored(dir.path()).unwrap(), "{entry}");
        }
    }

    #[test]
    fn test_similar_names_do_not_count() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".gitignore"), ".tasksmith-old\n").unwrap();
        assert!(ensure_ignored(dir.path()).unwrap());
    }
}
