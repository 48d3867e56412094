//! Duplicate removal.
//!
//! Duplicates are removed permanently with a single `remove_file`. There is
//! no trash and no retry: a failed removal stops the run.

use std::fs;
use std::path::Path;

use crate::error::DedupError;

/// Permanently delete a duplicate file.
///
/// # Errors
///
/// [`DedupError::Remove`] if the filesystem refuses the removal.
pub fn remove_duplicate(path: &Path) -> Result<(), DedupError> {
    fs::remove_file(path).map_err(|source| {
        log::error!("Remove failed for {}: {}", path.display(), source);
        DedupError::Remove {
            path: path.to_path_buf(),
            source,
        }
    })?;
    log::debug!("Removed duplicate {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remove_duplicate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dup.txt");
        fs::write(&path, b"dup").unwrap();

        remove_duplicate(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_remove_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = remove_duplicate(&dir.path().join("missing.txt")).unwrap_err();
        match err {
            DedupError::Remove { path, source } => {
                assert!(path.ends_with("missing.txt"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected Remove error, got {other:?}"),
        }
    }
}
