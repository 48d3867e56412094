//! Scanner module for path classification and file fingerprinting.
//!
//! This module provides functionality for:
//! - Reading fresh metadata for one dequeued path ([`Entry`])
//! - Deciding what to do with that path ([`walker`])
//! - Streaming content digests with a run-wide algorithm ([`hasher`])
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory expansion and skip rules
//! - [`hasher`]: MD5/SHA-1/SHA-256/BLAKE3 fingerprints (streaming)
//! - [`path_utils`]: Hidden-name detection and display helpers

pub mod hasher;
pub mod path_utils;
pub mod walker;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DedupError;

// Re-export main types
pub use hasher::{DigestAlgorithm, Fingerprint, Hasher};
pub use walker::{SkipReason, Visit, Walker};

/// Kind of filesystem entry, as far as dedup cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    Regular,
    /// Symlinks, devices, sockets, fifos
    Other,
}

/// A path plus the metadata read when it was dequeued.
///
/// Never cached: the tree is being mutated while it is walked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Path as it was enqueued
    pub path: PathBuf,
    /// Directory, regular file or other
    pub kind: EntryKind,
    /// Basename starts with a dot
    pub hidden: bool,
}

impl Entry {
    /// Stat `path`. Symlinks are only followed when `follow` is set, which
    /// the walker does for input roots alone.
    ///
    /// # Errors
    ///
    /// [`DedupError::Stat`] if the metadata call fails.
    pub fn read(path: &Path, follow: bool) -> Result<Self, DedupError> {
        let metadata = if follow {
            fs::metadata(path)
        } else {
            fs::symlink_metadata(path)
        }
        .map_err(|source| DedupError::Stat {
            path: path.to_path_buf(),
            source,
        })?;

        let file_type = metadata.file_type();
        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::Regular
        } else {
            EntryKind::Other
        };

        Ok(Self {
            path: path.to_path_buf(),
            kind,
            hidden: path_utils::is_hidden(path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_entry_read_kinds() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("f.txt");
        fs::write(&file, b"x").unwrap();

        let entry = Entry::read(dir.path(), true).unwrap();
        assert_eq!(entry.kind, EntryKind::Directory);

        let entry = Entry::read(&file, false).unwrap();
        assert_eq!(entry.kind, EntryKind::Regular);
        assert!(!entry.hidden);
    }

    #[test]
    fn test_entry_hidden_flag() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join(".secret");
        fs::write(&file, b"x").unwrap();
        assert!(Entry::read(&file, false).unwrap().hidden);
    }

    #[cfg(unix)]
    #[test]
    fn test_entry_follow_only_when_asked() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("real");
        fs::create_dir(&target).unwrap();
        let link = dir.path().join("alias");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(Entry::read(&link, false).unwrap().kind, EntryKind::Other);
        assert_eq!(Entry::read(&link, true).unwrap().kind, EntryKind::Directory);
    }

    #[test]
    fn test_entry_missing_path() {
        let err = Entry::read(Path::new("/no/such/entry"), false).unwrap_err();
        assert!(matches!(err, DedupError::Stat { .. }));
    }
}
