//! Per-item classification for the directory traversal.
//!
//! # Overview
//!
//! The traversal is lazy: the [`Walker`] looks at one dequeued path at a
//! time, reading its metadata fresh from the filesystem. Directories expand
//! into child paths for the work queue, regular files are handed on for
//! fingerprinting and everything else is skipped.
//!
//! Rules applied per path:
//!
//! - Subdirectories below the root are only expanded when recursion is on.
//! - A child whose path equals one of the *other* input roots is never
//!   enqueued; that root gets its own traversal in caller order.
//! - Hidden files (leading dot) and non-regular files (symlinks, devices,
//!   sockets) are skipped. Symlinks are never followed below the root.
//!
//! # Example
//!
//! ```no_run
//! use dedup::scanner::{Visit, Walker};
//! use std::path::PathBuf;
//!
//! let roots = vec![PathBuf::from("dst"), PathBuf::from("src")];
//! let walker = Walker::new(&roots[1], &roots, true);
//! match walker.visit(&roots[1]).unwrap() {
//!     Visit::Expand(children) => println!("{} children", children.len()),
//!     other => println!("{other:?}"),
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use super::{Entry, EntryKind};
use crate::error::DedupError;

/// What to do with one dequeued path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit {
    /// A directory that was listed; children go back on the queue.
    Expand(Vec<PathBuf>),
    /// A regular, visible file to fingerprint.
    File(Entry),
    /// Nothing to do.
    Skip(SkipReason),
}

/// Why a path was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Subdirectory of the root with recursion disabled
    NotRecursive,
    /// File name starts with a dot
    Hidden,
    /// Symlink, device, socket or fifo
    NotRegular,
}

/// Classifies paths for one input root.
#[derive(Debug, Clone, Copy)]
pub struct Walker<'a> {
    root: &'a Path,
    roots: &'a [PathBuf],
    recursive: bool,
}

impl<'a> Walker<'a> {
    /// Create a walker for `root`, one of the ordered input `roots`.
    #[must_use]
    pub fn new(root: &'a Path, roots: &'a [PathBuf], recursive: bool) -> Self {
        Self {
            root,
            roots,
            recursive,
        }
    }

    /// Classify `path` and, for directories, list its children.
    ///
    /// # Errors
    ///
    /// [`DedupError::Stat`] or [`DedupError::ReadDir`] when the filesystem
    /// refuses the metadata or listing call.
    pub fn visit(&self, path: &Path) -> Result<Visit, DedupError> {
        let is_root = path == self.root;
        let entry = Entry::read(path, is_root)?;

        match entry.kind {
            EntryKind::Directory => {
                if !is_root && !self.recursive {
                    log::trace!("Not descending into {}", path.display());
                    return Ok(Visit::Skip(SkipReason::NotRecursive));
                }
                self.list_children(path).map(Visit::Expand)
            }
            EntryKind::Regular if entry.hidden => Ok(Visit::Skip(SkipReason::Hidden)),
            EntryKind::Regular => Ok(Visit::File(entry)),
            EntryKind::Other => Ok(Visit::Skip(SkipReason::NotRegular)),
        }
    }

    /// Whether `path` is an input root other than the one being walked.
    fn is_foreign_root(&self, path: &Path) -> bool {
        self.roots
            .iter()
            .any(|root| root.as_path() != self.root && root.as_path() == path)
    }

    fn list_children(&self, dir: &Path) -> Result<Vec<PathBuf>, DedupError> {
        let read_dir_err = |source| DedupError::ReadDir {
            path: dir.to_path_buf(),
            source,
        };

        let mut children = Vec::new();
        for dirent in fs::read_dir(dir).map_err(read_dir_err)? {
            let child = dirent.map_err(read_dir_err)?.path();
            if self.is_foreign_root(&child) {
                log::debug!("Leaving input root {} for its own pass", child.display());
                continue;
            }
            children.push(child);
        }
        children.sort();
        Ok(children)
    }
}
