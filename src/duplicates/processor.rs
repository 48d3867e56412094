//! Per-file dedup and merge decisions.
//!
//! For one regular file:
//!
//! 1. Fingerprint the full content.
//! 2. Claim the fingerprint in the [`ContentIndex`].
//! 3. Same path already canonical: nothing to do.
//! 4. Another path is canonical: the file is a duplicate. Remove it unless
//!    duplicates are kept.
//! 5. New fingerprint: the file is canonical. When this root is being merged,
//!    move it into the destination under a collision-free name.
//!
//! At most one remove or one rename happens per file. In dry-run the same
//! decisions are made and reported, and the filesystem is left alone.

use std::path::{Path, PathBuf};

use super::index::{Claim, ContentIndex};
use crate::actions::{move_file, remove_duplicate};
use crate::engine::{RunContext, RunOptions};
use crate::error::DedupError;
use crate::progress::RunEvent;

/// How one input root is treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootPlan {
    /// The merge destination (first input root)
    pub destination: PathBuf,
    /// Root currently being traversed
    pub root: PathBuf,
    /// This root is the destination: dedup only
    pub first: bool,
    /// Merging is enabled for the run
    pub merge: bool,
}

impl RootPlan {
    #[must_use]
    pub fn new(destination: &Path, root: &Path, merge: bool) -> Self {
        Self {
            destination: destination.to_path_buf(),
            root: root.to_path_buf(),
            first: destination == root,
            merge,
        }
    }

    /// Whether unique files are moved into the destination.
    #[must_use]
    pub fn relocates(&self) -> bool {
        self.merge && !self.first
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Path was already the canonical entry
    AlreadyIndexed,
    /// Duplicate left on disk (`keep`)
    KeptDuplicate { canonical: PathBuf },
    /// Duplicate removed
    Removed { canonical: PathBuf },
    /// Unique, left in place
    Indexed,
    /// Unique, moved into the destination
    Moved { to: PathBuf },
}

/// Applies the dedup/merge rules for one root.
#[derive(Debug, Clone, Copy)]
pub struct Processor<'a> {
    context: &'a RunContext,
    options: &'a RunOptions,
    plan: &'a RootPlan,
}

impl<'a> Processor<'a> {
    #[must_use]
    pub fn new(context: &'a RunContext, options: &'a RunOptions, plan: &'a RootPlan) -> Self {
        Self {
            context,
            options,
            plan,
        }
    }

    fn index(&self) -> &ContentIndex {
        &self.context.index
    }

    /// Process one regular file.
    ///
    /// # Errors
    ///
    /// Read, remove or rename failures. Each is fatal for the run.
    pub fn process(&self, path: &Path) -> Result<Outcome, DedupError> {
        let fingerprint = self.context.hasher.fingerprint_file(path)?;
        self.context.stats.record_hash();

        match self.index().claim(fingerprint, path) {
            Claim::AlreadyIndexed => Ok(Outcome::AlreadyIndexed),
            Claim::Duplicate { canonical } => self.handle_duplicate(path, canonical),
            Claim::Unique => self.handle_unique(path),
        }
    }

    fn handle_duplicate(&self, path: &Path, canonical: PathBuf) -> Result<Outcome, DedupError> {
        if self.options.keep {
            log::debug!("Keeping {} (dupe of {})", path.display(), canonical.display());
            return Ok(Outcome::KeptDuplicate { canonical });
        }

        if self.options.dry_run {
            self.context.destinations.vacate(path);
        } else {
            remove_duplicate(path)?;
        }
        self.context.stats.record_delete();
        self.context.emit(&RunEvent::Removed {
            path: path.to_path_buf(),
            canonical: canonical.clone(),
        });
        Ok(Outcome::Removed { canonical })
    }

    fn handle_unique(&self, path: &Path) -> Result<Outcome, DedupError> {
        if !self.plan.relocates() {
            return Ok(Outcome::Indexed);
        }

        // Regular files reaching here always have a basename.
        let Some(name) = path.file_name() else {
            return Ok(Outcome::Indexed);
        };

        let dry_run = self.options.dry_run;
        let to = self
            .context
            .destinations
            .claim(&self.plan.destination, name, |to| {
                if dry_run {
                    Ok(())
                } else {
                    move_file(path, to)
                }
            })?;

        self.context.stats.record_move();
        self.context.emit(&RunEvent::Moved {
            from: path.to_path_buf(),
            to: to.clone(),
        });
        Ok(Outcome::Moved { to })
    }
}
