//! Content-addressed index of canonical paths.
//!
//! Maps a [`Fingerprint`] to the first path that produced it. The lookup and
//! the insert-if-absent happen under one lock acquisition, so two workers
//! racing on the same new fingerprint cannot both see it as unique.
//!
//! The index never revalidates its entries. If a canonical file is removed
//! by something outside the run, later duplicates of it are still treated as
//! duplicates of the missing path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::scanner::Fingerprint;

/// Result of [`ContentIndex::claim`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// This exact path is already the canonical entry.
    AlreadyIndexed,
    /// Another path owns this fingerprint.
    Duplicate {
        /// The surviving copy
        canonical: PathBuf,
    },
    /// The fingerprint was new; this path is now canonical.
    Unique,
}

/// Concurrency-safe fingerprint to canonical path map.
#[derive(Debug, Default)]
pub struct ContentIndex {
    entries: Mutex<HashMap<Fingerprint, PathBuf>>,
}

impl ContentIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Fingerprint, PathBuf>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check `fingerprint` and record `path` as canonical if it was absent.
    pub fn claim(&self, fingerprint: Fingerprint, path: &Path) -> Claim {
        let mut entries = self.lock();
        match entries.get(&fingerprint) {
            Some(existing) if existing == path => Claim::AlreadyIndexed,
            Some(existing) => Claim::Duplicate {
                canonical: existing.clone(),
            },
            None => {
                entries.insert(fingerprint, path.to_path_buf());
                Claim::Unique
            }
        }
    }

    /// Canonical path recorded for `fingerprint`.
    #[must_use]
    pub fn canonical(&self, fingerprint: &Fingerprint) -> Option<PathBuf> {
        self.lock().get(fingerprint).cloned()
    }

    /// Number of distinct fingerprints seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
