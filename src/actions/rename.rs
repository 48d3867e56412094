//! Collision-safe relocation into the destination root.
//!
//! # Naming
//!
//! [`next_available`] returns the first of `base.ext`, `base-2.ext`,
//! `base-3.ext`, ... that is not taken. Numbering starts at 2; a `-1`
//! suffix is never produced. The extension is whatever follows the last dot
//! of the file name, so `archive.tar.gz` becomes `archive.tar-2.gz`.
//!
//! # Serialization
//!
//! Choosing a name is check-then-use against the live filesystem. The
//! [`DestinationLedger`] holds one lock across the choice and the rename,
//! and remembers every name it handed out. Two workers in the same run can
//! therefore never pick the same destination, and a dry-run (where nothing
//! is renamed) reports the same names a real run would. Other processes
//! writing into the destination are not accounted for.

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::DedupError;

/// Candidate file name for attempt `n` (1 = the original name).
///
/// ```
/// use dedup::actions::rename::candidate_name;
/// use std::ffi::OsStr;
///
/// assert_eq!(candidate_name(OsStr::new("foo.txt"), 1), "foo.txt");
/// assert_eq!(candidate_name(OsStr::new("foo.txt"), 2), "foo-2.txt");
/// assert_eq!(candidate_name(OsStr::new("README"), 3), "README-3");
/// ```
#[must_use]
pub fn candidate_name(name: &OsStr, n: u32) -> OsString {
    if n <= 1 {
        return name.to_os_string();
    }
    let path = Path::new(name);
    let stem = path.file_stem().unwrap_or(name);
    let mut candidate = stem.to_os_string();
    candidate.push(format!("-{n}"));
    if let Some(ext) = path.extension() {
        candidate.push(".");
        candidate.push(ext);
    }
    candidate
}

/// Whether something already occupies `path` on disk.
///
/// Dangling symlinks count as occupied; any error other than "not found"
/// also counts as occupied so the name is never reused blindly.
#[must_use]
pub fn occupied(path: &Path) -> bool {
    match fs::symlink_metadata(path) {
        Ok(_) => true,
        Err(e) => e.kind() != io::ErrorKind::NotFound,
    }
}

/// First free path in `dir` for `name`, according to `taken`.
pub fn next_available<F>(dir: &Path, name: &OsStr, taken: F) -> PathBuf
where
    F: Fn(&Path) -> bool,
{
    let mut n = 1;
    loop {
        let candidate = dir.join(candidate_name(name, n));
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Rename `from` to `to`. No copy fallback across devices.
///
/// # Errors
///
/// [`DedupError::Rename`] if the rename fails.
pub fn move_file(from: &Path, to: &Path) -> Result<(), DedupError> {
    fs::rename(from, to).map_err(|source| {
        log::error!("Rename failed {} -> {}: {}", from.display(), to.display(), source);
        DedupError::Rename {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        }
    })?;
    log::debug!("Moved {} -> {}", from.display(), to.display());
    Ok(())
}

/// Serializes destination naming for a run and records names handed out.
///
/// In dry-run nothing is removed, so removals are recorded with
/// [`vacate`](Self::vacate) and their paths count as free when naming.
#[derive(Debug, Default)]
pub struct DestinationLedger {
    state: Mutex<LedgerState>,
}

#[derive(Debug, Default)]
struct LedgerState {
    reserved: HashSet<PathBuf>,
    vacated: HashSet<PathBuf>,
}

impl LedgerState {
    fn taken(&self, path: &Path) -> bool {
        self.reserved.contains(path) || (occupied(path) && !self.vacated.contains(path))
    }
}

impl DestinationLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pick a free name for `name` in `dir` and run `commit` with it while
    /// still holding the lock. The name is reserved only if `commit`
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Whatever `commit` returns.
    pub fn claim<F>(&self, dir: &Path, name: &OsStr, commit: F) -> Result<PathBuf, DedupError>
    where
        F: FnOnce(&Path) -> Result<(), DedupError>,
    {
        let mut state = self.lock();
        let target = next_available(dir, name, |p| state.taken(p));
        commit(&target)?;
        state.vacated.remove(&target);
        state.reserved.insert(target.clone());
        Ok(target)
    }

    /// Treat `path` as removed even though it is still on disk.
    pub fn vacate(&self, path: &Path) {
        self.lock().vacated.insert(path.to_path_buf());
    }

    /// Number of destinations handed out so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().reserved.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
