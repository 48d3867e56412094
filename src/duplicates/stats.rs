//! Run statistics.
//!
//! Counters are independent atomics. A snapshot may combine values from
//! slightly different moments, which is fine for reporting.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Process-lifetime counters for one run.
#[derive(Debug, Default)]
pub struct RunStats {
    hashed: AtomicU64,
    moved: AtomicU64,
    deleted: AtomicU64,
}

impl RunStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hash(&self) {
        self.hashed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_move(&self) {
        self.moved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delete(&self) {
        self.deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all three counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hashed: self.hashed.load(Ordering::Relaxed),
            moved: self.moved.load(Ordering::Relaxed),
            deleted: self.deleted.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`RunStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Files fingerprinted
    pub hashed: u64,
    /// Unique files relocated into the destination
    pub moved: u64,
    /// Duplicates removed (or that would be removed in dry-run)
    pub deleted: u64,
}

impl StatsSnapshot {
    /// Whether nothing has happened yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hashed == 0 && self.moved == 0 && self.deleted == 0
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("no changes");
        }
        let parts = [
            ("hashed", self.hashed),
            ("moved", self.moved),
            ("deleted", self.deleted),
        ];
        let mut first = true;
        for (label, count) in parts.into_iter().filter(|(_, n)| *n > 0) {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{label} {count}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_counts() {
        let stats = RunStats::new();
        stats.record_hash();
        stats.record_hash();
        stats.record_delete();
        let snap = stats.snapshot();
        assert_eq!(snap.hashed, 2);
        assert_eq!(snap.moved, 0);
        assert_eq!(snap.deleted, 1);
    }

    #[test]
    fn test_display_no_changes() {
        assert_eq!(StatsSnapshot::default().to_string(), "no changes");
    }

    #[test]
    fn test_display_omits_zero_counters() {
        let snap = StatsSnapshot {
            hashed: 4,
            moved: 2,
            deleted: 0,
        };
        assert_eq!(snap.to_string(), "hashed 4, moved 2");

        let snap = StatsSnapshot {
            hashed: 0,
            moved: 0,
            deleted: 7,
        };
        assert_eq!(snap.to_string(), "deleted 7");
    }
}
