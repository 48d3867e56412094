//! Duplicate detection and resolution.
//!
//! This module provides:
//! - [`ContentIndex`]: fingerprint to canonical path, first-seen wins
//! - [`Processor`]: per-file skip/delete/move decisions
//! - [`RunStats`]: hashed/moved/deleted counters for reporting
//!
//! # Example
//!
//! ```
//! use dedup::duplicates::{Claim, ContentIndex};
//! use dedup::scanner::Fingerprint;
//! use std::path::{Path, PathBuf};
//!
//! let index = ContentIndex::new();
//! let fp = Fingerprint::from_hex("d41d8cd98f00b204e9800998ecf8427e");
//! assert_eq!(index.claim(fp.clone(), Path::new("dst/a.txt")), Claim::Unique);
//! assert_eq!(
//!     index.claim(fp, Path::new("src/b.txt")),
//!     Claim::Duplicate { canonical: PathBuf::from("dst/a.txt") }
//! );
//! ```

pub mod index;
pub mod processor;
pub mod stats;

pub use index::{Claim, ContentIndex};
pub use processor::{Outcome, Processor, RootPlan};
pub use stats::{RunStats, StatsSnapshot};
