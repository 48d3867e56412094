//! Filesystem mutations.
//!
//! This module provides the only two mutations a run performs:
//! - Permanent removal of a duplicate ([`delete`])
//! - Collision-safe rename of a unique file into the destination ([`rename`])
//!
//! Both are skipped entirely in dry-run mode; the caller decides.
//!
//! ```no_run
//! use dedup::actions::{next_available, occupied};
//! use std::ffi::OsStr;
//! use std::path::Path;
//!
//! let target = next_available(Path::new("dest"), OsStr::new("foo.txt"), occupied);
//! println!("would move to {}", target.display());
//! ```

pub mod delete;
pub mod rename;

// Re-export commonly used types
pub use delete::remove_duplicate;
pub use rename::{candidate_name, move_file, next_available, occupied, DestinationLedger};
