//! Command-line interface definitions for dedup.
//!
//! The first directory is the destination. Every later directory is
//! processed after it, in the order given.
//!
//! # Example
//!
//! ```bash
//! # Remove duplicates inside one directory (top level only)
//! dedup ~/Pictures
//!
//! # Merge two trees into ~/Pictures, renaming on name collisions
//! dedup --merge --recursive ~/Pictures /mnt/backup/Pictures
//!
//! # See what would happen without touching anything
//! dedup -v --dry-run --merge -r ~/Pictures /mnt/backup/Pictures
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

const NOTES: &str = "\
Notes:
  * two files are duplicates if their hash sums match.
  * dedup is destructive unless --keep or --dry-run is given.
  * with a single directory dedup only removes duplicates, nothing is moved.
  * when merging, a unique file whose name is taken in the destination gets
    the next free number (if 'foo.txt' exists the file becomes 'foo-2.txt').
  * --keep without --merge is a read-only operation.
  * any filesystem error stops the run.";

/// Deduplicate files across directories, optionally merging them into the
/// first directory.
#[derive(Debug, Parser)]
#[command(name = "dedup")]
#[command(author, version, about, long_about = None, after_help = NOTES)]
pub struct Cli {
    /// Directories to process; the first one is the merge destination
    #[arg(value_name = "DIRECTORY", required = true, num_args = 1..)]
    pub directories: Vec<PathBuf>,

    /// Keep duplicates (by default, duplicates are deleted)
    #[arg(short, long)]
    pub keep: bool,

    /// Move unique files into the first directory
    #[arg(short, long)]
    pub merge: bool,

    /// Search nested directories
    #[arg(short, long)]
    pub recursive: bool,

    /// Increase verbosity (-v prints every move and delete, -vv adds debug logs)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Run exactly as configured, except that no changes are made
    #[arg(long)]
    pub dry_run: bool,

    /// Number of worker threads (default: available parallelism)
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Hashing algorithm: md5 (default), sha1, sha256 or blake3
    #[arg(long = "hash", value_name = "ALGORITHM")]
    pub hash: Option<String>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Final summary format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Configuration file (TOML); defaults to the platform config directory
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Output format for the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    Text,
    /// JSON summary on stdout
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["dedup", "a"]).unwrap();
        assert_eq!(cli.directories, vec![PathBuf::from("a")]);
        assert!(!cli.keep && !cli.merge && !cli.recursive && !cli.dry_run);
        assert_eq!(cli.verbose, 0);
        assert_eq!(cli.workers, None);
        assert_eq!(cli.hash, None);
        assert_eq!(cli.output, OutputFormat::Text);
    }

    #[test]
    fn test_parse_all_flags() {
        let cli = Cli::try_parse_from([
            "dedup", "-k", "-m", "-r", "-vv", "--dry-run", "-w", "3", "--hash", "sha1", "dst",
            "src1", "src2",
        ])
        .unwrap();
        assert!(cli.keep && cli.merge && cli.recursive && cli.dry_run);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.workers, Some(3));
        assert_eq!(cli.hash.as_deref(), Some("sha1"));
        assert_eq!(cli.directories.len(), 3);
    }

    #[test]
    fn test_directory_required() {
        assert!(Cli::try_parse_from(["dedup"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["dedup", "-q", "-v", "a"]).is_err());
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Text.to_string(), "text");
    }
}
