//! Error types, structured error reports and exit codes.
//!
//! Every filesystem failure inside a run is fatal. [`DedupError`] names the
//! operation and path that failed; [`RunError`] pairs it with the statistics
//! snapshot taken at the moment the run stopped.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::duplicates::StatsSnapshot;

/// Errors raised while validating input or processing a directory tree.
#[derive(thiserror::Error, Debug)]
pub enum DedupError {
    /// The configured digest algorithm is not one of the supported set.
    #[error("Unknown hashing algorithm: {0}")]
    UnknownDigest(String),

    /// An explicitly named config file does not exist.
    #[error("Config file not found: {0}")]
    ConfigFile(PathBuf),

    /// No input directories were given.
    #[error("At least one directory is required")]
    NoDirectories,

    /// An input directory does not exist.
    #[error("Directory not found [stat-input: {0}]")]
    NotFound(PathBuf),

    /// An input path exists but is not a directory.
    #[error("Must be directory [stat-input: {0}]")]
    NotADirectory(PathBuf),

    /// Reading metadata for a queued path failed.
    #[error("{source} [stat: {path}]")]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Listing a directory failed.
    #[error("{source} [read-dir: {path}]")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Opening or reading a file for fingerprinting failed.
    #[error("{source} [read: {path}]")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Deleting a duplicate failed.
    #[error("{source} [remove: {path}]")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Moving a unique file into the destination failed.
    #[error("{source} [rename: {from} -> {to}]")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The worker pool could not be created.
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),

    /// The run was interrupted by the user.
    #[error("Interrupted")]
    Interrupted,
}

impl DedupError {
    /// Whether this error was detected before any traversal started.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownDigest(_)
                | Self::ConfigFile(_)
                | Self::NoDirectories
                | Self::NotFound(_)
                | Self::NotADirectory(_)
                | Self::ThreadPool(_)
        )
    }

    /// The path involved in the failure, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound(p) | Self::NotADirectory(p) | Self::ConfigFile(p) => Some(p),
            Self::Stat { path, .. }
            | Self::ReadDir { path, .. }
            | Self::Read { path, .. }
            | Self::Remove { path, .. } => Some(path),
            Self::Rename { from, .. } => Some(from),
            Self::UnknownDigest(_) | Self::NoDirectories | Self::ThreadPool(_) | Self::Interrupted => {
                None
            }
        }
    }

    /// Short name of the failed operation.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::UnknownDigest(_)
            | Self::ConfigFile(_)
            | Self::NoDirectories
            | Self::ThreadPool(_) => "configure",
            Self::NotFound(_) | Self::NotADirectory(_) => "stat-input",
            Self::Stat { .. } => "stat",
            Self::ReadDir { .. } => "read-dir",
            Self::Read { .. } => "read",
            Self::Remove { .. } => "remove",
            Self::Rename { .. } => "rename",
            Self::Interrupted => "interrupt",
        }
    }
}

/// A failed run: the error that stopped it plus the counters at that time.
#[derive(thiserror::Error, Debug)]
#[error("{error} ({stats})")]
pub struct RunError {
    /// The error that halted the run.
    #[source]
    pub error: DedupError,
    /// Statistics snapshot when the run halted.
    pub stats: StatsSnapshot,
}

impl RunError {
    #[must_use]
    pub fn new(error: DedupError, stats: StatsSnapshot) -> Self {
        Self { error, stats }
    }

    /// Exit code matching the underlying error.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::for_error(&self.error)
    }
}

/// Exit codes for the dedup binary.
///
/// - 0: Success (all roots drained)
/// - 1: Runtime error (I/O failure during traversal)
/// - 2: Configuration error (bad digest name, bad directory argument)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// All input directories were processed.
    Success = 0,
    /// A filesystem operation failed mid-run.
    RuntimeError = 1,
    /// The invocation was rejected before traversal began.
    ConfigError = 2,
    /// Interrupted by Ctrl+C.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DD000",
            Self::RuntimeError => "DD001",
            Self::ConfigError => "DD002",
            Self::Interrupted => "DD130",
        }
    }

    /// Classify a [`DedupError`].
    #[must_use]
    pub fn for_error(err: &DedupError) -> Self {
        if matches!(err, DedupError::Interrupted) {
            Self::Interrupted
        } else if err.is_configuration() {
            Self::ConfigError
        } else {
            Self::RuntimeError
        }
    }

    /// Classify an application error. Failures loading configuration count
    /// as configuration errors.
    #[must_use]
    pub fn for_report(err: &anyhow::Error) -> Self {
        if let Some(run) = err.downcast_ref::<RunError>() {
            run.exit_code()
        } else if let Some(dedup) = err.downcast_ref::<DedupError>() {
            Self::for_error(dedup)
        } else if err.downcast_ref::<figment::Error>().is_some() {
            Self::ConfigError
        } else {
            Self::RuntimeError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Failed operation, when known
    pub operation: Option<String>,
    /// Path involved in the failure, when known
    pub path: Option<PathBuf>,
    /// Counters at the time of failure
    pub stats: Option<StatsSnapshot>,
}

impl StructuredError {
    /// Build a structured error from an application error and its exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        let run_error = err.downcast_ref::<RunError>();
        let dedup_error = run_error
            .map(|e| &e.error)
            .or_else(|| err.downcast_ref::<DedupError>());

        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            operation: dedup_error.map(|e| e.operation().to_string()),
            path: dedup_error.and_then(|e| e.path().map(Path::to_path_buf)),
            stats: run_error.map(|e| e.stats),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn io_err() -> io::Error {
        io::Error::new(io::ErrorKind::PermissionDenied, "denied")
    }

    #[test]
    fn test_configuration_classification() {
        assert!(DedupError::UnknownDigest("crc".into()).is_configuration());
        assert!(DedupError::NotADirectory(PathBuf::from("/f")).is_configuration());
        assert!(!DedupError::Interrupted.is_configuration());
        assert!(!DedupError::Remove {
            path: PathBuf::from("/a"),
            source: io_err()
        }
        .is_configuration());
    }

    #[test]
    fn test_exit_code_for_error() {
        assert_eq!(
            ExitCode::for_error(&DedupError::NoDirectories),
            ExitCode::ConfigError
        );
        assert_eq!(
            ExitCode::for_error(&DedupError::Interrupted),
            ExitCode::Interrupted
        );
        let err = DedupError::Read {
            path: PathBuf::from("/x"),
            source: io_err(),
        };
        assert_eq!(ExitCode::for_error(&err), ExitCode::RuntimeError);
        assert_eq!(ExitCode::RuntimeError.as_i32(), 1);
        assert_eq!(ExitCode::Interrupted.code_prefix(), "DD130");
    }

    #[test]
    fn test_exit_code_for_report() {
        let run: anyhow::Error =
            RunError::new(DedupError::Interrupted, StatsSnapshot::default()).into();
        assert_eq!(ExitCode::for_report(&run), ExitCode::Interrupted);

        let config: anyhow::Error = DedupError::ConfigFile(PathBuf::from("/x.toml")).into();
        assert_eq!(ExitCode::for_report(&config), ExitCode::ConfigError);

        let other = anyhow::anyhow!("boom");
        assert_eq!(ExitCode::for_report(&other), ExitCode::RuntimeError);
    }

    #[test]
    fn test_error_display_names_operation_and_path() {
        let err = DedupError::Rename {
            from: PathBuf::from("/src/a.txt"),
            to: PathBuf::from("/dst/a.txt"),
            source: io_err(),
        };
        let msg = err.to_string();
        assert!(msg.contains("rename: /src/a.txt -> /dst/a.txt"), "{msg}");
        assert_eq!(err.operation(), "rename");
        assert_eq!(err.path(), Some(Path::new("/src/a.txt")));
    }

    #[test]
    fn test_run_error_display_includes_stats() {
        let stats = StatsSnapshot {
            hashed: 3,
            moved: 0,
            deleted: 1,
        };
        let err = RunError::new(
            DedupError::Stat {
                path: PathBuf::from("/gone"),
                source: io::Error::new(io::ErrorKind::NotFound, "missing"),
            },
            stats,
        );
        assert_eq!(
            err.to_string(),
            "missing [stat: /gone] (hashed 3, deleted 1)"
        );
        assert_eq!(err.exit_code(), ExitCode::RuntimeError);
    }

    #[test]
    fn test_structured_error_from_run_error() {
        let err = anyhow::Error::new(RunError::new(
            DedupError::Remove {
                path: PathBuf::from("/d/dup.txt"),
                source: io_err(),
            },
            StatsSnapshot::default(),
        ));
        let structured = StructuredError::new(&err, ExitCode::RuntimeError);
        assert_eq!(structured.code, "DD001");
        assert_eq!(structured.operation.as_deref(), Some("remove"));
        assert_eq!(structured.path, Some(PathBuf::from("/d/dup.txt")));
        assert!(structured.stats.is_some());
    }
}
