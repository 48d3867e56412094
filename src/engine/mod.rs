//! Run orchestration.
//!
//! # Overview
//!
//! A run processes the input roots strictly in order: the destination (first
//! root) and then every source. Each root gets a fresh [`WorkQueue`] seeded
//! with the root path and drained by the worker pool; the next root starts
//! only after the previous queue is empty. Inside a root, items run in
//! parallel and the [`ContentIndex`] decides which copy survives.
//!
//! All shared state lives in one [`RunContext`] built per [`Engine`], so two
//! engines never share an index.
//!
//! # Example
//!
//! ```no_run
//! use dedup::engine::{Engine, RunOptions};
//! use dedup::progress::NullSink;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! let options = RunOptions::default().with_merge(true).with_recursive(true);
//! let engine = Engine::new(options, Arc::new(NullSink));
//! let summary = engine
//!     .run(&[PathBuf::from("library"), PathBuf::from("incoming")])
//!     .unwrap();
//! println!("{}", summary.stats);
//! ```

pub mod queue;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::actions::DestinationLedger;
use crate::duplicates::{ContentIndex, Processor, RootPlan, RunStats, StatsSnapshot};
use crate::error::{DedupError, RunError};
use crate::progress::{EventSink, RunEvent};
use crate::scanner::path_utils::normalize_input;
use crate::scanner::{DigestAlgorithm, Hasher, Visit, Walker};

pub use queue::{TaskGroup, WorkQueue};

/// Options consumed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Never delete duplicates
    pub keep: bool,
    /// Move unique files from source roots into the destination
    pub merge: bool,
    /// Descend below each root
    pub recursive: bool,
    /// Emit per-action lines
    pub verbose: bool,
    /// Decide and report, change nothing
    pub dry_run: bool,
    /// Worker threads; 0 means available parallelism
    pub workers: usize,
    /// Digest used for every file in the run
    pub digest: DigestAlgorithm,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            keep: false,
            merge: false,
            recursive: false,
            verbose: false,
            dry_run: false,
            workers: 0,
            digest: DigestAlgorithm::default(),
        }
    }
}

impl RunOptions {
    #[must_use]
    pub fn with_keep(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    #[must_use]
    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }

    #[must_use]
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn with_digest(mut self, digest: DigestAlgorithm) -> Self {
        self.digest = digest;
        self
    }

    /// Worker count with 0 resolved to the available parallelism.
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        }
    }

    /// `keep` without `merge` never touches the filesystem.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.dry_run || (self.keep && !self.merge)
    }
}

/// State shared by every worker for the lifetime of one run.
pub struct RunContext {
    /// Fingerprint to canonical path
    pub index: ContentIndex,
    /// Hashed/moved/deleted counters
    pub stats: RunStats,
    /// Destination names handed out so far
    pub destinations: DestinationLedger,
    /// Digest factory for the run
    pub hasher: Hasher,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("index", &self.index)
            .field("stats", &self.stats)
            .field("destinations", &self.destinations)
            .field("hasher", &self.hasher)
            .field("sink", &"<sink>")
            .finish()
    }
}

impl RunContext {
    #[must_use]
    pub fn new(options: &RunOptions, sink: Arc<dyn EventSink>) -> Self {
        Self {
            index: ContentIndex::new(),
            stats: RunStats::new(),
            destinations: DestinationLedger::new(),
            hasher: Hasher::new(options.digest),
            sink,
        }
    }

    /// Send an event to the sink along with the current counters.
    pub fn emit(&self, event: &RunEvent) {
        self.sink.on_event(event, &self.stats.snapshot());
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Final counters
    pub stats: StatsSnapshot,
    /// Distinct fingerprints seen
    pub unique_files: usize,
    /// Roots in processing order, normalized
    pub roots: Vec<PathBuf>,
    /// Digest used
    pub digest: String,
    /// Whether the run was a dry-run
    pub dry_run: bool,
}

/// Check the input directories and normalize their spelling.
///
/// Trailing separators are dropped; every path must exist and be a
/// directory (symlinks to directories are accepted).
///
/// # Errors
///
/// [`DedupError::NoDirectories`], [`DedupError::NotFound`],
/// [`DedupError::NotADirectory`] or [`DedupError::Stat`].
pub fn validate_directories(dirs: &[PathBuf]) -> Result<Vec<PathBuf>, DedupError> {
    if dirs.is_empty() {
        return Err(DedupError::NoDirectories);
    }
    dirs.iter()
        .map(|dir| {
            let dir = normalize_input(dir);
            match std::fs::metadata(&dir) {
                Ok(meta) if meta.is_dir() => Ok(dir),
                Ok(_) => Err(DedupError::NotADirectory(dir)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err(DedupError::NotFound(dir))
                }
                Err(source) => Err(DedupError::Stat { path: dir, source }),
            }
        })
        .collect()
}

/// Deduplicates (and optionally merges) a list of directory roots.
pub struct Engine {
    options: RunOptions,
    context: RunContext,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Engine {
    #[must_use]
    pub fn new(options: RunOptions, sink: Arc<dyn EventSink>) -> Self {
        let context = RunContext::new(&options, sink);
        Self {
            options,
            context,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// Once the flag is set, workers stop handling new items and the run
    /// fails with [`DedupError::Interrupted`].
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    #[must_use]
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    #[must_use]
    pub fn context(&self) -> &RunContext {
        &self.context
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn fail(&self, error: DedupError) -> RunError {
        RunError::new(error, self.context.stats.snapshot())
    }

    /// Process every directory in order. The first is the destination.
    ///
    /// # Errors
    ///
    /// Configuration errors before anything is touched, or the first
    /// filesystem error during traversal. Either way the error carries the
    /// statistics at the time the run stopped.
    pub fn run(&self, directories: &[PathBuf]) -> Result<RunSummary, RunError> {
        let roots = validate_directories(directories).map_err(|e| self.fail(e))?;
        let workers = self.options.effective_workers();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("dedup-worker-{i}"))
            .build()
            .map_err(|e| self.fail(DedupError::ThreadPool(e.to_string())))?;

        log::info!(
            "Deduplicating {} root(s) with {} workers using {}{}",
            roots.len(),
            workers,
            self.options.digest,
            if self.options.dry_run { " (dry-run)" } else { "" }
        );
        if self.options.is_read_only() {
            log::debug!("Run is read-only; no files will be removed or moved");
        }

        let destination = &roots[0];
        for root in &roots {
            let plan = RootPlan::new(destination, root, self.options.merge);
            self.scan_root(&pool, workers, &plan, &roots)
                .map_err(|e| self.fail(e))?;
        }

        self.context.emit(&RunEvent::Done);
        let stats = self.context.stats.snapshot();
        log::info!("Finished: {stats}");

        Ok(RunSummary {
            stats,
            unique_files: self.context.index.len(),
            roots,
            digest: self.options.digest.to_string(),
            dry_run: self.options.dry_run,
        })
    }

    /// Drain one root's queue.
    fn scan_root(
        &self,
        pool: &rayon::ThreadPool,
        workers: usize,
        plan: &RootPlan,
        roots: &[PathBuf],
    ) -> Result<(), DedupError> {
        log::debug!(
            "Processing root {} (first: {}, relocate: {})",
            plan.root.display(),
            plan.first,
            plan.relocates()
        );

        let walker = Walker::new(&plan.root, roots, self.options.recursive);
        let processor = Processor::new(&self.context, &self.options, plan);

        let queue = WorkQueue::new().with_progress(|performed, queued| {
            self.context
                .emit(&RunEvent::Progress { performed, queued });
        });
        queue.enqueue([plan.root.clone()]);

        queue.drain(pool, workers, |queue, path| {
            if self.is_shutdown_requested() {
                return Err(DedupError::Interrupted);
            }
            self.handle(&walker, &processor, queue, &path)
        })
    }

    fn handle(
        &self,
        walker: &Walker<'_>,
        processor: &Processor<'_>,
        queue: &WorkQueue<'_>,
        path: &Path,
    ) -> Result<(), DedupError> {
        match walker.visit(path)? {
            Visit::Expand(children) => {
                self.context.emit(&RunEvent::Scanning {
                    dir: path.to_path_buf(),
                });
                queue.enqueue(children);
            }
            Visit::File(entry) => {
                let outcome = processor.process(&entry.path)?;
                log::trace!("{}: {:?}", entry.path.display(), outcome);
            }
            Visit::Skip(reason) => {
                log::trace!("Skipping {} ({:?})", path.display(), reason);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemorySink;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validate_directories_trims_trailing_separator() {
        let dir = TempDir::new().unwrap();
        let with_sep = PathBuf::from(format!("{}/", dir.path().display()));
        let roots = validate_directories(&[with_sep]).unwrap();
        assert_eq!(roots, vec![dir.path().to_path_buf()]);
    }

    #[test]
    fn test_validate_directories_errors() {
        assert!(matches!(
            validate_directories(&[]),
            Err(DedupError::NoDirectories)
        ));

        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(
            validate_directories(&[file]),
            Err(DedupError::NotADirectory(_))
        ));
        assert!(matches!(
            validate_directories(&[dir.path().join("missing")]),
            Err(DedupError::NotFound(_))
        ));
    }

    #[test]
    fn test_effective_workers() {
        assert_eq!(RunOptions::default().with_workers(3).effective_workers(), 3);
        assert!(RunOptions::default().effective_workers() >= 1);
    }

    #[test]
    fn test_read_only_modes() {
        assert!(RunOptions::default().with_keep(true).is_read_only());
        assert!(RunOptions::default().with_dry_run(true).is_read_only());
        assert!(!RunOptions::default()
            .with_keep(true)
            .with_merge(true)
            .is_read_only());
        assert!(!RunOptions::default().is_read_only());
    }

    #[test]
    fn test_run_emits_scanning_and_done() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        let sink = Arc::new(MemorySink::new());
        let engine = Engine::new(RunOptions::default().with_workers(2), sink.clone());

        let summary = engine.run(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(summary.stats.hashed, 1);
        assert_eq!(summary.unique_files, 1);

        let events = sink.events();
        assert_eq!(
            events.first(),
            Some(&RunEvent::Scanning {
                dir: dir.path().to_path_buf()
            })
        );
        assert_eq!(events.last(), Some(&RunEvent::Done));
    }

    #[test]
    fn test_shutdown_flag_interrupts_run() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        let flag = Arc::new(AtomicBool::new(true));
        let engine = Engine::new(RunOptions::default(), Arc::new(MemorySink::new()))
            .with_shutdown_flag(flag);

        let err = engine.run(&[dir.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err.error, DedupError::Interrupted));
        assert!(dir.path().join("a.txt").exists());
    }

    #[test]
    fn test_config_error_has_empty_stats() {
        let engine = Engine::new(RunOptions::default(), Arc::new(MemorySink::new()));
        let err = engine.run(&[PathBuf::from("/no/such/dir/for/dedup")]).unwrap_err();
        assert!(err.error.is_configuration());
        assert!(err.stats.is_empty());
    }
}
