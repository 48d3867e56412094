//! Run events and the sinks that present them.
//!
//! The engine never prints. It emits [`RunEvent`]s to an [`EventSink`]
//! together with the current [`StatsSnapshot`]; the sink decides what the
//! user sees.
//!
//! - [`ConsoleReporter`]: human-readable lines (verbose mode) or a spinner
//! - [`MemorySink`]: records events, used by tests and library callers
//! - [`NullSink`]: discards everything

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use yansi::Paint;

use crate::duplicates::StatsSnapshot;
use crate::scanner::path_utils::{display, split_common_prefix};

/// Something that happened during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// A directory is being listed.
    Scanning { dir: PathBuf },
    /// A duplicate was removed (or would be, in dry-run).
    Removed { path: PathBuf, canonical: PathBuf },
    /// A unique file was moved into the destination (or would be).
    Moved { from: PathBuf, to: PathBuf },
    /// Periodic queue progress for the current root.
    Progress { performed: u64, queued: u64 },
    /// Every root has been drained.
    Done,
}

/// Receiver of run events.
///
/// Called concurrently from worker threads.
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: &RunEvent, stats: &StatsSnapshot);
}

/// Discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_event(&self, _event: &RunEvent, _stats: &StatsSnapshot) {}
}

/// Records every event in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<RunEvent>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all events so far.
    #[must_use]
    pub fn events(&self) -> Vec<RunEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Only the filesystem actions (removes and moves), sorted so runs with
    /// different worker counts compare equal.
    #[must_use]
    pub fn actions(&self) -> Vec<RunEvent> {
        let mut actions: Vec<RunEvent> = self
            .events()
            .into_iter()
            .filter(|e| matches!(e, RunEvent::Removed { .. } | RunEvent::Moved { .. }))
            .collect();
        actions.sort_by_key(|e| format!("{e:?}"));
        actions
    }
}

impl EventSink for MemorySink {
    fn on_event(&self, event: &RunEvent, _stats: &StatsSnapshot) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Terminal presentation of run events.
///
/// In verbose mode every scan, removal and move is printed as one line,
/// prefixed with `[DRYRUN]` when nothing is being changed. The statistics
/// are appended in parentheses whenever they changed since the last line.
/// Without verbose mode a spinner shows queue progress instead.
pub struct ConsoleReporter {
    verbose: bool,
    dry_run: bool,
    quiet: bool,
    spinner: Option<ProgressBar>,
    last_report: Mutex<String>,
}

impl std::fmt::Debug for ConsoleReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleReporter")
            .field("verbose", &self.verbose)
            .field("dry_run", &self.dry_run)
            .field("quiet", &self.quiet)
            .field("spinner", &self.spinner.is_some())
            .finish()
    }
}

impl ConsoleReporter {
    /// Create a reporter.
    ///
    /// # Examples
    ///
    /// ```
    /// use dedup::progress::ConsoleReporter;
    ///
    /// let reporter = ConsoleReporter::new(true, false, false);
    /// ```
    #[must_use]
    pub fn new(verbose: bool, dry_run: bool, quiet: bool) -> Self {
        let spinner = (!verbose && !quiet).then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });

        Self {
            verbose,
            dry_run,
            quiet,
            spinner,
            last_report: Mutex::new(String::new()),
        }
    }

    /// Build the final text of a line: dry-run marker and stats suffix.
    fn decorate(&self, message: &str, stats: &StatsSnapshot) -> String {
        let mut line = String::new();
        if self.dry_run {
            line.push_str(&"[DRYRUN] ".dim().to_string());
        }
        line.push_str(message);

        let report = stats.to_string();
        let mut last = self.last_report.lock().unwrap_or_else(PoisonError::into_inner);
        if *last != report {
            line.push_str(&format!(" ({report})").dim().to_string());
            *last = report;
        }
        line
    }

    fn print(&self, message: &str, stats: &StatsSnapshot) {
        if self.quiet {
            return;
        }
        let line = self.decorate(message, stats);
        match &self.spinner {
            Some(pb) => pb.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }
}

impl Drop for ConsoleReporter {
    fn drop(&mut self) {
        // A failed run never sees `Done`.
        if let Some(pb) = &self.spinner {
            if !pb.is_finished() {
                pb.finish_and_clear();
            }
        }
    }
}

/// `Removing a dupe-of b`, collapsing the shared prefix.
#[must_use]
pub fn removal_line(path: &Path, canonical: &Path) -> String {
    let (shared, removed, kept) = split_common_prefix(path, canonical);
    let removed = display(&removed);
    let kept = display(&kept);
    if shared.as_os_str().is_empty() {
        format!("Removing {} dupe-of {}", removed.red(), kept.blue())
    } else {
        format!(
            "Removing {}/{{{} dupe-of {}}}",
            display(&shared).dim(),
            removed.red(),
            kept.blue()
        )
    }
}

/// `Moving: a -> b`, collapsing the shared prefix.
#[must_use]
pub fn move_line(from: &Path, to: &Path) -> String {
    let (shared, source, target) = split_common_prefix(from, to);
    let source = display(&source);
    let target = display(&target);
    if shared.as_os_str().is_empty() {
        format!("Moving: {} -> {}", source, target.green())
    } else {
        format!(
            "Moving: {}/{{{} -> {}}}",
            display(&shared).dim(),
            source,
            target.green()
        )
    }
}

impl EventSink for ConsoleReporter {
    fn on_event(&self, event: &RunEvent, stats: &StatsSnapshot) {
        match event {
            RunEvent::Scanning { dir } => {
                if self.verbose {
                    self.print(&format!("Scanning {}", display(dir).blue()), stats);
                } else if let Some(pb) = &self.spinner {
                    pb.set_message(format!("Scanning {}", display(dir)));
                }
            }
            RunEvent::Removed { path, canonical } => {
                if self.verbose {
                    self.print(&removal_line(path, canonical), stats);
                }
            }
            RunEvent::Moved { from, to } => {
                if self.verbose {
                    self.print(&move_line(from, to), stats);
                }
            }
            RunEvent::Progress { performed, queued } => {
                let message = format!("Performed #{performed} actions with #{queued} queued");
                if self.verbose {
                    self.print(&message.dim().to_string(), stats);
                } else if let Some(pb) = &self.spinner {
                    pb.set_message(format!("{message} ({stats})"));
                }
            }
            RunEvent::Done => {
                if let Some(pb) = &self.spinner {
                    pb.finish_and_clear();
                }
                self.print("Done", stats);
            }
        }
    }
}
