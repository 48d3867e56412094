//! Dynamically growing work queue with termination detection.
//!
//! # Overview
//!
//! Handlers enqueue new paths while the queue is being drained (a directory
//! enqueues its children), so "the channel is empty" does not mean "the work
//! is done". Completion is tracked by a [`TaskGroup`]:
//!
//! - [`WorkQueue::enqueue`] calls [`TaskGroup::add`] for the whole batch
//!   *before* any of the paths is sent, so the outstanding count can never
//!   reach zero while a discovered item is still in flight.
//! - Each worker calls [`TaskGroup::done`] after its handler returns. The one
//!   call that brings the count to zero closes the channel, which wakes every
//!   worker blocked in `recv` and lets it exit.
//!
//! # Failure
//!
//! The first handler error is kept and the queue switches to abort mode:
//! remaining items are received and marked done without running the handler,
//! so the drain still terminates and [`WorkQueue::drain`] returns the error.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender};

use crate::error::DedupError;

/// Report progress every this many completed items.
pub const PROGRESS_INTERVAL: u64 = 100;

/// Counts outstanding work and signals when it reaches zero.
#[derive(Debug, Default)]
pub struct TaskGroup {
    outstanding: Mutex<usize>,
    idle: Condvar,
}

impl TaskGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `n` new units of work.
    pub fn add(&self, n: usize) {
        let mut outstanding = self.outstanding.lock().unwrap_or_else(PoisonError::into_inner);
        *outstanding += n;
    }

    /// Mark one unit finished. Returns `true` for the call that brought the
    /// outstanding count to zero.
    pub fn done(&self) -> bool {
        let mut outstanding = self.outstanding.lock().unwrap_or_else(PoisonError::into_inner);
        debug_assert!(*outstanding > 0, "done() without matching add()");
        *outstanding = outstanding.saturating_sub(1);
        if *outstanding == 0 {
            self.idle.notify_all();
            true
        } else {
            false
        }
    }

    /// Block until no work is outstanding.
    pub fn wait(&self) {
        let mut outstanding = self.outstanding.lock().unwrap_or_else(PoisonError::into_inner);
        while *outstanding > 0 {
            outstanding = self
                .idle
                .wait(outstanding)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    #[must_use]
    pub fn outstanding(&self) -> usize {
        *self.outstanding.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

type ProgressFn<'a> = Box<dyn Fn(u64, u64) + Send + Sync + 'a>;

/// Queue of paths for one input root, drained by a fixed worker pool.
pub struct WorkQueue<'a> {
    group: TaskGroup,
    sender: Mutex<Option<Sender<PathBuf>>>,
    receiver: Receiver<PathBuf>,
    submitted: AtomicU64,
    completed: AtomicU64,
    aborted: AtomicBool,
    failure: Mutex<Option<DedupError>>,
    on_progress: Option<ProgressFn<'a>>,
}

impl std::fmt::Debug for WorkQueue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkQueue")
            .field("outstanding", &self.group.outstanding())
            .field("submitted", &self.submitted())
            .field("completed", &self.completed())
            .field("aborted", &self.is_aborted())
            .finish()
    }
}

impl Default for WorkQueue<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> WorkQueue<'a> {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            group: TaskGroup::new(),
            sender: Mutex::new(Some(sender)),
            receiver,
            submitted: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            aborted: AtomicBool::new(false),
            failure: Mutex::new(None),
            on_progress: None,
        }
    }

    /// Call `f(performed, queued)` every [`PROGRESS_INTERVAL`] completions.
    #[must_use]
    pub fn with_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(u64, u64) + Send + Sync + 'a,
    {
        self.on_progress = Some(Box::new(f));
        self
    }

    /// Add paths to the queue.
    ///
    /// Must be called either before [`drain`](Self::drain) or from inside a
    /// handler; once the last item completes the queue is closed and further
    /// paths are dropped.
    pub fn enqueue<I>(&self, paths: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let paths: Vec<PathBuf> = paths.into_iter().collect();
        if paths.is_empty() {
            return;
        }

        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = sender.as_ref() else {
            log::warn!("Dropping {} paths enqueued after close", paths.len());
            return;
        };

        self.group.add(paths.len());
        self.submitted
            .fetch_add(paths.len() as u64, Ordering::SeqCst);
        for path in paths {
            // The receiver lives as long as `self`; send cannot fail.
            let _ = tx.send(path);
        }
    }

    /// Drain the queue on `workers` threads of `pool`, invoking `handler`
    /// for every path. Blocks until every enqueued path has completed.
    ///
    /// # Errors
    ///
    /// The first error any handler returned.
    pub fn drain<F>(&self, pool: &rayon::ThreadPool, workers: usize, handler: F) -> Result<(), DedupError>
    where
        F: Fn(&Self, PathBuf) -> Result<(), DedupError> + Sync,
    {
        if self.group.outstanding() == 0 {
            self.close();
            return Ok(());
        }

        let handler = &handler;
        pool.scope(|scope| {
            for id in 0..workers.max(1) {
                scope.spawn(move |_| self.work(id, handler));
            }
        });
        self.group.wait();

        match self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn work<F>(&self, id: usize, handler: &F)
    where
        F: Fn(&Self, PathBuf) -> Result<(), DedupError> + Sync,
    {
        log::trace!("Worker {id} started");
        for path in self.receiver.iter() {
            if !self.is_aborted() {
                if let Err(err) = handler(self, path) {
                    self.fail(err);
                }
            }
            self.complete();
        }
        log::trace!("Worker {id} exiting");
    }

    fn complete(&self) {
        let performed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        if self.group.done() {
            self.close();
        }
        if performed % PROGRESS_INTERVAL == 0 {
            if let Some(report) = &self.on_progress {
                let queued = self.submitted().saturating_sub(performed);
                report(performed, queued);
            }
        }
    }

    fn fail(&self, err: DedupError) {
        let mut failure = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
        if failure.is_none() {
            log::debug!("Aborting queue: {err}");
            *failure = Some(err);
        }
        self.aborted.store(true, Ordering::SeqCst);
    }

    fn close(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Total paths ever enqueued.
    #[must_use]
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::SeqCst)
    }

    /// Paths whose handler has returned (or that were skipped after abort).
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn pool(threads: usize) -> rayon::ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap()
    }

    #[test]
    fn test_task_group_done_reports_last() {
        let group = TaskGroup::new();
        group.add(2);
        assert!(!group.done());
        assert!(group.done());
        assert_eq!(group.outstanding(), 0);
        group.wait();
    }

    #[test]
    fn test_empty_queue_drains_immediately() {
        let queue = WorkQueue::new();
        let calls = AtomicUsize::new(0);
        queue
            .drain(&pool(2), 2, |_, _| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handlers_can_enqueue_while_draining() {
        // Each item "n" with n > 0 expands into two items "n-1": a binary
        // tree of depth 8 has 2^9 - 1 nodes.
        let queue = WorkQueue::new();
        queue.enqueue([PathBuf::from("8")]);
        let seen = AtomicUsize::new(0);

        queue
            .drain(&pool(4), 4, |q, path| {
                seen.fetch_add(1, Ordering::SeqCst);
                let depth: u32 = path.to_str().unwrap().parse().unwrap();
                if depth > 0 {
                    let child = PathBuf::from((depth - 1).to_string());
                    q.enqueue([child.clone(), child]);
                }
                Ok(())
            })
            .unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 511);
        assert_eq!(queue.submitted(), 511);
        assert_eq!(queue.completed(), 511);
    }

    #[test]
    fn test_single_worker_drains_everything() {
        let queue = WorkQueue::new();
        queue.enqueue((0..50).map(|i| PathBuf::from(i.to_string())));
        let seen = AtomicUsize::new(0);
        queue
            .drain(&pool(1), 1, |_, _| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 50);
    }

    #[test]
    fn test_first_error_is_returned_and_rest_skipped() {
        let queue = WorkQueue::new();
        queue.enqueue((0..20).map(|i| PathBuf::from(i.to_string())));
        let handled = AtomicUsize::new(0);

        let result = queue.drain(&pool(1), 1, |_, path| {
            handled.fetch_add(1, Ordering::SeqCst);
            if path == PathBuf::from("3") {
                return Err(DedupError::Interrupted);
            }
            Ok(())
        });

        assert!(matches!(result, Err(DedupError::Interrupted)));
        // One worker handles 0..=3 in order, then skips the rest.
        assert_eq!(handled.load(Ordering::SeqCst), 4);
        assert_eq!(queue.completed(), 20);
        assert!(queue.is_aborted());
    }

    #[test]
    fn test_progress_reported_every_interval() {
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reports);
        let queue = WorkQueue::new().with_progress(move |performed, queued| {
            sink.lock().unwrap().push((performed, queued));
        });
        queue.enqueue((0..250).map(|i| PathBuf::from(i.to_string())));
        queue.drain(&pool(1), 1, |_, _| Ok(())).unwrap();

        let reports = reports.lock().unwrap();
        assert_eq!(*reports, vec![(100, 150), (200, 50)]);
    }

    #[test]
    fn test_enqueue_after_close_is_dropped() {
        let queue = WorkQueue::new();
        queue.enqueue([PathBuf::from("a")]);
        queue.drain(&pool(1), 1, |_, _| Ok(())).unwrap();
        queue.enqueue([PathBuf::from("late")]);
        assert_eq!(queue.submitted(), 1);
    }
}
