//! Ctrl+C handling.
//!
//! The handler only flips a shared flag. The engine checks the flag before
//! handling each queued path, so an interrupt stops the run between file
//! operations and never in the middle of a rename or delete. The process then
//! exits with [`EXIT_CODE_INTERRUPTED`].

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// 128 + SIGINT.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared interrupt flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Set the flag as if Ctrl+C had been pressed.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The flag to hand to [`Engine::with_shutdown_flag`](crate::engine::Engine::with_shutdown_flag).
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Failure registering the process signal hook.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static INSTALLED: OnceLock<ShutdownHandler> = OnceLock::new();

/// Register the Ctrl+C hook (once per process) and return its handler.
///
/// Later calls return the same handler with the flag cleared, so several
/// runs in one process (tests) can each install without conflict.
///
/// # Errors
///
/// [`SignalError::InstallFailed`] when the hook cannot be registered and no
/// handler was installed before.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = INSTALLED.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();
    let registered = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "\nInterrupted. Finishing current file operations...");
        let _ = stderr.flush();
    });

    match registered {
        Ok(()) => Ok(INSTALLED.get_or_init(|| handler).clone()),
        // Lost a race with another thread installing at the same time.
        Err(_) if INSTALLED.get().is_some() => install_handler(),
        Err(err) => Err(err.into()),
    }
}
