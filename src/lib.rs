//! dedup - content-based file deduplication and directory merging.
//!
//! Files are identified by a digest of their full content. The first
//! directory given is the destination: duplicates are removed everywhere
//! (unless kept), and with `--merge` every unique file from the later
//! directories is moved into the destination under a collision-free name.
//! Traversal, hashing and file operations run on a pool of worker threads
//! fed by a dynamic queue per input directory.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod engine;
pub mod error;
pub mod logging;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::Result;

use cli::{Cli, OutputFormat};
use config::Config;
use engine::Engine;
use error::{ExitCode, RunError};
use progress::ConsoleReporter;

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Configuration, signal-hook and run failures. A failed run is returned as
/// a [`RunError`] carrying the statistics at the time it stopped.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    if cli.no_color || !std::io::stdout().is_terminal() {
        yansi::disable();
    }

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_cli(&cli);
    log::debug!("Effective configuration: {config:?}");

    let options = config
        .into_options(cli.verbose > 0)
        .map_err(|e| RunError::new(e, Default::default()))?;

    let shutdown = signal::install_handler()?;
    let quiet = cli.quiet || cli.output == OutputFormat::Json;
    let reporter = Arc::new(ConsoleReporter::new(
        options.verbose,
        options.dry_run,
        quiet,
    ));

    let engine = Engine::new(options, reporter).with_shutdown_flag(shutdown.get_flag());
    let summary = engine.run(&cli.directories)?;

    if cli.output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(ExitCode::Success)
}
