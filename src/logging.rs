//! Diagnostic logging via the `log` facade and the `env_logger` backend.
//!
//! Move and delete lines are printed by the
//! [`ConsoleReporter`](crate::progress::ConsoleReporter) and are not log
//! records. Logging is for diagnostics on stderr. The level comes from, in
//! priority order:
//!
//! 1. `RUST_LOG`, when set
//! 2. `--quiet` (errors only)
//! 3. `-v` count: none = warn, `-v` = info, `-vv` = debug, `-vvv` = trace
//!
//! ```rust,no_run
//! use dedup::logging::init_logging;
//!
//! init_logging(2, false);
//! log::debug!("visible with -vv");
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Initialize logging once, before the run starts.
///
/// Calling it again in the same process is a no-op (the second
/// initialization is ignored rather than panicking).
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();
    let from_env = env::var_os("RUST_LOG").is_some();

    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_ok() && !from_env {
        log::debug!(
            "Logging initialized at level: {:?}",
            determine_level(verbose, quiet)
        );
    }
}

fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Debug builds and `-vv` show the module path; release builds stay compact.
fn configure_format(builder: &mut Builder, verbose: u8) {
    let with_module = cfg!(debug_assertions) || verbose >= 2;
    builder.format(move |buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        if with_module {
            writeln!(
                buf,
                "{style}{level:<5}{style:#} [{}] {}",
                record.module_path().unwrap_or("dedup"),
                record.args()
            )
        } else {
            writeln!(buf, "{style}{level:<5}{style:#} {}", record.args())
        }
    });
}
