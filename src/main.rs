//! dedup command-line entry point.

use clap::Parser;
use dedup::{
    cli::Cli,
    error::{ExitCode, RunError, StructuredError},
};

fn main() {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;

    match dedup::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let exit_code = ExitCode::for_report(&err);

            let message = if err.downcast_ref::<RunError>().is_some() {
                // Already names the operation, path and statistics.
                err.to_string()
            } else {
                format!("{err:#}")
            };

            if json_errors {
                match serde_json::to_string_pretty(&StructuredError::new(&err, exit_code)) {
                    Ok(json) => eprintln!("{json}"),
                    Err(_) => eprintln!("[{}] Error: {message}", exit_code.code_prefix()),
                }
            } else {
                eprintln!("[{}] Error: {message}", exit_code.code_prefix());
            }

            std::process::exit(exit_code.as_i32());
        }
    }
}
