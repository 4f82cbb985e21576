//! Command-line entry point
//!
//! Exit codes: 0 on success (and for `--help`/`--version`), 1 for configuration
//! errors including values the argument parser rejects (no request is made),
//! 2 for any failure while streaming.

use asrm_export::{Config, ToExitCode, logging, run_export};
use clap::Parser;
use clap::error::ErrorKind;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // A missing .env file is fine; real environment variables still apply
    let _ = dotenvy::dotenv();

    let config = match Config::try_parse() {
        Ok(config) => config,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => e.exit(),
            _ => {
                let _ = e.print();
                return ExitCode::from(1);
            }
        },
    };

    if let Err(e) = logging::init_tracing(config.log_format) {
        eprintln!("ERROR: could not initialize logging: {e}");
        return ExitCode::from(2);
    }

    if let Err(e) = config.validate() {
        eprintln!("ERROR: {e}");
        return ExitCode::from(e.exit_code());
    }

    match run_export(&config).await {
        Ok(summary) => {
            println!("Wrote: {}", summary.path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
