//! Scenery CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use scenery_cli::{Args, error_adapter::to_reportables};

fn main() {
    // Install miette's pretty panic hook early for better panic reports
    miette::set_panic_hook();

    let args = Args::parse();

    // Unknown level names fall back to warnings only
    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting Scenery");
    debug!(args:?; "Parsed arguments");

    match scenery_cli::run(&args) {
        Ok(()) => info!(script = args.input; "Script replayed successfully"),
        Err(err) => {
            let reporter = miette::GraphicalReportHandler::new();

            // A script error renders with its source excerpt, anything else as a plain report
            for reportable in to_reportables(&err) {
                let mut writer = String::new();
                reporter
                    .render_report(&mut writer, &reportable)
                    .expect("Writing to String buffer is infallible");

                error!("{writer}");
            }

            let code = err.exit_code();
            debug!(code; "Exiting after failed replay");
            process::exit(code);
        }
    }
}
