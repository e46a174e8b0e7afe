//! CLI logic for the Scenery script runner.
//!
//! The runner replays a TOML edit script against a fresh model with an
//! attached view, then reports the committed transactions, the resulting
//! cell outline and the bounds of the visible graph.

pub mod error_adapter;
pub mod script;

mod args;
mod config;
mod error;

pub use args::Args;
pub use error::CliError;

use std::{fs, io::Write};

use log::info;

use script::{Replay, Script};

/// Run the Scenery CLI application
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `CliError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Script parsing errors
/// - Model errors raised by a step
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(
        input_path = args.input,
        output_path:? = args.output;
        "Replaying script"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;
    let script = Script::parse(&source)?;

    let mut replay = Replay::new(app_config);
    replay.run(&script)?;
    let report = replay.report();

    match &args.output {
        Some(output) => {
            fs::write(output, report)?;
            info!(output_file = output; "Report written");
        }
        None => std::io::stdout().write_all(report.as_bytes())?,
    }

    Ok(())
}
