//! Command-line argument definitions for the Scenery CLI.

use clap::Parser;

/// Command-line arguments for the Scenery script runner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input edit script (TOML)
    #[arg(help = "Path to the edit script")]
    pub input: String,

    /// Path to the report file; the report goes to stdout when omitted
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
