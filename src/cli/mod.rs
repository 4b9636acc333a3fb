//! CLI arguments parsing

pub mod args;

pub use args::{CliArgs, StorageBackend};

use clap::Parser;

/// Parse command-line arguments, exiting with usage help on error
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}
