//! CLI module
//!
//! Provides command-line interface for:
//! - serve: HTTP API over the configured fixtures
//! - query: One-shot request, body to stdout
//! - explain: Planned sub-queries and SQL for a request

mod args;
mod commands;
mod errors;

pub use args::{parse_param, Cli, Command, RequestArgs};
pub use commands::{build_handler, explain, query, run_command, serve, Config};
pub use errors::{CliError, CliErrorCode, CliResult};

use crate::observability::init_logging;

/// Parses arguments, loads configuration, starts logging, dispatches.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let config = Config::load_or_default(cli.config.as_deref())?;
    init_logging(config.log_format);
    run_command(&config, cli.command)
}
