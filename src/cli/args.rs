//! CLI argument definitions using clap
//!
//! Commands:
//! - epiquery serve [--config <path>] [--port <n>]
//! - epiquery query <source> -p name=value ...
//! - epiquery explain <source> -p name=value ...

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// epiquery - revision-aware queries over epidemiological tables
#[derive(Parser, Debug)]
#[command(name = "epiquery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file; defaults apply when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API
    Serve {
        /// Overrides the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run one request and write the response body to stdout
    Query(RequestArgs),

    /// Print the sub-queries and SQL a request would run
    Explain(RequestArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Source name, e.g. fluview
    pub source: String,

    /// Request parameter as name=value; repeatable
    #[arg(short = 'p', long = "param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
}

/// Splits `name=value` at the first `=`.
pub fn parse_param(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got '{}'", s)),
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
