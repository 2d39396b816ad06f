//! epiquery CLI entry point
//!
//! Parses arguments and dispatches through `cli::run`; errors go to stderr
//! with a non-zero exit status.

use epiquery::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
