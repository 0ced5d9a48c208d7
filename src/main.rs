//! daily-query CLI entry point
//!
//! Parses arguments and runs one command through `cli::run`. Failures are
//! reported as a JSON error line on stdout and the process exits non-zero.

use std::io;

use daily_query::cli;

fn main() {
    if let Err(e) = cli::run() {
        if cli::write_error(&mut io::stdout(), e.code_str(), e.message()).is_err() {
            eprintln!("{}", e);
        }
        std::process::exit(1);
    }
}
