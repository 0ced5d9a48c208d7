//! CLI module for daily-query
//!
//! Provides command-line interface for:
//! - collections: List existing day collections with their counts
//! - find / search / aggregate / distinct: Query the selected days
//! - explain: Show the plan without dispatching it
//! - upsert: Update or create one document in a day collection

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, QueryArgs};
pub use commands::{run, run_command, run_command_to};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
