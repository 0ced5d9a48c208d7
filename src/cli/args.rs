//! CLI argument definitions using clap
//!
//! Commands:
//! - daily-query collections --config <path> [selection]
//! - daily-query find --config <path> [selection] [--flatten]
//! - daily-query search --config <path> [selection]
//! - daily-query aggregate --pipeline <json> [selection] [--flatten]
//! - daily-query distinct --field <f> [selection]
//! - daily-query explain [--pipeline <json>] [selection]
//! - daily-query upsert --day <d> --criteria <json> --defaults <json>

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// daily-query - Query day-partitioned document collections
#[derive(Parser, Debug)]
#[command(name = "daily-query")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Date selection and query shape shared by the read commands
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Path to configuration file
    #[arg(long, default_value = "./daily-query.json")]
    pub config: PathBuf,

    /// Explicit day (YYYY-MM-DD), repeatable
    #[arg(long = "day")]
    pub days: Vec<String>,

    /// First day of the range, inclusive
    #[arg(long)]
    pub from: Option<String>,

    /// Last day of the range, inclusive
    #[arg(long)]
    pub to: Option<String>,

    /// Filter document as JSON
    #[arg(long)]
    pub filter: Option<String>,

    /// Fields to include, comma separated
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Fields to exclude, comma separated
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Maximum number of documents across all collections
    #[arg(long)]
    pub limit: Option<u64>,

    /// Visit the oldest day first
    #[arg(long)]
    pub ascending: bool,

    /// Emit one line per document instead of one per collection
    #[arg(long)]
    pub flatten: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the existing collections for the selected days
    Collections {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Find matching documents
    Find {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Find matching documents, one line per document with its collection
    Search {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Run an aggregation pipeline in every selected collection
    Aggregate {
        #[command(flatten)]
        query: QueryArgs,

        /// Pipeline stages as a JSON array
        #[arg(long)]
        pipeline: String,
    },

    /// Distinct values of a field across the selected collections
    Distinct {
        #[command(flatten)]
        query: QueryArgs,

        /// Field to collect
        #[arg(long)]
        field: String,
    },

    /// Show the plan without running it
    Explain {
        #[command(flatten)]
        query: QueryArgs,

        /// Explain an aggregation with these stages instead of a find
        #[arg(long)]
        pipeline: Option<String>,
    },

    /// Update the document matching the criteria, or create it
    Upsert {
        /// Path to configuration file
        #[arg(long, default_value = "./daily-query.json")]
        config: PathBuf,

        /// Day whose collection is written
        #[arg(long)]
        day: String,

        /// Equality criteria as a JSON object
        #[arg(long)]
        criteria: String,

        /// Fields to set as a JSON object
        #[arg(long)]
        defaults: String,
    },
}

impl Command {
    /// Path to the configuration file
    pub fn config(&self) -> &Path {
        match self {
            Command::Collections { query }
            | Command::Find { query }
            | Command::Search { query }
            | Command::Aggregate { query, .. }
            | Command::Distinct { query, .. }
            | Command::Explain { query, .. } => &query.config,
            Command::Upsert { config, .. } => config,
        }
    }

    /// Subcommand name, for logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Collections { .. } => "collections",
            Command::Find { .. } => "find",
            Command::Search { .. } => "search",
            Command::Aggregate { .. } => "aggregate",
            Command::Distinct { .. } => "distinct",
            Command::Explain { .. } => "explain",
            Command::Upsert { .. } => "upsert",
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
