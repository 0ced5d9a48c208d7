//! CLI command implementations
//!
//! Every command follows the same sequence:
//!
//! 1. Load and validate the configuration
//! 2. Apply the configured log level
//! 3. Open the store named by the connection string
//! 4. Run one facade operation and stream its results as JSON lines
//!
//! Errors abort the command. Lines already written stay written.

use std::io::{self, Write};

use serde_json::json;

use crate::config::Config;
use crate::dates::{DateSelector, Day, DayOrder};
use crate::errors::QueryError;
use crate::executor::FanOut;
use crate::facade::{DailyQuery, FindQuery};
use crate::observability::{log_event, Event, Logger};
use crate::store::{ConnectionString, DocumentStore, MemoryStore, Scheme, StoreCollection};

use super::args::{Command, QueryArgs};
use super::errors::CliResult;
use super::io::{parse_document, parse_pipeline, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    let name = cli.command.name();
    run_command(cli.command).map_err(|e| {
        log_event(
            Event::CommandFailed,
            &[
                ("code", e.code_str()),
                ("command", name),
                ("error", e.message()),
            ],
        );
        e
    })
}

/// Run a command, writing results to stdout
pub fn run_command(cmd: Command) -> CliResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_command_to(cmd, &mut out)
}

/// Run a command, writing results to `out`
pub fn run_command_to<W: Write>(cmd: Command, out: &mut W) -> CliResult<()> {
    let config = Config::load(cmd.config())?;
    Logger::set_level(config.log_severity()?);

    let uri = config.connection_string()?;
    log_event(
        Event::ConfigLoaded,
        &[
            ("command", cmd.name()),
            ("fetch_batch", &config.fetch_batch.to_string()),
            ("uri", &uri.redacted()),
        ],
    );

    match uri.scheme() {
        Scheme::Memory => {
            let store = open_memory(&config)?;
            dispatch(store, &config, &uri, cmd, out)
        }
        Scheme::Mongodb | Scheme::MongodbSrv => open_mongo(&config, &uri, cmd, out),
    }
}

fn open_memory(config: &Config) -> CliResult<MemoryStore> {
    match &config.seed_dir {
        Some(dir) => MemoryStore::load_dir(dir).map_err(|e| {
            QueryError::configuration(format!(
                "Failed to load seed_dir {}: {}",
                dir.display(),
                e
            ))
            .into()
        }),
        None => Ok(MemoryStore::new()),
    }
}

#[cfg(feature = "mongodb")]
fn open_mongo<W: Write>(
    config: &Config,
    uri: &ConnectionString,
    cmd: Command,
    out: &mut W,
) -> CliResult<()> {
    let store = crate::store::MongoStore::connect(uri)?;
    dispatch(store, config, uri, cmd, out)
}

#[cfg(not(feature = "mongodb"))]
fn open_mongo<W: Write>(
    _config: &Config,
    uri: &ConnectionString,
    _cmd: Command,
    _out: &mut W,
) -> CliResult<()> {
    Err(QueryError::configuration(format!(
        "{}:// stores require building with the `mongodb` feature",
        uri.scheme().as_str()
    ))
    .into())
}

fn dispatch<S: DocumentStore, W: Write>(
    store: S,
    config: &Config,
    uri: &ConnectionString,
    cmd: Command,
    out: &mut W,
) -> CliResult<()> {
    log_event(
        Event::StoreOpened,
        &[
            ("database", uri.database()),
            ("scheme", uri.scheme().as_str()),
        ],
    );

    let daily = DailyQuery::new(store).with_fetch_batch(config.fetch_batch);

    match cmd {
        Command::Collections { query } => {
            let query = find_query(&query)?;
            let resolved = daily.get_collections(query.date_selector(), query.day_order())?;
            for handle in resolved.handles() {
                write_response(
                    out,
                    json!({
                        "collection": handle.name(),
                        "documents": handle.count()?,
                    }),
                )?;
            }
        }
        Command::Find { query } => {
            let flatten = query.flatten;
            write_fan_out(out, daily.find(find_query(&query)?)?, flatten)?;
        }
        Command::Search { query } => {
            for item in daily.search(find_query(&query)?)? {
                write_response(out, item?.to_json())?;
            }
        }
        Command::Aggregate { query, pipeline } => {
            let stages = parse_pipeline(&pipeline)?;
            let flatten = query.flatten;
            write_fan_out(out, daily.aggregate(find_query(&query)?, stages)?, flatten)?;
        }
        Command::Distinct { query, field } => {
            for value in daily.distinct(&field, find_query(&query)?)? {
                write_response(out, value?)?;
            }
        }
        Command::Explain { query, pipeline } => {
            let find = find_query(&query)?;
            let explain = match pipeline {
                Some(raw) => daily.explain_aggregate(&find, parse_pipeline(&raw)?)?,
                None => daily.explain(&find)?,
            };
            write_response(out, explain.to_json())?;
        }
        Command::Upsert {
            day,
            criteria,
            defaults,
            ..
        } => {
            let criteria = parse_document("criteria", &criteria)?;
            let defaults = parse_document("defaults", &defaults)?;
            let collection = daily.day(Day::parse(&day)?);
            let before = collection.update_or_create(defaults, criteria)?;
            write_response(
                out,
                json!({
                    "collection": collection.name(),
                    "created": before.is_none(),
                    "before": before,
                }),
            )?;
        }
    }

    Ok(())
}

/// Build a facade query from the shared options
fn find_query(args: &QueryArgs) -> CliResult<FindQuery> {
    let dates = DateSelector::parse(
        args.days.as_slice(),
        args.from.as_deref(),
        args.to.as_deref(),
    )?;

    let mut query = FindQuery::new()
        .dates(dates)
        .fields(args.fields.iter().map(String::as_str))
        .exclude(args.exclude.iter().map(String::as_str))
        .order(if args.ascending {
            DayOrder::Ascending
        } else {
            DayOrder::Descending
        });

    if let Some(raw) = &args.filter {
        query = query.filter(parse_document("filter", raw)?);
    }
    if let Some(limit) = args.limit {
        query = query.limit(limit);
    }

    Ok(query)
}

/// One line per collection, or one per document when flattened
fn write_fan_out<C: StoreCollection, W: Write>(
    out: &mut W,
    fan_out: FanOut<C>,
    flatten: bool,
) -> CliResult<()> {
    if flatten {
        for item in fan_out.documents() {
            write_response(out, item?.to_json())?;
        }
        return Ok(());
    }

    for batch in fan_out {
        let batch = batch?;
        write_response(
            out,
            json!({
                "collection": batch.collection(),
                "day": batch.day().to_string(),
                "matched": batch.matched(),
                "documents": batch.documents(),
            }),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::args::Cli;
    use super::super::errors::CliErrorCode;
    use super::*;
    use crate::errors::QueryErrorCode;
    use clap::Parser;
    use serde_json::Value;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_config(temp_dir: &TempDir) -> PathBuf {
        let seed_dir = temp_dir.path().join("seed");
        fs::create_dir(&seed_dir).unwrap();
        fs::write(
            seed_dir.join("2024-01-01.json"),
            json!([
                {"_id": 1, "title": "a", "tags": ["rust"]},
                {"_id": 2, "title": "b", "tags": ["go"]}
            ])
            .to_string(),
        )
        .unwrap();
        fs::write(
            seed_dir.join("2024-01-02.json"),
            json!([{"_id": 3, "title": "c", "tags": ["rust", "db"]}]).to_string(),
        )
        .unwrap();

        let config_path = temp_dir.path().join("daily-query.json");
        let config = json!({
            "uri": "memory://",
            "seed_dir": seed_dir.to_string_lossy()
        });
        fs::write(&config_path, config.to_string()).unwrap();
        config_path
    }

    fn run_args(config: &std::path::Path, args: &[&str]) -> CliResult<Vec<Value>> {
        let mut argv = vec!["daily-query"];
        argv.extend_from_slice(args);
        argv.push("--config");
        let config = config.to_string_lossy().to_string();
        argv.push(&config);

        let cli = Cli::try_parse_from(argv).unwrap();
        let mut out = Vec::new();
        run_command_to(cli.command, &mut out)?;

        Ok(String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str::<Value>(line).unwrap()["data"].clone())
            .collect())
    }

    #[test]
    fn test_collections_lists_existing_days() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_config(&temp_dir);

        let lines = run_args(
            &config,
            &["collections", "--from", "2023-12-31", "--to", "2024-01-02"],
        )
        .unwrap();
        assert_eq!(
            lines,
            vec![
                json!({"collection": "2024-01-02", "documents": 1}),
                json!({"collection": "2024-01-01", "documents": 2}),
            ]
        );
    }

    #[test]
    fn test_find_one_line_per_collection() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_config(&temp_dir);

        let lines = run_args(
            &config,
            &["find", "--from", "2024-01-01", "--to", "2024-01-02", "--ascending"],
        )
        .unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["collection"], "2024-01-01");
        assert_eq!(lines[0]["matched"], 2);
        assert_eq!(lines[1]["documents"][0]["title"], "c");
    }

    #[test]
    fn test_find_flatten_with_limit() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_config(&temp_dir);

        let lines = run_args(
            &config,
            &[
                "find",
                "--day",
                "2024-01-01",
                "--day",
                "2024-01-02",
                "--fields",
                "title",
                "--exclude",
                "_id",
                "--limit",
                "2",
                "--flatten",
            ],
        )
        .unwrap();
        assert_eq!(
            lines,
            vec![
                json!({"collection": "2024-01-02", "document": {"title": "c"}}),
                json!({"collection": "2024-01-01", "document": {"title": "a"}}),
            ]
        );
    }

    #[test]
    fn test_distinct_command() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_config(&temp_dir);

        let lines = run_args(
            &config,
            &[
                "distinct",
                "--field",
                "tags",
                "--from",
                "2024-01-01",
                "--to",
                "2024-01-02",
            ],
        )
        .unwrap();
        assert_eq!(lines, vec![json!("rust"), json!("db"), json!("go")]);
    }

    #[test]
    fn test_aggregate_command() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_config(&temp_dir);

        let lines = run_args(
            &config,
            &[
                "aggregate",
                "--day",
                "2024-01-01",
                "--pipeline",
                r#"[{"$count": "n"}]"#,
            ],
        )
        .unwrap();
        assert_eq!(lines[0]["documents"], json!([{"n": 2}]));
    }

    #[test]
    fn test_explain_command() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_config(&temp_dir);

        let lines = run_args(
            &config,
            &["explain", "--from", "2024-01-01", "--to", "2024-01-02", "--limit", "1"],
        )
        .unwrap();
        assert_eq!(lines[0]["total_documents"], 3);
        assert_eq!(lines[0]["effective_limit"], 1);
    }

    #[test]
    fn test_upsert_command() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_config(&temp_dir);

        let lines = run_args(
            &config,
            &[
                "upsert",
                "--day",
                "2024-01-05",
                "--criteria",
                r#"{"url": "/a"}"#,
                "--defaults",
                r#"{"views": 1}"#,
            ],
        )
        .unwrap();
        assert_eq!(lines[0]["collection"], "2024-01-05");
        assert_eq!(lines[0]["created"], true);
    }

    #[test]
    fn test_inverted_range_error() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_config(&temp_dir);

        let err = run_args(&config, &["find", "--from", "2024-01-02", "--to", "2024-01-01"])
            .unwrap_err();
        assert_eq!(
            err.code(),
            &CliErrorCode::Query(QueryErrorCode::InvalidRange)
        );
    }

    #[test]
    fn test_invalid_filter_argument() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_config(&temp_dir);

        let err = run_args(&config, &["find", "--day", "2024-01-01", "--filter", "[1]"])
            .unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::InvalidArgument);
    }

    #[test]
    fn test_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let err = run_args(&temp_dir.path().join("absent.json"), &["find"]).unwrap_err();
        assert_eq!(err.code_str(), "DAILY_CONFIGURATION");
    }

    #[cfg(not(feature = "mongodb"))]
    #[test]
    fn test_mongodb_requires_feature() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("daily-query.json");
        fs::write(&config_path, json!({"uri": "mongodb://localhost/news"}).to_string()).unwrap();

        let err = run_args(&config_path, &["find"]).unwrap_err();
        assert_eq!(err.code_str(), "DAILY_CONFIGURATION");
        assert!(err.message().contains("mongodb"));
    }
}
