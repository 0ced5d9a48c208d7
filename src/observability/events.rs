//! Observable events
//!
//! Events are explicit and typed. Each carries its own severity. Events
//! raised by the query core are all `TRACE`, below the default level; only
//! the CLI reports failures at `ERROR`.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Process
    /// Configuration loaded
    ConfigLoaded,
    /// Store client created
    StoreOpened,

    // Query planning
    /// Date selector resolved into days
    DatesResolved,
    /// Existing collections bound and counted
    CatalogResolved,
    /// Query plan built
    QueryPlanned,
    /// Query rejected before dispatch
    QueryRejected,

    // Fan-out
    /// Query issued against one collection
    CollectionDispatched,
    /// Remaining collections skipped because the budget ran out
    BudgetExhausted,
    /// Query against one collection failed
    CollectionFailed,

    // Writes
    /// Upsert applied to a day collection
    UpsertApplied,

    // CLI
    /// A command ended with an error
    CommandFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreOpened => "STORE_OPENED",
            Event::DatesResolved => "DATES_RESOLVED",
            Event::CatalogResolved => "CATALOG_RESOLVED",
            Event::QueryPlanned => "QUERY_PLANNED",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::CollectionDispatched => "COLLECTION_DISPATCHED",
            Event::BudgetExhausted => "BUDGET_EXHAUSTED",
            Event::CollectionFailed => "COLLECTION_FAILED",
            Event::UpsertApplied => "UPSERT_APPLIED",
            Event::CommandFailed => "COMMAND_FAILED",
        }
    }

    /// Returns the severity this event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::ConfigLoaded | Event::StoreOpened => Severity::Info,
            Event::CommandFailed => Severity::Error,
            _ => Severity::Trace,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
