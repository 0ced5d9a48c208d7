//! Observability subsystem
//!
//! - Structured logging (JSON lines on stderr)
//! - Typed events
//! - Atomic metrics counters
//!
//! Observability is read-only: it never changes query results, and a
//! failure to write a log line is ignored.
//!
//! ```ignore
//! use daily_query::observability::{log_event, Event, Logger, Severity};
//!
//! Logger::set_level(Severity::Trace);
//! log_event(Event::DatesResolved, &[("days", "3")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity, DEFAULT_LEVEL};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a typed event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        // both are TRACE, below the default level, so nothing is written
        assert!(Event::DatesResolved.severity() < DEFAULT_LEVEL);
        assert!(Event::CollectionFailed.severity() < DEFAULT_LEVEL);
        log_event(Event::DatesResolved, &[("days", "1")]);
        log_event(Event::CollectionFailed, &[("collection", "2024-01-01")]);
    }
}
