//! Fan-out Budget Tests
//!
//! Tests for the global result budget across day collections:
//! - Newest day first, stop once the budget is spent
//! - Collections are dispatched only when pulled
//! - The first failing collection ends the stream

use daily_query::{
    DailyQuery, DateSelector, Day, Document, FindQuery, MemoryStore, QueryErrorCode, QueryResult,
};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn day(s: &str) -> Day {
    s.parse().unwrap()
}

fn seed(store: &MemoryStore, name: &str, count: usize) {
    let docs = (0..count)
        .map(|i| json!({"n": i, "day": name}))
        .collect::<Vec<_>>();
    store.insert_values(name, docs).unwrap();
}

/// 2024-01-01: 3 docs, 2024-01-02: 5 docs, 2024-01-03: 2 docs
fn three_days() -> DailyQuery<MemoryStore> {
    let store = MemoryStore::new();
    seed(&store, "2024-01-01", 3);
    seed(&store, "2024-01-02", 5);
    seed(&store, "2024-01-03", 2);
    DailyQuery::new(store).with_today(day("2024-01-03"))
}

fn stage(value: serde_json::Value) -> Document {
    value.as_object().cloned().unwrap()
}

fn range() -> FindQuery {
    FindQuery::new().between(day("2024-01-01"), day("2024-01-03"))
}

// =============================================================================
// Budget
// =============================================================================

/// Limit 6 over 3/5/2 documents: newest two days fill it, the oldest is skipped.
#[test]
fn test_limit_spans_newest_days_first() {
    let q = three_days();

    let batches: Vec<_> = q
        .find(range().limit(6))
        .unwrap()
        .collect::<QueryResult<_>>()
        .unwrap();

    let names: Vec<&str> = batches.iter().map(|b| b.collection()).collect();
    assert_eq!(names, vec!["2024-01-03", "2024-01-02"]);
    assert_eq!(batches[0].matched(), 2);
    assert_eq!(batches[1].matched(), 4);

    assert_eq!(q.store().dispatch_log(), vec!["2024-01-03", "2024-01-02"]);
    assert_eq!(q.metrics().fanouts_short_circuited, 1);
}

/// Flattened search yields exactly the budget.
#[test]
fn test_search_yields_exactly_limit() {
    let q = three_days();

    let items: Vec<_> = q
        .search(range().limit(6))
        .unwrap()
        .collect::<QueryResult<_>>()
        .unwrap();

    assert_eq!(items.len(), 6);
    assert!(items[..2].iter().all(|i| i.collection() == "2024-01-03"));
    assert!(items[2..].iter().all(|i| i.collection() == "2024-01-02"));
    assert!(!q.store().dispatch_log().contains(&"2024-01-01".to_string()));
}

/// Without a limit every matching document is returned.
#[test]
fn test_no_limit_returns_everything() {
    let q = three_days();

    let docs: Vec<Document> = q
        .search(range())
        .unwrap()
        .bare()
        .collect::<QueryResult<_>>()
        .unwrap();
    assert_eq!(docs.len(), 10);
}

/// A limit above the total is capped by the total.
#[test]
fn test_limit_above_total() {
    let q = three_days();

    let fan_out = q.find(range().limit(100)).unwrap();
    assert_eq!(fan_out.budget().effective(), 10);
    assert_eq!(fan_out.count(), 3);
}

/// Zero candidates means nothing is dispatched.
#[test]
fn test_empty_range_dispatches_nothing() {
    let q = three_days();

    let batches: Vec<_> = q
        .find(FindQuery::new().between(day("2023-12-01"), day("2023-12-31")))
        .unwrap()
        .collect();
    assert!(batches.is_empty());
    assert!(q.store().dispatch_log().is_empty());
}

/// Ascending order visits the oldest day first.
#[test]
fn test_ascending_order() {
    let q = three_days();

    let names: Vec<String> = q
        .find(range().ascending().limit(4))
        .unwrap()
        .map(|b| b.unwrap().collection().to_string())
        .collect();
    assert_eq!(names, vec!["2024-01-01", "2024-01-02"]);
}

/// Aggregation results also count against the budget.
#[test]
fn test_aggregate_budget() {
    let q = three_days();

    let items: Vec<_> = q
        .aggregate(range().limit(3), vec![stage(json!({"$sort": {"n": -1}}))])
        .unwrap()
        .documents()
        .collect::<QueryResult<_>>()
        .unwrap();

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].document.get("n"), Some(&json!(1)));
    assert_eq!(items[2].collection(), "2024-01-02");
    assert_eq!(items[2].document.get("n"), Some(&json!(4)));
}

// =============================================================================
// Laziness
// =============================================================================

/// Building the fan-out counts collections but queries none.
#[test]
fn test_nothing_dispatched_until_pulled() {
    let q = three_days();

    let mut fan_out = q.find(range()).unwrap();
    assert!(q.store().dispatch_log().is_empty());
    assert_eq!(fan_out.pending(), 3);

    fan_out.next().unwrap().unwrap();
    assert_eq!(q.store().dispatch_log(), vec!["2024-01-03"]);
}

/// Pulling single documents dispatches the next collection only when needed.
#[test]
fn test_documents_pull_collections_one_at_a_time() {
    let q = three_days();

    let mut items = q.search(range()).unwrap();
    items.next().unwrap().unwrap();
    items.next().unwrap().unwrap();
    assert_eq!(q.store().dispatch_log(), vec!["2024-01-03"]);

    items.next().unwrap().unwrap();
    assert_eq!(q.store().dispatch_log(), vec!["2024-01-03", "2024-01-02"]);
}

// =============================================================================
// Failures
// =============================================================================

/// A failing collection ends the stream with PipelineExecution.
#[test]
fn test_failure_is_fail_fast() {
    let q = three_days();
    q.store().fail_collection("2024-01-02");

    let results: Vec<_> = q.find(range()).unwrap().collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());

    let err = results[1].as_ref().unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::PipelineExecution);
    assert_eq!(err.collection(), Some("2024-01-02"));

    assert!(!q.store().dispatch_log().contains(&"2024-01-01".to_string()));
    assert_eq!(q.metrics().dispatch_failures, 1);
}

/// Documents already yielded before the failure stay with the caller.
#[test]
fn test_failure_after_partial_results() {
    let q = three_days();
    q.store().fail_collection("2024-01-01");

    let mut yielded = 0;
    let mut failed = None;
    for item in q.search(range()).unwrap() {
        match item {
            Ok(_) => yielded += 1,
            Err(err) => failed = Some(err),
        }
    }

    assert_eq!(yielded, 7);
    assert_eq!(failed.unwrap().code(), QueryErrorCode::PipelineExecution);
}

/// An unreachable store fails before any fan-out is built.
#[test]
fn test_unavailable_store_fails_binding() {
    let q = three_days();
    q.store().disconnect();

    let err = q.find(range()).err().unwrap();
    assert_eq!(err.code(), QueryErrorCode::CollectionBind);

    q.store().reconnect();
    assert!(q.find(range()).is_ok());
}

/// The unbounded selector reaches every stored day.
#[test]
fn test_selector_forever_covers_all_days() {
    let q = three_days();

    let total: u64 = q
        .find(FindQuery::new().dates(DateSelector::forever()))
        .unwrap()
        .map(|b| b.unwrap().matched())
        .sum();
    assert_eq!(total, 10);
}
