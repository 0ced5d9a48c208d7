//! Date Resolution Tests
//!
//! Tests for turning date selectors into day lists:
//! - Inclusive ranges with open bounds defaulted
//! - Explicit days merged with ranges, without duplicates
//! - Malformed or inverted input rejected as InvalidRange

use daily_query::{DateRangeResolver, DateSelector, Day, DayOrder, QueryErrorCode};

// =============================================================================
// Helper Functions
// =============================================================================

fn day(s: &str) -> Day {
    s.parse().unwrap()
}

fn resolver() -> DateRangeResolver {
    DateRangeResolver::with_today(day("2024-03-02"))
}

fn names(days: &[Day]) -> Vec<String> {
    days.iter().map(Day::collection_name).collect()
}

// =============================================================================
// Ordering and Uniqueness
// =============================================================================

/// Resolved days are strictly ordered in the requested direction.
#[test]
fn test_days_strictly_ordered() {
    let selector = DateSelector::between(day("2024-02-20"), day("2024-03-02"))
        .with_days([day("2024-02-25"), day("2024-01-01"), day("2024-01-01")]);

    let desc = resolver().resolve(&selector, DayOrder::Descending).unwrap();
    assert!(desc.windows(2).all(|w| w[0] > w[1]));

    let asc = resolver().resolve(&selector, DayOrder::Ascending).unwrap();
    assert!(asc.windows(2).all(|w| w[0] < w[1]));

    assert_eq!(desc.len(), asc.len());
    assert_eq!(desc.len(), 13);
}

/// Ranges cross month boundaries, leap day included.
#[test]
fn test_range_crosses_leap_day() {
    let days = resolver()
        .resolve(
            &DateSelector::between(day("2024-02-28"), day("2024-03-01")),
            DayOrder::Ascending,
        )
        .unwrap();
    assert_eq!(names(&days), vec!["2024-02-28", "2024-02-29", "2024-03-01"]);
}

/// Explicit days alone are not expanded into a range.
#[test]
fn test_explicit_days_only() {
    let selector = DateSelector::new().with_days([day("2024-01-05"), day("2023-12-31")]);
    let days = resolver().resolve(&selector, DayOrder::Descending).unwrap();
    assert_eq!(names(&days), vec!["2024-01-05", "2023-12-31"]);
}

// =============================================================================
// Defaults
// =============================================================================

/// An open upper bound stops at today.
#[test]
fn test_open_upper_bound_is_today() {
    let selector = DateSelector::new().since(day("2024-02-29"));
    let days = resolver().resolve(&selector, DayOrder::Descending).unwrap();
    assert_eq!(names(&days), vec!["2024-03-02", "2024-03-01", "2024-02-29"]);
}

/// An open lower bound starts at the epoch.
#[test]
fn test_open_lower_bound_is_epoch() {
    let selector = DateSelector::new().until(day("1970-01-03"));
    let days = resolver().resolve(&selector, DayOrder::Ascending).unwrap();
    assert_eq!(names(&days), vec!["1970-01-01", "1970-01-02", "1970-01-03"]);
}

/// No-value markers behave like absent bounds.
#[test]
fn test_no_value_markers() {
    let parsed = DateSelector::parse::<&str>(&[], Some("None"), Some("2024-01-02")).unwrap();
    let explicit = DateSelector::new().until(day("2024-01-02"));
    assert_eq!(parsed, explicit);

    let parsed = DateSelector::parse(&["2024-01-01"], Some("null"), Some("")).unwrap();
    assert_eq!(parsed, DateSelector::new().with_days([day("2024-01-01")]));
}

/// Datetime strings keep only their date part.
#[test]
fn test_datetime_strings() {
    let parsed = DateSelector::parse::<&str>(
        &[],
        Some("2024-01-01 23:59:59.999"),
        Some("2024-01-02T00:00:00"),
    )
    .unwrap();
    assert_eq!(
        parsed,
        DateSelector::between(day("2024-01-01"), day("2024-01-02"))
    );
}

// =============================================================================
// Rejections
// =============================================================================

/// days_from after days_to is InvalidRange.
#[test]
fn test_inverted_range() {
    let err = resolver()
        .resolve(
            &DateSelector::between(day("2024-01-02"), day("2024-01-01")),
            DayOrder::Descending,
        )
        .unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::InvalidRange);
}

/// Unparseable dates are InvalidRange.
#[test]
fn test_malformed_date() {
    let err = DateSelector::parse(&["2024-13-01"], None, None).unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::InvalidRange);

    let err = DateSelector::parse::<&str>(&[], Some("yesterday"), None).unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::InvalidRange);
    assert!(err.message().contains("yesterday"));
}
