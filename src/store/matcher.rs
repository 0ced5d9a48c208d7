//! Filter document evaluation
//!
//! Evaluates MongoDB-style filter documents against JSON documents.
//!
//! Supported:
//! - implicit equality (`{"field": value}`), matching array members too
//! - comparison: `$eq $ne $gt $gte $lt $lte`
//! - membership: `$in $nin`
//! - presence: `$exists`
//! - logical: `$and $or $nor`
//!
//! Unknown operators are rejected, never ignored.

use std::cmp::Ordering;

use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::values::{compare, equals, lookup};
use super::Document;

/// Checks whether a document matches a filter
pub fn matches(doc: &Document, filter: &Document) -> StoreResult<bool> {
    for (key, condition) in filter {
        let matched = match key.as_str() {
            "$and" => all_of(doc, condition)?,
            "$or" => any_of(doc, condition)?,
            "$nor" => !any_of(doc, condition)?,
            op if op.starts_with('$') => {
                return Err(StoreError::InvalidFilter(format!(
                    "unknown top-level operator {}",
                    op
                )))
            }
            field => matches_field(lookup(doc, field), condition)?,
        };

        if !matched {
            return Ok(false);
        }
    }

    Ok(true)
}

fn sub_filters(condition: &Value) -> StoreResult<Vec<&Document>> {
    let items = condition
        .as_array()
        .ok_or_else(|| StoreError::InvalidFilter("logical operator expects an array".into()))?;

    items
        .iter()
        .map(|item| {
            item.as_object().ok_or_else(|| {
                StoreError::InvalidFilter("logical operator items must be documents".into())
            })
        })
        .collect()
}

fn all_of(doc: &Document, condition: &Value) -> StoreResult<bool> {
    for filter in sub_filters(condition)? {
        if !matches(doc, filter)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn any_of(doc: &Document, condition: &Value) -> StoreResult<bool> {
    for filter in sub_filters(condition)? {
        if matches(doc, filter)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Returns true when a condition is an operator document (`{"$gt": 1}`)
fn is_operator_document(condition: &Value) -> bool {
    match condition {
        Value::Object(map) => !map.is_empty() && map.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

fn matches_field(actual: Option<&Value>, condition: &Value) -> StoreResult<bool> {
    let Value::Object(operators) = condition else {
        return Ok(eq_match(actual, condition));
    };
    if !is_operator_document(condition) {
        return Ok(eq_match(actual, condition));
    }

    for (op, operand) in operators {
        let matched = match op.as_str() {
            "$eq" => eq_match(actual, operand),
            "$ne" => !eq_match(actual, operand),
            "$gt" => range_match(actual, operand, |o| o == Ordering::Greater),
            "$gte" => range_match(actual, operand, |o| o != Ordering::Less),
            "$lt" => range_match(actual, operand, |o| o == Ordering::Less),
            "$lte" => range_match(actual, operand, |o| o != Ordering::Greater),
            "$in" => in_match(actual, operand)?,
            "$nin" => !in_match(actual, operand)?,
            "$exists" => {
                let wanted = operand.as_bool().ok_or_else(|| {
                    StoreError::InvalidFilter("$exists expects a boolean".into())
                })?;
                actual.is_some() == wanted
            }
            other => {
                return Err(StoreError::InvalidFilter(format!(
                    "unknown operator {}",
                    other
                )))
            }
        };

        if !matched {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Equality: missing matches null, arrays match any member
fn eq_match(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        None => expected.is_null(),
        Some(value) => {
            if equals(value, expected) {
                return true;
            }
            match value {
                Value::Array(items) => items.iter().any(|item| equals(item, expected)),
                _ => false,
            }
        }
    }
}

/// Range comparison: same-kind values only, arrays match any member
fn range_match(actual: Option<&Value>, bound: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    let Some(value) = actual else {
        return false;
    };

    let check = |v: &Value| compare(v, bound).map(&accept).unwrap_or(false);

    match value {
        Value::Array(items) => items.iter().any(check),
        other => check(other),
    }
}

fn in_match(actual: Option<&Value>, operand: &Value) -> StoreResult<bool> {
    let candidates = operand
        .as_array()
        .ok_or_else(|| StoreError::InvalidFilter("$in/$nin expects an array".into()))?;

    Ok(candidates.iter().any(|c| eq_match(actual, c)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn check(d: Value, f: Value) -> bool {
        matches(&doc(d), &doc(f)).unwrap()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(check(json!({"a": 1}), json!({})));
    }

    #[test]
    fn test_implicit_equality() {
        assert!(check(json!({"name": "Alice"}), json!({"name": "Alice"})));
        assert!(!check(json!({"name": "Alice"}), json!({"name": "Bob"})));
    }

    #[test]
    fn test_no_type_coercion() {
        assert!(!check(json!({"value": 123}), json!({"value": "123"})));
        assert!(check(json!({"value": 123}), json!({"value": 123.0})));
    }

    #[test]
    fn test_array_membership() {
        let d = json!({"tags": ["rust", "db"]});
        assert!(check(d.clone(), json!({"tags": "rust"})));
        assert!(!check(d.clone(), json!({"tags": "go"})));
        assert!(check(d, json!({"tags": {"$in": ["go", "db"]}})));
    }

    #[test]
    fn test_range_predicates() {
        let d = json!({"age": 25});
        assert!(check(d.clone(), json!({"age": {"$gte": 18, "$lt": 30}})));
        assert!(!check(d.clone(), json!({"age": {"$gt": 25}})));
        assert!(check(d.clone(), json!({"age": {"$lte": 25}})));
        assert!(!check(d, json!({"age": {"$gt": "20"}})));
    }

    #[test]
    fn test_missing_field() {
        assert!(!check(json!({"a": 1}), json!({"b": 1})));
        assert!(check(json!({"a": 1}), json!({"b": null})));
        assert!(check(json!({"a": 1}), json!({"b": {"$exists": false}})));
        assert!(!check(json!({"a": 1}), json!({"b": {"$gt": 0}})));
    }

    #[test]
    fn test_logical_operators() {
        let d = json!({"status": "active", "age": 21});
        assert!(check(
            d.clone(),
            json!({"$or": [{"status": "inactive"}, {"age": {"$gt": 18}}]})
        ));
        assert!(!check(
            d.clone(),
            json!({"$and": [{"status": "active"}, {"age": {"$lt": 18}}]})
        ));
        assert!(check(d, json!({"$nor": [{"status": "banned"}]})));
    }

    #[test]
    fn test_nested_path() {
        let d = json!({"source": {"site": "example.org"}});
        assert!(check(d, json!({"source.site": "example.org"})));
    }

    #[test]
    fn test_embedded_document_equality() {
        let d = json!({"source": {"site": "example.org"}});
        assert!(check(d, json!({"source": {"site": "example.org"}})));
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let err = matches(&doc(json!({"a": 1})), &doc(json!({"a": {"$regex": "x"}}))).unwrap_err();
        assert!(matches!(err, StoreError::InvalidFilter(_)));

        let err = matches(&doc(json!({"a": 1})), &doc(json!({"$where": "x"}))).unwrap_err();
        assert!(matches!(err, StoreError::InvalidFilter(_)));
    }
}
