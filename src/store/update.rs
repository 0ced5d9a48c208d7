//! Update document application for the in-memory store
//!
//! Supports `$set`, `$setOnInsert`, `$unset` and `$inc`.

use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::values::{lookup, remove_path, set_path};
use super::Document;

fn operand<'a>(op: &str, value: &'a Value) -> StoreResult<&'a Document> {
    value
        .as_object()
        .ok_or_else(|| StoreError::InvalidUpdate(format!("{} expects a document", op)))
}

/// Validates that an update only uses supported operators
pub fn validate(update: &Document) -> StoreResult<()> {
    if update.is_empty() {
        return Err(StoreError::InvalidUpdate("update document is empty".into()));
    }
    for (op, value) in update {
        match op.as_str() {
            "$set" | "$setOnInsert" | "$unset" | "$inc" => {
                operand(op, value)?;
            }
            other => {
                return Err(StoreError::InvalidUpdate(format!(
                    "unsupported update operator '{}'",
                    other
                )))
            }
        }
    }
    Ok(())
}

/// Applies an update to a document in place.
///
/// `inserting` enables `$setOnInsert`.
pub fn apply(doc: &mut Document, update: &Document, inserting: bool) -> StoreResult<()> {
    validate(update)?;

    for (op, value) in update {
        let fields = operand(op, value)?;
        match op.as_str() {
            "$set" => {
                for (path, v) in fields {
                    set_path(doc, path, v.clone());
                }
            }
            "$setOnInsert" if inserting => {
                for (path, v) in fields {
                    set_path(doc, path, v.clone());
                }
            }
            "$unset" => {
                for path in fields.keys() {
                    remove_path(doc, path);
                }
            }
            "$inc" => {
                for (path, delta) in fields {
                    let next = increment(lookup(doc, path), delta, path)?;
                    set_path(doc, path, next);
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn increment(current: Option<&Value>, delta: &Value, path: &str) -> StoreResult<Value> {
    let non_numeric = || StoreError::InvalidUpdate(format!("cannot $inc non-numeric field '{}'", path));

    let Value::Number(delta) = delta else {
        return Err(non_numeric());
    };
    let current = match current {
        None | Some(Value::Null) => return Ok(Value::Number(delta.clone())),
        Some(Value::Number(n)) => n,
        Some(_) => return Err(non_numeric()),
    };

    if let (Some(a), Some(b)) = (current.as_i64(), delta.as_i64()) {
        if let Some(sum) = a.checked_add(b) {
            return Ok(Value::from(sum));
        }
    }

    let sum = current.as_f64().unwrap_or(0.0) + delta.as_f64().unwrap_or(0.0);
    serde_json::Number::from_f64(sum)
        .map(Value::Number)
        .ok_or_else(non_numeric)
}

/// Seeds a new document from the equality parts of a filter
pub fn seed_from_filter(filter: &Document) -> Document {
    let mut doc = Document::new();
    for (field, condition) in filter {
        if field.starts_with('$') {
            continue;
        }
        let value = match condition {
            Value::Object(ops) if ops.keys().any(|k| k.starts_with('$')) => match ops.get("$eq") {
                Some(v) => v.clone(),
                None => continue,
            },
            other => other.clone(),
        };
        set_path(&mut doc, field, value);
    }
    doc
}
