//! Aggregation pipeline evaluation for the in-memory store
//!
//! Stages run in order over a materialized document list:
//! `$match $project $limit $skip $sort $group $unwind $count`.
//! `$group` keeps groups in first-seen order.

use std::collections::HashMap;

use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::values::{compare, lookup, set_path, sort_order, value_key};
use super::{matcher, project, Document};

/// Runs a pipeline over a list of documents
pub fn run(mut documents: Vec<Document>, pipeline: &[Document]) -> StoreResult<Vec<Document>> {
    for stage in pipeline {
        let (name, spec) = stage_parts(stage)?;
        documents = match name {
            "$match" => match_stage(documents, as_document(name, spec)?)?,
            "$project" => documents
                .iter()
                .map(|d| project::apply(d, as_document(name, spec)?))
                .collect::<StoreResult<_>>()?,
            "$limit" => {
                let n = as_count(name, spec)?;
                documents.truncate(n);
                documents
            }
            "$skip" => {
                let n = as_count(name, spec)?;
                documents.into_iter().skip(n).collect()
            }
            "$sort" => sort_stage(documents, as_document(name, spec)?)?,
            "$group" => group_stage(documents, as_document(name, spec)?)?,
            "$unwind" => unwind_stage(documents, spec)?,
            "$count" => count_stage(documents, spec)?,
            other => {
                return Err(StoreError::InvalidPipeline(format!(
                    "unsupported stage {}",
                    other
                )))
            }
        };
    }

    Ok(documents)
}

/// Validates stage shapes without running them
pub fn validate(pipeline: &[Document]) -> StoreResult<()> {
    run(Vec::new(), pipeline).map(|_| ())
}

fn stage_parts(stage: &Document) -> StoreResult<(&str, &Value)> {
    let mut entries = stage.iter();
    match (entries.next(), entries.next()) {
        (Some((name, spec)), None) => Ok((name.as_str(), spec)),
        _ => Err(StoreError::InvalidPipeline(
            "each stage must have exactly one key".into(),
        )),
    }
}

fn as_document<'a>(name: &str, spec: &'a Value) -> StoreResult<&'a Document> {
    spec.as_object()
        .ok_or_else(|| StoreError::InvalidPipeline(format!("{} expects a document", name)))
}

fn as_count(name: &str, spec: &Value) -> StoreResult<usize> {
    spec.as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| StoreError::InvalidPipeline(format!("{} expects a non-negative integer", name)))
}

fn field_reference(spec: &Value) -> Option<&str> {
    spec.as_str().and_then(|s| s.strip_prefix('$'))
}

fn match_stage(documents: Vec<Document>, filter: &Document) -> StoreResult<Vec<Document>> {
    let mut out = Vec::with_capacity(documents.len());
    for doc in documents {
        if matcher::matches(&doc, filter)? {
            out.push(doc);
        }
    }
    Ok(out)
}

fn sort_stage(mut documents: Vec<Document>, keys: &Document) -> StoreResult<Vec<Document>> {
    let mut order = Vec::with_capacity(keys.len());
    for (field, direction) in keys {
        let descending = match direction.as_i64() {
            Some(1) => false,
            Some(-1) => true,
            _ => {
                return Err(StoreError::InvalidPipeline(format!(
                    "$sort direction for '{}' must be 1 or -1",
                    field
                )))
            }
        };
        order.push((field.as_str(), descending));
    }

    documents.sort_by(|a, b| {
        for (field, descending) in &order {
            let ordering = sort_order(lookup(a, field), lookup(b, field));
            let ordering = if *descending {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering.is_ne() {
                return ordering;
            }
        }
        std::cmp::Ordering::Equal
    });

    Ok(documents)
}

/// Evaluates a group key or accumulator expression
fn evaluate(expr: &Value, doc: &Document) -> Value {
    match expr {
        Value::String(_) => match field_reference(expr) {
            Some(path) => lookup(doc, path).cloned().unwrap_or(Value::Null),
            None => expr.clone(),
        },
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), evaluate(v, doc)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Accumulator {
    Sum,
    First,
    Last,
    Push,
    AddToSet,
    Min,
    Max,
}

impl Accumulator {
    fn parse(name: &str) -> StoreResult<Self> {
        Ok(match name {
            "$sum" => Accumulator::Sum,
            "$first" => Accumulator::First,
            "$last" => Accumulator::Last,
            "$push" => Accumulator::Push,
            "$addToSet" => Accumulator::AddToSet,
            "$min" => Accumulator::Min,
            "$max" => Accumulator::Max,
            other => {
                return Err(StoreError::InvalidPipeline(format!(
                    "unsupported accumulator {}",
                    other
                )))
            }
        })
    }

    fn initial(&self) -> Value {
        match self {
            Accumulator::Sum => Value::from(0),
            Accumulator::Push | Accumulator::AddToSet => Value::Array(Vec::new()),
            _ => Value::Null,
        }
    }

    fn fold(&self, acc: &mut Value, value: Value, first: bool) {
        match self {
            Accumulator::Sum => {
                if let Value::Number(n) = &value {
                    *acc = add_numbers(acc, n);
                }
            }
            Accumulator::First => {
                if first {
                    *acc = value;
                }
            }
            Accumulator::Last => *acc = value,
            Accumulator::Push => {
                if let Value::Array(items) = acc {
                    items.push(value);
                }
            }
            Accumulator::AddToSet => {
                if let Value::Array(items) = acc {
                    if !items.contains(&value) {
                        items.push(value);
                    }
                }
            }
            Accumulator::Min | Accumulator::Max => {
                if value.is_null() {
                    return;
                }
                let wanted = if *self == Accumulator::Min {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Greater
                };
                if acc.is_null() || compare(&value, acc) == Some(wanted) {
                    *acc = value;
                }
            }
        }
    }
}

fn add_numbers(acc: &Value, n: &serde_json::Number) -> Value {
    let current = match acc {
        Value::Number(c) => Some(c),
        _ => None,
    };
    if let (Some(a), Some(b)) = (current.and_then(|c| c.as_i64()), n.as_i64()) {
        if let Some(sum) = a.checked_add(b) {
            return Value::from(sum);
        }
    }
    let a = current.and_then(|c| c.as_f64()).unwrap_or(0.0);
    let b = n.as_f64().unwrap_or(0.0);
    serde_json::Number::from_f64(a + b)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn group_stage(documents: Vec<Document>, spec: &Document) -> StoreResult<Vec<Document>> {
    let id_expr = spec
        .get("_id")
        .ok_or_else(|| StoreError::InvalidPipeline("$group requires an _id".into()))?;

    let mut accumulators = Vec::new();
    for (field, acc_spec) in spec.iter().filter(|(k, _)| k.as_str() != "_id") {
        let (op, operand) = acc_spec
            .as_object()
            .and_then(|m| {
                let mut it = m.iter();
                match (it.next(), it.next()) {
                    (Some(entry), None) => Some(entry),
                    _ => None,
                }
            })
            .ok_or_else(|| {
                StoreError::InvalidPipeline(format!(
                    "$group field '{}' must be a single accumulator",
                    field
                ))
            })?;
        accumulators.push((field.clone(), Accumulator::parse(op)?, operand));
    }

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Document> = Vec::new();

    for doc in &documents {
        let key = evaluate(id_expr, doc);
        let hash_key = value_key(&key);
        let existing = index.get(&hash_key).copied();
        let (position, first) = match existing {
            Some(position) => (position, false),
            None => {
                let mut group = Document::new();
                group.insert("_id".to_string(), key);
                for (field, acc, _) in &accumulators {
                    group.insert(field.clone(), acc.initial());
                }
                index.insert(hash_key, groups.len());
                groups.push(group);
                (groups.len() - 1, true)
            }
        };

        let group = &mut groups[position];
        for (field, acc, operand) in &accumulators {
            let value = evaluate(operand, doc);
            if let Some(current) = group.get_mut(field) {
                acc.fold(current, value, first);
            }
        }
    }

    Ok(groups)
}

fn unwind_stage(documents: Vec<Document>, spec: &Value) -> StoreResult<Vec<Document>> {
    let path = match spec {
        Value::Object(opts) => opts.get("path").and_then(field_reference),
        other => field_reference(other),
    }
    .ok_or_else(|| StoreError::InvalidPipeline("$unwind expects a '$field' path".into()))?;

    let mut out = Vec::new();
    for doc in documents {
        let items = match lookup(&doc, path) {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::Null) | None => continue,
            Some(_) => {
                out.push(doc);
                continue;
            }
        };
        for item in items {
            let mut copy = doc.clone();
            set_path(&mut copy, path, item);
            out.push(copy);
        }
    }
    Ok(out)
}

fn count_stage(documents: Vec<Document>, spec: &Value) -> StoreResult<Vec<Document>> {
    let field = spec
        .as_str()
        .filter(|s| !s.is_empty() && !s.starts_with('$'))
        .ok_or_else(|| StoreError::InvalidPipeline("$count expects a field name".into()))?;

    if documents.is_empty() {
        return Ok(Vec::new());
    }

    let mut out = Document::new();
    out.insert(field.to_string(), Value::from(documents.len() as u64));
    Ok(vec![out])
}
