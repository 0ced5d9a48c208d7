//! Projection application for the in-memory store
//!
//! Follows the store rules: a projection is either inclusive or exclusive.
//! `_id` is kept by inclusive projections unless explicitly excluded, and
//! is the only field allowed to be excluded inside an inclusive projection.
//! String values starting with `$` are field references (`$project` only).

use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::values::{as_flag, lookup, remove_path, set_path};
use super::Document;

const ID_FIELD: &str = "_id";

enum Shape<'a> {
    Inclusive {
        keep_id: bool,
        fields: Vec<&'a str>,
        computed: Vec<(&'a str, &'a str)>,
    },
    Exclusive {
        fields: Vec<&'a str>,
    },
}

fn classify(projection: &Document) -> StoreResult<Shape<'_>> {
    let mut included = Vec::new();
    let mut excluded = Vec::new();
    let mut computed = Vec::new();
    let mut keep_id = true;

    for (field, value) in projection {
        if let Some(reference) = value.as_str().and_then(|s| s.strip_prefix('$')) {
            computed.push((field.as_str(), reference));
            continue;
        }

        let flag = as_flag(value).ok_or_else(|| {
            StoreError::InvalidProjection(format!("unsupported value for field '{}'", field))
        })?;

        match (field.as_str(), flag) {
            (ID_FIELD, false) => keep_id = false,
            (_, true) => included.push(field.as_str()),
            (_, false) => excluded.push(field.as_str()),
        }
    }

    let inclusive = !included.is_empty() || !computed.is_empty();

    if inclusive && !excluded.is_empty() {
        return Err(StoreError::InvalidProjection(format!(
            "cannot do exclusion on field '{}' in inclusion projection",
            excluded[0]
        )));
    }

    if inclusive {
        Ok(Shape::Inclusive {
            keep_id,
            fields: included,
            computed,
        })
    } else {
        if !keep_id {
            excluded.push(ID_FIELD);
        }
        Ok(Shape::Exclusive { fields: excluded })
    }
}

/// Validates a projection without applying it
pub fn validate(projection: &Document) -> StoreResult<()> {
    classify(projection).map(|_| ())
}

/// Applies a projection to a document
pub fn apply(doc: &Document, projection: &Document) -> StoreResult<Document> {
    if projection.is_empty() {
        return Ok(doc.clone());
    }

    Ok(match classify(projection)? {
        Shape::Inclusive {
            keep_id,
            fields,
            computed,
        } => {
            let mut out = Document::new();
            if keep_id {
                if let Some(id) = doc.get(ID_FIELD) {
                    out.insert(ID_FIELD.to_string(), id.clone());
                }
            }
            for field in fields {
                if let Some(value) = lookup(doc, field) {
                    set_path(&mut out, field, value.clone());
                }
            }
            for (name, reference) in computed {
                let value = lookup(doc, reference).cloned().unwrap_or(Value::Null);
                set_path(&mut out, name, value);
            }
            out
        }
        Shape::Exclusive { fields } => {
            let mut out = doc.clone();
            for field in fields {
                remove_path(&mut out, field);
            }
            out
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn sample() -> Document {
        doc(json!({"_id": "p1", "title": "Hello", "body": "...", "meta": {"lang": "en", "words": 3}}))
    }

    #[test]
    fn test_inclusion_keeps_id() {
        let out = apply(&sample(), &doc(json!({"title": 1}))).unwrap();
        assert_eq!(out, doc(json!({"_id": "p1", "title": "Hello"})));
    }

    #[test]
    fn test_inclusion_without_id() {
        let out = apply(&sample(), &doc(json!({"title": 1, "_id": 0}))).unwrap();
        assert_eq!(out, doc(json!({"title": "Hello"})));
    }

    #[test]
    fn test_exclusion() {
        let out = apply(&sample(), &doc(json!({"body": 0, "meta": 0}))).unwrap();
        assert_eq!(out, doc(json!({"_id": "p1", "title": "Hello"})));
    }

    #[test]
    fn test_nested_paths() {
        let out = apply(&sample(), &doc(json!({"meta.lang": 1, "_id": false}))).unwrap();
        assert_eq!(out, doc(json!({"meta": {"lang": "en"}})));

        let out = apply(&sample(), &doc(json!({"meta.words": 0}))).unwrap();
        assert_eq!(out.get("meta"), Some(&json!({"lang": "en"})));
    }

    #[test]
    fn test_field_reference() {
        let out = apply(&sample(), &doc(json!({"language": "$meta.lang", "_id": 0}))).unwrap();
        assert_eq!(out, doc(json!({"language": "en"})));
    }

    #[test]
    fn test_mixed_projection_rejected() {
        let err = apply(&sample(), &doc(json!({"title": 1, "body": 0}))).unwrap_err();
        assert!(matches!(err, StoreError::InvalidProjection(_)));
    }

    #[test]
    fn test_empty_projection_is_identity() {
        assert_eq!(apply(&sample(), &Document::new()).unwrap(), sample());
    }
}
