//! Projection building
//!
//! Include and exclude field lists are merged into one projection that
//! never mixes directions:
//!
//! - a field named in both lists is excluded
//! - when any included field remains, the projection is inclusive; other
//!   excluded fields are already absent from the output and are dropped,
//!   except `_id`, which the store returns unless excluded explicitly
//! - otherwise every excluded field maps to 0

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::store::Document;

const ID_FIELD: &str = "_id";

/// Direction of a projected field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldMode {
    /// Return the field (1)
    Include,
    /// Strip the field (0)
    Exclude,
}

impl FieldMode {
    /// Returns the store flag for this mode
    pub fn flag(&self) -> u8 {
        match self {
            FieldMode::Include => 1,
            FieldMode::Exclude => 0,
        }
    }
}

/// A field projection in insertion order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Projection {
    fields: Vec<(String, FieldMode)>,
}

impl Projection {
    /// Returns the projected fields in order
    pub fn fields(&self) -> &[(String, FieldMode)] {
        &self.fields
    }

    /// Returns the mode of a field, if projected
    pub fn mode(&self, field: &str) -> Option<FieldMode> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, mode)| *mode)
    }

    /// Returns true when the projection lists the fields to keep
    pub fn is_inclusive(&self) -> bool {
        self.fields
            .iter()
            .any(|(name, mode)| *mode == FieldMode::Include && name != ID_FIELD)
    }

    /// Renders the projection as a store projection document
    pub fn to_document(&self) -> Document {
        self.fields
            .iter()
            .map(|(name, mode)| (name.clone(), Value::from(mode.flag())))
            .collect()
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Object(self.to_document()))
    }
}

/// Compiles include/exclude field lists into a projection
pub struct ProjectionBuilder;

impl ProjectionBuilder {
    /// Builds a projection, or `None` when both lists are empty.
    pub fn build<I, E>(include: I, exclude: E) -> Option<Projection>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let include = dedup(include);
        let exclude = dedup(exclude);

        if include.is_empty() && exclude.is_empty() {
            return None;
        }

        let kept: Vec<&String> = include.iter().filter(|f| !exclude.contains(f)).collect();

        let fields = if kept.is_empty() {
            // Every include was overridden, or there were none
            let mut fields: Vec<(String, FieldMode)> = include
                .iter()
                .filter(|f| exclude.contains(f))
                .map(|f| (f.clone(), FieldMode::Exclude))
                .collect();
            for field in &exclude {
                if !include.contains(field) {
                    fields.push((field.clone(), FieldMode::Exclude));
                }
            }
            fields
        } else {
            let mut fields: Vec<(String, FieldMode)> = kept
                .into_iter()
                .map(|f| (f.clone(), FieldMode::Include))
                .collect();
            if exclude.iter().any(|f| f == ID_FIELD) {
                fields.push((ID_FIELD.to_string(), FieldMode::Exclude));
            }
            fields
        };

        Some(Projection { fields })
    }
}

fn dedup<T>(fields: T) -> Vec<String>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for field in fields {
        let field = field.as_ref().trim();
        if !field.is_empty() && !out.iter().any(|f| f == field) {
            out.push(field.to_string());
        }
    }
    out
}
