use anyhow::anyhow;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::error::{LedgerError, Result};

/// One stored record: its id plus the JSON object persisted under it.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    /// True when the field is present and non-null.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.get(field).is_some_and(|value| !value.is_null())
    }

    /// Integer field value, zero when absent or non-numeric.
    pub fn i64_field(&self, field: &str) -> i64 {
        self.fields.get(field).and_then(Value::as_i64).unwrap_or(0)
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.fields.clone()))?)
    }
}

pub(crate) fn to_fields<T: Serialize>(value: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(LedgerError::Transport(anyhow!(
            "documents must serialize to JSON objects, got {other}"
        ))),
    }
}

/// A single-field mutation applied by `update`.
#[derive(Debug, Clone)]
pub enum FieldDelta {
    Set(Value),
    /// Server-side arithmetic add; a missing field counts as zero.
    Increment(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone)]
pub enum Filter {
    /// Matches documents whose integer field is strictly greater than the bound.
    GreaterThan(String, i64),
}

/// Declarative collection scan: optional field filter, order, and limit.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub(crate) filter: Option<Filter>,
    pub(crate) order: Option<(String, Direction)>,
    pub(crate) limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order = Some((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
