//! Records (persisted rows) and drafts (uncommitted local edits).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::{Filter, Row, value_text};
use crate::resource::{FieldKind, FieldSpec, Resource};

#[cfg(test)]
#[path = "record_test.rs"]
mod tests;

/// Opaque server-assigned id, held in text form whether the table uses
/// integers or UUIDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl RecordId {
    /// Equality filter selecting exactly this row.
    #[must_use]
    pub fn filter(&self) -> Filter {
        Filter::eq("id", self.0.clone())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("row has no id column")]
    MissingId,
}

/// One persisted row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: RecordId,
    pub row: Row,
}

impl Record {
    /// Wrap a backend row.
    ///
    /// # Errors
    ///
    /// Returns `MissingId` if the row has no usable `id`.
    pub fn from_row(row: Row) -> Result<Self, RecordError> {
        let id = row
            .get("id")
            .filter(|v| !v.is_null())
            .map(value_text)
            .ok_or(RecordError::MissingId)?;
        Ok(Self { id: RecordId(id), row })
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.row.get(field)
    }

    /// Display text of a field; empty when absent.
    #[must_use]
    pub fn text(&self, field: &str) -> String {
        self.row.get(field).map(value_text).unwrap_or_default()
    }
}

/// Client-local uncommitted copy of a record's fields.
///
/// Holds read-only fields too so a view can display them, but
/// [`Draft::to_row`] only emits editable ones.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Draft {
    values: Row,
}

impl Draft {
    /// Fresh draft for a create form.
    #[must_use]
    pub fn empty(resource: &Resource) -> Self {
        let values = resource
            .editable_fields()
            .map(|f| (f.name.to_string(), default_value(f.kind)))
            .collect();
        Self { values }
    }

    /// Draft hydrated from a fetched record.
    #[must_use]
    pub fn from_record(resource: &Resource, record: &Record) -> Self {
        let values = resource
            .fields
            .iter()
            .map(|f| (f.name.to_string(), record.get(f.name).cloned().unwrap_or(Value::Null)))
            .collect();
        Self { values }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    #[must_use]
    pub fn text(&self, name: &str) -> String {
        self.values.get(name).map(value_text).unwrap_or_default()
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Editable fields as a row for insert.
    #[must_use]
    pub fn to_row(&self, resource: &Resource) -> Row {
        self.collect(resource.editable_fields())
    }

    /// Fields an update may change; create-only fields are left out.
    #[must_use]
    pub fn to_patch(&self, resource: &Resource) -> Row {
        self.collect(resource.updatable_fields())
    }

    fn collect<'a>(&self, fields: impl Iterator<Item = &'a FieldSpec>) -> Row {
        fields
            .filter_map(|f| {
                self.values
                    .get(f.name)
                    .map(|v| (f.name.to_string(), v.clone()))
            })
            .collect()
    }
}

fn default_value(kind: FieldKind) -> Value {
    match kind {
        FieldKind::Text | FieldKind::TextArea => Value::String(String::new()),
        FieldKind::Boolean => Value::Bool(false),
        FieldKind::Integer | FieldKind::Decimal | FieldKind::Date | FieldKind::Select(_) | FieldKind::Image => {
            Value::Null
        }
    }
}
