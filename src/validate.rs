//! Field input parsing and client-side draft validation.
//!
//! Validation runs before any request is sent; a failing draft never
//! reaches the backend.

use std::fmt;

use serde_json::Value;

use crate::record::Draft;
use crate::resource::{FieldKind, FieldSpec, Resource};

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("{label} is required")]
    Required { field: &'static str, label: &'static str },

    #[error("{label} must be a number")]
    InvalidNumber { field: &'static str, label: &'static str },

    #[error("{label} cannot be negative")]
    Negative { field: &'static str, label: &'static str },

    #[error("{label} must be a date (YYYY-MM-DD)")]
    InvalidDate { field: &'static str, label: &'static str },

    #[error("{label} must be one of: {options}")]
    InvalidOption { field: &'static str, label: &'static str, options: String },

    #[error("{label} must be true or false")]
    InvalidBoolean { field: &'static str, label: &'static str },

    #[error("{label} is read-only")]
    ReadOnly { field: &'static str, label: &'static str },

    #[error("unknown field {0}")]
    UnknownField(String),
}

impl FieldError {
    /// Name of the offending field, for inline display.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Required { field, .. }
            | Self::InvalidNumber { field, .. }
            | Self::Negative { field, .. }
            | Self::InvalidDate { field, .. }
            | Self::InvalidOption { field, .. }
            | Self::InvalidBoolean { field, .. }
            | Self::ReadOnly { field, .. } => field,
            Self::UnknownField(name) => name,
        }
    }
}

/// Every problem found in one draft.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field() == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

// =============================================================================
// INPUT PARSING
// =============================================================================

/// Convert raw form input into the JSON value stored in a draft.
///
/// Blank input becomes `null` for non-text kinds so "required" is checked
/// in one place.
///
/// # Errors
///
/// Returns a `FieldError` when the input cannot represent the field's kind.
pub fn parse_input(spec: &FieldSpec, raw: &str) -> Result<Value, FieldError> {
    let trimmed = raw.trim();
    let (field, label) = (spec.name, spec.label);
    match spec.kind {
        FieldKind::Text | FieldKind::TextArea => Ok(Value::String(raw.to_string())),
        _ if trimmed.is_empty() => Ok(Value::Null),
        FieldKind::Image => Ok(Value::String(trimmed.to_string())),
        FieldKind::Integer => trimmed
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| FieldError::InvalidNumber { field, label }),
        FieldKind::Decimal => trimmed
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or(FieldError::InvalidNumber { field, label }),
        FieldKind::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
            _ => Err(FieldError::InvalidBoolean { field, label }),
        },
        FieldKind::Date => {
            if is_iso_date(trimmed) {
                Ok(Value::String(trimmed.to_string()))
            } else {
                Err(FieldError::InvalidDate { field, label })
            }
        }
        FieldKind::Select(options) => {
            if options.contains(&trimmed) {
                Ok(Value::String(trimmed.to_string()))
            } else {
                Err(FieldError::InvalidOption { field, label, options: options.join(", ") })
            }
        }
    }
}

fn is_iso_date(s: &str) -> bool {
    let parts: Vec<&str> = s.split('-').collect();
    let [y, m, d] = parts.as_slice() else {
        return false;
    };
    if y.len() != 4 || m.len() != 2 || d.len() != 2 {
        return false;
    }
    let (Ok(_), Ok(month), Ok(day)) = (y.parse::<u16>(), m.parse::<u8>(), d.parse::<u8>()) else {
        return false;
    };
    (1..=12).contains(&month) && (1..=31).contains(&day)
}

// =============================================================================
// DRAFT VALIDATION
// =============================================================================

/// Check every editable field of `draft` against `resource`.
///
/// # Errors
///
/// Returns all field errors found, not just the first.
pub fn validate_draft(resource: &Resource, draft: &Draft) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();
    for spec in resource.editable_fields() {
        if let Some(err) = check_field(spec, draft.get(spec.name)) {
            errors.push(err);
        }
    }
    if errors.is_empty() { Ok(()) } else { Err(ValidationErrors(errors)) }
}

fn check_field(spec: &FieldSpec, value: Option<&Value>) -> Option<FieldError> {
    let (field, label) = (spec.name, spec.label);
    let blank = match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    };
    if blank {
        return spec
            .required
            .then_some(FieldError::Required { field, label });
    }

    if spec.kind.is_numeric() {
        let number = match value {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        let Some(number) = number else {
            return Some(FieldError::InvalidNumber { field, label });
        };
        if spec.non_negative && number < 0.0 {
            return Some(FieldError::Negative { field, label });
        }
    }
    None
}
