// 🧹 Field Coercion - raw strings → typed attribute values
//
// The NASA exports use empty strings for unknown values. `coerce` reads the
// field's declared kind and empty-value policy from the schema; anything that
// fails to parse becomes a `FieldError` instead of leaving an attribute unset.

use crate::schema::{EmptyPolicy, Field, FieldKind, RawRecord, RecordKind};
use crate::temporal::cd_to_datetime;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

/// FieldError - Why a single field could not be coerced
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("missing required field `{field}`")]
    Missing { field: Field },

    #[error("required field `{field}` is empty")]
    Empty { field: Field },

    #[error("field `{field}`: {value:?} is not a number")]
    InvalidNumber { field: Field, value: String },

    #[error("field `{field}`: {value:?} is not a YYYY-Mon-DD HH:MM date")]
    InvalidDateTime { field: Field, value: String },

    #[error("field `{field}` is declared {declared:?}, read as {requested:?}")]
    WrongKind {
        field: Field,
        declared: FieldKind,
        requested: FieldKind,
    },
}

impl FieldError {
    pub fn field(&self) -> Field {
        match self {
            FieldError::Missing { field }
            | FieldError::Empty { field }
            | FieldError::InvalidNumber { field, .. }
            | FieldError::InvalidDateTime { field, .. }
            | FieldError::WrongKind { field, .. } => *field,
        }
    }
}

/// RecordError - Every field failure of one rejected record
#[derive(Debug, Clone, PartialEq)]
pub struct RecordError {
    pub kind: RecordKind,
    pub errors: Vec<FieldError>,
}

impl RecordError {
    pub fn new(kind: RecordKind, errors: Vec<FieldError>) -> Self {
        RecordError { kind, errors }
    }

    /// Gather the failures among a record's per-field outcomes (`None` = ok)
    pub fn collect<I>(kind: RecordKind, outcomes: I) -> Self
    where
        I: IntoIterator<Item = Option<FieldError>>,
    {
        RecordError::new(kind, outcomes.into_iter().flatten().collect())
    }

    pub fn fields(&self) -> Vec<Field> {
        self.errors.iter().map(FieldError::field).collect()
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rejected {} record: ", self.kind)?;
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for RecordError {}

// ============================================================================
// COERCIONS
// ============================================================================

/// A raw value coerced to its field's declared kind
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(Option<String>),
    Float(f64),
    Flag(bool),
    DateTime(DateTime<Utc>),
}

fn missing(record: &RawRecord, field: Field) -> FieldError {
    if record.get(field).is_some() {
        FieldError::Empty { field }
    } else {
        FieldError::Missing { field }
    }
}

fn empty_value(record: &RawRecord, field: Field) -> Result<FieldValue, FieldError> {
    match field.empty_policy() {
        EmptyPolicy::Reject => Err(missing(record, field)),
        EmptyPolicy::Absent => Ok(FieldValue::Text(None)),
        EmptyPolicy::NaN => Ok(FieldValue::Float(f64::NAN)),
        EmptyPolicy::False => Ok(FieldValue::Flag(false)),
    }
}

/// Coerce one field by its declared kind; blanks follow its empty policy
pub fn coerce(record: &RawRecord, field: Field) -> Result<FieldValue, FieldError> {
    let Some(value) = record.value(field) else {
        return empty_value(record, field);
    };

    match field.kind() {
        FieldKind::Text => Ok(FieldValue::Text(Some(value.to_string()))),
        FieldKind::Float => value
            .parse::<f64>()
            .map(FieldValue::Float)
            .map_err(|_| FieldError::InvalidNumber {
                field,
                value: value.to_string(),
            }),
        // Single-character flag: "Y"/"y" → true, anything else → false
        FieldKind::Flag => Ok(FieldValue::Flag(value.eq_ignore_ascii_case("y"))),
        FieldKind::DateTime => cd_to_datetime(value)
            .map(FieldValue::DateTime)
            .map_err(|_| FieldError::InvalidDateTime {
                field,
                value: value.to_string(),
            }),
    }
}

fn wrong_kind(field: Field, requested: FieldKind) -> FieldError {
    FieldError::WrongKind {
        field,
        declared: field.kind(),
        requested,
    }
}

/// Text value, `None` when the field may be absent and is
pub fn text(record: &RawRecord, field: Field) -> Result<Option<String>, FieldError> {
    match coerce(record, field)? {
        FieldValue::Text(text) => Ok(text),
        _ => Err(wrong_kind(field, FieldKind::Text)),
    }
}

/// Text value that must be present
pub fn required_text(record: &RawRecord, field: Field) -> Result<String, FieldError> {
    text(record, field)?.ok_or_else(|| missing(record, field))
}

pub fn float(record: &RawRecord, field: Field) -> Result<f64, FieldError> {
    match coerce(record, field)? {
        FieldValue::Float(value) => Ok(value),
        _ => Err(wrong_kind(field, FieldKind::Float)),
    }
}

pub fn flag(record: &RawRecord, field: Field) -> Result<bool, FieldError> {
    match coerce(record, field)? {
        FieldValue::Flag(value) => Ok(value),
        _ => Err(wrong_kind(field, FieldKind::Flag)),
    }
}

/// Close-approach date ("YYYY-Mon-DD HH:MM")
pub fn datetime(record: &RawRecord, field: Field) -> Result<DateTime<Utc>, FieldError> {
    match coerce(record, field)? {
        FieldValue::DateTime(time) => Ok(time),
        _ => Err(wrong_kind(field, FieldKind::DateTime)),
    }
}

// ============================================================================
// TESTS
// ============================================================================
