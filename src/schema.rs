// 📐 Shape Layer - Declared record schemas
// Every raw field we understand is declared ONCE here, with its raw key,
// its type and its empty-value policy. Coercion reads both from here.
//
// Raw keys are matched case-insensitively when a header row (CSV) or a
// `fields` array (JSON) is bound to a schema, not on every record.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

// ============================================================================
// FIELD TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Text,
    Float,
    Flag,
    DateTime,
}

/// What a field becomes when the source leaves it empty (or omits it)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmptyPolicy {
    /// The record cannot be built without it
    Reject,
    /// Stored as `None`
    Absent,
    /// Stored as `f64::NAN`
    NaN,
    /// Stored as `false`
    False,
}

/// RecordKind - Which of the two source shapes a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Neo,
    Approach,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Neo => "NEO",
            RecordKind::Approach => "close approach",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// FIELD
// ============================================================================

/// Field - One recognized raw field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    /// NEO primary designation (`pdes`)
    Designation,
    /// NEO IAU name (`name`)
    Name,
    /// NEO diameter in km (`diameter`)
    Diameter,
    /// Potentially hazardous flag (`pha`)
    Hazardous,
    /// Designation of the approaching NEO (`des`)
    ApproachDesignation,
    /// Time of closest approach, "YYYY-Mon-DD HH:MM" (`cd`)
    Time,
    /// Nominal approach distance in au (`dist`)
    Distance,
    /// Relative approach velocity in km/s (`v_rel`)
    Velocity,
}

impl Field {
    /// Key as it appears in the source files
    pub fn raw_key(&self) -> &'static str {
        match self {
            Field::Designation => "pdes",
            Field::Name => "name",
            Field::Diameter => "diameter",
            Field::Hazardous => "pha",
            Field::ApproachDesignation => "des",
            Field::Time => "cd",
            Field::Distance => "dist",
            Field::Velocity => "v_rel",
        }
    }

    /// Value type `coercion::coerce` parses the field into
    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Designation | Field::Name | Field::ApproachDesignation => FieldKind::Text,
            Field::Diameter | Field::Distance | Field::Velocity => FieldKind::Float,
            Field::Hazardous => FieldKind::Flag,
            Field::Time => FieldKind::DateTime,
        }
    }

    /// What `coercion::coerce` yields for a blank or absent value
    pub fn empty_policy(&self) -> EmptyPolicy {
        match self {
            Field::Name => EmptyPolicy::Absent,
            Field::Diameter => EmptyPolicy::NaN,
            Field::Hazardous => EmptyPolicy::False,
            _ => EmptyPolicy::Reject,
        }
    }

    pub fn is_required(&self) -> bool {
        self.empty_policy() == EmptyPolicy::Reject
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw_key())
    }
}

// ============================================================================
// RECORD SCHEMA
// ============================================================================

/// RecordSchema - The fixed set of fields one record shape understands
#[derive(Debug)]
pub struct RecordSchema {
    pub kind: RecordKind,
    fields: &'static [Field],
}

/// Shape of a row of `neos.csv`
pub static NEO_SCHEMA: RecordSchema = RecordSchema {
    kind: RecordKind::Neo,
    fields: &[
        Field::Designation,
        Field::Name,
        Field::Diameter,
        Field::Hazardous,
    ],
};

/// Shape of a row of `cad.json`
pub static APPROACH_SCHEMA: RecordSchema = RecordSchema {
    kind: RecordKind::Approach,
    fields: &[
        Field::ApproachDesignation,
        Field::Time,
        Field::Distance,
        Field::Velocity,
    ],
};

impl RecordSchema {
    pub fn fields(&self) -> &[Field] {
        self.fields
    }

    /// Resolve a raw key (any case) to the field it declares
    pub fn lookup(&self, key: &str) -> Option<Field> {
        let key = key.trim();
        self.fields
            .iter()
            .copied()
            .find(|field| field.raw_key().eq_ignore_ascii_case(key))
    }

    /// Bind a header row to this schema
    ///
    /// Unknown columns are ignored. When a field appears twice the first
    /// column wins.
    pub fn bind<I, S>(&self, headers: I) -> SchemaBinding<'_>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = Vec::new();
        let columns = headers
            .into_iter()
            .map(|header| {
                let header = header.as_ref();
                match self.lookup(header) {
                    Some(field) if !seen.contains(&field) => {
                        seen.push(field);
                        Some(field)
                    }
                    Some(field) => {
                        debug!(column = header, %field, "duplicate column ignored");
                        None
                    }
                    None => None,
                }
            })
            .collect();

        SchemaBinding {
            schema: self,
            columns,
        }
    }

    /// Build a record from a key/value mapping (keys in any case)
    pub fn record<I, K, V>(&self, pairs: I) -> RawRecord
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut record = RawRecord::new(self.kind);
        for (key, value) in pairs {
            if let Some(field) = self.lookup(key.as_ref()) {
                record.insert(field, value);
            }
        }
        record
    }
}

// ============================================================================
// SCHEMA BINDING
// ============================================================================

/// SchemaBinding - Column index → field, resolved once per source
#[derive(Debug)]
pub struct SchemaBinding<'s> {
    schema: &'s RecordSchema,
    columns: Vec<Option<Field>>,
}

impl<'s> SchemaBinding<'s> {
    pub fn schema(&self) -> &'s RecordSchema {
        self.schema
    }

    /// Required fields with no column in the source
    pub fn missing_required(&self) -> Vec<Field> {
        self.schema
            .fields()
            .iter()
            .copied()
            .filter(|field| field.is_required() && !self.columns.contains(&Some(*field)))
            .collect()
    }

    /// Pull the bound columns out of one row
    pub fn extract<I, V>(&self, row: I) -> RawRecord
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let mut record = RawRecord::new(self.schema.kind);
        for (column, value) in self.columns.iter().zip(row) {
            if let Some(field) = column {
                record.insert(*field, value);
            }
        }
        record
    }
}

// ============================================================================
// RAW RECORD
// ============================================================================

/// RawRecord - Untyped values of one source row, keyed by declared field
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    kind: RecordKind,
    values: HashMap<Field, String>,
}

impl RawRecord {
    pub fn new(kind: RecordKind) -> Self {
        RawRecord {
            kind,
            values: HashMap::new(),
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn insert(&mut self, field: Field, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    /// Raw value as read, `None` when the source has no such column
    pub fn get(&self, field: Field) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    /// Trimmed value, `None` when absent or blank
    pub fn value(&self, field: Field) -> Option<&str> {
        self.get(field)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
