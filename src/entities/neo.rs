// ☄️ CelestialObject Entity - one near-Earth object
//
// "Designation is IDENTITY (never changes), approaches are the only thing that grows"
//
// Identity: primary designation (unique across the database)
// Values: IAU name (optional), diameter in km (NaN when unknown), PHA flag

use crate::coercion::{self, RecordError};
use crate::entities::approach::Approach;
use crate::schema::{Field, RawRecord, RecordKind, NEO_SCHEMA};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// CELESTIAL OBJECT
// ============================================================================

/// A near-Earth object and the close approaches linked to it
pub struct CelestialObject {
    designation: String,
    name: Option<String>,
    /// Kilometers; NaN when unknown
    diameter: f64,
    hazardous: bool,
    approaches: Vec<Arc<Approach>>,
}

impl CelestialObject {
    pub fn new(
        designation: impl Into<String>,
        name: Option<String>,
        diameter: f64,
        hazardous: bool,
    ) -> Self {
        CelestialObject {
            designation: designation.into(),
            name,
            diameter,
            hazardous,
            approaches: Vec::new(),
        }
    }

    /// Build from a row bound to the NEO schema
    ///
    /// Every field failure is reported; nothing is half-built.
    pub fn from_record(record: &RawRecord) -> Result<Self, RecordError> {
        let designation = coercion::required_text(record, Field::Designation);
        let name = coercion::text(record, Field::Name);
        let diameter = coercion::float(record, Field::Diameter);
        let hazardous = coercion::flag(record, Field::Hazardous);

        match (designation, name, diameter, hazardous) {
            (Ok(designation), Ok(name), Ok(diameter), Ok(hazardous)) => {
                Ok(CelestialObject::new(designation, name, diameter, hazardous))
            }
            (designation, name, diameter, hazardous) => Err(RecordError::collect(
                RecordKind::Neo,
                [designation.err(), name.err(), diameter.err(), hazardous.err()],
            )),
        }
    }

    /// Build from a field-name → value mapping (names in any case)
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, RecordError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self::from_record(&NEO_SCHEMA.record(pairs))
    }

    pub fn designation(&self) -> &str {
        &self.designation
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn diameter(&self) -> f64 {
        self.diameter
    }

    pub fn hazardous(&self) -> bool {
        self.hazardous
    }

    pub fn approaches(&self) -> &[Arc<Approach>] {
        &self.approaches
    }

    /// Add a close approach (call order, no dedup)
    pub fn append_approach(&mut self, approach: Arc<Approach>) {
        self.approaches.push(approach);
    }

    /// "433 Eros", or just the designation when unnamed
    pub fn full_name(&self) -> String {
        match &self.name {
            Some(name) => format!("{} {}", self.designation, name),
            None => self.designation.clone(),
        }
    }

    pub fn serialize(&self) -> NeoRecord {
        NeoRecord {
            designation: self.designation.clone(),
            name: self.name.clone(),
            diameter_km: self.diameter,
            potentially_hazardous: self.hazardous,
        }
    }
}

impl fmt::Display for CelestialObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NEO {} (name: {}) has a diameter of {:.3} km and {} potentially hazardous",
            self.designation,
            self.name.as_deref().unwrap_or("unnamed"),
            self.diameter,
            if self.hazardous { "is" } else { "is not" },
        )
    }
}

// Approaches are summarized as a count; each one points back here.
impl fmt::Debug for CelestialObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CelestialObject")
            .field("designation", &self.designation)
            .field("name", &self.name)
            .field("diameter", &format_args!("{:.3}", self.diameter))
            .field("hazardous", &self.hazardous)
            .field("approaches", &self.approaches.len())
            .finish()
    }
}

// ============================================================================
// SERIALIZED VIEW
// ============================================================================

/// Flat export view of a NEO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeoRecord {
    pub designation: String,
    pub name: Option<String>,
    pub diameter_km: f64,
    pub potentially_hazardous: bool,
}

// ============================================================================
// TESTS
// ============================================================================
