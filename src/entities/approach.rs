// 🌍 Approach Entity - one close approach of a NEO to Earth
//
// Two-phase reference to the owning NEO:
// - `designation` is the join key, fixed at construction
// - `neo` is resolved exactly once by the linking phase in `NeoDatabase`
//
// The resolved reference is `Weak`: the NEO owns its approaches, the
// database owns the NEOs.

use crate::coercion::{self, RecordError};
use crate::entities::neo::CelestialObject;
use crate::error::{NeoError, NeoResult};
use crate::schema::{Field, RawRecord, RecordKind, APPROACH_SCHEMA};
use crate::temporal::datetime_to_str;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

// ============================================================================
// APPROACH
// ============================================================================

/// A close approach to Earth by a NEO
pub struct Approach {
    designation: String,
    time: DateTime<Utc>,
    /// Astronomical units
    distance: f64,
    /// Kilometers per second
    velocity: f64,
    neo: OnceLock<Weak<CelestialObject>>,
}

impl Approach {
    pub fn new(designation: impl Into<String>, time: DateTime<Utc>, distance: f64, velocity: f64) -> Self {
        Approach {
            designation: designation.into(),
            time,
            distance,
            velocity,
            neo: OnceLock::new(),
        }
    }

    /// Build from a row bound to the close-approach schema
    pub fn from_record(record: &RawRecord) -> Result<Self, RecordError> {
        let designation = coercion::required_text(record, Field::ApproachDesignation);
        let time = coercion::datetime(record, Field::Time);
        let distance = coercion::float(record, Field::Distance);
        let velocity = coercion::float(record, Field::Velocity);

        match (designation, time, distance, velocity) {
            (Ok(designation), Ok(time), Ok(distance), Ok(velocity)) => {
                Ok(Approach::new(designation, time, distance, velocity))
            }
            (designation, time, distance, velocity) => Err(RecordError::collect(
                RecordKind::Approach,
                [designation.err(), time.err(), distance.err(), velocity.err()],
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
        Self::from_record(&APPROACH_SCHEMA.record(pairs))
    }

    /// Designation of the NEO this approach belongs to
    pub fn designation(&self) -> &str {
        &self.designation
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Approach time as "YYYY-MM-DD HH:MM"
    pub fn time_str(&self) -> String {
        datetime_to_str(&self.time)
    }

    pub fn is_linked(&self) -> bool {
        self.neo.get().is_some()
    }

    /// The NEO this approach belongs to
    ///
    /// Fails with `NeoError::Unlinked` until the linking phase has run, and
    /// with `NeoError::Detached` once the owning database is gone.
    pub fn neo(&self) -> NeoResult<Arc<CelestialObject>> {
        let designation = || self.designation.clone();
        match self.neo.get() {
            None => Err(NeoError::Unlinked {
                designation: designation(),
            }),
            Some(neo) => neo.upgrade().ok_or_else(|| NeoError::Detached {
                designation: designation(),
            }),
        }
    }

    /// Resolve the reference to the owning NEO (once)
    pub(crate) fn link(&self, neo: &Arc<CelestialObject>) -> NeoResult<()> {
        if neo.designation() != self.designation {
            return Err(NeoError::DesignationMismatch {
                approach: self.designation.clone(),
                neo: neo.designation().to_string(),
            });
        }

        self.neo
            .set(Arc::downgrade(neo))
            .map_err(|_| NeoError::AlreadyLinked(self.designation.clone()))
    }

    fn sentence(&self, subject: &str) -> String {
        format!(
            "On {}, {} approaches Earth at a distance of {:.2} au and a velocity of {:.2} km/s",
            self.time_str(),
            subject,
            self.distance,
            self.velocity,
        )
    }

    /// Human-readable sentence; requires the approach to be linked
    pub fn describe(&self) -> NeoResult<String> {
        let neo = self.neo()?;
        Ok(self.sentence(&format!("'{}'", neo.full_name())))
    }

    pub fn serialize(&self) -> ApproachRecord {
        ApproachRecord {
            datetime_utc: self.time_str(),
            distance_au: self.distance,
            velocity_km_s: self.velocity,
        }
    }
}

// Unresolved approaches say so instead of borrowing a name they don't have.
impl fmt::Display for Approach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sentence = match self.neo() {
            Ok(neo) => self.sentence(&format!("'{}'", neo.full_name())),
            Err(NeoError::Detached { .. }) => {
                self.sentence(&format!("NEO '{}' (no longer loaded)", self.designation))
            }
            Err(_) => self.sentence(&format!("unlinked NEO '{}'", self.designation)),
        };
        f.write_str(&sentence)
    }
}

impl fmt::Debug for Approach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Approach")
            .field("time", &self.time_str())
            .field("distance", &format_args!("{:.2}", self.distance))
            .field("velocity", &format_args!("{:.2}", self.velocity))
            .field("neo", &self.designation)
            .field("linked", &self.is_linked())
            .finish()
    }
}

// ============================================================================
// SERIALIZED VIEW
// ============================================================================

/// Flat export view of a close approach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproachRecord {
    pub datetime_utc: String,
    pub distance_au: f64,
    pub velocity_km_s: f64,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coercion::FieldError;

    fn eros_approach() -> Approach {
        Approach::from_pairs([
            ("des", "433"),
            ("cd", "1900-Jan-01 00:00"),
            ("dist", "0.3"),
            ("v_rel", "5.5"),
        ])
        .unwrap()
    }

    fn eros() -> Arc<CelestialObject> {
        Arc::new(CelestialObject::new("433", Some("Eros".to_string()), 16.84, false))
    }

    #[test]
    fn test_eros_approach_from_record() {
        let approach = eros_approach();

        assert_eq!(approach.designation(), "433");
        assert_eq!(approach.distance(), 0.3);
        assert_eq!(approach.velocity(), 5.5);
        assert_eq!(approach.time_str(), "1900-01-01 00:00");
        assert!(!approach.is_linked());
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let approach = Approach::from_pairs([
            ("DES", "99942"),
            ("Cd", "2029-Apr-13 21:46"),
            ("DIST", "0.000254"),
            ("V_Rel", "7.42"),
            ("orbit_id", "206"),
        ])
        .unwrap();

        assert_eq!(approach.designation(), "99942");
        assert_eq!(approach.time_str(), "2029-04-13 21:46");
    }

    #[test]
    fn test_rejects_every_bad_field() {
        let error = Approach::from_pairs([
            ("des", ""),
            ("cd", "2029-13-45"),
            ("dist", "far"),
        ])
        .unwrap_err();

        assert_eq!(error.kind, RecordKind::Approach);
        assert_eq!(
            error.fields(),
            vec![
                Field::ApproachDesignation,
                Field::Time,
                Field::Distance,
                Field::Velocity,
            ]
        );
        assert_eq!(error.errors[3], FieldError::Missing { field: Field::Velocity });
    }

    #[test]
    fn test_neo_before_linking_is_an_error() {
        let approach = eros_approach();

        assert_eq!(
            approach.neo().unwrap_err(),
            NeoError::Unlinked {
                designation: "433".to_string()
            }
        );
        assert!(approach.describe().is_err());
    }

    #[test]
    fn test_link_resolves_same_instance() {
        let neo = eros();
        let approach = eros_approach();

        approach.link(&neo).unwrap();

        assert!(approach.is_linked());
        assert!(Arc::ptr_eq(&approach.neo().unwrap(), &neo));
    }

    #[test]
    fn test_link_only_once() {
        let neo = eros();
        let approach = eros_approach();

        approach.link(&neo).unwrap();
        assert_eq!(
            approach.link(&neo),
            Err(NeoError::AlreadyLinked("433".to_string()))
        );
    }

    #[test]
    fn test_link_requires_matching_designation() {
        let other = Arc::new(CelestialObject::new("99942", None, f64::NAN, true));
        let approach = eros_approach();

        assert!(matches!(
            approach.link(&other),
            Err(NeoError::DesignationMismatch { .. })
        ));
        assert!(!approach.is_linked());
    }

    #[test]
    fn test_neo_after_owner_dropped() {
        let approach = eros_approach();
        {
            let neo = eros();
            approach.link(&neo).unwrap();
        }

        assert!(approach.is_linked());
        assert_eq!(
            approach.neo().unwrap_err(),
            NeoError::Detached {
                designation: "433".to_string()
            }
        );
        assert_eq!(
            approach.to_string(),
            "On 1900-01-01 00:00, NEO '433' (no longer loaded) approaches Earth at a distance of 0.30 au and a velocity of 5.50 km/s"
        );
    }

    #[test]
    fn test_serialize() {
        let approach = eros_approach();
        let record = approach.serialize();

        assert_eq!(
            record,
            ApproachRecord {
                datetime_utc: "1900-01-01 00:00".to_string(),
                distance_au: 0.3,
                velocity_km_s: 5.5,
            }
        );
        assert_eq!(record, approach.serialize());
    }

    #[test]
    fn test_display_linked_and_unlinked() {
        let neo = eros();
        let approach = eros_approach();

        assert_eq!(
            approach.to_string(),
            "On 1900-01-01 00:00, unlinked NEO '433' approaches Earth at a distance of 0.30 au and a velocity of 5.50 km/s"
        );

        approach.link(&neo).unwrap();
        assert_eq!(
            approach.to_string(),
            "On 1900-01-01 00:00, '433 Eros' approaches Earth at a distance of 0.30 au and a velocity of 5.50 km/s"
        );
        assert_eq!(approach.describe().unwrap(), approach.to_string());
    }

    #[test]
    fn test_debug() {
        assert_eq!(
            format!("{:?}", eros_approach()),
            "Approach { time: \"1900-01-01 00:00\", distance: 0.30, velocity: 5.50, neo: \"433\", linked: false }"
        );
    }
}
