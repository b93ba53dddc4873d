// NEO Graph - Core Library
// Near-Earth objects + close approaches, coerced from NASA/JPL exports and
// linked into one read-only graph. Used by the CLI and by tests.

pub mod schema;         // Declared record schemas + raw records
pub mod coercion;       // Raw strings → typed values, per-field errors
pub mod temporal;       // Close-approach date strings
pub mod error;
pub mod entities;       // CelestialObject + Approach
pub mod database;       // Linking phase + lookups
pub mod extract;        // neos.csv / cad.json loaders
pub mod write;          // CSV / JSON output
pub mod config;

#[cfg(feature = "cli")]
pub mod logging;

// Re-export commonly used types
pub use schema::{
    Field, FieldKind, EmptyPolicy, RecordKind, RecordSchema, SchemaBinding, RawRecord,
    NEO_SCHEMA, APPROACH_SCHEMA,
};
pub use coercion::{FieldError, FieldValue, RecordError};
pub use temporal::{cd_to_datetime, datetime_to_str};
pub use error::{NeoError, NeoResult};
pub use entities::{
    CelestialObject, NeoRecord,
    Approach, ApproachRecord,
};
pub use database::{NeoDatabase, LinkReport, UnresolvedPolicy};
pub use extract::{
    Extracted, IngestReport, RejectedRecord,
    load_neos, load_approaches, read_neos, read_approaches,
};
pub use write::{write_csv, write_json, write_to_csv, write_to_json, CSV_COLUMNS};
pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
