// 💾 Writers - linked close approaches → CSV / JSON
//
// Fixed column sets. Every approach must already be linked: the NEO columns
// come from the resolved reference, never from the bare designation.

use crate::entities::{Approach, ApproachRecord, NeoRecord};
use crate::error::NeoResult;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// CSV column order
pub const CSV_COLUMNS: [&str; 7] = [
    "datetime_utc",
    "distance_au",
    "velocity_km_s",
    "designation",
    "name",
    "diameter_km",
    "potentially_hazardous",
];

#[derive(Debug, Serialize)]
struct CsvRow {
    datetime_utc: String,
    distance_au: f64,
    velocity_km_s: f64,
    designation: String,
    name: String,
    diameter_km: f64,
    potentially_hazardous: bool,
}

impl CsvRow {
    fn from_approach(approach: &Approach) -> NeoResult<Self> {
        let neo = approach.neo()?.serialize();
        let ApproachRecord {
            datetime_utc,
            distance_au,
            velocity_km_s,
        } = approach.serialize();

        Ok(CsvRow {
            datetime_utc,
            distance_au,
            velocity_km_s,
            designation: neo.designation,
            name: neo.name.unwrap_or_default(),
            diameter_km: neo.diameter_km,
            potentially_hazardous: neo.potentially_hazardous,
        })
    }
}

#[derive(Debug, Serialize)]
struct JsonEntry {
    #[serde(flatten)]
    approach: ApproachRecord,
    neo: NeoRecord,
}

// Rows are built (and every link checked) before anything is written, so a
// refused export never leaves a partial file behind.

fn csv_rows<'a, I>(approaches: I) -> NeoResult<Vec<CsvRow>>
where
    I: IntoIterator<Item = &'a Arc<Approach>>,
{
    approaches
        .into_iter()
        .map(|approach| CsvRow::from_approach(approach))
        .collect()
}

fn json_entries<'a, I>(approaches: I) -> NeoResult<Vec<JsonEntry>>
where
    I: IntoIterator<Item = &'a Arc<Approach>>,
{
    approaches
        .into_iter()
        .map(|approach| {
            Ok(JsonEntry {
                approach: approach.serialize(),
                neo: approach.neo()?.serialize(),
            })
        })
        .collect()
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    Ok(BufWriter::new(file))
}

// ============================================================================
// CSV
// ============================================================================

fn emit_csv<W: Write>(rows: &[CsvRow], writer: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(CSV_COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write approaches as CSV, returns the number of rows
pub fn write_csv<'a, I, W>(approaches: I, writer: W) -> Result<usize>
where
    I: IntoIterator<Item = &'a Arc<Approach>>,
    W: Write,
{
    let rows = csv_rows(approaches)?;
    emit_csv(&rows, writer)?;
    Ok(rows.len())
}

pub fn write_to_csv<'a, I>(approaches: I, path: &Path) -> Result<usize>
where
    I: IntoIterator<Item = &'a Arc<Approach>>,
{
    let rows = csv_rows(approaches)
        .with_context(|| format!("Refusing to write CSV to {}", path.display()))?;
    emit_csv(&rows, create(path)?)
        .with_context(|| format!("Failed to write CSV to {}", path.display()))?;
    info!(path = %path.display(), rows = rows.len(), "wrote close approaches");
    Ok(rows.len())
}

// ============================================================================
// JSON
// ============================================================================

fn emit_json<W: Write>(entries: &[JsonEntry], mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, entries)?;
    writer.flush()?;
    Ok(())
}

/// Write approaches as a JSON array, returns the number of entries
pub fn write_json<'a, I, W>(approaches: I, writer: W) -> Result<usize>
where
    I: IntoIterator<Item = &'a Arc<Approach>>,
    W: Write,
{
    let entries = json_entries(approaches)?;
    emit_json(&entries, writer)?;
    Ok(entries.len())
}

pub fn write_to_json<'a, I>(approaches: I, path: &Path) -> Result<usize>
where
    I: IntoIterator<Item = &'a Arc<Approach>>,
{
    let entries = json_entries(approaches)
        .with_context(|| format!("Refusing to write JSON to {}", path.display()))?;
    emit_json(&entries, create(path)?)
        .with_context(|| format!("Failed to write JSON to {}", path.display()))?;
    info!(path = %path.display(), entries = entries.len(), "wrote close approaches");
    Ok(entries.len())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{NeoDatabase, UnresolvedPolicy};
    use crate::entities::CelestialObject;
    use crate::error::NeoError;
    use serde_json::Value;

    fn database() -> NeoDatabase {
        let neos = vec![
            CelestialObject::from_pairs([
                ("pdes", "433"),
                ("name", "Eros"),
                ("diameter", "16.84"),
                ("pha", "N"),
            ])
            .unwrap(),
            CelestialObject::from_pairs([("pdes", "2020 FK"), ("pha", "Y")]).unwrap(),
        ];
        let approaches = vec![
            Approach::from_pairs([
                ("des", "433"),
                ("cd", "1900-Jan-01 00:00"),
                ("dist", "0.3"),
                ("v_rel", "5.5"),
            ])
            .unwrap(),
            Approach::from_pairs([
                ("des", "2020 FK"),
                ("cd", "2020-Mar-19 12:00"),
                ("dist", "0.04"),
                ("v_rel", "8.1"),
            ])
            .unwrap(),
        ];
        NeoDatabase::new(neos, approaches).unwrap()
    }

    #[test]
    fn test_write_csv() {
        let db = database();
        let mut out = Vec::new();

        let rows = write_csv(db.approaches(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(rows, 2);
        assert_eq!(
            lines[0],
            "datetime_utc,distance_au,velocity_km_s,designation,name,diameter_km,potentially_hazardous"
        );
        assert_eq!(lines[1], "1900-01-01 00:00,0.3,5.5,433,Eros,16.84,false");
        assert_eq!(lines[2], "2020-03-19 12:00,0.04,8.1,2020 FK,,NaN,true");
    }

    #[test]
    fn test_write_csv_header_only_when_empty() {
        let mut out = Vec::new();
        let rows = write_csv(std::iter::empty::<&Arc<Approach>>(), &mut out).unwrap();

        assert_eq!(rows, 0);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_write_json() {
        let db = database();
        let mut out = Vec::new();

        let entries = write_json(db.approaches(), &mut out).unwrap();
        let json: Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(entries, 2);
        assert_eq!(json[0]["datetime_utc"], "1900-01-01 00:00");
        assert_eq!(json[0]["distance_au"], 0.3);
        assert_eq!(json[0]["velocity_km_s"], 5.5);
        assert_eq!(json[0]["neo"]["designation"], "433");
        assert_eq!(json[0]["neo"]["name"], "Eros");
        assert_eq!(json[0]["neo"]["diameter_km"], 16.84);
        assert_eq!(json[0]["neo"]["potentially_hazardous"], false);

        assert!(json[1]["neo"]["name"].is_null());
        assert!(json[1]["neo"]["diameter_km"].is_null());
    }

    #[test]
    fn test_writers_refuse_unlinked_approaches() {
        let db = NeoDatabase::with_policy(
            vec![],
            vec![Approach::from_pairs([
                ("des", "ghost"),
                ("cd", "2000-Jan-01 00:00"),
                ("dist", "0.1"),
                ("v_rel", "1.0"),
            ])
            .unwrap()],
            UnresolvedPolicy::Keep,
        )
        .unwrap();

        let csv_error = write_csv(db.approaches(), Vec::new()).unwrap_err();
        assert!(matches!(
            csv_error.downcast_ref::<NeoError>(),
            Some(NeoError::Unlinked { .. })
        ));

        let json_error = write_json(db.approaches(), Vec::new()).unwrap_err();
        assert!(matches!(
            json_error.downcast_ref::<NeoError>(),
            Some(NeoError::Unlinked { .. })
        ));
    }

    #[test]
    fn test_write_to_files() {
        let db = database();
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("out.csv");
        let json_path = dir.path().join("out.json");

        assert_eq!(write_to_csv(db.approaches(), &csv_path).unwrap(), 2);
        assert_eq!(write_to_json(db.approaches(), &json_path).unwrap(), 2);

        let mut reader = csv::Reader::from_path(&csv_path).unwrap();
        assert_eq!(reader.headers().unwrap().iter().collect::<Vec<_>>(), CSV_COLUMNS);
        assert_eq!(reader.records().count(), 2);

        let json: Value = serde_json::from_reader(File::open(&json_path).unwrap()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_refused_export_leaves_no_file() {
        let db = NeoDatabase::with_policy(
            vec![CelestialObject::from_pairs([("pdes", "433")]).unwrap()],
            vec![
                Approach::from_pairs([
                    ("des", "433"),
                    ("cd", "2000-Jan-01 00:00"),
                    ("dist", "0.1"),
                    ("v_rel", "1.0"),
                ])
                .unwrap(),
                Approach::from_pairs([
                    ("des", "ghost"),
                    ("cd", "2000-Jan-02 00:00"),
                    ("dist", "0.2"),
                    ("v_rel", "2.0"),
                ])
                .unwrap(),
            ],
            UnresolvedPolicy::Keep,
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("out.csv");
        let json_path = dir.path().join("out.json");

        let error = write_to_csv(db.approaches(), &csv_path).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<NeoError>(),
            Some(NeoError::Unlinked { .. })
        ));
        assert!(!csv_path.exists());

        assert!(write_to_json(db.approaches(), &json_path).is_err());
        assert!(!json_path.exists());
    }

    #[test]
    fn test_refused_export_keeps_existing_file() {
        let db = NeoDatabase::with_policy(
            vec![],
            vec![Approach::from_pairs([
                ("des", "ghost"),
                ("cd", "2000-Jan-01 00:00"),
                ("dist", "0.1"),
                ("v_rel", "1.0"),
            ])
            .unwrap()],
            UnresolvedPolicy::Keep,
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "previous export\n").unwrap();

        assert!(write_to_csv(db.approaches(), &path).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous export\n");
    }

    #[test]
    fn test_export_of_linked_subset() {
        let db = NeoDatabase::with_policy(
            vec![CelestialObject::from_pairs([("pdes", "433")]).unwrap()],
            vec![
                Approach::from_pairs([
                    ("des", "ghost"),
                    ("cd", "2000-Jan-01 00:00"),
                    ("dist", "0.1"),
                    ("v_rel", "1.0"),
                ])
                .unwrap(),
                Approach::from_pairs([
                    ("des", "433"),
                    ("cd", "2000-Jan-02 00:00"),
                    ("dist", "0.2"),
                    ("v_rel", "2.0"),
                ])
                .unwrap(),
            ],
            UnresolvedPolicy::Keep,
        )
        .unwrap();
        let mut out = Vec::new();

        let rows = write_csv(db.approaches().iter().filter(|a| a.is_linked()), &mut out).unwrap();

        assert_eq!(rows, 1);
        assert!(String::from_utf8(out).unwrap().contains("2000-01-02 00:00,0.2,2.0,433,,NaN,false"));
    }
}
