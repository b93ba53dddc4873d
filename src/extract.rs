// 🏗️ Extraction - neos.csv / cad.json → entities
//
// Both sources are bound to their declared schema once (CSV header row,
// JSON `fields` array). A bad row is rejected and reported, it never aborts
// the load. A source missing a required column does.

use crate::coercion::RecordError;
use crate::entities::{Approach, CelestialObject};
use crate::error::NeoError;
use crate::schema::{RawRecord, RecordKind, SchemaBinding, APPROACH_SCHEMA, NEO_SCHEMA};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

// ============================================================================
// INGEST REPORT
// ============================================================================

/// A source row that could not become an entity
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRecord {
    /// CSV line the row starts on (header is line 1) or JSON `data` row (1-based)
    pub line: usize,
    pub error: RecordError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub source: String,
    pub kind: RecordKind,
    pub total: usize,
    pub accepted: usize,
    pub rejected: Vec<RejectedRecord>,
}

impl IngestReport {
    fn new(source: &str, kind: RecordKind) -> Self {
        IngestReport {
            source: source.to_string(),
            kind,
            total: 0,
            accepted: 0,
            rejected: Vec::new(),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} {} records, {} accepted, {} rejected",
            self.source,
            self.total,
            self.kind,
            self.accepted,
            self.rejected.len()
        )
    }
}

/// Entities read from one source plus what happened to every row
#[derive(Debug)]
pub struct Extracted<T> {
    pub records: Vec<T>,
    pub report: IngestReport,
}

impl<T> Extracted<T> {
    fn new(source: &str, kind: RecordKind) -> Self {
        Extracted {
            records: Vec::new(),
            report: IngestReport::new(source, kind),
        }
    }

    fn push(&mut self, line: usize, result: std::result::Result<T, RecordError>) {
        self.report.total += 1;
        match result {
            Ok(entity) => {
                self.report.accepted += 1;
                self.records.push(entity);
            }
            Err(error) => {
                warn!(source = %self.report.source, line, "{}", error);
                self.report.rejected.push(RejectedRecord { line, error });
            }
        }
    }

    fn finish(self) -> Self {
        info!("{}", self.report.summary());
        self
    }
}

fn check_columns(binding: &SchemaBinding<'_>) -> Result<()> {
    let missing = binding.missing_required();
    if missing.is_empty() {
        return Ok(());
    }
    Err(NeoError::MissingColumns {
        kind: binding.schema().kind.to_string(),
        missing: missing.iter().map(|field| field.raw_key().to_string()).collect(),
    }
    .into())
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

// ============================================================================
// NEOS (CSV)
// ============================================================================

/// Read NEOs from CSV (header row required)
pub fn read_neos<R: Read>(reader: R, source: &str) -> Result<Extracted<CelestialObject>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header from {}", source))?
        .clone();
    let binding = NEO_SCHEMA.bind(headers.iter());
    check_columns(&binding).with_context(|| format!("Unusable NEO file {}", source))?;

    let mut extracted = Extracted::new(source, RecordKind::Neo);
    for row in reader.records() {
        let row = row.with_context(|| format!("Failed to read CSV row of {}", source))?;
        // Line the record starts on; quoted fields may span several
        let line = row.position().map_or(0, |position| position.line() as usize);
        let record: RawRecord = binding.extract(row.iter());
        extracted.push(line, CelestialObject::from_record(&record));
    }

    Ok(extracted.finish())
}

/// Load NEOs from a CSV file
///
/// # Example:
/// ```no_run
/// use neo_graph::extract::load_neos;
/// use std::path::Path;
///
/// let neos = load_neos(Path::new("data/neos.csv"))?;
/// println!("{}", neos.report.summary());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn load_neos(path: &Path) -> Result<Extracted<CelestialObject>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    debug!(path = %path.display(), "loading NEOs");
    read_neos(BufReader::new(file), &source_name(path))
}

// ============================================================================
// CLOSE APPROACHES (JSON)
// ============================================================================

/// Layout of the JPL close-approach API dump
#[derive(Debug, Deserialize)]
struct CadDocument {
    fields: Vec<String>,
    data: Vec<Vec<Value>>,
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Read close approaches from the `{"fields": [...], "data": [[...]]}` layout
pub fn read_approaches<R: Read>(reader: R, source: &str) -> Result<Extracted<Approach>> {
    let document: CadDocument = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse JSON from {}", source))?;

    let binding = APPROACH_SCHEMA.bind(&document.fields);
    check_columns(&binding).with_context(|| format!("Unusable close-approach file {}", source))?;

    let mut extracted = Extracted::new(source, RecordKind::Approach);
    for (idx, row) in document.data.into_iter().enumerate() {
        let record = binding.extract(row.into_iter().map(cell_text));
        extracted.push(idx + 1, Approach::from_record(&record));
    }

    Ok(extracted.finish())
}

/// Load close approaches from a JSON file
pub fn load_approaches(path: &Path) -> Result<Extracted<Approach>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    debug!(path = %path.display(), "loading close approaches");
    read_approaches(BufReader::new(file), &source_name(path))
}

// ============================================================================
// TESTS
// ============================================================================
