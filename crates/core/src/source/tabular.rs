//! Tabular sources: CSV files with a header row.
//!
//! Headers are matched case-insensitively after trimming; cell values are
//! trimmed. Blank cells are not adapter errors: the validator reports every
//! one of them together. Rows are referenced as `line N`, counting data rows
//! from 1.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::{unreadable, SourceBatch, SourceKind};
use crate::error::{ProvisionError, SourceError};
use crate::record::{ContactName, ProvisioningRecord};

/// Columns of the mentors file.
pub const MENTOR_COLUMNS: [&str; 3] = ["first_name", "last_name", "email"];

/// Columns of the schools file.
pub const SCHOOL_COLUMNS: [&str; 5] = [
    "tla",
    "organisation_name",
    "first_name",
    "last_name",
    "email",
];

/// UTF-8 BOM bytes.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// A data row keyed by lowercased column name.
struct Row {
    line: usize,
    cells: HashMap<String, String>,
}

impl Row {
    fn reference(&self) -> String {
        format!("line {}", self.line)
    }

    fn get(&self, column: &str) -> String {
        self.cells.get(column).cloned().unwrap_or_default()
    }
}

/// Read a mentors CSV: one unaffiliated record per row.
pub fn read_mentors(path: &Path) -> Result<SourceBatch, ProvisionError> {
    let data = read_bytes(path)?;
    let mut batch = SourceBatch::new(SourceKind::Mentors);
    let rows = parse_rows(path, &data, &MENTOR_COLUMNS, &mut batch.errors)?;
    for row in rows {
        batch.records.push(ProvisioningRecord::unaffiliated(
            ContactName::Split {
                first: row.get("first_name"),
                last: row.get("last_name"),
            },
            row.get("email"),
            row.reference(),
        ));
    }
    Ok(batch)
}

/// Read a schools CSV: one organization and its team leader per row.
///
/// The `tla` is uppercased and serves as both the organization identifier
/// and the single team identifier.
pub fn read_schools(path: &Path) -> Result<SourceBatch, ProvisionError> {
    let data = read_bytes(path)?;
    let mut batch = SourceBatch::new(SourceKind::Schools);
    let rows = parse_rows(path, &data, &SCHOOL_COLUMNS, &mut batch.errors)?;
    for row in rows {
        let tla = row.get("tla").to_uppercase();
        batch.records.push(ProvisioningRecord::for_organization(
            ContactName::Split {
                first: row.get("first_name"),
                last: row.get("last_name"),
            },
            row.get("email"),
            vec![tla],
            Some(row.get("organisation_name")),
            row.reference(),
        ));
    }
    Ok(batch)
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, ProvisionError> {
    fs::read(path).map_err(|e| unreadable(path, format!("Couldn't open {}: {}", path.display(), e)))
}

fn strip_utf8_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(UTF8_BOM).unwrap_or(data)
}

/// Check headers, then collect every row. Rows the CSV reader cannot decode
/// are pushed onto `errors` and skipped.
fn parse_rows(
    path: &Path,
    data: &[u8],
    required: &[&str],
    errors: &mut Vec<SourceError>,
) -> Result<Vec<Row>, ProvisionError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(strip_utf8_bom(data));

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| unreadable(path, format!("Invalid CSV header: {e}")))?
        .iter()
        .map(str::to_lowercase)
        .collect();

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == col))
        .collect();
    if !missing.is_empty() {
        return Err(unreadable(
            path,
            format!("missing required column(s): {}", missing.join(", ")),
        ));
    }

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let line = index + 1;
        match result {
            Ok(record) => {
                let cells = headers
                    .iter()
                    .zip(record.iter())
                    .map(|(h, v)| (h.clone(), v.to_string()))
                    .collect();
                rows.push(Row { line, cells });
            }
            Err(e) => errors.push(SourceError::new(format!("line {line}"), format!("Invalid CSV row: {e}"))),
        }
    }
    Ok(rows)
}
