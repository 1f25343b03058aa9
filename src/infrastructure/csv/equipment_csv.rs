// ============================================================
// EQUIPMENT CSV PARSER
// ============================================================
// Validate uploaded CSV bytes and turn them into typed equipment records

use crate::domain::equipment::EquipmentRecord;
use crate::domain::error::{AppError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::warn;

/// The five columns every upload must carry, spelled the way the official
/// sample file spells them. Matching against the header row is case- and
/// whitespace-insensitive.
pub const REQUIRED_COLUMNS: [&str; 5] =
    ["Equipment Name", "Type", "Flowrate", "Pressure", "Temperature"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Name,
    Type,
    Flowrate,
    Pressure,
    Temperature,
}

static COLUMN_LOOKUP: Lazy<HashMap<&'static str, Column>> = Lazy::new(|| {
    HashMap::from([
        ("equipment name", Column::Name),
        ("type", Column::Type),
        ("flowrate", Column::Flowrate),
        ("pressure", Column::Pressure),
        ("temperature", Column::Temperature),
    ])
});

/// Result of parsing one upload. Rows with missing or non-numeric values are
/// dropped rather than failing the whole file; `skipped_rows` reports how
/// many were lost so the caller can surface it.
#[derive(Debug, Clone)]
pub struct ParsedUpload {
    pub records: Vec<EquipmentRecord>,
    pub skipped_rows: usize,
}

pub struct EquipmentCsvParser {
    /// Delimiter character (default: comma)
    delimiter: u8,
}

impl Default for EquipmentCsvParser {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl EquipmentCsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parse raw upload bytes. Pure apart from a warning log per dropped row.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<ParsedUpload> {
        let content = decode_upload(bytes)?;
        self.parse_content(&content)
    }

    pub fn parse_content(&self, content: &str) -> Result<ParsedUpload> {
        // CSVs exported from Excel often sneak a BOM onto the first header.
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .clone();

        let columns = resolve_columns(&headers)?;

        let mut records = Vec::new();
        let mut skipped_rows = 0usize;

        for (index, result) in reader.records().enumerate() {
            let row = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;

            match parse_row(&columns, &row) {
                Ok(record) => records.push(record),
                Err(field) => {
                    warn!(row = index + 1, field, "Dropping CSV row with invalid value");
                    skipped_rows += 1;
                }
            }
        }

        Ok(ParsedUpload {
            records,
            skipped_rows,
        })
    }
}

/// Decode upload bytes as UTF-8, falling back to Windows-1252 for files
/// exported by older spreadsheet tools.
fn decode_upload(bytes: &[u8]) -> Result<String> {
    if let Ok(content) = std::str::from_utf8(bytes) {
        return Ok(content.to_string());
    }

    let (content, _, had_errors) = encoding_rs::WINDOWS_1252.decode(bytes);
    if had_errors {
        return Err(AppError::ParseError(
            "Upload is not valid UTF-8 or Windows-1252 text.".to_string(),
        ));
    }
    Ok(content.into_owned())
}

fn normalize_header(header: &str) -> String {
    header.trim().trim_start_matches('\u{feff}').to_lowercase()
}

/// Map each required column to its index in the header row, or report every
/// missing column name in one error.
fn resolve_columns(headers: &StringRecord) -> Result<HashMap<Column, usize>> {
    let mut indexes = HashMap::new();
    for (idx, header) in headers.iter().enumerate() {
        if let Some(column) = COLUMN_LOOKUP.get(normalize_header(header).as_str()) {
            // First occurrence wins if a column is duplicated.
            indexes.entry(*column).or_insert(idx);
        }
    }

    let mut missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .zip([
            Column::Name,
            Column::Type,
            Column::Flowrate,
            Column::Pressure,
            Column::Temperature,
        ])
        .filter(|(_, column)| !indexes.contains_key(column))
        .map(|(name, _)| name.to_string())
        .collect();

    if !missing.is_empty() {
        missing.sort();
        return Err(AppError::InvalidColumns(missing));
    }

    Ok(indexes)
}

/// Build a record from one data row. Returns the offending column name when
/// a value is absent or fails numeric coercion.
fn parse_row(
    columns: &HashMap<Column, usize>,
    row: &StringRecord,
) -> std::result::Result<EquipmentRecord, &'static str> {
    let name = field(columns, row, Column::Name);
    if name.is_empty() {
        return Err("Equipment Name");
    }
    let equipment_type = field(columns, row, Column::Type);
    if equipment_type.is_empty() {
        return Err("Type");
    }

    Ok(EquipmentRecord {
        name: name.to_string(),
        equipment_type: equipment_type.to_string(),
        flowrate: numeric_field(columns, row, Column::Flowrate, "Flowrate")?,
        pressure: numeric_field(columns, row, Column::Pressure, "Pressure")?,
        temperature: numeric_field(columns, row, Column::Temperature, "Temperature")?,
    })
}

fn field<'a>(columns: &HashMap<Column, usize>, row: &'a StringRecord, column: Column) -> &'a str {
    row.get(columns[&column]).unwrap_or("")
}

fn numeric_field(
    columns: &HashMap<Column, usize>,
    row: &StringRecord,
    column: Column,
    label: &'static str,
) -> std::result::Result<f64, &'static str> {
    field(columns, row, column).parse::<f64>().map_err(|_| label)
}
