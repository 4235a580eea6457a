//! Tabular loader for flight activity exports
//!
//! Reads a CSV file or the first worksheet of a spreadsheet, checks that
//! every required field is present in the header and turns each row into a
//! [`FlightRecord`] of loosely-typed values. Row counts and value types are
//! not checked here.

use calamine::{Data, Reader, open_workbook_auto};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::layout::{DurationCategory, Layout, fields};
use super::value::RawValue;
use crate::common::errors::{ConversionError, ConversionResult};

/// Extensions read through calamine; everything else is parsed as CSV
const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Cell contents treated as missing in CSV input
const MISSING_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// One flight leg as read from the input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightRecord {
    pub date: RawValue,
    pub departure: RawValue,
    pub arrival: RawValue,
    pub off_block: RawValue,
    pub on_block: RawValue,
    pub aircraft_type: RawValue,
    pub aircraft: RawValue,
    pub students: RawValue,
    pub instructors: RawValue,
    pub flight_type: RawValue,
    pub program_phase: RawValue,
    /// Indexed in [`DurationCategory::ALL`] order
    pub durations: [RawValue; 8],
}

impl FlightRecord {
    pub fn duration(&self, category: DurationCategory) -> &RawValue {
        &self.durations[category as usize]
    }

    fn from_row(index: &FieldIndex, row: &[RawValue]) -> Self {
        FlightRecord {
            date: index.value(row, fields::DATE),
            departure: index.value(row, fields::DEPARTURE),
            arrival: index.value(row, fields::ARRIVAL),
            off_block: index.value(row, fields::OFF_BLOCK),
            on_block: index.value(row, fields::ON_BLOCK),
            aircraft_type: index.value(row, fields::AIRCRAFT_TYPE),
            aircraft: index.value(row, fields::AIRCRAFT),
            students: index.value(row, fields::STUDENTS),
            instructors: index.value(row, fields::INSTRUCTORS),
            flight_type: index.value(row, fields::FLIGHT_TYPE),
            program_phase: index.value(row, fields::PROGRAM_PHASE),
            durations: DurationCategory::ALL.map(|category| index.value(row, category.field_name())),
        }
    }
}

/// Header name -> column position, first occurrence wins
struct FieldIndex(HashMap<String, usize>);

impl FieldIndex {
    fn new(field_names: &[String]) -> Self {
        let mut positions = HashMap::new();
        for (position, name) in field_names.iter().enumerate() {
            positions.entry(name.clone()).or_insert(position);
        }
        FieldIndex(positions)
    }

    fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    fn value(&self, row: &[RawValue], name: &str) -> RawValue {
        self.0
            .get(name)
            .and_then(|position| row.get(*position))
            .cloned()
            .unwrap_or_default()
    }
}

/// Parsed input: declared field names and records in file order
#[derive(Debug, Clone, Default)]
pub struct LoadedTable {
    pub field_names: Vec<String>,
    pub records: Vec<FlightRecord>,
}

/// Load and schema-check an input table
pub fn load_table(path: &Path, layout: &Layout) -> ConversionResult<LoadedTable> {
    let (field_names, rows) = if is_spreadsheet(path) {
        read_spreadsheet_rows(path)?
    } else {
        read_csv_rows(path)?
    };

    let index = FieldIndex::new(&field_names);
    let missing: Vec<String> = layout
        .required_fields
        .iter()
        .filter(|name| !index.contains(name))
        .map(ToString::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(ConversionError::Schema { missing });
    }

    let records: Vec<FlightRecord> = rows
        .iter()
        .map(|row| FlightRecord::from_row(&index, row))
        .collect();

    tracing::debug!(
        "Loaded {} records with {} fields from {}",
        records.len(),
        field_names.len(),
        path.display()
    );

    Ok(LoadedTable {
        field_names,
        records,
    })
}

fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SPREADSHEET_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

fn input_error(path: &Path, message: impl ToString) -> ConversionError {
    ConversionError::InputRead {
        path: PathBuf::from(path),
        message: message.to_string(),
    }
}

type RawRows = (Vec<String>, Vec<Vec<RawValue>>);

/// CSV columns are typed as a whole: numeric when every present value parses as a number
fn read_csv_rows(path: &Path) -> ConversionResult<RawRows> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| input_error(path, e))?;

    let field_names: Vec<String> = reader
        .headers()
        .map_err(|e| input_error(path, e))?
        .iter()
        .map(ToString::to_string)
        .collect();

    let mut cells: Vec<Vec<Option<String>>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| input_error(path, e))?;
        // Rows of missing markers only still count as records
        let row: Vec<Option<String>> = (0..field_names.len())
            .map(|position| {
                record
                    .get(position)
                    .filter(|cell| !MISSING_MARKERS.contains(cell))
                    .map(ToString::to_string)
            })
            .collect();
        cells.push(row);
    }

    let numeric_columns: Vec<bool> = (0..field_names.len())
        .map(|position| {
            cells
                .iter()
                .filter_map(|row| row[position].as_deref())
                .all(|cell| parse_number(cell).is_some())
        })
        .collect();

    let rows = cells
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&numeric_columns)
                .map(|(cell, numeric)| match cell {
                    None => RawValue::Absent,
                    Some(cell) if *numeric => {
                        parse_number(&cell).map_or(RawValue::Absent, RawValue::Number)
                    }
                    Some(cell) => RawValue::Text(cell),
                })
                .collect()
        })
        .collect();

    Ok((field_names, rows))
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok()
}

/// First worksheet, first row as header. Empty rows inside the used range are kept.
fn read_spreadsheet_rows(path: &Path) -> ConversionResult<RawRows> {
    let mut workbook = open_workbook_auto(path).map_err(|e| input_error(path, e))?;
    let sheet_name = workbook
        .sheet_names()
        .into_iter()
        .next()
        .ok_or_else(|| input_error(path, "No worksheets"))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| input_error(path, e))?;

    let mut rows = range.rows();
    let field_names: Vec<String> = rows
        .next()
        .map(|header| header.iter().map(ToString::to_string).collect())
        .unwrap_or_default();

    let records = rows
        .map(|row| row.iter().map(raw_value_from_cell).collect::<Vec<_>>())
        .collect();

    Ok((field_names, records))
}

pub fn raw_value_from_cell(cell: &Data) -> RawValue {
    match cell {
        Data::Empty | Data::Error(_) => RawValue::Absent,
        Data::Int(value) => {
            // i64 -> f64 only loses precision far beyond any flight log value
            #[allow(clippy::cast_precision_loss)]
            let value = *value as f64;
            RawValue::Number(value)
        }
        Data::Float(value) => RawValue::Number(*value),
        Data::DateTime(excel_dt) => RawValue::from_serial(excel_dt.as_f64()),
        Data::String(text) if text.is_empty() => RawValue::Absent,
        Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => {
            RawValue::Text(text.clone())
        }
        Data::Bool(flag) => RawValue::Text(if *flag { "True" } else { "False" }.to_string()),
    }
}
