//! Per-field normalization of raw input values
//!
//! Every function here is pure and never fails: values that cannot be
//! interpreted degrade to a fallback (absent duration, raw date label)
//! rather than aborting the conversion.

use chrono::{NaiveDate, NaiveTime, Timelike};

use super::layout::DurationCategory;
use super::loader::FlightRecord;
use super::value::RawValue;

/// Label written for a record without any date, so the row still reads as data
pub const MISSING_DATE_LABEL: &str = "nan";

/// Text duration parsers, tried in order until one yields a value
const TEXT_DURATION_PARSERS: [fn(&str) -> Option<f64>; 2] = [clock_hours, plain_hours];

/// Duration in decimal hours, or `None` for "leave the cell blank"
pub fn decimal_hours(value: &RawValue) -> Option<f64> {
    match value {
        RawValue::Absent => None,
        RawValue::Number(hours) => hours.is_finite().then_some(*hours),
        RawValue::TimeOfDay(time) => Some(hours_from_time(*time)),
        RawValue::Timestamp(timestamp) => Some(hours_from_time(timestamp.time())),
        RawValue::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            TEXT_DURATION_PARSERS.iter().find_map(|parse| parse(text))
        }
    }
}

fn hours_from_time(time: NaiveTime) -> f64 {
    f64::from(time.hour()) + f64::from(time.minute()) / 60.0 + f64::from(time.second()) / 3600.0
}

/// `H:MM` or `H:MM:SS`, each segment an integer
fn clock_hours(text: &str) -> Option<f64> {
    if !text.contains(':') {
        return None;
    }

    let mut segments = text.split(':').map(str::trim);
    let hours: i32 = segments.next()?.parse().ok()?;
    let minutes: i32 = segments.next()?.parse().ok()?;
    let seconds: i32 = match segments.next() {
        Some(segment) => segment.parse().ok()?,
        None => 0,
    };

    Some(f64::from(hours) + f64::from(minutes) / 60.0 + f64::from(seconds) / 3600.0)
}

fn plain_hours(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|hours| hours.is_finite())
}

/// First whitespace-delimited token of a name; non-text values pass through
pub fn short_name(value: &RawValue) -> RawValue {
    match value {
        RawValue::Text(name) => {
            let trimmed = name.trim();
            let first = trimmed.split_whitespace().next().unwrap_or(trimmed);
            RawValue::Text(first.to_string())
        }
        other => other.clone(),
    }
}

/// Strict `YYYY-MM-DD` calendar date
///
/// Timestamps coming from spreadsheet inputs contribute their date part.
pub fn calendar_date(value: &RawValue) -> Option<NaiveDate> {
    match value {
        RawValue::Text(text) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok(),
        RawValue::Timestamp(timestamp) => Some(timestamp.date()),
        RawValue::Absent | RawValue::Number(_) | RawValue::TimeOfDay(_) => None,
    }
}

/// What ends up in the date column
#[derive(Debug, Clone, PartialEq)]
pub enum DateCell {
    /// Parsed date, written with date formatting
    Date(NaiveDate),
    /// Unparsable input, written verbatim without formatting
    Label(String),
}

/// A record with every field converted to the type its column expects
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub date: DateCell,
    pub departure: RawValue,
    pub arrival: RawValue,
    pub off_block: RawValue,
    pub on_block: RawValue,
    pub aircraft_type: RawValue,
    pub aircraft: RawValue,
    pub students: RawValue,
    pub instructor: RawValue,
    pub flight_type: RawValue,
    pub program_phase: RawValue,
    /// Indexed in [`DurationCategory::ALL`] order
    pub durations: [Option<f64>; 8],
}

pub fn normalize_record(record: &FlightRecord) -> NormalizedRecord {
    let date = match calendar_date(&record.date) {
        Some(date) => DateCell::Date(date),
        None if record.date.is_absent() => DateCell::Label(MISSING_DATE_LABEL.to_string()),
        None => {
            tracing::trace!("Keeping unparsed date {:?} as a label", record.date);
            DateCell::Label(record.date.display_text())
        }
    };

    NormalizedRecord {
        date,
        departure: record.departure.clone(),
        arrival: record.arrival.clone(),
        off_block: record.off_block.clone(),
        on_block: record.on_block.clone(),
        aircraft_type: record.aircraft_type.clone(),
        aircraft: record.aircraft.clone(),
        students: record.students.clone(),
        instructor: short_name(&record.instructors),
        flight_type: record.flight_type.clone(),
        program_phase: record.program_phase.clone(),
        durations: DurationCategory::ALL.map(|category| decimal_hours(record.duration(category))),
    }
}
