//! Loosely-typed cell values as they arrive from an input table
//!
//! The same field may carry numbers, text or date/time values from one row to
//! the next. Every consumer matches on [`RawValue`] exhaustively instead of
//! coercing implicitly.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Days from 0001-01-01 (day 1) to the spreadsheet epoch 1899-12-30.
const SPREADSHEET_EPOCH_DAYS_FROM_CE: i32 = 693_594;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// A single input value before normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RawValue {
    #[default]
    Absent,
    Number(f64),
    TimeOfDay(NaiveTime),
    Timestamp(NaiveDateTime),
    Text(String),
}

impl RawValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, RawValue::Absent)
    }

    /// Render the value as the label a reader would see for it
    pub fn display_text(&self) -> String {
        match self {
            RawValue::Absent => String::new(),
            RawValue::Number(number) => format_number(*number),
            RawValue::TimeOfDay(time) => time.format("%H:%M:%S").to_string(),
            RawValue::Timestamp(timestamp) => timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            RawValue::Text(text) => text.clone(),
        }
    }

    /// Convert a spreadsheet serial (days since 1899-12-30) into a time or timestamp.
    ///
    /// Serials below one day carry no calendar date and become [`RawValue::TimeOfDay`].
    pub fn from_serial(serial: f64) -> RawValue {
        match timestamp_from_serial(serial) {
            Some(timestamp) if (0.0..1.0).contains(&serial) => RawValue::TimeOfDay(timestamp.time()),
            Some(timestamp) => RawValue::Timestamp(timestamp),
            None => RawValue::Absent,
        }
    }
}

fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{number:.0}")
    } else {
        number.to_string()
    }
}

/// Spreadsheet serial for a calendar date
pub fn serial_from_date(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce() - SPREADSHEET_EPOCH_DAYS_FROM_CE)
}

/// Fraction of a day for a time of day
pub fn serial_from_time(time: NaiveTime) -> f64 {
    f64::from(time.num_seconds_from_midnight()) / SECONDS_PER_DAY
}

pub fn serial_from_timestamp(timestamp: NaiveDateTime) -> f64 {
    serial_from_date(timestamp.date()) + serial_from_time(timestamp.time())
}

/// Inverse of [`serial_from_timestamp`], rounded to the nearest second
pub fn timestamp_from_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 || serial > f64::from(i32::MAX) {
        return None;
    }

    let mut days = serial.floor();
    let mut seconds = ((serial - days) * SECONDS_PER_DAY).round();
    if seconds >= SECONDS_PER_DAY {
        days += 1.0;
        seconds = 0.0;
    }

    // Safe casts: both values are finite and bounded above
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (days, seconds) = (days as i32, seconds as u32);

    let date = NaiveDate::from_num_days_from_ce_opt(days.checked_add(SPREADSHEET_EPOCH_DAYS_FROM_CE)?)?;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)?;
    Some(date.and_time(time))
}
