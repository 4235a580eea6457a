//! Row/column access to the template worksheet
//!
//! The writer, aggregator and sanitizer only see the [`Grid`] trait. The
//! production implementation wraps a `umya_spreadsheet` worksheet borrowed
//! exclusively for the duration of one conversion.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use umya_spreadsheet::{Border, Worksheet};

use super::value::{RawValue, serial_from_date, serial_from_time, serial_from_timestamp};
use crate::common::errors::{ConversionError, ConversionResult};

const TIME_FORMAT: &str = "hh:mm:ss";
const TIMESTAMP_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
const PRINT_AREA_NAME: &str = "_xlnm.Print_Area";

/// A typed write into one cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellWrite {
    Blank,
    Text(String),
    Number(f64),
    /// Date with the number format to display it with
    Date(NaiveDate, &'static str),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    /// Formula text including the leading `=`
    Formula(String),
}

impl From<&RawValue> for CellWrite {
    fn from(value: &RawValue) -> Self {
        match value {
            RawValue::Absent => CellWrite::Blank,
            RawValue::Number(number) => CellWrite::Number(*number),
            RawValue::TimeOfDay(time) => CellWrite::Time(*time),
            RawValue::Timestamp(timestamp) => CellWrite::Timestamp(*timestamp),
            RawValue::Text(text) => CellWrite::Text(text.clone()),
        }
    }
}

impl From<Option<f64>> for CellWrite {
    fn from(value: Option<f64>) -> Self {
        value.map_or(CellWrite::Blank, CellWrite::Number)
    }
}

/// Mutable view of a worksheet addressed by 1-based `(column, row)`
pub trait Grid {
    /// Last row holding any cell, styled or valued
    fn max_row(&self) -> u32;
    /// Last column holding any cell, styled or valued
    fn max_column(&self) -> u32;
    /// True when the cell holds a non-empty value
    fn has_value(&self, column: u32, row: u32) -> bool;
    fn put(&mut self, column: u32, row: u32, value: CellWrite);
    fn clear_border(&mut self, column: u32, row: u32);
    /// Replace the active filter range (`A1:AF10` form)
    fn set_auto_filter(&mut self, range: &str);
    /// Replace the print area (`A1:AF11` form)
    fn set_print_area(&mut self, range: &str) -> ConversionResult<()>;

    fn clear_value(&mut self, column: u32, row: u32) {
        self.put(column, row, CellWrite::Blank);
    }
}

/// [`Grid`] over a template worksheet
pub struct WorksheetGrid<'a> {
    sheet: &'a mut Worksheet,
}

impl<'a> WorksheetGrid<'a> {
    pub fn new(sheet: &'a mut Worksheet) -> Self {
        Self { sheet }
    }
}

impl Grid for WorksheetGrid<'_> {
    fn max_row(&self) -> u32 {
        self.sheet.get_highest_row()
    }

    fn max_column(&self) -> u32 {
        self.sheet.get_highest_column()
    }

    fn has_value(&self, column: u32, row: u32) -> bool {
        !self.sheet.get_value((column, row)).is_empty()
    }

    fn put(&mut self, column: u32, row: u32, value: CellWrite) {
        let cell = self.sheet.get_cell_mut((column, row));
        match value {
            CellWrite::Blank => {
                cell.set_blank();
            }
            CellWrite::Text(text) => {
                cell.set_value_string(text);
            }
            CellWrite::Number(number) => {
                cell.set_value_number(number);
            }
            CellWrite::Date(date, format) => {
                cell.set_value_number(serial_from_date(date));
                cell.get_style_mut()
                    .get_number_format_mut()
                    .set_format_code(format);
            }
            CellWrite::Time(time) => {
                cell.set_value_number(serial_from_time(time));
                cell.get_style_mut()
                    .get_number_format_mut()
                    .set_format_code(TIME_FORMAT);
            }
            CellWrite::Timestamp(timestamp) => {
                cell.set_value_number(serial_from_timestamp(timestamp));
                cell.get_style_mut()
                    .get_number_format_mut()
                    .set_format_code(TIMESTAMP_FORMAT);
            }
            CellWrite::Formula(formula) => {
                cell.set_formula(formula.trim_start_matches('='));
            }
        }
    }

    fn clear_border(&mut self, column: u32, row: u32) {
        let borders = self.sheet.get_style_mut((column, row)).get_borders_mut();
        borders.get_left_mut().set_border_style(Border::BORDER_NONE);
        borders.get_right_mut().set_border_style(Border::BORDER_NONE);
        borders.get_top_mut().set_border_style(Border::BORDER_NONE);
        borders.get_bottom_mut().set_border_style(Border::BORDER_NONE);
        borders
            .get_diagonal_mut()
            .set_border_style(Border::BORDER_NONE);
    }

    fn set_auto_filter(&mut self, range: &str) {
        self.sheet.set_auto_filter(range);
    }

    fn set_print_area(&mut self, range: &str) -> ConversionResult<()> {
        let address = format!(
            "{}!{}",
            sheet_reference(self.sheet.get_name()),
            absolute_range(range)
        );

        // Setting an address on an existing name appends a range, so replace the name
        self.sheet
            .get_defined_names_mut()
            .retain(|name| name.get_name() != PRINT_AREA_NAME);

        self.sheet
            .add_defined_name(PRINT_AREA_NAME.to_string(), address)
            .map_err(|message| ConversionError::Workbook {
                message: format!("could not set print area: {message}"),
            })
    }
}

/// Sheet name as used in a defined-name address, quoted when needed
fn sheet_reference(name: &str) -> String {
    if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// `A1:AF10` -> `$A$1:$AF$10`
fn absolute_range(range: &str) -> String {
    range
        .split(':')
        .map(|reference| {
            let split = reference
                .find(|c: char| c.is_ascii_digit())
                .unwrap_or(reference.len());
            let (letters, digits) = reference.split_at(split);
            format!("${letters}${digits}")
        })
        .collect::<Vec<_>>()
        .join(":")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_range() {
        assert_eq!(absolute_range("A1:AF10"), "$A$1:$AF$10");
        assert_eq!(absolute_range("B7"), "$B$7");
    }

    #[test]
    fn test_sheet_reference() {
        assert_eq!(sheet_reference("Sheet1"), "Sheet1");
        assert_eq!(sheet_reference("Flight Log"), "'Flight Log'");
        assert_eq!(sheet_reference("Pilot's log"), "'Pilot''s log'");
    }

    #[test]
    fn test_cell_write_from_raw_value() {
        assert_eq!(CellWrite::from(&RawValue::Absent), CellWrite::Blank);
        assert_eq!(CellWrite::from(&RawValue::Number(2.0)), CellWrite::Number(2.0));
        assert_eq!(
            CellWrite::from(&RawValue::Text("LSGG".to_string())),
            CellWrite::Text("LSGG".to_string())
        );
        assert_eq!(CellWrite::from(Some(1.5)), CellWrite::Number(1.5));
        assert_eq!(CellWrite::from(None), CellWrite::Blank);
    }

    #[test]
    fn test_worksheet_grid_writes_values_and_formulas() {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_active_sheet_mut();
        let mut grid = WorksheetGrid::new(sheet);

        grid.put(1, 2, CellWrite::Text("LSGG".to_string()));
        grid.put(2, 2, CellWrite::Number(1.5));
        grid.put(3, 3, CellWrite::Formula("=SUM(B2:B2)".to_string()));

        assert!(grid.has_value(1, 2));
        assert!(grid.has_value(2, 2));
        assert!(!grid.has_value(1, 5));
        assert_eq!(grid.max_row(), 3);

        grid.clear_value(1, 2);
        assert!(!grid.has_value(1, 2));

        let sheet = book.get_active_sheet();
        assert_eq!(sheet.get_value((2u32, 2u32)), "1.5");
        assert_eq!(
            sheet.get_cell((3u32, 3u32)).map(|cell| cell.get_formula().to_string()),
            Some("SUM(B2:B2)".to_string())
        );
    }

    #[test]
    fn test_print_area_replaces_existing_one() {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_active_sheet_mut();
        sheet
            .add_defined_name(PRINT_AREA_NAME, "Sheet1!$A$1:$AF$10")
            .unwrap();

        let mut grid = WorksheetGrid::new(sheet);
        grid.set_print_area("A1:AF4").unwrap();
        grid.set_print_area("A1:AF5").unwrap();

        let addresses: Vec<String> = book
            .get_active_sheet()
            .get_defined_names()
            .iter()
            .filter(|name| name.get_name() == PRINT_AREA_NAME)
            .map(|name| name.get_address())
            .collect();
        assert_eq!(addresses.len(), 1);
        assert!(addresses[0].ends_with("!$A$1:$AF$5"), "{}", addresses[0]);
        assert!(!addresses[0].contains(','));
    }
}
