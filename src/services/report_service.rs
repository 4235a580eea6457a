//! Flight log report conversion service
//!
//! Runs one conversion end-to-end: load the export, normalize it, fill a
//! freshly opened copy of the template and persist the result. The workbook
//! is owned by a single call from open to save, and the output only appears
//! once it is completely written.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use umya_spreadsheet::Spreadsheet;

use super::processing::{
    aggregate::{Totals, write_totals},
    grid::{Grid, WorksheetGrid},
    layout::Layout,
    loader::load_table,
    normalize::{NormalizedRecord, normalize_record},
    sanitize::clear_below_totals,
    writer::{Placement, write_records},
};
use crate::common::errors::{ConversionError, ConversionResult};
use crate::config::Config;

pub const OUTPUT_SUFFIX: &str = "_formatted";
pub const OUTPUT_EXTENSION: &str = "xlsx";

/// Result of a successful conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    pub records_read: usize,
    pub rows_written: usize,
    pub records_dropped: usize,
    pub capacity: u32,
    pub last_data_row: u32,
    pub total_row: u32,
    pub rows_cleared: u32,
    pub processing_time_ms: u128,
}

/// What the grid stages did, before persistence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridReport {
    pub placement: Placement,
    pub totals: Totals,
    pub rows_cleared: u32,
}

/// Writer -> aggregator -> sanitizer over one grid
pub fn fill_template<G: Grid>(
    grid: &mut G,
    layout: &Layout,
    records: &[NormalizedRecord],
) -> ConversionResult<GridReport> {
    let placement = write_records(grid, layout, records);
    let totals = write_totals(grid, layout);
    let rows_cleared = clear_below_totals(grid, layout, &totals, placement.template_columns)?;

    Ok(GridReport {
        placement,
        totals,
        rows_cleared,
    })
}

/// `<dir>/<stem>.<ext>` -> `<dir>/<stem>_formatted.xlsx`
pub fn output_path_for(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "report".into(), |stem| stem.to_string_lossy());
    input.with_file_name(format!("{stem}{OUTPUT_SUFFIX}.{OUTPUT_EXTENSION}"))
}

/// Converts flight exports against one template
#[derive(Debug, Clone)]
pub struct ReportConverter {
    layout: Layout,
    template_path: PathBuf,
    sheet_name: Option<String>,
}

impl ReportConverter {
    pub fn new(layout: Layout, template_path: PathBuf, sheet_name: Option<String>) -> Self {
        Self {
            layout,
            template_path,
            sheet_name,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Layout::default(),
            config.template_path.clone(),
            config.template_sheet.clone(),
        )
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    pub fn template_available(&self) -> bool {
        self.template_path.is_file()
    }

    /// Convert `input` into a filled copy of the template at `output`
    pub fn convert(&self, input: &Path, output: &Path) -> ConversionResult<ConversionSummary> {
        let started = Instant::now();
        tracing::info!("Converting {} into {}", input.display(), output.display());

        let table = load_table(input, &self.layout)?;
        let mut book = self.open_template()?;

        let records: Vec<NormalizedRecord> = table.records.iter().map(normalize_record).collect();

        let sheet = match &self.sheet_name {
            Some(name) => book
                .get_sheet_by_name_mut(name)
                .ok_or_else(|| ConversionError::SheetNotFound { name: name.clone() })?,
            None => book.get_active_sheet_mut(),
        };
        let report = fill_template(&mut WorksheetGrid::new(sheet), &self.layout, &records)?;

        persist(&book, output)?;

        let summary = ConversionSummary {
            records_read: records.len(),
            rows_written: report.placement.written,
            records_dropped: report.placement.dropped,
            capacity: report.placement.capacity,
            last_data_row: report.totals.last_data_row,
            total_row: report.totals.total_row,
            rows_cleared: report.rows_cleared,
            processing_time_ms: started.elapsed().as_millis(),
        };
        tracing::info!(
            "Wrote {} of {} records to {} (totals row {}, {} ms)",
            summary.rows_written,
            summary.records_read,
            output.display(),
            summary.total_row,
            summary.processing_time_ms
        );
        Ok(summary)
    }

    fn open_template(&self) -> ConversionResult<Spreadsheet> {
        if !self.template_available() {
            return Err(ConversionError::TemplateNotFound {
                path: self.template_path.clone(),
            });
        }

        umya_spreadsheet::reader::xlsx::read(&self.template_path).map_err(|e| {
            ConversionError::TemplateRead {
                path: self.template_path.clone(),
                message: e.to_string(),
            }
        })
    }
}

/// Write to a temporary file next to `output`, then rename it into place
fn persist(book: &Spreadsheet, output: &Path) -> ConversionResult<()> {
    let save_error = |message: String| ConversionError::Save {
        path: output.to_path_buf(),
        message,
    };

    let directory = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staged = tempfile::Builder::new()
        .prefix(".report-")
        .suffix(".xlsx")
        .tempfile_in(directory)
        .map_err(|e| save_error(e.to_string()))?;

    umya_spreadsheet::writer::xlsx::write(book, staged.path())
        .map_err(|e| save_error(e.to_string()))?;
    staged
        .persist(output)
        .map_err(|e| save_error(e.error.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_helpers::{flight_csv, write_flight_template};
    use crate::services::processing::grid::CellWrite;
    use crate::services::processing::grid::memory::MemoryGrid;
    use crate::services::processing::layout::DurationCategory;
    use crate::services::processing::normalize::DateCell;
    use crate::services::processing::value::RawValue;
    use calamine::{Data, Reader, open_workbook_auto};
    use std::collections::BTreeMap;
    use std::fs;
    use umya_spreadsheet::Border;

    fn converter(template: &Path) -> ReportConverter {
        ReportConverter::new(Layout::default(), template.to_path_buf(), None)
    }

    type SheetContents = (
        Option<(u32, u32)>,
        Vec<Vec<Data>>,
        Vec<Vec<String>>,
        Vec<(String, String)>,
    );

    /// Values, formulas and defined names of the first worksheet
    fn sheet_contents(path: &Path) -> SheetContents {
        let mut workbook = open_workbook_auto(path).unwrap();
        let sheet_name = workbook.sheet_names()[0].clone();
        let values = workbook.worksheet_range(&sheet_name).unwrap();
        let formulas = workbook.worksheet_formula(&sheet_name).unwrap();
        (
            values.start(),
            values.rows().map(<[Data]>::to_vec).collect(),
            formulas.rows().map(<[String]>::to_vec).collect(),
            workbook.defined_names().to_vec(),
        )
    }

    fn print_areas(path: &Path) -> Vec<String> {
        let (_, _, _, names) = sheet_contents(path);
        names
            .into_iter()
            .filter(|(name, _)| name == "_xlnm.Print_Area")
            .map(|(_, address)| address)
            .collect()
    }

    /// Bottom border style of every cell in `A1:AF{last_row}`, keyed by
    /// `(column, row)`; `none` when the cell is gone
    fn bottom_borders(path: &Path, last_row: u32) -> BTreeMap<(u32, u32), String> {
        let book = umya_spreadsheet::reader::xlsx::read(path).unwrap();
        let sheet = book.get_active_sheet();
        let mut borders = BTreeMap::new();
        for row in 1..=last_row {
            for column in 1..=32u32 {
                let style = sheet
                    .get_cell((column, row))
                    .and_then(|cell| cell.get_style().get_borders())
                    .map_or_else(
                        || Border::BORDER_NONE.to_string(),
                        |edges| edges.get_bottom().get_border_style().to_string(),
                    );
                borders.insert((column, row), style);
            }
        }
        borders
    }

    fn normalized(count: usize) -> Vec<NormalizedRecord> {
        (0..count)
            .map(|offset| NormalizedRecord {
                date: DateCell::Label(format!("day {offset}")),
                departure: RawValue::Text("LSGG".to_string()),
                arrival: RawValue::Text("LSZH".to_string()),
                off_block: RawValue::Absent,
                on_block: RawValue::Absent,
                aircraft_type: RawValue::Absent,
                aircraft: RawValue::Absent,
                students: RawValue::Absent,
                instructor: RawValue::Absent,
                flight_type: RawValue::Absent,
                program_phase: RawValue::Absent,
                durations: [Some(1.0); 8],
            })
            .collect()
    }

    #[test]
    fn test_output_path_for() {
        assert_eq!(
            output_path_for(Path::new("/tmp/uploads/march.csv")),
            PathBuf::from("/tmp/uploads/march_formatted.xlsx")
        );
        assert_eq!(
            output_path_for(Path::new("log")),
            PathBuf::from("log_formatted.xlsx")
        );
    }

    #[test]
    fn test_fill_template_places_totals_after_records() {
        let layout = Layout::default();
        let mut grid = MemoryGrid::template(20, 32, 9);

        let report = fill_template(&mut grid, &layout, &normalized(4)).unwrap();

        assert_eq!(report.placement.written, 4);
        assert_eq!(report.totals.last_data_row, 5);
        assert_eq!(report.totals.total_row, 6);
        assert_eq!(report.rows_cleared, 14);
        assert_eq!(grid.auto_filter.as_deref(), Some("A1:AF5"));
        assert_eq!(grid.print_area.as_deref(), Some("A1:AF6"));
        assert_eq!(
            grid.value(9, 6),
            Some(&CellWrite::Formula("=SUM(I2:I5)".to_string()))
        );
        // Template decoration in the data region survives, not below the totals row
        assert_eq!(grid.value(9, 5), Some(&CellWrite::Number(99.0)));
        assert_eq!(grid.value(9, 7), None);
        assert!(!grid.has_border(9, 7));
    }

    #[test]
    fn test_fill_template_truncates_to_capacity() {
        let layout = Layout::default();
        let mut grid = MemoryGrid::template(6, 32, 9);

        let report = fill_template(&mut grid, &layout, &normalized(9)).unwrap();

        assert_eq!(report.placement.capacity, 5);
        assert_eq!(report.placement.dropped, 4);
        assert_eq!(report.totals.last_data_row, 6);
        assert_eq!(report.totals.total_row, 7);
        assert_eq!(report.rows_cleared, 0);
        assert_eq!(grid.print_area.as_deref(), Some("A1:AF7"));
    }

    #[test]
    fn test_fill_template_without_records() {
        let layout = Layout::default();
        let mut grid = MemoryGrid::template(8, 32, 9);

        let report = fill_template(&mut grid, &layout, &[]).unwrap();

        assert_eq!(report.totals.last_data_row, 2);
        assert_eq!(report.totals.total_row, 3);
        assert_eq!(
            grid.value(layout.duration_column(DurationCategory::Day), 3),
            Some(&CellWrite::Formula("=SUM(AA2:AA2)".to_string()))
        );
    }

    #[test]
    fn test_convert_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.xlsx");
        write_flight_template(&template, 12);
        let input = dir.path().join("march.csv");
        fs::write(&input, flight_csv(3)).unwrap();
        let output = output_path_for(&input);

        let summary = converter(&template).convert(&input, &output).unwrap();

        assert_eq!(summary.records_read, 3);
        assert_eq!(summary.rows_written, 3);
        assert_eq!(summary.records_dropped, 0);
        assert_eq!(summary.capacity, 11);
        assert_eq!(summary.last_data_row, 4);
        assert_eq!(summary.total_row, 5);

        let mut workbook = open_workbook_auto(&output).unwrap();
        let sheet_name = workbook.sheet_names()[0].clone();
        let values = workbook.worksheet_range(&sheet_name).unwrap();
        let formulas = workbook.worksheet_formula(&sheet_name).unwrap();

        // (row, column), 0-based
        assert_eq!(values.get_value((1, 1)), Some(&Data::String("LSGG".to_string())));
        assert_eq!(values.get_value((1, 13)), Some(&Data::String("Smith".to_string())));
        assert_eq!(values.get_value((1, 24)), Some(&Data::Float(1.5)));
        assert_eq!(formulas.get_value((4, 2)), Some(&"SUM(C2:C4)".to_string()));
        assert_eq!(formulas.get_value((4, 31)), Some(&"SUM(AF2:AF4)".to_string()));

        // Stale template values in column I survive in the data region only
        assert_eq!(values.get_value((3, 8)), Some(&Data::Float(1.0)));
        for row in 5..12 {
            assert!(
                matches!(values.get_value((row, 8)), None | Some(Data::Empty)),
                "row {row} should be blank"
            );
        }

        // One print area, ending at the totals row
        let areas = print_areas(&output);
        assert_eq!(areas.len(), 1);
        assert!(areas[0].ends_with("!$A$1:$AF$5"), "{}", areas[0]);
        assert!(!areas[0].contains(','));

        // Borders survive down to the totals row and are gone below it
        let borders = bottom_borders(&output, 12);
        assert_eq!(borders[&(1, 4)], Border::BORDER_THIN);
        assert_eq!(borders[&(32, 5)], Border::BORDER_THIN);
        for ((column, row), style) in &borders {
            if *row > 5 {
                assert_eq!(style, Border::BORDER_NONE, "border at ({column}, {row})");
            }
        }
    }

    #[test]
    fn test_trailing_record_without_date_stays_above_totals() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.xlsx");
        write_flight_template(&template, 10);
        let input = dir.path().join("march.csv");
        let mut csv = flight_csv(2);
        csv.push_str(",LSZH,LSGG,10:00,11:00,C172,HB-ABC,1003,Doe Jane,Solo,PPL-2,2,,,,,,,\n");
        fs::write(&input, csv).unwrap();
        let output = output_path_for(&input);

        let summary = converter(&template).convert(&input, &output).unwrap();

        assert_eq!(summary.rows_written, 3);
        assert_eq!(summary.last_data_row, 4);
        assert_eq!(summary.total_row, 5);

        let mut workbook = open_workbook_auto(&output).unwrap();
        let sheet_name = workbook.sheet_names()[0].clone();
        let values = workbook.worksheet_range(&sheet_name).unwrap();
        let formulas = workbook.worksheet_formula(&sheet_name).unwrap();

        assert_eq!(values.get_value((3, 0)), Some(&Data::String("nan".to_string())));
        assert_eq!(values.get_value((3, 1)), Some(&Data::String("LSZH".to_string())));
        assert_eq!(values.get_value((3, 24)), Some(&Data::Float(2.0)));
        assert_eq!(formulas.get_value((4, 24)), Some(&"SUM(Y2:Y4)".to_string()));
    }

    #[test]
    fn test_convert_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.xlsx");
        write_flight_template(&template, 8);
        let input = dir.path().join("april.csv");
        fs::write(&input, flight_csv(2)).unwrap();

        let converter = converter(&template);
        let first_path = dir.path().join("first.xlsx");
        let second_path = dir.path().join("second.xlsx");
        let first = converter.convert(&input, &first_path).unwrap();
        let second = converter.convert(&input, &second_path).unwrap();

        assert_eq!(sheet_contents(&first_path), sheet_contents(&second_path));
        assert_eq!(bottom_borders(&first_path, 8), bottom_borders(&second_path, 8));

        assert_eq!(
            ConversionSummary {
                processing_time_ms: 0,
                ..first
            },
            ConversionSummary {
                processing_time_ms: 0,
                ..second
            }
        );
    }

    #[test]
    fn test_missing_template_is_reported_and_nothing_written() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("may.csv");
        fs::write(&input, flight_csv(1)).unwrap();
        let output = dir.path().join("may_formatted.xlsx");
        let template = dir.path().join("absent.xlsx");

        let err = converter(&template).convert(&input, &output).unwrap_err();

        assert_eq!(err, ConversionError::TemplateNotFound { path: template });
        assert!(!output.exists());
    }

    #[test]
    fn test_schema_error_precedes_template_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.csv");
        fs::write(&input, "date,departure\n2024-03-15,LSGG\n").unwrap();
        let output = dir.path().join("bad_formatted.xlsx");

        let err = converter(&dir.path().join("absent.xlsx"))
            .convert(&input, &output)
            .unwrap_err();

        match err {
            ConversionError::Schema { missing } => {
                assert_eq!(missing.len(), 17);
                assert_eq!(missing[0], "arrival");
            }
            other => panic!("expected schema error, got {other:?}"),
        }
        assert!(!output.exists());
    }

    #[test]
    fn test_unknown_sheet_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.xlsx");
        write_flight_template(&template, 6);
        let input = dir.path().join("june.csv");
        fs::write(&input, flight_csv(1)).unwrap();
        let output = dir.path().join("june_formatted.xlsx");

        let converter =
            ReportConverter::new(Layout::default(), template, Some("Logbook".to_string()));
        let err = converter.convert(&input, &output).unwrap_err();

        assert_eq!(
            err,
            ConversionError::SheetNotFound {
                name: "Logbook".to_string()
            }
        );
        assert!(!output.exists());
    }
}
