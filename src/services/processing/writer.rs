//! Template writer: places normalized records into the data region
//!
//! The data region runs from the first data row down to the last row the
//! template already uses. Records beyond that capacity are dropped; capacity
//! rows without a record have their record columns (and only those) cleared.

use super::grid::{CellWrite, Grid};
use super::layout::{DurationCategory, Layout};
use super::normalize::{DateCell, NormalizedRecord};

/// Outcome of filling the data region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Template extent before anything was written
    pub template_rows: u32,
    pub template_columns: u32,
    pub capacity: u32,
    pub written: usize,
    pub dropped: usize,
}

pub fn write_records<G: Grid>(
    grid: &mut G,
    layout: &Layout,
    records: &[NormalizedRecord],
) -> Placement {
    let template_rows = grid.max_row();
    let template_columns = grid.max_column();
    let capacity = layout.capacity(template_rows);

    for offset in 0..capacity {
        let row = layout.first_data_row + offset;
        match records.get(offset as usize) {
            Some(record) => place_record(grid, layout, row, record),
            None => clear_record_columns(grid, layout, row),
        }
    }

    let written = records.len().min(capacity as usize);
    let dropped = records.len() - written;
    if dropped > 0 {
        tracing::warn!(
            "Template holds {capacity} rows; dropping {dropped} of {} records",
            records.len()
        );
    }
    tracing::debug!("Wrote {written} records into rows {}..", layout.first_data_row);

    Placement {
        template_rows,
        template_columns,
        capacity,
        written,
        dropped,
    }
}

fn place_record<G: Grid>(grid: &mut G, layout: &Layout, row: u32, record: &NormalizedRecord) {
    let date = match &record.date {
        DateCell::Date(date) => CellWrite::Date(*date, layout.date_format),
        DateCell::Label(label) => CellWrite::Text(label.clone()),
    };
    grid.put(layout.date_column, row, date);

    let verbatim = [
        (layout.departure_column, &record.departure),
        (layout.off_block_column, &record.off_block),
        (layout.arrival_column, &record.arrival),
        (layout.on_block_column, &record.on_block),
        (layout.aircraft_type_column, &record.aircraft_type),
        (layout.aircraft_column, &record.aircraft),
        (layout.students_column, &record.students),
        (layout.instructor_column, &record.instructor),
        (layout.flight_type_column, &record.flight_type),
        (layout.program_phase_column, &record.program_phase),
    ];
    for (column, value) in verbatim {
        grid.put(column, row, CellWrite::from(value));
    }

    for (category, hours) in DurationCategory::ALL.iter().zip(record.durations) {
        grid.put(layout.duration_column(*category), row, CellWrite::from(hours));
    }
}

fn clear_record_columns<G: Grid>(grid: &mut G, layout: &Layout, row: u32) {
    for column in layout.record_columns() {
        grid.clear_value(column, row);
    }
}
