//! Totals row and filter range

use super::grid::{CellWrite, Grid};
use super::layout::{Layout, column_letter};

/// Where the data ends and the totals row sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub last_data_row: u32,
    pub total_row: u32,
}

/// Find the last dated row, write `SUM` formulas directly below it and
/// narrow the filter range to the data rows.
pub fn write_totals<G: Grid>(grid: &mut G, layout: &Layout) -> Totals {
    let first = layout.first_data_row;
    let last_data_row = (first..=grid.max_row())
        .rev()
        .find(|row| grid.has_value(layout.date_column, *row))
        .unwrap_or(first);
    let total_row = last_data_row + 1;

    // Filter covers the data rows only, never the totals row
    grid.set_auto_filter(&layout.filter_range(last_data_row));

    for &column in &layout.sum_columns {
        let letter = column_letter(column);
        grid.put(
            column,
            total_row,
            CellWrite::Formula(format!("=SUM({letter}{first}:{letter}{last_data_row})")),
        );
    }

    tracing::debug!("Totals written to row {total_row} over rows {first}..={last_data_row}");

    Totals {
        last_data_row,
        total_row,
    }
}
