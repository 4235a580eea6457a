//! Clears everything below the totals row and pins the print area

use super::aggregate::Totals;
use super::grid::Grid;
use super::layout::Layout;
use crate::common::errors::ConversionResult;

/// Blank every cell below `totals.total_row` across `width` columns, strip
/// its borders, and set the print area to end at the totals row.
///
/// Returns the number of rows cleared.
pub fn clear_below_totals<G: Grid>(
    grid: &mut G,
    layout: &Layout,
    totals: &Totals,
    width: u32,
) -> ConversionResult<u32> {
    let first_stale = totals.total_row + 1;
    let last_row = grid.max_row();

    for row in first_stale..=last_row {
        for column in 1..=width {
            grid.clear_value(column, row);
            grid.clear_border(column, row);
        }
    }

    grid.set_print_area(&layout.print_range(totals.total_row))?;

    let cleared = (last_row + 1).saturating_sub(first_stale);
    tracing::debug!("Cleared {cleared} rows below totals row {}", totals.total_row);
    Ok(cleared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::processing::grid::CellWrite;
    use crate::services::processing::grid::memory::MemoryGrid;

    #[test]
    fn test_rows_below_totals_are_blank_and_borderless() {
        let layout = Layout::default();
        let mut grid = MemoryGrid::template(12, 34, 9);
        grid.put(33, 10, CellWrite::Text("note".to_string()));
        let totals = Totals {
            last_data_row: 4,
            total_row: 5,
        };

        let cleared = clear_below_totals(&mut grid, &layout, &totals, 34).unwrap();

        assert_eq!(cleared, 7);
        for row in 6..=12 {
            for column in 1..=34 {
                assert_eq!(grid.value(column, row), None, "value at ({column}, {row})");
                assert!(!grid.has_border(column, row), "border at ({column}, {row})");
            }
        }
        // Data rows and the totals row are untouched
        assert_eq!(grid.value(9, 5), Some(&CellWrite::Number(99.0)));
        assert!(grid.has_border(1, 5));
        assert!(grid.has_border(1, 2));
        assert_eq!(grid.print_area.as_deref(), Some("A1:AF5"));
    }

    #[test]
    fn test_totals_on_last_row_clears_nothing() {
        let layout = Layout::default();
        let mut grid = MemoryGrid::template(5, 32, 9);
        let totals = Totals {
            last_data_row: 4,
            total_row: 5,
        };

        let cleared = clear_below_totals(&mut grid, &layout, &totals, 32).unwrap();

        assert_eq!(cleared, 0);
        assert!(grid.has_border(1, 5));
        assert_eq!(grid.print_area.as_deref(), Some("A1:AF5"));
    }
}
