//! Fixed description of the flight log template grid
//!
//! The template is a pre-formatted workbook: header in row 1, one flight per
//! row from row 2, columns `A`..`AF`. [`Layout`] is built once at startup and
//! threaded through every stage; nothing in the pipeline reads ambient globals.

/// The eight flight-time categories carried by every record, in column order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationCategory {
    Vfr,
    Ifr,
    Day,
    Night,
    Local,
    CrossCountry,
    PilotFlying,
    PilotMonitoring,
}

impl DurationCategory {
    pub const ALL: [DurationCategory; 8] = [
        DurationCategory::Vfr,
        DurationCategory::Ifr,
        DurationCategory::Day,
        DurationCategory::Night,
        DurationCategory::Local,
        DurationCategory::CrossCountry,
        DurationCategory::PilotFlying,
        DurationCategory::PilotMonitoring,
    ];

    /// Input field carrying this category
    pub fn field_name(self) -> &'static str {
        match self {
            DurationCategory::Vfr => "vfr_time",
            DurationCategory::Ifr => "ifr_time",
            DurationCategory::Day => "day_time",
            DurationCategory::Night => "night_time",
            DurationCategory::Local => "local_time",
            DurationCategory::CrossCountry => "cross_country_time",
            DurationCategory::PilotFlying => "pilot_flying_time",
            DurationCategory::PilotMonitoring => "pilot_monitoring_time",
        }
    }
}

/// Input field names, as they appear in the export header
pub mod fields {
    pub const DATE: &str = "date";
    pub const DEPARTURE: &str = "departure";
    pub const ARRIVAL: &str = "arrival";
    pub const OFF_BLOCK: &str = "off_block";
    pub const ON_BLOCK: &str = "on_block";
    pub const AIRCRAFT_TYPE: &str = "aircraft_type";
    pub const AIRCRAFT: &str = "aircraft";
    pub const STUDENTS: &str = "students";
    pub const INSTRUCTORS: &str = "instructors";
    pub const FLIGHT_TYPE: &str = "flight_type";
    pub const PROGRAM_PHASE: &str = "program_phase";
}

/// Column positions (1-based) and fixed ranges of the template
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub header_row: u32,
    pub first_data_row: u32,
    /// Right edge of the filter range and print area
    pub last_column: u32,

    pub date_column: u32,
    pub departure_column: u32,
    pub off_block_column: u32,
    pub arrival_column: u32,
    pub on_block_column: u32,
    pub aircraft_type_column: u32,
    pub aircraft_column: u32,
    pub students_column: u32,
    pub instructor_column: u32,
    pub flight_type_column: u32,
    pub program_phase_column: u32,
    /// Indexed in [`DurationCategory::ALL`] order
    pub duration_columns: [u32; 8],

    /// Columns receiving a `SUM` formula in the totals row
    pub sum_columns: Vec<u32>,
    pub required_fields: Vec<&'static str>,
    pub date_format: &'static str,
}

impl Default for Layout {
    fn default() -> Self {
        let mut required_fields = vec![
            fields::DATE,
            fields::DEPARTURE,
            fields::ARRIVAL,
            fields::OFF_BLOCK,
            fields::ON_BLOCK,
            fields::AIRCRAFT_TYPE,
            fields::AIRCRAFT,
            fields::STUDENTS,
            fields::INSTRUCTORS,
            fields::FLIGHT_TYPE,
            fields::PROGRAM_PHASE,
        ];
        required_fields.extend(DurationCategory::ALL.map(DurationCategory::field_name));

        // C, I, J, K, L, then Q..=AF
        let mut sum_columns = vec![3, 9, 10, 11, 12];
        sum_columns.extend(17..=32);

        Layout {
            header_row: 1,
            first_data_row: 2,
            last_column: 32,
            date_column: 1,
            departure_column: 2,
            off_block_column: 3,
            arrival_column: 4,
            on_block_column: 5,
            aircraft_type_column: 7,
            aircraft_column: 8,
            students_column: 13,
            instructor_column: 14,
            flight_type_column: 15,
            program_phase_column: 16,
            duration_columns: [25, 26, 27, 28, 29, 30, 31, 32],
            sum_columns,
            required_fields,
            date_format: "dd/mm/yyyy",
        }
    }
}

impl Layout {
    /// Number of data rows a template whose last used row is `max_template_row` can hold
    pub fn capacity(&self, max_template_row: u32) -> u32 {
        (max_template_row + 1).saturating_sub(self.first_data_row)
    }

    pub fn duration_column(&self, category: DurationCategory) -> u32 {
        self.duration_columns[category as usize]
    }

    /// Every column a record writes to; unused data rows are cleared over exactly these
    pub fn record_columns(&self) -> Vec<u32> {
        let mut columns = vec![
            self.date_column,
            self.departure_column,
            self.off_block_column,
            self.arrival_column,
            self.on_block_column,
            self.aircraft_type_column,
            self.aircraft_column,
            self.students_column,
            self.instructor_column,
            self.flight_type_column,
            self.program_phase_column,
        ];
        columns.extend(self.duration_columns);
        columns
    }

    /// Filter range: header through the last data row, never the totals row
    pub fn filter_range(&self, last_data_row: u32) -> String {
        self.block_range(last_data_row)
    }

    /// Print area: header through the totals row inclusive
    pub fn print_range(&self, total_row: u32) -> String {
        self.block_range(total_row)
    }

    fn block_range(&self, last_row: u32) -> String {
        format!(
            "A{}:{}{}",
            self.header_row,
            column_letter(self.last_column),
            last_row
        )
    }
}

/// Spreadsheet column letters for a 1-based index (`1` -> `A`, `32` -> `AF`)
pub fn column_letter(index: u32) -> String {
    let mut letters = Vec::new();
    let mut remaining = index;
    while remaining > 0 {
        let offset = (remaining - 1) % 26;
        letters.push(char::from_u32('A' as u32 + offset).unwrap_or('A'));
        remaining = (remaining - 1) / 26;
    }
    letters.iter().rev().collect()
}
