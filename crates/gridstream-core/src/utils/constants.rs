//! Workbook-wide limits and defaults.

use crate::types::{ColT, RangeSize, RowT};

/// Default number of rows in a sheet, matching the largest target format.
pub const DEFAULT_ROW_SIZE: RowT = 1_048_576;

/// Default number of columns in a sheet, matching the largest target format.
pub const DEFAULT_COL_SIZE: ColT = 16_384;

/// Default sheet dimensions.
pub const DEFAULT_SHEET_SIZE: RangeSize = RangeSize {
    rows: DEFAULT_ROW_SIZE,
    columns: DEFAULT_COL_SIZE,
};

/// Default origin date: serial day 0 is 1899-12-30.
pub const DEFAULT_ORIGIN_DATE: (i32, u32, u32) = (1899, 12, 30);

/// Default numeric precision of the CSV dump (-1 keeps the shortest
/// round-trip form).
pub const DEFAULT_OUTPUT_PRECISION: i32 = -1;
