//! Deterministic textual serializations of a document.
//!
//! The `check` dump is the reference form used in regression tests; the
//! others (`flat`, `csv`, `html`, `json`) are one-file-per-sheet renditions
//! for human inspection or further processing.

pub mod check;
pub mod csv;
pub mod flat;
pub mod html;
pub mod json;

use crate::cell::Cell;
use crate::document::Document;
use crate::formula::FormulaScalar;
use crate::sheet::Sheet;
use crate::types::{Address, ColT, RowT};

/// Format a numeric value in its shortest round-trip form, printing
/// integral values without a decimal point.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        let mut buf = ryu::Buffer::new();
        buf.format(n).to_string()
    }
}

/// Format a numeric value with a fixed number of decimal places, or the
/// shortest form when `precision` is negative.
pub(crate) fn format_number_with_precision(n: f64, precision: i32) -> String {
    if precision < 0 {
        format_number(n)
    } else {
        format!("{:.*}", precision as usize, n)
    }
}

/// Render a cached formula scalar for output.
pub(crate) fn format_scalar(doc: &Document, scalar: FormulaScalar) -> String {
    match scalar {
        FormulaScalar::Empty => String::new(),
        FormulaScalar::Number(n) => format_number(n),
        FormulaScalar::Bool(b) => (if b { "true" } else { "false" }).to_string(),
        FormulaScalar::String(id) => doc
            .shared_strings()
            .get(id)
            .map(str::to_string)
            .unwrap_or_default(),
        FormulaScalar::Error(e) => e.as_str().to_string(),
    }
}

/// Render a cell's value for grid-shaped output (flat, csv, html, json).
pub(crate) fn cell_display(doc: &Document, sheet: &Sheet, row: RowT, col: ColT) -> String {
    match sheet.cell_at(row, col) {
        Cell::Empty => String::new(),
        Cell::Bool(b) => (if b { "true" } else { "false" }).to_string(),
        Cell::Number(n) => format_number(n),
        Cell::String(id) => doc
            .shared_strings()
            .get(id)
            .map(str::to_string)
            .unwrap_or_default(),
        Cell::Formula(fid) => sheet
            .formula_cell_result(fid, Address::new(row, col))
            .map(|s| format_scalar(doc, s))
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(0.1), "0.1");
    }

    #[test]
    fn test_format_number_with_precision() {
        assert_eq!(format_number_with_precision(1.5, 3), "1.500");
        assert_eq!(format_number_with_precision(1.5, -1), "1.5");
        assert_eq!(format_number_with_precision(2.0, 0), "2");
    }
}
