//! CSV dump: one file per sheet.
//!
//! Numeric cells honor the document's configured output precision. Values
//! containing a delimiter, quote, or newline are quoted with doubled
//! internal quotes, so a dump re-parses to the same content.

use std::io::Write;
use std::path::Path;

use crate::cell::Cell;
use crate::document::Document;
use crate::error::Result;
use crate::sheet::Sheet;
use crate::types::{Address, SheetT};

use super::{format_number_with_precision, format_scalar};

/// Write `<sheet name>.csv` for every sheet into `outdir`.
pub fn dump(doc: &Document, outdir: &Path) -> Result<()> {
    std::fs::create_dir_all(outdir)?;
    for idx in 0..doc.sheet_count() as SheetT {
        let name = doc.sheet_name(idx).unwrap_or("sheet");
        let mut file = std::fs::File::create(outdir.join(format!("{name}.csv")))?;
        dump_sheet(doc, idx, &mut file)?;
    }
    Ok(())
}

/// Write one sheet as CSV to a writer.
pub fn dump_sheet<W: Write>(doc: &Document, sheet_idx: SheetT, out: &mut W) -> Result<()> {
    let Some(sheet) = doc.sheet(sheet_idx) else {
        return Ok(());
    };
    let Some(range) = sheet.get_data_range() else {
        return Ok(());
    };
    let precision = doc.config().output_precision;

    for row in range.first.row..=range.last.row {
        let mut line = String::new();
        for col in range.first.column..=range.last.column {
            if col > range.first.column {
                line.push(',');
            }
            line.push_str(&quote(&csv_cell_value(doc, sheet, row, col, precision)));
        }
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn csv_cell_value(doc: &Document, sheet: &Sheet, row: i32, col: i32, precision: i32) -> String {
    match sheet.cell_at(row, col) {
        Cell::Empty => String::new(),
        Cell::Bool(b) => (if b { "true" } else { "false" }).to_string(),
        Cell::Number(n) => format_number_with_precision(n, precision),
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

/// Quote a field when it contains a structural character.
fn quote(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::DEFAULT_SHEET_SIZE;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_csv_dump_sheet() {
        let mut doc = Document::new(DEFAULT_SHEET_SIZE);
        let s = doc.append_sheet("data");
        let id = doc.shared_strings_mut().add("a,b");
        let sheet = doc.sheet_mut(s).unwrap();
        sheet.set_value(0, 0, 1.0);
        sheet.set_string(0, 1, id);
        sheet.set_bool(1, 0, false);

        let mut out = Vec::new();
        dump_sheet(&doc, s, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1,\"a,b\"\nfalse,\n");
    }

    #[test]
    fn test_csv_dump_honors_precision() {
        let mut doc = Document::new(DEFAULT_SHEET_SIZE);
        let mut config = doc.config().clone();
        config.output_precision = 2;
        doc.set_config(config);
        let s = doc.append_sheet("data");
        doc.sheet_mut(s).unwrap().set_value(0, 0, 1.5);

        let mut out = Vec::new();
        dump_sheet(&doc, s, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1.50\n");
    }

    #[test]
    fn test_csv_dump_quotes_embedded_quotes() {
        let mut doc = Document::new(DEFAULT_SHEET_SIZE);
        let s = doc.append_sheet("data");
        let id = doc.shared_strings_mut().add("b\"c");
        doc.sheet_mut(s).unwrap().set_string(0, 0, id);

        let mut out = Vec::new();
        dump_sheet(&doc, s, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\"b\"\"c\"\n");
    }

    #[test]
    fn test_csv_dump_empty_sheet_writes_nothing() {
        let mut doc = Document::new(DEFAULT_SHEET_SIZE);
        let s = doc.append_sheet("data");
        let mut out = Vec::new();
        dump_sheet(&doc, s, &mut out).unwrap();
        assert!(out.is_empty());
    }
}
