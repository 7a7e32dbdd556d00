//! JSON dump: an array of row arrays per sheet.
//!
//! Cell values keep their type: numbers and booleans are emitted as JSON
//! scalars, strings are escaped, and empty cells become `null`.

use std::io::Write;
use std::path::Path;

use crate::cell::Cell;
use crate::document::Document;
use crate::error::Result;
use crate::formula::FormulaScalar;
use crate::sheet::Sheet;
use crate::types::{Address, ColT, RowT, SheetT};

use super::format_number;

/// Write `<sheet name>.json` for every sheet into `outdir`.
pub fn dump(doc: &Document, outdir: &Path) -> Result<()> {
    std::fs::create_dir_all(outdir)?;
    for idx in 0..doc.sheet_count() as SheetT {
        let name = doc.sheet_name(idx).unwrap_or("sheet");
        let mut file = std::fs::File::create(outdir.join(format!("{name}.json")))?;
        dump_sheet(doc, idx, &mut file)?;
    }
    Ok(())
}

/// Write one sheet as a JSON array-of-arrays to a writer.
pub fn dump_sheet<W: Write>(doc: &Document, sheet_idx: SheetT, out: &mut W) -> Result<()> {
    let Some(sheet) = doc.sheet(sheet_idx) else {
        return Ok(());
    };
    let Some(range) = sheet.get_data_range() else {
        writeln!(out, "[]")?;
        return Ok(());
    };

    writeln!(out, "[")?;
    for row in range.first.row..=range.last.row {
        let mut cells = Vec::new();
        for col in range.first.column..=range.last.column {
            cells.push(json_cell(doc, sheet, row, col));
        }
        let comma = if row < range.last.row { "," } else { "" };
        writeln!(out, "  [{}]{comma}", cells.join(", "))?;
    }
    writeln!(out, "]")?;
    Ok(())
}

fn json_cell(doc: &Document, sheet: &Sheet, row: RowT, col: ColT) -> String {
    match sheet.cell_at(row, col) {
        Cell::Empty => "null".to_string(),
        Cell::Bool(b) => (if b { "true" } else { "false" }).to_string(),
        Cell::Number(n) => format_number(n),
        Cell::String(id) => json_string(doc.shared_strings().get(id).unwrap_or("")),
        Cell::Formula(fid) => match sheet.formula_cell_result(fid, Address::new(row, col)) {
            Some(FormulaScalar::Number(n)) => format_number(n),
            Some(FormulaScalar::Bool(b)) => (if b { "true" } else { "false" }).to_string(),
            Some(FormulaScalar::String(id)) => {
                json_string(doc.shared_strings().get(id).unwrap_or(""))
            }
            Some(FormulaScalar::Error(e)) => json_string(e.as_str()),
            _ => "null".to_string(),
        },
    }
}

fn json_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
