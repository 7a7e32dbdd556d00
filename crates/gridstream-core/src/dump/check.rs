//! Check dump: the reference serialization used in regression tests.
//!
//! One line per non-empty cell, sorted by (sheet, row, column):
//!
//! ```text
//! <sheet name>/<row>/<column>:<type>:<value>
//! ```
//!
//! Formula cells print their expression text and, when present, the cached
//! result.

use std::io::Write;

use crate::cell::Cell;
use crate::document::Document;
use crate::error::Result;
use crate::types::Address;

use super::{format_number, format_scalar};

/// Write the check dump of every sheet to a writer.
pub fn dump<W: Write>(doc: &Document, out: &mut W) -> Result<()> {
    for idx in 0..doc.sheet_count() as i32 {
        let Some(sheet) = doc.sheet(idx) else {
            continue;
        };
        let name = doc.sheet_name(idx).unwrap_or("");
        for (row, col, cell) in sheet.populated_cells() {
            match cell {
                Cell::Empty => {}
                Cell::Bool(b) => {
                    writeln!(
                        out,
                        "{name}/{row}/{col}:boolean:{}",
                        if b { "true" } else { "false" }
                    )?;
                }
                Cell::Number(n) => {
                    writeln!(out, "{name}/{row}/{col}:numeric:{}", format_number(n))?;
                }
                Cell::String(id) => {
                    let text = doc.shared_strings().get(id).unwrap_or("");
                    writeln!(out, "{name}/{row}/{col}:string:{text}")?;
                }
                Cell::Formula(fid) => {
                    let Some(fc) = sheet.formula_cell(fid) else {
                        continue;
                    };
                    match sheet.formula_cell_result(fid, Address::new(row, col)) {
                        Some(scalar) => {
                            writeln!(
                                out,
                                "{name}/{row}/{col}:formula:={}:{}",
                                fc.tokens.text,
                                format_scalar(doc, scalar)
                            )?;
                        }
                        None => {
                            writeln!(out, "{name}/{row}/{col}:formula:={}", fc.tokens.text)?;
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
