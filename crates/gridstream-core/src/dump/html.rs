//! HTML dump: one `<table>` document per sheet.

use std::io::Write;
use std::path::Path;

use crate::document::Document;
use crate::error::Result;
use crate::types::SheetT;

use super::cell_display;

/// Write `<sheet name>.html` for every sheet into `outdir`.
pub fn dump(doc: &Document, outdir: &Path) -> Result<()> {
    std::fs::create_dir_all(outdir)?;
    for idx in 0..doc.sheet_count() as SheetT {
        let name = doc.sheet_name(idx).unwrap_or("sheet");
        let mut file = std::fs::File::create(outdir.join(format!("{name}.html")))?;
        dump_sheet(doc, idx, &mut file)?;
    }
    Ok(())
}

/// Write one sheet as an HTML table to a writer.
pub fn dump_sheet<W: Write>(doc: &Document, sheet_idx: SheetT, out: &mut W) -> Result<()> {
    let Some(sheet) = doc.sheet(sheet_idx) else {
        return Ok(());
    };
    let name = doc.sheet_name(sheet_idx).unwrap_or("");

    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html><head><title>{}</title></head><body>", escape(name))?;
    writeln!(out, "<table border=\"1\">")?;

    if let Some(range) = sheet.get_data_range() {
        for row in range.first.row..=range.last.row {
            write!(out, "<tr>")?;
            for col in range.first.column..=range.last.column {
                write!(out, "<td>{}</td>", escape(&cell_display(doc, sheet, row, col)))?;
            }
            writeln!(out, "</tr>")?;
        }
    }

    writeln!(out, "</table>")?;
    writeln!(out, "</body></html>")?;
    Ok(())
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
