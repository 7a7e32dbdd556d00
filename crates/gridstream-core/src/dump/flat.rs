//! Flat dump: a fixed-width text grid, one file per sheet.

use std::io::Write;
use std::path::Path;

use crate::document::Document;
use crate::error::Result;
use crate::types::SheetT;
use crate::utils::cell_ref::column_number_to_name;

use super::cell_display;

/// Write `<sheet name>.txt` for every sheet into `outdir`.
pub fn dump(doc: &Document, outdir: &Path) -> Result<()> {
    std::fs::create_dir_all(outdir)?;
    for idx in 0..doc.sheet_count() as SheetT {
        let name = doc.sheet_name(idx).unwrap_or("sheet");
        let mut file = std::fs::File::create(outdir.join(format!("{name}.txt")))?;
        dump_sheet(doc, idx, &mut file)?;
    }
    Ok(())
}

/// Write one sheet as a fixed-width grid to a writer.
pub fn dump_sheet<W: Write>(doc: &Document, sheet_idx: SheetT, out: &mut W) -> Result<()> {
    let Some(sheet) = doc.sheet(sheet_idx) else {
        return Ok(());
    };
    let name = doc.sheet_name(sheet_idx).unwrap_or("");
    writeln!(out, "---")?;
    writeln!(out, "Sheet name: {name}")?;

    let Some(range) = sheet.get_data_range() else {
        writeln!(out, "(empty)")?;
        return Ok(());
    };
    writeln!(
        out,
        "rows: {}  cols: {}",
        range.last.row + 1,
        range.last.column + 1
    )?;

    // Collect the display text of every cell first to size the columns.
    let rows = (range.first.row..=range.last.row).collect::<Vec<_>>();
    let cols = (range.first.column..=range.last.column).collect::<Vec<_>>();
    let mut grid: Vec<Vec<String>> = Vec::with_capacity(rows.len());
    for &row in &rows {
        let mut line = Vec::with_capacity(cols.len());
        for &col in &cols {
            line.push(cell_display(doc, sheet, row, col));
        }
        grid.push(line);
    }

    let mut widths: Vec<usize> = cols
        .iter()
        .map(|&c| column_number_to_name(c).map(|n| n.chars().count()).unwrap_or(1))
        .collect();
    for line in &grid {
        for (i, cell) in line.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    // Header row with column names.
    let header: Vec<String> = cols
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let name = column_number_to_name(c).unwrap_or_else(|_| "?".to_string());
            format!("{name:^width$}", width = widths[i])
        })
        .collect();
    writeln!(out, "| {} |", header.join(" | "))?;

    for line in &grid {
        let cells: Vec<String> = line
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{cell:<width$}", width = widths[i]))
            .collect();
        writeln!(out, "| {} |", cells.join(" | "))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::DEFAULT_SHEET_SIZE;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flat_dump_grid() {
        let mut doc = Document::new(DEFAULT_SHEET_SIZE);
        let s = doc.append_sheet("data");
        let id = doc.shared_strings_mut().add("long text");
        let sheet = doc.sheet_mut(s).unwrap();
        sheet.set_string(0, 0, id);
        sheet.set_value(1, 1, 7.0);

        let mut out = Vec::new();
        dump_sheet(&doc, s, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "---\n\
             Sheet name: data\n\
             rows: 2  cols: 2\n\
             |     A     | B |\n\
             | long text |   |\n\
             |           | 7 |\n"
        );
    }

    #[test]
    fn test_flat_dump_empty_sheet() {
        let mut doc = Document::new(DEFAULT_SHEET_SIZE);
        let s = doc.append_sheet("empty");
        let mut out = Vec::new();
        dump_sheet(&doc, s, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("(empty)"));
    }
}
