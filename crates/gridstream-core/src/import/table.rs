//! Table import builder.
//!
//! Buffers the table header, its columns (each committed individually), the
//! style flags, and an optional embedded auto-filter built through a
//! sub-builder. Commit inserts into the workbook table store, where the
//! first table of a given name wins.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::table::{Table, TableColumn};
use crate::types::{FormulaRefContext, SheetT, TotalsRowFunction};

use super::auto_filter::ImportAutoFilter;
use super::resolver::ReferenceResolver;

/// Buffer-then-commit builder for tables.
pub struct ImportTable<'a> {
    doc: &'a mut Document,
    #[allow(dead_code)]
    sheet: SheetT,
    buffer: Table,
    current_column: TableColumn,
}

impl<'a> ImportTable<'a> {
    pub(crate) fn new(doc: &'a mut Document, sheet: SheetT) -> Self {
        Self {
            doc,
            sheet,
            buffer: Table::default(),
            current_column: TableColumn::default(),
        }
    }

    pub fn set_identifier(&mut self, id: usize) {
        self.buffer.identifier = id;
    }

    pub fn set_name(&mut self, name: &str) {
        self.buffer.name = name.to_string();
    }

    pub fn set_display_name(&mut self, name: &str) {
        self.buffer.display_name = Some(name.to_string());
    }

    /// Set the table range from a reference string, resolved with the
    /// document's active grammar.
    ///
    /// # Errors
    ///
    /// Fails when the reference string cannot be resolved.
    pub fn set_range(&mut self, ref_str: &str) -> Result<()> {
        let resolver = ReferenceResolver::new(self.doc, FormulaRefContext::Global);
        let range = resolver.resolve_range(ref_str)?;
        self.buffer.range = range.to_range();
        Ok(())
    }

    pub fn set_totals_row_count(&mut self, count: usize) {
        self.buffer.totals_row_count = count;
    }

    pub fn set_column_count(&mut self, count: usize) {
        self.buffer.columns.reserve(count);
    }

    // ===== per-column buffer =====

    pub fn set_column_identifier(&mut self, id: usize) {
        self.current_column.identifier = id;
    }

    pub fn set_column_name(&mut self, name: &str) {
        self.current_column.name = name.to_string();
    }

    pub fn set_column_totals_row_label(&mut self, label: &str) {
        self.current_column.totals_row_label = Some(label.to_string());
    }

    pub fn set_column_totals_row_function(&mut self, func: TotalsRowFunction) {
        self.current_column.totals_row_function = func;
    }

    /// Commit the buffered column to the table buffer.
    pub fn commit_column(&mut self) {
        self.buffer
            .columns
            .push(std::mem::take(&mut self.current_column));
    }

    // ===== style flags =====

    pub fn set_style_name(&mut self, name: &str) {
        self.buffer.style.name = Some(name.to_string());
    }

    pub fn set_style_show_first_column(&mut self, show: bool) {
        self.buffer.style.show_first_column = show;
    }

    pub fn set_style_show_last_column(&mut self, show: bool) {
        self.buffer.style.show_last_column = show;
    }

    pub fn set_style_show_row_stripes(&mut self, show: bool) {
        self.buffer.style.show_row_stripes = show;
    }

    pub fn set_style_show_column_stripes(&mut self, show: bool) {
        self.buffer.style.show_column_stripes = show;
    }

    /// Embedded auto-filter sub-builder; its commit lands in this table's
    /// buffer.
    pub fn auto_filter(&mut self) -> ImportAutoFilter<'_> {
        ImportAutoFilter::for_table(&mut self.buffer.filter)
    }

    /// Commit the buffered table to the workbook.
    ///
    /// A table whose name is already taken is discarded; the existing table
    /// is neither replaced nor modified.
    ///
    /// # Errors
    ///
    /// Fails when no name was set.
    pub fn commit(self) -> Result<()> {
        if self.buffer.name.is_empty() {
            return Err(Error::Structure("table committed without a name".to_string()));
        }
        self.doc.insert_table(self.buffer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Address, AutoFilterNodeOp, AutoFilterOp, Range};
    use crate::utils::constants::DEFAULT_SHEET_SIZE;

    fn doc() -> Document {
        let mut doc = Document::new(DEFAULT_SHEET_SIZE);
        doc.append_sheet("Sheet1");
        doc
    }

    #[test]
    fn test_table_builder_full_round() {
        let mut doc = doc();
        let mut t = ImportTable::new(&mut doc, 0);
        t.set_identifier(1);
        t.set_name("Sales");
        t.set_display_name("Sales Table");
        t.set_range("Sheet1!A1:C11").unwrap();
        t.set_totals_row_count(1);
        t.set_column_count(2);

        t.set_column_identifier(1);
        t.set_column_name("Region");
        t.commit_column();

        t.set_column_identifier(2);
        t.set_column_name("Amount");
        t.set_column_totals_row_label("Total");
        t.set_column_totals_row_function(TotalsRowFunction::Sum);
        t.commit_column();

        t.set_style_name("TableStyleMedium2");
        t.set_style_show_row_stripes(true);

        let mut af = t.auto_filter();
        af.set_range(Range::new(Address::new(0, 0), Address::new(10, 2)));
        let col = af.start_column(0, AutoFilterNodeOp::Or);
        af.append_item(&col, AutoFilterOp::Equal, "East");
        af.commit().unwrap();

        t.commit().unwrap();

        let stored = doc.get_table("Sales").unwrap();
        assert_eq!(stored.identifier, 1);
        assert_eq!(stored.columns.len(), 2);
        assert_eq!(stored.columns[1].totals_row_function, TotalsRowFunction::Sum);
        assert_eq!(stored.range.last, Address::new(10, 2));
        assert!(stored.style.show_row_stripes);
        assert!(stored.filter.is_some());
    }

    #[test]
    fn test_duplicate_table_name_is_discarded() {
        let mut doc = doc();
        let mut t = ImportTable::new(&mut doc, 0);
        t.set_identifier(1);
        t.set_name("T");
        t.commit().unwrap();

        let mut t = ImportTable::new(&mut doc, 0);
        t.set_identifier(2);
        t.set_name("T");
        t.commit().unwrap();

        assert_eq!(doc.table_count(), 1);
        assert_eq!(doc.get_table("T").unwrap().identifier, 1);
    }

    #[test]
    fn test_table_without_name_fails() {
        let mut doc = doc();
        let t = ImportTable::new(&mut doc, 0);
        assert!(t.commit().is_err());
    }

    #[test]
    fn test_bad_range_string_fails() {
        let mut doc = doc();
        let mut t = ImportTable::new(&mut doc, 0);
        assert!(t.set_range("not-a-range").is_err());
    }
}
