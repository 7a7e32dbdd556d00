//! Per-sheet import builder.
//!
//! [`ImportSheet`] exposes the direct value setters plus accessors for the
//! specialized sub-builders (properties, view, data table, conditional
//! format, named expressions, auto filter, table, formula, array formula).
//! Acquiring a sub-builder initializes a fresh buffer.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::formula::{FormulaScalar, FormulaTokens};
use crate::sheet::{DataTable, DataTableType};
use crate::types::{
    Address, ColT, FormulaGrammar, Range, RangeSize, RowT, SheetPane, SheetT, StringId,
};
use crate::view::DocumentView;

use super::auto_filter::ImportAutoFilter;
use super::cond_format::ImportCondFormat;
use super::named_exp::{ImportNamedExpression, NamedScope};
use super::table::ImportTable;

/// Import-side interface over one sheet.
pub struct ImportSheet<'a> {
    doc: &'a mut Document,
    view: Option<&'a mut DocumentView>,
    sheet: SheetT,
}

impl<'a> ImportSheet<'a> {
    pub(crate) fn new(
        doc: &'a mut Document,
        view: Option<&'a mut DocumentView>,
        sheet: SheetT,
    ) -> Self {
        Self { doc, view, sheet }
    }

    pub fn sheet_index(&self) -> SheetT {
        self.sheet
    }

    /// The size of the sheet.
    pub fn sheet_size(&self) -> RangeSize {
        self.doc
            .sheet(self.sheet)
            .map(|s| s.size())
            .unwrap_or(RangeSize { rows: 0, columns: 0 })
    }

    // -----------------------------------------------------------------------
    // Value setters
    // -----------------------------------------------------------------------

    /// Set a raw string value and let the sheet infer its type.
    pub fn set_auto(&mut self, row: RowT, col: ColT, value: &str) {
        if let Some((sheet, strings)) = self.doc.sheet_and_strings_mut(self.sheet) {
            sheet.set_auto(row, col, value, strings);
        }
    }

    /// Set a string cell by shared-string identifier.
    pub fn set_string(&mut self, row: RowT, col: ColT, sindex: StringId) {
        if let Some(sheet) = self.doc.sheet_mut(self.sheet) {
            sheet.set_string(row, col, sindex);
        }
    }

    /// Intern a string and set it as a string cell, bypassing type
    /// inference.
    pub fn set_string_value(&mut self, row: RowT, col: ColT, value: &str) {
        if let Some((sheet, strings)) = self.doc.sheet_and_strings_mut(self.sheet) {
            let id = strings.add(value);
            sheet.set_string(row, col, id);
        }
    }

    pub fn set_value(&mut self, row: RowT, col: ColT, value: f64) {
        if let Some(sheet) = self.doc.sheet_mut(self.sheet) {
            sheet.set_value(row, col, value);
        }
    }

    pub fn set_bool(&mut self, row: RowT, col: ColT, value: bool) {
        if let Some(sheet) = self.doc.sheet_mut(self.sheet) {
            sheet.set_bool(row, col, value);
        }
    }

    /// Set a date-time value, converted to a serial day count relative to
    /// the document origin date.
    pub fn set_date_time(
        &mut self,
        row: RowT,
        col: ColT,
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: f64,
    ) -> Result<()> {
        let origin = self.doc.origin_date();
        let sheet = self
            .doc
            .sheet_mut(self.sheet)
            .ok_or_else(|| Error::Structure("sheet vanished during import".to_string()))?;
        sheet.set_date_time(row, col, origin, year, month, day, hour, minute, second)
    }

    /// Set the cell format of one cell. Called after any column and row
    /// formats.
    pub fn set_format(&mut self, row: RowT, col: ColT, xf_index: usize) {
        if let Some(sheet) = self.doc.sheet_mut(self.sheet) {
            sheet.set_format(row, col, xf_index);
        }
    }

    /// Set the cell format of a cell range.
    pub fn set_format_range(&mut self, range: Range, xf_index: usize) {
        if let Some(sheet) = self.doc.sheet_mut(self.sheet) {
            sheet.set_format_range(range, xf_index);
        }
    }

    /// Set the cell format of contiguous columns. Called before any row or
    /// cell formats.
    pub fn set_column_format(&mut self, col: ColT, col_span: ColT, xf_index: usize) {
        if let Some(sheet) = self.doc.sheet_mut(self.sheet) {
            sheet.set_column_format(col, col_span, xf_index);
        }
    }

    /// Set the cell format of one row. Called after column formats and
    /// before cell formats.
    pub fn set_row_format(&mut self, row: RowT, xf_index: usize) {
        if let Some(sheet) = self.doc.sheet_mut(self.sheet) {
            sheet.set_row_format(row, xf_index);
        }
    }

    /// Duplicate the source cell's value across `range_size` cells below.
    pub fn fill_down_cells(&mut self, src_row: RowT, src_col: ColT, range_size: RowT) {
        if let Some(sheet) = self.doc.sheet_mut(self.sheet) {
            sheet.fill_down_cells(src_row, src_col, range_size);
        }
    }

    // -----------------------------------------------------------------------
    // Sub-builders
    // -----------------------------------------------------------------------

    pub fn sheet_properties(&mut self) -> ImportSheetProperties<'_> {
        ImportSheetProperties {
            doc: self.doc,
            sheet: self.sheet,
        }
    }

    /// View import interface; `None` when the factory was built without a
    /// view store.
    pub fn sheet_view(&mut self) -> Option<ImportSheetView<'_>> {
        let view = self.view.as_deref_mut()?;
        Some(ImportSheetView {
            view,
            sheet: self.sheet,
        })
    }

    pub fn data_table(&mut self) -> ImportDataTable<'_> {
        ImportDataTable {
            doc: self.doc,
            sheet: self.sheet,
            buffer: DataTable {
                table_type: DataTableType::Column,
                range: Range::default(),
                first_reference: None,
                first_reference_deleted: false,
                second_reference: None,
                second_reference_deleted: false,
            },
        }
    }

    pub fn conditional_format(&mut self) -> ImportCondFormat<'_> {
        ImportCondFormat::new(self.doc, self.sheet)
    }

    /// Builder for sheet-scoped named expressions.
    pub fn named_expression(&mut self) -> ImportNamedExpression<'_> {
        ImportNamedExpression::new(self.doc, NamedScope::Sheet(self.sheet))
    }

    pub fn auto_filter(&mut self) -> ImportAutoFilter<'_> {
        ImportAutoFilter::for_sheet(self.doc, self.sheet)
    }

    pub fn table(&mut self) -> ImportTable<'_> {
        ImportTable::new(self.doc, self.sheet)
    }

    pub fn formula(&mut self) -> ImportFormula<'_> {
        ImportFormula {
            doc: self.doc,
            sheet: self.sheet,
            position: None,
            formula: None,
            shared_index: None,
            result: None,
        }
    }

    pub fn array_formula(&mut self) -> ImportArrayFormula<'_> {
        ImportArrayFormula {
            doc: self.doc,
            sheet: self.sheet,
            range: None,
            formula: None,
            results: Vec::new(),
        }
    }
}

/// Sheet properties: decorative attributes that are not cell values.
pub struct ImportSheetProperties<'a> {
    doc: &'a mut Document,
    sheet: SheetT,
}

impl ImportSheetProperties<'_> {
    pub fn set_column_width(&mut self, col: ColT, col_span: ColT, width: f64) {
        if let Some(sheet) = self.doc.sheet_mut(self.sheet) {
            sheet.set_column_width(col, col_span, width);
        }
    }

    pub fn set_column_hidden(&mut self, col: ColT, col_span: ColT, hidden: bool) {
        if let Some(sheet) = self.doc.sheet_mut(self.sheet) {
            sheet.set_column_hidden(col, col_span, hidden);
        }
    }

    pub fn set_row_height(&mut self, row: RowT, height: f64) {
        if let Some(sheet) = self.doc.sheet_mut(self.sheet) {
            sheet.set_row_height(row, height);
        }
    }

    pub fn set_row_hidden(&mut self, row: RowT, hidden: bool) {
        if let Some(sheet) = self.doc.sheet_mut(self.sheet) {
            sheet.set_row_hidden(row, hidden);
        }
    }

    /// Record a merged cell range.
    ///
    /// # Errors
    ///
    /// Fails when the range overlaps an existing merged range.
    pub fn set_merge_cell_range(&mut self, range: Range) -> Result<()> {
        let sheet = self
            .doc
            .sheet_mut(self.sheet)
            .ok_or_else(|| Error::Structure("sheet vanished during import".to_string()))?;
        sheet.set_merge_cell_range(range)
    }
}

/// Sheet view import interface.
pub struct ImportSheetView<'a> {
    view: &'a mut DocumentView,
    sheet: SheetT,
}

impl ImportSheetView<'_> {
    pub fn set_selected_range(&mut self, pane: SheetPane, range: Range) {
        self.view
            .get_or_create_sheet_view(self.sheet)
            .set_selection(pane, range);
    }

    pub fn set_active_pane(&mut self, pane: SheetPane) {
        self.view
            .get_or_create_sheet_view(self.sheet)
            .set_active_pane(pane);
    }

    pub fn set_split_pane(&mut self, hor_split: f64, ver_split: f64, top_left_cell: Address) {
        self.view
            .get_or_create_sheet_view(self.sheet)
            .set_split_pane(hor_split, ver_split, top_left_cell);
    }

    pub fn set_frozen_pane(
        &mut self,
        visible_columns: ColT,
        visible_rows: RowT,
        top_left_cell: Address,
    ) {
        self.view
            .get_or_create_sheet_view(self.sheet)
            .set_frozen_pane(visible_columns, visible_rows, top_left_cell);
    }

    /// Mark this sheet as the active sheet of the document view.
    pub fn set_sheet_active(&mut self) {
        self.view.set_active_sheet(self.sheet);
    }
}

/// Data table import builder.
pub struct ImportDataTable<'a> {
    doc: &'a mut Document,
    sheet: SheetT,
    buffer: DataTable,
}

impl ImportDataTable<'_> {
    pub fn set_type(&mut self, table_type: DataTableType) {
        self.buffer.table_type = table_type;
    }

    pub fn set_range(&mut self, range: Range) {
        self.buffer.range = range;
    }

    pub fn set_first_reference(&mut self, ref_str: &str, deleted: bool) {
        self.buffer.first_reference = Some(ref_str.to_string());
        self.buffer.first_reference_deleted = deleted;
    }

    pub fn set_second_reference(&mut self, ref_str: &str, deleted: bool) {
        self.buffer.second_reference = Some(ref_str.to_string());
        self.buffer.second_reference_deleted = deleted;
    }

    /// Commit the buffered data table to the sheet.
    ///
    /// # Errors
    ///
    /// Fails when the target sheet no longer exists.
    pub fn commit(self) -> Result<()> {
        let sheet = self
            .doc
            .sheet_mut(self.sheet)
            .ok_or_else(|| Error::Structure("sheet vanished during import".to_string()))?;
        sheet.add_data_table(self.buffer);
        Ok(())
    }
}

/// Cached result buffered before a formula commit.
enum ResultBuffer {
    Numeric(f64),
    Text(String),
    Bool(bool),
    Empty,
}

/// Single-cell formula import builder.
pub struct ImportFormula<'a> {
    doc: &'a mut Document,
    sheet: SheetT,
    position: Option<Address>,
    formula: Option<(FormulaGrammar, String)>,
    shared_index: Option<usize>,
    result: Option<ResultBuffer>,
}

impl ImportFormula<'_> {
    /// Position of the cell.
    pub fn set_position(&mut self, row: RowT, col: ColT) {
        self.position = Some(Address::new(row, col));
    }

    /// Formula expression, without the leading `=`.
    pub fn set_formula(&mut self, grammar: FormulaGrammar, formula: &str) {
        self.formula = Some((grammar, formula.to_string()));
    }

    /// Register the formula under a shared index. With an expression this
    /// defines the group; without one it joins an existing group.
    pub fn set_shared_formula_index(&mut self, index: usize) {
        self.shared_index = Some(index);
    }

    pub fn set_result_value(&mut self, value: f64) {
        self.result = Some(ResultBuffer::Numeric(value));
    }

    pub fn set_result_string(&mut self, value: &str) {
        self.result = Some(ResultBuffer::Text(value.to_string()));
    }

    pub fn set_result_bool(&mut self, value: bool) {
        self.result = Some(ResultBuffer::Bool(value));
    }

    pub fn set_result_empty(&mut self) {
        self.result = Some(ResultBuffer::Empty);
    }

    /// Commit the buffered formula data to the cell.
    ///
    /// # Errors
    ///
    /// Fails when no position was set, when the expression does not compile
    /// under the fail error policy, or when an index-only commit references
    /// an unknown shared group.
    pub fn commit(self) -> Result<()> {
        let pos = self
            .position
            .ok_or_else(|| Error::Structure("formula committed without a position".to_string()))?;
        let policy = self.doc.config().error_policy;

        let scalar = match self.result {
            Some(ResultBuffer::Numeric(v)) => Some(FormulaScalar::Number(v)),
            Some(ResultBuffer::Bool(v)) => Some(FormulaScalar::Bool(v)),
            Some(ResultBuffer::Empty) => Some(FormulaScalar::Empty),
            Some(ResultBuffer::Text(s)) => {
                let id = self.doc.shared_strings_mut().add(&s);
                Some(FormulaScalar::String(id))
            }
            None => None,
        };

        let tokens = match &self.formula {
            Some((grammar, text)) => Some(FormulaTokens::compile(text, *grammar, policy)?),
            None => None,
        };

        let sheet = self
            .doc
            .sheet_mut(self.sheet)
            .ok_or_else(|| Error::Structure("sheet vanished during import".to_string()))?;

        match (tokens, self.shared_index) {
            (Some(tokens), Some(sindex)) => {
                sheet.set_grouped_formula(pos.row, pos.column, sindex, tokens);
            }
            (Some(tokens), None) => {
                sheet.set_formula(pos.row, pos.column, tokens);
            }
            (None, Some(sindex)) => {
                sheet.set_shared_formula_member(pos.row, pos.column, sindex)?;
            }
            (None, None) => {
                return Err(Error::Structure(
                    "formula committed without an expression or shared index".to_string(),
                ));
            }
        }

        if let Some(scalar) = scalar {
            sheet.set_formula_result(pos.row, pos.column, scalar);
        }
        Ok(())
    }
}

/// Array (matrix) formula import builder.
pub struct ImportArrayFormula<'a> {
    doc: &'a mut Document,
    sheet: SheetT,
    range: Option<Range>,
    formula: Option<(FormulaGrammar, String)>,
    results: Vec<(RowT, ColT, ResultBuffer)>,
}

impl ImportArrayFormula<'_> {
    /// Range the array formula spans.
    pub fn set_range(&mut self, range: Range) {
        self.range = Some(range);
    }

    /// Formula expression, without the leading `=`.
    pub fn set_formula(&mut self, grammar: FormulaGrammar, formula: &str) {
        self.formula = Some((grammar, formula.to_string()));
    }

    pub fn set_result_value(&mut self, row: RowT, col: ColT, value: f64) {
        self.results.push((row, col, ResultBuffer::Numeric(value)));
    }

    pub fn set_result_string(&mut self, row: RowT, col: ColT, value: &str) {
        self.results
            .push((row, col, ResultBuffer::Text(value.to_string())));
    }

    pub fn set_result_bool(&mut self, row: RowT, col: ColT, value: bool) {
        self.results.push((row, col, ResultBuffer::Bool(value)));
    }

    pub fn set_result_empty(&mut self, row: RowT, col: ColT) {
        self.results.push((row, col, ResultBuffer::Empty));
    }

    /// Commit the buffered array formula over its range.
    ///
    /// # Errors
    ///
    /// Fails when the range or expression is missing, or the expression
    /// does not compile under the fail error policy.
    pub fn commit(self) -> Result<()> {
        let range = self.range.ok_or_else(|| {
            Error::Structure("array formula committed without a range".to_string())
        })?;
        let (grammar, text) = self.formula.ok_or_else(|| {
            Error::Structure("array formula committed without an expression".to_string())
        })?;
        let policy = self.doc.config().error_policy;
        let tokens = FormulaTokens::compile(&text, grammar, policy)?;

        // Intern string results first; writing into the sheet needs its own
        // mutable borrow.
        let mut scalars = Vec::with_capacity(self.results.len());
        for (row, col, buffer) in self.results {
            let scalar = match buffer {
                ResultBuffer::Numeric(v) => FormulaScalar::Number(v),
                ResultBuffer::Bool(v) => FormulaScalar::Bool(v),
                ResultBuffer::Empty => FormulaScalar::Empty,
                ResultBuffer::Text(s) => {
                    FormulaScalar::String(self.doc.shared_strings_mut().add(&s))
                }
            };
            scalars.push((row, col, scalar));
        }

        let sheet = self
            .doc
            .sheet_mut(self.sheet)
            .ok_or_else(|| Error::Structure("sheet vanished during import".to_string()))?;
        sheet.set_array_formula(range, tokens);
        for (row, col, scalar) in scalars {
            sheet.set_formula_result(row, col, scalar);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::ImportFactory;
    use crate::types::CellType;
    use crate::utils::constants::DEFAULT_SHEET_SIZE;

    #[test]
    fn test_value_setters() {
        let mut doc = Document::new(DEFAULT_SHEET_SIZE);
        {
            let mut factory = ImportFactory::new(&mut doc);
            let mut sheet = factory.append_sheet(0, "data").unwrap();
            sheet.set_auto(0, 0, "12");
            sheet.set_auto(0, 1, "hello");
            sheet.set_value(1, 0, 3.5);
            sheet.set_bool(1, 1, true);
            sheet.set_date_time(2, 0, 2011, 6, 15, 12, 0, 0.0).unwrap();
        }
        let sheet = doc.sheet(0).unwrap();
        assert_eq!(sheet.get_numeric_value(0, 0), Some(12.0));
        assert_eq!(sheet.cell_type(0, 1), CellType::String);
        assert_eq!(sheet.get_numeric_value(1, 0), Some(3.5));
        assert_eq!(sheet.get_bool_value(1, 1), Some(true));
        assert_eq!(sheet.get_numeric_value(2, 0), Some(40709.5));
    }

    #[test]
    fn test_formula_builder_normal() {
        let mut doc = Document::new(DEFAULT_SHEET_SIZE);
        {
            let mut factory = ImportFactory::new(&mut doc);
            let mut sheet = factory.append_sheet(0, "data").unwrap();
            let mut f = sheet.formula();
            f.set_position(0, 0);
            f.set_formula(FormulaGrammar::Xlsx, "1+2");
            f.set_result_value(3.0);
            f.commit().unwrap();
        }
        let sheet = doc.sheet(0).unwrap();
        assert_eq!(sheet.cell_type(0, 0), CellType::Formula);
        assert_eq!(sheet.get_numeric_value(0, 0), Some(3.0));
    }

    #[test]
    fn test_formula_builder_shared_group() {
        let mut doc = Document::new(DEFAULT_SHEET_SIZE);
        {
            let mut factory = ImportFactory::new(&mut doc);
            factory.set_recalc_formula_cells(true);
            let mut sheet = factory.append_sheet(0, "data").unwrap();
            sheet.set_value(0, 1, 1.0); // B1
            sheet.set_value(0, 2, 2.0); // C1
            sheet.set_value(1, 1, 10.0); // B2
            sheet.set_value(1, 2, 20.0); // C2

            let mut f = sheet.formula();
            f.set_position(0, 0);
            f.set_formula(FormulaGrammar::Xlsx, "B1+C1");
            f.set_shared_formula_index(0);
            f.commit().unwrap();

            let mut f = sheet.formula();
            f.set_position(1, 0);
            f.set_shared_formula_index(0);
            f.commit().unwrap();
            drop(sheet);
            factory.finalize().unwrap();
        }
        let sheet = doc.sheet(0).unwrap();
        assert_eq!(sheet.get_numeric_value(0, 0), Some(3.0));
        assert_eq!(sheet.get_numeric_value(1, 0), Some(30.0));
    }

    #[test]
    fn test_formula_builder_without_position_fails() {
        let mut doc = Document::new(DEFAULT_SHEET_SIZE);
        let mut factory = ImportFactory::new(&mut doc);
        let mut sheet = factory.append_sheet(0, "data").unwrap();
        let mut f = sheet.formula();
        f.set_formula(FormulaGrammar::Xlsx, "1+1");
        assert!(f.commit().is_err());
    }

    #[test]
    fn test_array_formula_builder() {
        let mut doc = Document::new(DEFAULT_SHEET_SIZE);
        {
            let mut factory = ImportFactory::new(&mut doc);
            let mut sheet = factory.append_sheet(0, "data").unwrap();
            let mut af = sheet.array_formula();
            af.set_range(Range::new(Address::new(0, 0), Address::new(1, 0)));
            af.set_formula(FormulaGrammar::Xlsx, "B1:B2*2");
            af.set_result_value(0, 0, 2.0);
            af.set_result_value(1, 0, 4.0);
            af.commit().unwrap();
        }
        let sheet = doc.sheet(0).unwrap();
        assert_eq!(sheet.get_numeric_value(0, 0), Some(2.0));
        assert_eq!(sheet.get_numeric_value(1, 0), Some(4.0));
        assert!(sheet.array_formula(0).is_some());
    }

    #[test]
    fn test_sheet_properties_and_merge() {
        let mut doc = Document::new(DEFAULT_SHEET_SIZE);
        {
            let mut factory = ImportFactory::new(&mut doc);
            let mut sheet = factory.append_sheet(0, "data").unwrap();
            let mut props = sheet.sheet_properties();
            props.set_column_width(0, 2, 15.0);
            props.set_row_hidden(5, true);
            props
                .set_merge_cell_range(Range::new(Address::new(0, 0), Address::new(0, 2)))
                .unwrap();
        }
        let sheet = doc.sheet(0).unwrap();
        assert_eq!(sheet.column_properties(1).size, Some(15.0));
        assert!(sheet.row_properties(5).hidden);
        assert_eq!(sheet.merge_ranges().len(), 1);
    }

    #[test]
    fn test_sheet_view_import() {
        let mut doc = Document::new(DEFAULT_SHEET_SIZE);
        let mut view = DocumentView::new();
        {
            let mut factory = ImportFactory::with_view(&mut doc, &mut view);
            let mut sheet = factory.append_sheet(0, "data").unwrap();
            let mut sv = sheet.sheet_view().unwrap();
            sv.set_frozen_pane(2, 3, Address::new(3, 2));
            sv.set_selected_range(
                SheetPane::BottomRight,
                Range::new(Address::new(4, 4), Address::new(4, 4)),
            );
            sv.set_active_pane(SheetPane::BottomRight);
            sv.set_sheet_active();
        }
        assert_eq!(view.active_sheet(), 0);
        let sv = view.sheet_view(0).unwrap();
        assert_eq!(sv.frozen_pane().unwrap().visible_rows, 3);
        assert_eq!(sv.active_pane(), SheetPane::BottomRight);
    }

    #[test]
    fn test_sheet_view_absent_without_view_store() {
        let mut doc = Document::new(DEFAULT_SHEET_SIZE);
        let mut factory = ImportFactory::new(&mut doc);
        let mut sheet = factory.append_sheet(0, "data").unwrap();
        assert!(sheet.sheet_view().is_none());
    }

    #[test]
    fn test_data_table_builder() {
        let mut doc = Document::new(DEFAULT_SHEET_SIZE);
        {
            let mut factory = ImportFactory::new(&mut doc);
            let mut sheet = factory.append_sheet(0, "data").unwrap();
            let mut dt = sheet.data_table();
            dt.set_type(DataTableType::Both);
            dt.set_range(Range::new(Address::new(0, 0), Address::new(5, 5)));
            dt.set_first_reference("A1", false);
            dt.set_second_reference("B1", true);
            dt.commit().unwrap();
        }
        let tables = doc.sheet(0).unwrap().data_tables();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].table_type, DataTableType::Both);
        assert!(tables[0].second_reference_deleted);
    }

    #[test]
    fn test_fill_down_via_builder() {
        let mut doc = Document::new(DEFAULT_SHEET_SIZE);
        {
            let mut factory = ImportFactory::new(&mut doc);
            let mut sheet = factory.append_sheet(0, "data").unwrap();
            sheet.set_auto(0, 0, "repeat");
            sheet.fill_down_cells(0, 0, 2);
        }
        let sheet = doc.sheet(0).unwrap();
        let id0 = sheet.get_string_identifier(0, 0).unwrap();
        assert_eq!(sheet.get_string_identifier(1, 0), Some(id0));
        assert_eq!(sheet.get_string_identifier(2, 0), Some(id0));
    }
}
