//! Per-sheet cell value store.
//!
//! Cells are stored column-major in sparse ordered maps, so empty cells
//! occupy no physical space and iteration over populated cells is
//! O(populated). The sheet also owns its formula-cell store, shared-formula
//! groups, array-formula regions, merged ranges, format indices, and
//! sheet-local named expressions.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::cell::{Cell, FormulaCellId};
use crate::cond_format::CondFormat;
use crate::defined_names::NamedExpressions;
use crate::error::{Error, Result};
use crate::formula::{
    ArrayFormula, FormulaCell, FormulaCellKind, FormulaScalar, FormulaTokens, ResultMatrix,
    SharedFormulaGroup,
};
use crate::shared_strings::SharedStrings;
use crate::table::AutoFilter;
use crate::types::{Address, CellType, ColT, Range, RangeSize, RowT, SheetT, StringId};
use crate::utils::datetime;

/// A what-if data table over a range.
///
/// A data table is a single-variable column, a single-variable row, or a
/// double-variable table using both input references.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    pub table_type: DataTableType,
    pub range: Range,
    pub first_reference: Option<String>,
    pub first_reference_deleted: bool,
    pub second_reference: Option<String>,
    pub second_reference_deleted: bool,
}

/// Shape of a data table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataTableType {
    #[default]
    Column,
    Row,
    Both,
}

/// Width/height and visibility overrides of a row or column band.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BandProperties {
    pub size: Option<f64>,
    pub hidden: bool,
}

/// A single sheet of the workbook.
#[derive(Debug)]
pub struct Sheet {
    index: SheetT,
    size: RangeSize,
    /// Column-major sparse cell storage.
    columns: BTreeMap<ColT, BTreeMap<RowT, Cell>>,
    formula_cells: Vec<FormulaCell>,
    /// Shared-formula groups keyed by the driver-supplied shared index.
    shared_groups: HashMap<usize, SharedFormulaGroup>,
    array_formulas: Vec<ArrayFormula>,
    merge_ranges: Vec<Range>,
    auto_filter: Option<AutoFilter>,
    cond_formats: Vec<CondFormat>,
    data_tables: Vec<DataTable>,
    named_expressions: NamedExpressions,
    // Format indices, per cell / row / column. Application order is
    // column, then row, then cell, so lookup precedence is the reverse.
    cell_format_indices: HashMap<(RowT, ColT), usize>,
    row_format_indices: HashMap<RowT, usize>,
    col_format_indices: BTreeMap<ColT, usize>,
    col_properties: BTreeMap<ColT, BandProperties>,
    row_properties: BTreeMap<RowT, BandProperties>,
}

impl Sheet {
    pub fn new(index: SheetT, size: RangeSize) -> Self {
        Self {
            index,
            size,
            columns: BTreeMap::new(),
            formula_cells: Vec::new(),
            shared_groups: HashMap::new(),
            array_formulas: Vec::new(),
            merge_ranges: Vec::new(),
            auto_filter: None,
            cond_formats: Vec::new(),
            data_tables: Vec::new(),
            named_expressions: NamedExpressions::new(),
            cell_format_indices: HashMap::new(),
            row_format_indices: HashMap::new(),
            col_format_indices: BTreeMap::new(),
            col_properties: BTreeMap::new(),
            row_properties: BTreeMap::new(),
        }
    }

    pub fn index(&self) -> SheetT {
        self.index
    }

    pub fn size(&self) -> RangeSize {
        self.size
    }

    fn in_bounds(&self, row: RowT, col: ColT) -> bool {
        (0..self.size.rows).contains(&row) && (0..self.size.columns).contains(&col)
    }

    // -----------------------------------------------------------------------
    // Value setters
    // -----------------------------------------------------------------------

    fn set_cell(&mut self, row: RowT, col: ColT, cell: Cell) {
        if !self.in_bounds(row, col) {
            return;
        }
        self.columns.entry(col).or_default().insert(row, cell);
    }

    /// Parse a raw string and store it with an inferred type: a full
    /// numeric parse becomes a number, `true`/`false` become booleans, and
    /// anything else is interned as a shared string. Empty input leaves the
    /// cell empty.
    pub fn set_auto(&mut self, row: RowT, col: ColT, s: &str, strings: &mut SharedStrings) {
        if s.is_empty() {
            return;
        }
        let trimmed = s.trim();
        let numeric_shape = trimmed
            .bytes()
            .next()
            .is_some_and(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.'));
        if numeric_shape {
            if let Ok(n) = trimmed.parse::<f64>() {
                self.set_cell(row, col, Cell::Number(n));
                return;
            }
        }
        match s {
            "true" | "TRUE" | "True" => self.set_cell(row, col, Cell::Bool(true)),
            "false" | "FALSE" | "False" => self.set_cell(row, col, Cell::Bool(false)),
            _ => {
                let id = strings.add(s);
                self.set_cell(row, col, Cell::String(id));
            }
        }
    }

    /// Store a string cell by its shared-string identifier.
    pub fn set_string(&mut self, row: RowT, col: ColT, sindex: StringId) {
        self.set_cell(row, col, Cell::String(sindex));
    }

    pub fn set_value(&mut self, row: RowT, col: ColT, value: f64) {
        self.set_cell(row, col, Cell::Number(value));
    }

    pub fn set_bool(&mut self, row: RowT, col: ColT, value: bool) {
        self.set_cell(row, col, Cell::Bool(value));
    }

    /// Store a date-time as a serial day count relative to `origin`.
    pub fn set_date_time(
        &mut self,
        row: RowT,
        col: ColT,
        origin: NaiveDate,
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: f64,
    ) -> Result<()> {
        let dt = datetime::date_time_from_parts(year, month, day, hour, minute, second)?;
        self.set_cell(row, col, Cell::Number(datetime::to_serial(origin, dt)));
        Ok(())
    }

    /// Store a formula cell.
    pub fn set_formula(
        &mut self,
        row: RowT,
        col: ColT,
        tokens: Arc<FormulaTokens>,
    ) -> FormulaCellId {
        let fid = self.formula_cells.len();
        self.formula_cells.push(FormulaCell {
            tokens,
            origin: Address::new(row, col),
            result: None,
            kind: FormulaCellKind::Normal,
        });
        self.set_cell(row, col, Cell::Formula(fid));
        fid
    }

    /// Register a shared-formula group and store its defining cell.
    pub fn set_grouped_formula(
        &mut self,
        row: RowT,
        col: ColT,
        sindex: usize,
        tokens: Arc<FormulaTokens>,
    ) -> FormulaCellId {
        let origin = Address::new(row, col);
        self.shared_groups.insert(
            sindex,
            SharedFormulaGroup {
                tokens: Arc::clone(&tokens),
                origin,
            },
        );
        let fid = self.formula_cells.len();
        self.formula_cells.push(FormulaCell {
            tokens,
            origin,
            result: None,
            kind: FormulaCellKind::SharedMember { group: sindex },
        });
        self.set_cell(row, col, Cell::Formula(fid));
        fid
    }

    /// Store a member cell of an already-registered shared-formula group.
    ///
    /// # Errors
    ///
    /// Fails when no group exists under `sindex`.
    pub fn set_shared_formula_member(
        &mut self,
        row: RowT,
        col: ColT,
        sindex: usize,
    ) -> Result<FormulaCellId> {
        let group = self.shared_groups.get(&sindex).ok_or_else(|| {
            Error::InvalidArgument(format!("no shared formula group with index {sindex}"))
        })?;
        let tokens = Arc::clone(&group.tokens);
        let origin = group.origin;
        let fid = self.formula_cells.len();
        self.formula_cells.push(FormulaCell {
            tokens,
            origin,
            result: None,
            kind: FormulaCellKind::SharedMember { group: sindex },
        });
        self.set_cell(row, col, Cell::Formula(fid));
        Ok(fid)
    }

    /// Store an array formula over a range; every member cell shares the
    /// tokens and one result matrix.
    pub fn set_array_formula(&mut self, range: Range, tokens: Arc<FormulaTokens>) -> usize {
        let array = self.array_formulas.len();
        self.array_formulas.push(ArrayFormula {
            tokens: Arc::clone(&tokens),
            matrix: ResultMatrix::new(range),
        });
        for row in range.first.row..=range.last.row {
            for col in range.first.column..=range.last.column {
                let fid = self.formula_cells.len();
                self.formula_cells.push(FormulaCell {
                    tokens: Arc::clone(&tokens),
                    origin: range.first,
                    result: None,
                    kind: FormulaCellKind::ArrayMember { array },
                });
                self.set_cell(row, col, Cell::Formula(fid));
            }
        }
        array
    }

    /// Attach a cached result to the formula cell at a position. Array
    /// members route the value into the common matrix.
    pub fn set_formula_result(&mut self, row: RowT, col: ColT, value: FormulaScalar) {
        let Some(Cell::Formula(fid)) = self.get_cell(row, col) else {
            return;
        };
        match self.formula_cells[fid].kind {
            FormulaCellKind::ArrayMember { array } => {
                self.array_formulas[array]
                    .matrix
                    .set(Address::new(row, col), value);
            }
            _ => self.formula_cells[fid].result = Some(value),
        }
    }

    /// Duplicate the source cell's value to `count` cells directly below.
    /// The copy range never extends past the sheet size.
    pub fn fill_down_cells(&mut self, src_row: RowT, src_col: ColT, count: RowT) {
        if count < 1 {
            return;
        }
        let src = self.cell_at(src_row, src_col);
        let last = (src_row + count).min(self.size.rows - 1);
        match src {
            Cell::Empty => {
                // Filling down an empty cell clears the target cells.
                if let Some(col_store) = self.columns.get_mut(&src_col) {
                    for row in (src_row + 1)..=last {
                        col_store.remove(&row);
                    }
                }
            }
            Cell::Formula(fid) => {
                let tokens = Arc::clone(&self.formula_cells[fid].tokens);
                let origin = self.formula_cells[fid].origin;
                for row in (src_row + 1)..=last {
                    let new_fid = self.formula_cells.len();
                    self.formula_cells.push(FormulaCell {
                        tokens: Arc::clone(&tokens),
                        origin,
                        result: None,
                        kind: FormulaCellKind::Normal,
                    });
                    self.set_cell(row, src_col, Cell::Formula(new_fid));
                }
            }
            other => {
                for row in (src_row + 1)..=last {
                    self.set_cell(row, src_col, other);
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    fn get_cell(&self, row: RowT, col: ColT) -> Option<Cell> {
        self.columns.get(&col).and_then(|c| c.get(&row)).copied()
    }

    /// The cell at a position; empty when no slot exists.
    pub fn cell_at(&self, row: RowT, col: ColT) -> Cell {
        self.get_cell(row, col).unwrap_or(Cell::Empty)
    }

    pub fn cell_type(&self, row: RowT, col: ColT) -> CellType {
        self.cell_at(row, col).cell_type()
    }

    pub fn get_numeric_value(&self, row: RowT, col: ColT) -> Option<f64> {
        match self.cell_at(row, col) {
            Cell::Number(n) => Some(n),
            Cell::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
            Cell::Formula(fid) => match self.formula_cell_result(fid, Address::new(row, col)) {
                Some(FormulaScalar::Number(n)) => Some(n),
                Some(FormulaScalar::Bool(b)) => Some(if b { 1.0 } else { 0.0 }),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn get_bool_value(&self, row: RowT, col: ColT) -> Option<bool> {
        match self.cell_at(row, col) {
            Cell::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn get_string_identifier(&self, row: RowT, col: ColT) -> Option<StringId> {
        match self.cell_at(row, col) {
            Cell::String(id) => Some(id),
            Cell::Formula(fid) => match self.formula_cell_result(fid, Address::new(row, col)) {
                Some(FormulaScalar::String(id)) => Some(id),
                _ => None,
            },
            _ => None,
        }
    }

    /// Read a numeric cell back as a date-time relative to `origin`.
    pub fn get_date_time(&self, row: RowT, col: ColT, origin: NaiveDate) -> Option<NaiveDateTime> {
        self.get_numeric_value(row, col)
            .map(|serial| datetime::from_serial(origin, serial))
    }

    /// The smallest rectangle anchored at (0, 0) enclosing every non-empty
    /// cell, or `None` for an empty sheet.
    pub fn get_data_range(&self) -> Option<Range> {
        let mut max_row = -1;
        let mut max_col = -1;
        for (&col, col_store) in &self.columns {
            if let Some((&last_row, _)) = col_store.last_key_value() {
                max_row = max_row.max(last_row);
                max_col = max_col.max(col);
            }
        }
        if max_row < 0 {
            return None;
        }
        Some(Range::new(
            Address::new(0, 0),
            Address::new(max_row, max_col),
        ))
    }

    /// All populated cells sorted by (row, column).
    pub fn populated_cells(&self) -> Vec<(RowT, ColT, Cell)> {
        let mut out = Vec::new();
        for (&col, col_store) in &self.columns {
            for (&row, &cell) in col_store {
                out.push((row, col, cell));
            }
        }
        out.sort_by_key(|&(row, col, _)| (row, col));
        out
    }

    /// Populated cells within a contiguous region, sorted by (row, column).
    pub fn populated_cells_in_range(&self, range: Range) -> Vec<(RowT, ColT, Cell)> {
        let mut out = Vec::new();
        for (&col, col_store) in self
            .columns
            .range(range.first.column..=range.last.column)
        {
            for (&row, &cell) in col_store.range(range.first.row..=range.last.row) {
                out.push((row, col, cell));
            }
        }
        out.sort_by_key(|&(row, col, _)| (row, col));
        out
    }

    // -----------------------------------------------------------------------
    // Formula store access
    // -----------------------------------------------------------------------

    pub fn formula_cell(&self, fid: FormulaCellId) -> Option<&FormulaCell> {
        self.formula_cells.get(fid)
    }

    pub fn formula_cell_count(&self) -> usize {
        self.formula_cells.len()
    }

    /// Cached result of a formula cell, reading array members out of their
    /// common matrix.
    pub fn formula_cell_result(&self, fid: FormulaCellId, pos: Address) -> Option<FormulaScalar> {
        let fc = self.formula_cells.get(fid)?;
        match fc.kind {
            FormulaCellKind::ArrayMember { array } => self.array_formulas[array].matrix.get(pos),
            _ => fc.result,
        }
    }

    pub(crate) fn set_formula_cell_result_by_id(&mut self, fid: FormulaCellId, value: FormulaScalar) {
        if let Some(fc) = self.formula_cells.get_mut(fid) {
            fc.result = Some(value);
        }
    }

    pub(crate) fn set_array_result(&mut self, array: usize, pos: Address, value: FormulaScalar) {
        if let Some(af) = self.array_formulas.get_mut(array) {
            af.matrix.set(pos, value);
        }
    }

    pub fn shared_group(&self, sindex: usize) -> Option<&SharedFormulaGroup> {
        self.shared_groups.get(&sindex)
    }

    pub fn array_formula(&self, index: usize) -> Option<&ArrayFormula> {
        self.array_formulas.get(index)
    }

    // -----------------------------------------------------------------------
    // Merged cells, filter, names, formats, band properties
    // -----------------------------------------------------------------------

    /// Record a merged cell range.
    ///
    /// # Errors
    ///
    /// Fails when the range intersects an existing merged range; merged
    /// ranges on a sheet are disjoint.
    pub fn set_merge_cell_range(&mut self, range: Range) -> Result<()> {
        if self.merge_ranges.iter().any(|r| r.intersects(&range)) {
            return Err(Error::Structure(format!(
                "merged range {range} overlaps an existing merged range"
            )));
        }
        self.merge_ranges.push(range);
        Ok(())
    }

    pub fn merge_ranges(&self) -> &[Range] {
        &self.merge_ranges
    }

    /// The merged range whose top-left cell is at the position, if any.
    pub fn get_merge_cell_range(&self, row: RowT, col: ColT) -> Option<Range> {
        let pos = Address::new(row, col);
        self.merge_ranges
            .iter()
            .find(|r| r.first == pos)
            .copied()
    }

    pub fn set_auto_filter(&mut self, filter: AutoFilter) {
        self.auto_filter = Some(filter);
    }

    pub fn auto_filter(&self) -> Option<&AutoFilter> {
        self.auto_filter.as_ref()
    }

    pub fn add_cond_format(&mut self, format: CondFormat) {
        self.cond_formats.push(format);
    }

    pub fn cond_formats(&self) -> &[CondFormat] {
        &self.cond_formats
    }

    pub fn add_data_table(&mut self, table: DataTable) {
        self.data_tables.push(table);
    }

    pub fn data_tables(&self) -> &[DataTable] {
        &self.data_tables
    }

    pub fn named_expressions(&self) -> &NamedExpressions {
        &self.named_expressions
    }

    pub fn named_expressions_mut(&mut self) -> &mut NamedExpressions {
        &mut self.named_expressions
    }

    pub fn set_format(&mut self, row: RowT, col: ColT, xf_index: usize) {
        if self.in_bounds(row, col) {
            self.cell_format_indices.insert((row, col), xf_index);
        }
    }

    pub fn set_format_range(&mut self, range: Range, xf_index: usize) {
        for row in range.first.row..=range.last.row {
            for col in range.first.column..=range.last.column {
                self.set_format(row, col, xf_index);
            }
        }
    }

    pub fn set_column_format(&mut self, col: ColT, col_span: ColT, xf_index: usize) {
        for c in col..col + col_span.max(1) {
            self.col_format_indices.insert(c, xf_index);
        }
    }

    pub fn set_row_format(&mut self, row: RowT, xf_index: usize) {
        self.row_format_indices.insert(row, xf_index);
    }

    /// The cell format index in effect at a position. Cell-specific formats
    /// win over row formats, which win over column formats.
    pub fn get_cell_format(&self, row: RowT, col: ColT) -> usize {
        if let Some(&xf) = self.cell_format_indices.get(&(row, col)) {
            return xf;
        }
        if let Some(&xf) = self.row_format_indices.get(&row) {
            return xf;
        }
        self.col_format_indices.get(&col).copied().unwrap_or(0)
    }

    pub fn set_column_width(&mut self, col: ColT, col_span: ColT, width: f64) {
        for c in col..col + col_span.max(1) {
            self.col_properties.entry(c).or_default().size = Some(width);
        }
    }

    pub fn set_column_hidden(&mut self, col: ColT, col_span: ColT, hidden: bool) {
        for c in col..col + col_span.max(1) {
            self.col_properties.entry(c).or_default().hidden = hidden;
        }
    }

    pub fn set_row_height(&mut self, row: RowT, height: f64) {
        self.row_properties.entry(row).or_default().size = Some(height);
    }

    pub fn set_row_hidden(&mut self, row: RowT, hidden: bool) {
        self.row_properties.entry(row).or_default().hidden = hidden;
    }

    pub fn column_properties(&self, col: ColT) -> BandProperties {
        self.col_properties.get(&col).copied().unwrap_or_default()
    }

    pub fn row_properties(&self, row: RowT) -> BandProperties {
        self.row_properties.get(&row).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ErrorPolicy, FormulaGrammar};

    fn small_sheet() -> Sheet {
        Sheet::new(0, RangeSize { rows: 100, columns: 10 })
    }

    fn compile(text: &str) -> Arc<FormulaTokens> {
        FormulaTokens::compile(text, FormulaGrammar::Xlsx, ErrorPolicy::Fail).unwrap()
    }

    #[test]
    fn test_empty_cells_occupy_no_space() {
        let sheet = small_sheet();
        assert_eq!(sheet.cell_at(5, 5), Cell::Empty);
        assert!(sheet.populated_cells().is_empty());
        assert_eq!(sheet.get_data_range(), None);
    }

    #[test]
    fn test_set_and_read_back_each_variant() {
        let mut sheet = small_sheet();
        let mut strings = SharedStrings::new();

        sheet.set_value(0, 0, 1.5);
        sheet.set_bool(1, 0, true);
        let id = strings.add("hello");
        sheet.set_string(2, 0, id);

        assert_eq!(sheet.cell_type(0, 0), CellType::Numeric);
        assert_eq!(sheet.get_numeric_value(0, 0), Some(1.5));
        assert_eq!(sheet.cell_type(1, 0), CellType::Boolean);
        assert_eq!(sheet.get_bool_value(1, 0), Some(true));
        assert_eq!(sheet.cell_type(2, 0), CellType::String);
        assert_eq!(sheet.get_string_identifier(2, 0), Some(id));
    }

    #[test]
    fn test_overwrite_replaces_variant() {
        let mut sheet = small_sheet();
        sheet.set_value(0, 0, 1.0);
        sheet.set_bool(0, 0, false);
        assert_eq!(sheet.cell_type(0, 0), CellType::Boolean);
    }

    #[test]
    fn test_set_auto_type_inference() {
        let mut sheet = small_sheet();
        let mut strings = SharedStrings::new();
        sheet.set_auto(0, 0, "12.5", &mut strings);
        sheet.set_auto(1, 0, "true", &mut strings);
        sheet.set_auto(2, 0, "hello", &mut strings);
        sheet.set_auto(3, 0, "", &mut strings);

        assert_eq!(sheet.cell_type(0, 0), CellType::Numeric);
        assert_eq!(sheet.cell_type(1, 0), CellType::Boolean);
        assert_eq!(sheet.cell_type(2, 0), CellType::String);
        assert_eq!(sheet.cell_type(3, 0), CellType::Empty);
        assert_eq!(strings.get(sheet.get_string_identifier(2, 0).unwrap()), Some("hello"));
    }

    #[test]
    fn test_data_range_anchored_at_origin() {
        let mut sheet = small_sheet();
        sheet.set_value(3, 2, 1.0);
        sheet.set_value(7, 1, 2.0);
        let range = sheet.get_data_range().unwrap();
        assert_eq!(range.first, Address::new(0, 0));
        assert_eq!(range.last, Address::new(7, 2));
    }

    #[test]
    fn test_populated_cells_sorted_row_major() {
        let mut sheet = small_sheet();
        sheet.set_value(1, 3, 1.0);
        sheet.set_value(0, 5, 2.0);
        sheet.set_value(1, 0, 3.0);
        let cells: Vec<(RowT, ColT)> = sheet
            .populated_cells()
            .iter()
            .map(|&(r, c, _)| (r, c))
            .collect();
        assert_eq!(cells, vec![(0, 5), (1, 0), (1, 3)]);
    }

    #[test]
    fn test_populated_cells_in_range() {
        let mut sheet = small_sheet();
        sheet.set_value(0, 0, 1.0);
        sheet.set_value(2, 2, 2.0);
        sheet.set_value(5, 5, 3.0);
        let region = Range::new(Address::new(0, 0), Address::new(3, 3));
        let cells: Vec<(RowT, ColT)> = sheet
            .populated_cells_in_range(region)
            .iter()
            .map(|&(r, c, _)| (r, c))
            .collect();
        assert_eq!(cells, vec![(0, 0), (2, 2)]);
    }

    #[test]
    fn test_fill_down_values() {
        let mut sheet = small_sheet();
        sheet.set_value(2, 1, 42.0);
        sheet.fill_down_cells(2, 1, 3);
        for row in 2..=5 {
            assert_eq!(sheet.get_numeric_value(row, 1), Some(42.0));
        }
        assert_eq!(sheet.cell_at(6, 1), Cell::Empty);
    }

    #[test]
    fn test_fill_down_clamped_to_sheet_size() {
        let mut sheet = Sheet::new(0, RangeSize { rows: 5, columns: 2 });
        sheet.set_value(3, 0, 1.0);
        sheet.fill_down_cells(3, 0, 10);
        assert_eq!(sheet.get_numeric_value(4, 0), Some(1.0));
        let range = sheet.get_data_range().unwrap();
        assert_eq!(range.last.row, 4);
    }

    #[test]
    fn test_writes_outside_sheet_size_ignored() {
        let mut sheet = Sheet::new(0, RangeSize { rows: 5, columns: 2 });
        sheet.set_value(10, 0, 1.0);
        sheet.set_value(0, 5, 1.0);
        sheet.set_value(-1, 0, 1.0);
        assert_eq!(sheet.get_data_range(), None);
    }

    #[test]
    fn test_shared_formula_group_joint_ownership() {
        let mut sheet = small_sheet();
        let tokens = compile("B1+C1");
        sheet.set_grouped_formula(0, 0, 0, Arc::clone(&tokens));
        sheet.set_shared_formula_member(1, 0, 0).unwrap();

        let Cell::Formula(fid0) = sheet.cell_at(0, 0) else {
            panic!("expected formula cell");
        };
        let Cell::Formula(fid1) = sheet.cell_at(1, 0) else {
            panic!("expected formula cell");
        };
        let t0 = &sheet.formula_cell(fid0).unwrap().tokens;
        let t1 = &sheet.formula_cell(fid1).unwrap().tokens;
        assert!(Arc::ptr_eq(t0, t1));
        assert_eq!(sheet.formula_cell(fid1).unwrap().origin, Address::new(0, 0));
    }

    #[test]
    fn test_shared_formula_member_without_group_fails() {
        let mut sheet = small_sheet();
        assert!(sheet.set_shared_formula_member(0, 0, 9).is_err());
    }

    #[test]
    fn test_array_formula_shares_matrix() {
        let mut sheet = small_sheet();
        let range = Range::new(Address::new(0, 0), Address::new(1, 0));
        sheet.set_array_formula(range, compile("B1:B2*2"));

        sheet.set_formula_result(0, 0, FormulaScalar::Number(2.0));
        sheet.set_formula_result(1, 0, FormulaScalar::Number(4.0));

        let Cell::Formula(fid0) = sheet.cell_at(0, 0) else {
            panic!("expected formula cell");
        };
        let Cell::Formula(fid1) = sheet.cell_at(1, 0) else {
            panic!("expected formula cell");
        };
        assert_eq!(
            sheet.formula_cell_result(fid0, Address::new(0, 0)),
            Some(FormulaScalar::Number(2.0))
        );
        assert_eq!(
            sheet.formula_cell_result(fid1, Address::new(1, 0)),
            Some(FormulaScalar::Number(4.0))
        );
        // Both members reference the same matrix object.
        let af = sheet.array_formula(0).unwrap();
        assert_eq!(af.matrix.get(Address::new(0, 0)), Some(FormulaScalar::Number(2.0)));
    }

    #[test]
    fn test_merged_ranges_must_be_disjoint() {
        let mut sheet = small_sheet();
        let a = Range::new(Address::new(0, 0), Address::new(1, 1));
        let b = Range::new(Address::new(1, 1), Address::new(2, 2));
        let c = Range::new(Address::new(5, 5), Address::new(6, 6));
        sheet.set_merge_cell_range(a).unwrap();
        assert!(sheet.set_merge_cell_range(b).is_err());
        sheet.set_merge_cell_range(c).unwrap();
        assert_eq!(sheet.merge_ranges().len(), 2);
        assert_eq!(sheet.get_merge_cell_range(0, 0), Some(a));
        assert_eq!(sheet.get_merge_cell_range(0, 1), None);
    }

    #[test]
    fn test_format_precedence_cell_over_row_over_column() {
        let mut sheet = small_sheet();
        sheet.set_column_format(2, 1, 10);
        assert_eq!(sheet.get_cell_format(0, 2), 10);
        sheet.set_row_format(0, 20);
        assert_eq!(sheet.get_cell_format(0, 2), 20);
        sheet.set_format(0, 2, 30);
        assert_eq!(sheet.get_cell_format(0, 2), 30);
        // Untouched cells keep the default.
        assert_eq!(sheet.get_cell_format(9, 9), 0);
    }

    #[test]
    fn test_date_time_round_trip() {
        let mut sheet = small_sheet();
        let origin = datetime::default_origin();
        sheet
            .set_date_time(0, 0, origin, 2011, 6, 15, 12, 0, 0.0)
            .unwrap();
        let dt = sheet.get_date_time(0, 0, origin).unwrap();
        assert_eq!(
            dt,
            datetime::date_time_from_parts(2011, 6, 15, 12, 0, 0.0).unwrap()
        );
    }

    #[test]
    fn test_band_properties() {
        let mut sheet = small_sheet();
        sheet.set_column_width(0, 2, 12.5);
        sheet.set_row_hidden(3, true);
        assert_eq!(sheet.column_properties(1).size, Some(12.5));
        assert!(sheet.row_properties(3).hidden);
        assert!(!sheet.row_properties(4).hidden);
    }
}
