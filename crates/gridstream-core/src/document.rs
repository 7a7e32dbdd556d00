//! The workbook document model.
//!
//! A [`Document`] owns every pool: sheets, the shared string table, style
//! stores, tables, pivot caches, and global named expressions. Import
//! builders borrow it for the duration of an import; dumpers walk it
//! afterwards.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;

use crate::defined_names::NamedExpressions;
use crate::dump;
use crate::error::{Error, Result};
use crate::formula::eval::{evaluate_at, Value};
use crate::formula::{FormulaCellKind, FormulaScalar};
use crate::pivot::PivotCollection;
use crate::shared_strings::SharedStrings;
use crate::sheet::Sheet;
use crate::styles::Styles;
use crate::table::Table;
use crate::types::{
    Address, DumpFormat, ErrorPolicy, FormulaGrammar, MissingResultPolicy, RangeSize, SheetT,
    SrcAddress,
};
use crate::utils::constants::DEFAULT_OUTPUT_PRECISION;
use crate::utils::datetime;

/// Document-level configuration knobs.
#[derive(Debug, Clone)]
pub struct DocConfig {
    /// Numeric output precision of the CSV dump; negative keeps the
    /// shortest round-trip form.
    pub output_precision: i32,
    /// Character set of the input stream, as reported by the format driver.
    pub character_set: Option<String>,
    /// How recoverable per-cell failures (formula parse errors) are
    /// treated.
    pub error_policy: ErrorPolicy,
    /// How formula cells with no cached result are pre-populated.
    pub missing_result_policy: MissingResultPolicy,
}

impl Default for DocConfig {
    fn default() -> Self {
        Self {
            output_precision: DEFAULT_OUTPUT_PRECISION,
            character_set: None,
            error_policy: ErrorPolicy::Fail,
            missing_result_policy: MissingResultPolicy::Empty,
        }
    }
}

/// In-memory workbook content.
pub struct Document {
    sheet_size: RangeSize,
    sheets: Vec<Sheet>,
    sheet_names: Vec<String>,
    shared_strings: SharedStrings,
    styles: Styles,
    tables: HashMap<String, Table>,
    pivots: PivotCollection,
    named_expressions: NamedExpressions,
    origin_date: NaiveDate,
    formula_grammar: FormulaGrammar,
    config: DocConfig,
}

impl Document {
    /// Create an empty document with the given sheet size.
    pub fn new(sheet_size: RangeSize) -> Self {
        Self {
            sheet_size,
            sheets: Vec::new(),
            sheet_names: Vec::new(),
            shared_strings: SharedStrings::new(),
            styles: Styles::new(),
            tables: HashMap::new(),
            pivots: PivotCollection::new(),
            named_expressions: NamedExpressions::new(),
            origin_date: datetime::default_origin(),
            formula_grammar: FormulaGrammar::Unknown,
            config: DocConfig::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Sheets
    // -----------------------------------------------------------------------

    /// Append a sheet and return its index.
    ///
    /// Sheet names are not de-duplicated here; callers that need unique
    /// names are responsible for providing them.
    pub fn append_sheet(&mut self, name: &str) -> SheetT {
        let index = self.sheets.len() as SheetT;
        self.sheets.push(Sheet::new(index, self.sheet_size));
        self.sheet_names.push(name.to_string());
        index
    }

    pub fn sheet(&self, index: SheetT) -> Option<&Sheet> {
        usize::try_from(index).ok().and_then(|i| self.sheets.get(i))
    }

    pub fn sheet_mut(&mut self, index: SheetT) -> Option<&mut Sheet> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.sheets.get_mut(i))
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.sheet_index(name).and_then(|i| self.sheet(i))
    }

    pub fn sheet_index(&self, name: &str) -> Option<SheetT> {
        self.sheet_names
            .iter()
            .position(|n| n == name)
            .map(|i| i as SheetT)
    }

    pub fn sheet_name(&self, index: SheetT) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.sheet_names.get(i))
            .map(String::as_str)
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn sheet_size(&self) -> RangeSize {
        self.sheet_size
    }

    /// Change the sheet size used for sheets appended from now on.
    pub fn set_sheet_size(&mut self, size: RangeSize) {
        self.sheet_size = size;
    }

    // -----------------------------------------------------------------------
    // Pools
    // -----------------------------------------------------------------------

    pub fn shared_strings(&self) -> &SharedStrings {
        &self.shared_strings
    }

    /// Split borrow: one sheet plus the shared string table, for setters
    /// that intern while writing cells.
    pub(crate) fn sheet_and_strings_mut(
        &mut self,
        index: SheetT,
    ) -> Option<(&mut Sheet, &mut SharedStrings)> {
        let i = usize::try_from(index).ok()?;
        let sheet = self.sheets.get_mut(i)?;
        Some((sheet, &mut self.shared_strings))
    }

    pub fn shared_strings_mut(&mut self) -> &mut SharedStrings {
        &mut self.shared_strings
    }

    pub fn styles(&self) -> &Styles {
        &self.styles
    }

    pub fn styles_mut(&mut self) -> &mut Styles {
        &mut self.styles
    }

    pub fn pivots(&self) -> &PivotCollection {
        &self.pivots
    }

    pub fn pivots_mut(&mut self) -> &mut PivotCollection {
        &mut self.pivots
    }

    // -----------------------------------------------------------------------
    // Tables
    // -----------------------------------------------------------------------

    /// Insert a table. The table is inserted only when no table of the same
    /// name exists; a duplicate is discarded, not overwritten.
    pub fn insert_table(&mut self, table: Table) {
        self.tables.entry(table.name.clone()).or_insert(table);
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    // -----------------------------------------------------------------------
    // Named expressions
    // -----------------------------------------------------------------------

    pub fn global_named_expressions(&self) -> &NamedExpressions {
        &self.named_expressions
    }

    pub fn global_named_expressions_mut(&mut self) -> &mut NamedExpressions {
        &mut self.named_expressions
    }

    /// Look up a name, checking the sheet scope before the global one.
    pub fn named_expression(
        &self,
        sheet: SheetT,
        name: &str,
    ) -> Option<&crate::defined_names::NamedExpression> {
        if let Some(sheet_store) = self.sheet(sheet) {
            if let Some(ne) = sheet_store.named_expressions().get(name) {
                return Some(ne);
            }
        }
        self.named_expressions.get(name)
    }

    // -----------------------------------------------------------------------
    // Settings
    // -----------------------------------------------------------------------

    pub fn set_origin_date(&mut self, year: i32, month: u32, day: u32) -> Result<()> {
        self.origin_date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            Error::InvalidArgument(format!("invalid origin date: {year}-{month}-{day}"))
        })?;
        Ok(())
    }

    pub fn origin_date(&self) -> NaiveDate {
        self.origin_date
    }

    pub fn set_formula_grammar(&mut self, grammar: FormulaGrammar) {
        self.formula_grammar = grammar;
    }

    pub fn formula_grammar(&self) -> FormulaGrammar {
        self.formula_grammar
    }

    pub fn config(&self) -> &DocConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DocConfig {
        &mut self.config
    }

    pub fn set_config(&mut self, config: DocConfig) {
        self.config = config;
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Clear all content, rebuilding empty pools. The sheet size and
    /// configuration survive.
    pub fn clear(&mut self) {
        self.sheets.clear();
        self.sheet_names.clear();
        self.shared_strings.clear();
        self.styles = Styles::new();
        self.tables.clear();
        self.pivots.clear();
        self.named_expressions.clear();
        self.formula_grammar = FormulaGrammar::Unknown;
    }

    /// Calculate every formula cell that has not been evaluated yet.
    ///
    /// Results are computed against the current cell values and written
    /// back as cached results; string results are interned in the shared
    /// string table.
    pub fn recalc_formula_cells(&mut self) -> Result<()> {
        enum Target {
            Cell(usize),
            Array(usize, Address),
        }

        // Phase 1: compute with the document borrowed immutably.
        let mut computed: Vec<(SheetT, Target, Value)> = Vec::new();
        for sheet in &self.sheets {
            let sheet_idx = sheet.index();
            for (row, col, cell) in sheet.populated_cells() {
                let crate::cell::Cell::Formula(fid) = cell else {
                    continue;
                };
                let pos = Address::new(row, col);
                if sheet.formula_cell_result(fid, pos).is_some() {
                    continue;
                }
                let fc = sheet
                    .formula_cell(fid)
                    .ok_or_else(|| Error::General("dangling formula cell index".to_string()))?;
                let value = match &fc.tokens.expr {
                    Ok(expr) => evaluate_at(
                        self,
                        expr,
                        SrcAddress::new(sheet_idx, row, col),
                        fc.origin,
                    )?,
                    Err(_) => Value::Error(crate::types::ErrorValue::Name),
                };
                let target = match fc.kind {
                    FormulaCellKind::ArrayMember { array } => Target::Array(array, pos),
                    _ => Target::Cell(fid),
                };
                computed.push((sheet_idx, target, value));
            }
        }

        // Phase 2: intern string results and write everything back.
        for (sheet_idx, target, value) in computed {
            let scalar = match value {
                Value::Empty => match self.config.missing_result_policy {
                    MissingResultPolicy::Empty => FormulaScalar::Empty,
                    MissingResultPolicy::ErrorSentinel => {
                        FormulaScalar::Error(crate::types::ErrorValue::Unknown)
                    }
                },
                Value::Number(n) => FormulaScalar::Number(n),
                Value::Bool(b) => FormulaScalar::Bool(b),
                Value::Text(s) => FormulaScalar::String(self.shared_strings.add(&s)),
                Value::Error(e) => FormulaScalar::Error(e),
            };
            let sheet = self
                .sheet_mut(sheet_idx)
                .ok_or_else(|| Error::General("sheet vanished during recalc".to_string()))?;
            match target {
                Target::Cell(fid) => sheet.set_formula_cell_result_by_id(fid, scalar),
                Target::Array(array, pos) => sheet.set_array_result(array, pos, scalar),
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Dumps
    // -----------------------------------------------------------------------

    /// Write the check dump (one line per non-empty cell) to a writer.
    pub fn dump_check<W: Write>(&self, out: &mut W) -> Result<()> {
        dump::check::dump(self, out)
    }

    /// Write one file per sheet in the requested format into a directory.
    pub fn dump(&self, format: DumpFormat, outdir: &Path) -> Result<()> {
        match format {
            DumpFormat::Check => {
                std::fs::create_dir_all(outdir)?;
                let mut file = std::fs::File::create(outdir.join("check.txt"))?;
                self.dump_check(&mut file)
            }
            DumpFormat::Csv => dump::csv::dump(self, outdir),
            DumpFormat::Flat => dump::flat::dump(self, outdir),
            DumpFormat::Html => dump::html::dump(self, outdir),
            DumpFormat::Json => dump::json::dump(self, outdir),
            DumpFormat::None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Range;
    use crate::utils::constants::DEFAULT_SHEET_SIZE;

    fn doc() -> Document {
        Document::new(DEFAULT_SHEET_SIZE)
    }

    #[test]
    fn test_append_and_lookup_sheets() {
        let mut doc = doc();
        assert_eq!(doc.append_sheet("Alpha"), 0);
        assert_eq!(doc.append_sheet("Beta"), 1);
        assert_eq!(doc.sheet_count(), 2);
        assert_eq!(doc.sheet_index("Beta"), Some(1));
        assert_eq!(doc.sheet_name(0), Some("Alpha"));
        assert!(doc.sheet(2).is_none());
        assert!(doc.sheet_by_name("Gamma").is_none());
    }

    #[test]
    fn test_sheet_names_not_deduplicated() {
        let mut doc = doc();
        doc.append_sheet("Same");
        doc.append_sheet("Same");
        assert_eq!(doc.sheet_count(), 2);
        // Lookup returns the first match.
        assert_eq!(doc.sheet_index("Same"), Some(0));
    }

    #[test]
    fn test_insert_table_first_wins() {
        let mut doc = doc();
        let mut first = Table {
            name: "T1".to_string(),
            identifier: 1,
            ..Table::default()
        };
        first.range = Range::default();
        let second = Table {
            name: "T1".to_string(),
            identifier: 2,
            ..Table::default()
        };
        doc.insert_table(first);
        doc.insert_table(second);
        assert_eq!(doc.table_count(), 1);
        assert_eq!(doc.get_table("T1").unwrap().identifier, 1);
    }

    #[test]
    fn test_clear_rebuilds_empty_pools() {
        let mut doc = doc();
        doc.append_sheet("S");
        doc.shared_strings_mut().add("x");
        doc.insert_table(Table {
            name: "T".to_string(),
            ..Table::default()
        });
        doc.clear();
        assert_eq!(doc.sheet_count(), 0);
        assert_eq!(doc.shared_strings().count(), 0);
        assert_eq!(doc.table_count(), 0);
        // Styles are rebuilt with their default entries.
        assert_eq!(doc.styles().font_count(), 1);
    }

    #[test]
    fn test_recalc_simple_formula() {
        use crate::formula::FormulaTokens;
        use crate::types::{ErrorPolicy, FormulaGrammar};

        let mut doc = doc();
        let s = doc.append_sheet("Sheet1");
        let sheet = doc.sheet_mut(s).unwrap();
        sheet.set_value(0, 1, 1.0); // B1
        sheet.set_value(0, 2, 2.0); // C1
        let tokens =
            FormulaTokens::compile("B1+C1", FormulaGrammar::Xlsx, ErrorPolicy::Fail).unwrap();
        sheet.set_formula(0, 0, tokens); // A1

        doc.recalc_formula_cells().unwrap();
        let sheet = doc.sheet(s).unwrap();
        assert_eq!(sheet.get_numeric_value(0, 0), Some(3.0));
    }

    #[test]
    fn test_recalc_shared_formula_translates_relative_refs() {
        use crate::formula::FormulaTokens;
        use crate::types::{ErrorPolicy, FormulaGrammar};

        let mut doc = doc();
        let s = doc.append_sheet("Sheet1");
        let sheet = doc.sheet_mut(s).unwrap();
        sheet.set_value(0, 1, 1.0); // B1
        sheet.set_value(0, 2, 2.0); // C1
        sheet.set_value(1, 1, 10.0); // B2
        sheet.set_value(1, 2, 20.0); // C2
        let tokens =
            FormulaTokens::compile("B1+C1", FormulaGrammar::Xlsx, ErrorPolicy::Fail).unwrap();
        sheet.set_grouped_formula(0, 0, 0, tokens); // A1
        sheet.set_shared_formula_member(1, 0, 0).unwrap(); // A2

        doc.recalc_formula_cells().unwrap();
        let sheet = doc.sheet(s).unwrap();
        assert_eq!(sheet.get_numeric_value(0, 0), Some(3.0));
        assert_eq!(sheet.get_numeric_value(1, 0), Some(30.0));
    }

    #[test]
    fn test_recalc_string_result_is_interned() {
        use crate::formula::FormulaTokens;
        use crate::types::{ErrorPolicy, FormulaGrammar};

        let mut doc = doc();
        let s = doc.append_sheet("Sheet1");
        let sheet = doc.sheet_mut(s).unwrap();
        let tokens = FormulaTokens::compile(
            "\"a\" & \"b\"",
            FormulaGrammar::Xlsx,
            ErrorPolicy::Fail,
        )
        .unwrap();
        sheet.set_formula(0, 0, tokens);

        doc.recalc_formula_cells().unwrap();
        let sheet = doc.sheet(s).unwrap();
        let id = sheet.get_string_identifier(0, 0).unwrap();
        assert_eq!(doc.shared_strings().get(id), Some("ab"));
    }

    #[test]
    fn test_recalc_skips_cached_results() {
        use crate::formula::{FormulaScalar, FormulaTokens};
        use crate::types::{ErrorPolicy, FormulaGrammar};

        let mut doc = doc();
        let s = doc.append_sheet("Sheet1");
        let sheet = doc.sheet_mut(s).unwrap();
        let tokens =
            FormulaTokens::compile("1+1", FormulaGrammar::Xlsx, ErrorPolicy::Fail).unwrap();
        sheet.set_formula(0, 0, tokens);
        sheet.set_formula_result(0, 0, FormulaScalar::Number(99.0));

        doc.recalc_formula_cells().unwrap();
        // The pre-existing cached result is preserved, not recomputed.
        assert_eq!(doc.sheet(s).unwrap().get_numeric_value(0, 0), Some(99.0));
    }

    #[test]
    fn test_origin_date_setting() {
        let mut doc = doc();
        doc.set_origin_date(1904, 1, 1).unwrap();
        assert_eq!(
            doc.origin_date(),
            NaiveDate::from_ymd_opt(1904, 1, 1).unwrap()
        );
        assert!(doc.set_origin_date(2020, 13, 1).is_err());
    }
}
