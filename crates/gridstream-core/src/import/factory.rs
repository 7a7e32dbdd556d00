//! The composite import factory handed to format drivers.
//!
//! The factory borrows the document (and optionally a view store) for the
//! duration of an import and hands out the specialized sub-builders. Every
//! accessor reborrows, so drivers acquire a builder, drive it, and let it
//! drop before acquiring the next one.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::types::{FormulaGrammar, FormulaRefContext, PivotCacheId, SheetT};
use crate::view::DocumentView;

use super::named_exp::{ImportNamedExpression, NamedScope};
use super::pivot::{ImportPivotCacheDefinition, ImportPivotCacheRecords};
use super::resolver::ReferenceResolver;
use super::shared_strings::{ImportSharedStrings, SegmentState};
use super::sheet::ImportSheet;
use super::styles::ImportStyles;

/// Entry point for format drivers to instantiate specialized builders.
pub struct ImportFactory<'a> {
    doc: &'a mut Document,
    view: Option<&'a mut DocumentView>,
    recalc_formula_cells: bool,
    segment_state: SegmentState,
}

impl<'a> ImportFactory<'a> {
    pub fn new(doc: &'a mut Document) -> Self {
        Self {
            doc,
            view: None,
            recalc_formula_cells: false,
            segment_state: SegmentState::default(),
        }
    }

    /// Create a factory that also populates a view store.
    pub fn with_view(doc: &'a mut Document, view: &'a mut DocumentView) -> Self {
        Self {
            doc,
            view: Some(view),
            recalc_formula_cells: false,
            segment_state: SegmentState::default(),
        }
    }

    /// Request recalculation of formula cells during [`Self::finalize`].
    pub fn set_recalc_formula_cells(&mut self, recalc: bool) {
        self.recalc_formula_cells = recalc;
    }

    /// Global settings builder.
    pub fn global_settings(&mut self) -> GlobalSettings<'_> {
        GlobalSettings { doc: self.doc }
    }

    /// Shared strings builder. Its rich-text segment state persists across
    /// acquisitions until `commit_segments` is called.
    pub fn shared_strings(&mut self) -> ImportSharedStrings<'_> {
        ImportSharedStrings::new(self.doc, &mut self.segment_state)
    }

    /// Styles builder.
    pub fn styles(&mut self) -> ImportStyles<'_> {
        ImportStyles::new(self.doc)
    }

    /// Builder for globally scoped named expressions.
    pub fn named_expression(&mut self) -> ImportNamedExpression<'_> {
        ImportNamedExpression::new(self.doc, NamedScope::Global)
    }

    /// Reference resolver for the given formula reference context.
    pub fn reference_resolver(&self, context: FormulaRefContext) -> ReferenceResolver<'_> {
        ReferenceResolver::new(self.doc, context)
    }

    /// Pivot cache definition builder for a cache id. An existing cache
    /// under the same id is replaced on commit.
    pub fn create_pivot_cache_definition(
        &mut self,
        cache_id: PivotCacheId,
    ) -> ImportPivotCacheDefinition<'_> {
        ImportPivotCacheDefinition::new(self.doc, cache_id)
    }

    /// Pivot cache records builder for a cache id.
    pub fn create_pivot_cache_records(
        &mut self,
        cache_id: PivotCacheId,
    ) -> ImportPivotCacheRecords<'_> {
        ImportPivotCacheRecords::new(self.doc, cache_id)
    }

    /// Append a sheet at the given position index and return its builder.
    ///
    /// # Errors
    ///
    /// Fails when `sheet_index` is not the next sequential index.
    pub fn append_sheet(&mut self, sheet_index: SheetT, name: &str) -> Result<ImportSheet<'_>> {
        if sheet_index != self.doc.sheet_count() as SheetT {
            return Err(Error::Structure(format!(
                "sheet index {sheet_index} appended out of order (expected {})",
                self.doc.sheet_count()
            )));
        }
        let index = self.doc.append_sheet(name);
        Ok(ImportSheet::new(self.doc, self.view.as_deref_mut(), index))
    }

    /// Sheet builder by name.
    pub fn get_sheet(&mut self, name: &str) -> Option<ImportSheet<'_>> {
        let index = self.doc.sheet_index(name)?;
        Some(ImportSheet::new(self.doc, self.view.as_deref_mut(), index))
    }

    /// Sheet builder by position index.
    pub fn get_sheet_by_index(&mut self, index: SheetT) -> Option<ImportSheet<'_>> {
        self.doc.sheet(index)?;
        Some(ImportSheet::new(self.doc, self.view.as_deref_mut(), index))
    }

    /// Read access to the document under import.
    pub fn document(&self) -> &Document {
        self.doc
    }

    /// Post-processing hook called by the driver after all input has been
    /// consumed.
    pub fn finalize(&mut self) -> Result<()> {
        if self.recalc_formula_cells {
            self.doc.recalc_formula_cells()?;
        }
        Ok(())
    }
}

/// Global import settings that affect how values are processed.
pub struct GlobalSettings<'a> {
    doc: &'a mut Document,
}

impl GlobalSettings<'_> {
    /// Set the date represented by a serial value of 0.
    pub fn set_origin_date(&mut self, year: i32, month: u32, day: u32) -> Result<()> {
        self.doc.set_origin_date(year, month, day)
    }

    /// Set the formula grammar used when none is specified locally.
    pub fn set_default_formula_grammar(&mut self, grammar: FormulaGrammar) {
        self.doc.set_formula_grammar(grammar);
    }

    pub fn default_formula_grammar(&self) -> FormulaGrammar {
        self.doc.formula_grammar()
    }

    /// Record the character set of the input stream.
    pub fn set_character_set(&mut self, charset: &str) {
        self.doc.config_mut().character_set = Some(charset.to_string());
    }
}
