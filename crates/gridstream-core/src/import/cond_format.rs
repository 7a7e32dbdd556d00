//! Conditional format import builder.
//!
//! Three nested buffers: the current condition, the current entry, and the
//! format itself. `commit_condition` folds the condition into the entry,
//! `commit_entry` folds the entry into the format, and `commit_format`
//! pushes the finished format onto the sheet.

use crate::cond_format::{
    CondDate, CondFormat, CondFormatCondition, CondFormatEntry, CondFormatType, CondOperator,
    CondValueType, DatabarAxis,
};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::types::{Address, Color, FormulaRefContext, Range, SheetT};

use super::resolver::ReferenceResolver;

/// Buffer-then-commit builder for conditional formats.
pub struct ImportCondFormat<'a> {
    doc: &'a mut Document,
    sheet: SheetT,
    buffer: CondFormat,
    entry: CondFormatEntry,
    condition: CondFormatCondition,
}

impl<'a> ImportCondFormat<'a> {
    pub(crate) fn new(doc: &'a mut Document, sheet: SheetT) -> Self {
        Self {
            doc,
            sheet,
            buffer: CondFormat::default(),
            entry: CondFormatEntry::default(),
            condition: CondFormatCondition::default(),
        }
    }

    // ===== condition buffer =====

    /// Color of the current condition (databar and colorscale entries).
    pub fn set_color(&mut self, alpha: u8, red: u8, green: u8, blue: u8) {
        self.condition.color = Some(Color::new(alpha, red, green, blue));
    }

    /// Formula, value, or string of the current condition.
    pub fn set_formula(&mut self, formula: &str) {
        self.condition.formula = Some(formula.to_string());
    }

    /// Value type of the current condition (iconset, databar, colorscale).
    pub fn set_condition_type(&mut self, value_type: CondValueType) {
        self.condition.value_type = value_type;
    }

    /// Date window of a date-type entry.
    pub fn set_date(&mut self, date: CondDate) {
        self.condition.date = date;
    }

    /// Fold the current condition into the current entry.
    pub fn commit_condition(&mut self) {
        self.entry
            .conditions
            .push(std::mem::take(&mut self.condition));
    }

    // ===== entry buffer =====

    pub fn set_type(&mut self, entry_type: CondFormatType) {
        self.entry.entry_type = entry_type;
    }

    pub fn set_operator(&mut self, operator: CondOperator) {
        self.entry.operator = operator;
    }

    /// Differential format applied when the entry matches.
    pub fn set_xf_id(&mut self, dxf: usize) {
        self.entry.dxf_index = Some(dxf);
    }

    pub fn set_icon_name(&mut self, name: &str) {
        self.entry.icon_name = Some(name.to_string());
    }

    pub fn set_iconset_reverse(&mut self, reverse: bool) {
        self.entry.iconset_reverse = reverse;
    }

    pub fn set_show_value(&mut self, show: bool) {
        self.entry.show_value = show;
    }

    pub fn set_databar_gradient(&mut self, gradient: bool) {
        self.entry.databar_gradient = gradient;
    }

    pub fn set_databar_axis(&mut self, axis: DatabarAxis) {
        self.entry.databar_axis = axis;
    }

    pub fn set_databar_color_positive(&mut self, alpha: u8, red: u8, green: u8, blue: u8) {
        self.entry.databar_color_positive = Some(Color::new(alpha, red, green, blue));
    }

    pub fn set_databar_color_negative(&mut self, alpha: u8, red: u8, green: u8, blue: u8) {
        self.entry.databar_color_negative = Some(Color::new(alpha, red, green, blue));
    }

    pub fn set_min_databar_length(&mut self, length: f64) {
        self.entry.min_databar_length = Some(length);
    }

    pub fn set_max_databar_length(&mut self, length: f64) {
        self.entry.max_databar_length = Some(length);
    }

    /// Fold the current entry into the format buffer.
    pub fn commit_entry(&mut self) {
        self.buffer.entries.push(std::mem::take(&mut self.entry));
    }

    // ===== format buffer =====

    /// Set the covered range from a reference string.
    ///
    /// # Errors
    ///
    /// Fails when the range string cannot be resolved.
    pub fn set_range_str(&mut self, range: &str) -> Result<()> {
        let resolver = ReferenceResolver::new(self.doc, FormulaRefContext::Global);
        self.buffer.range = resolver.resolve_range(range)?.to_range();
        Ok(())
    }

    /// Set the covered range from typed positions.
    pub fn set_range(&mut self, row_start: i32, col_start: i32, row_end: i32, col_end: i32) {
        self.buffer.range = Range::new(
            Address::new(row_start, col_start),
            Address::new(row_end, col_end),
        );
    }

    /// Commit the finished format to the sheet.
    ///
    /// # Errors
    ///
    /// Fails when the target sheet no longer exists.
    pub fn commit_format(self) -> Result<()> {
        let sheet = self.doc.sheet_mut(self.sheet).ok_or_else(|| {
            Error::Structure(format!(
                "conditional format committed to missing sheet {}",
                self.sheet
            ))
        })?;
        sheet.add_cond_format(self.buffer);
        Ok(())
    }
}
