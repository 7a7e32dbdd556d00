//! Reference resolver: strings to typed addresses and ranges.
//!
//! Resolution honors the document's formula grammar and the context the
//! string occurs in: the global grammar is A1 (with R1C1 accepted for the
//! XML Spreadsheet grammar), while the ODS named-range and
//! named-expression-base contexts use the `.`-separated OpenDocument
//! reference dialect (`$Sheet1.$B$2`).

use crate::document::Document;
use crate::error::{Error, Result};
use crate::types::{ColT, FormulaGrammar, FormulaRefContext, RowT, SheetT, SrcAddress, SrcRange};
use crate::utils::cell_ref::column_name_to_number;

/// Resolves reference strings against a document.
pub struct ReferenceResolver<'a> {
    doc: &'a Document,
    context: FormulaRefContext,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(doc: &'a Document, context: FormulaRefContext) -> Self {
        Self { doc, context }
    }

    pub fn context(&self) -> FormulaRefContext {
        self.context
    }

    /// Resolve a single cell address string.
    ///
    /// # Errors
    ///
    /// Fails with an invalid-argument error when the string is not a valid
    /// single cell address in the active dialect.
    pub fn resolve_address(&self, address: &str) -> Result<SrcAddress> {
        let s = address.trim();
        if s.is_empty() {
            return Err(Error::InvalidArgument("empty address string".to_string()));
        }
        if self.ods_dialect() {
            return self.parse_ods_address(s);
        }
        if self.doc.formula_grammar() == FormulaGrammar::XlsXml {
            if let Some(addr) = parse_r1c1(s) {
                return Ok(addr);
            }
        }
        self.parse_a1_address(s)
    }

    /// Resolve a range address string. A valid single address is accepted
    /// as a degenerate range.
    pub fn resolve_range(&self, range: &str) -> Result<SrcRange> {
        let s = range.trim();
        match split_range(s) {
            Some((first, last)) => {
                let first = self.resolve_address(first)?;
                let mut last = self.resolve_address(last)?;
                if last.sheet < 0 {
                    last.sheet = first.sheet;
                }
                Ok(SrcRange { first, last })
            }
            None => {
                let addr = self.resolve_address(s)?;
                Ok(SrcRange {
                    first: addr,
                    last: addr,
                })
            }
        }
    }

    fn ods_dialect(&self) -> bool {
        self.doc.formula_grammar() == FormulaGrammar::Ods
            && matches!(
                self.context,
                FormulaRefContext::NamedRange | FormulaRefContext::NamedExpressionBase
            )
    }

    /// `Sheet1!A1`, `'My Sheet'!$B$2`, or a bare `A1`.
    fn parse_a1_address(&self, s: &str) -> Result<SrcAddress> {
        let (sheet, rest) = match split_sheet_prefix(s, '!') {
            Some((name, rest)) => (self.lookup_sheet(&name)?, rest),
            None => (-1, s),
        };
        let (row, col) = parse_a1_cell(rest)
            .ok_or_else(|| Error::InvalidArgument(format!("invalid cell address: '{s}'")))?;
        Ok(SrcAddress::new(sheet, row, col))
    }

    /// `$Sheet1.$B$2` or `.B2` (ODS dialect).
    fn parse_ods_address(&self, s: &str) -> Result<SrcAddress> {
        let s = s.strip_prefix('$').unwrap_or(s);
        let (sheet, rest) = match s.split_once('.') {
            Some((name, rest)) if !name.is_empty() => (self.lookup_sheet(name)?, rest),
            Some((_, rest)) => (-1, rest),
            None => (-1, s),
        };
        let (row, col) = parse_a1_cell(rest)
            .ok_or_else(|| Error::InvalidArgument(format!("invalid cell address: '{s}'")))?;
        Ok(SrcAddress::new(sheet, row, col))
    }

    fn lookup_sheet(&self, name: &str) -> Result<SheetT> {
        self.doc
            .sheet_index(name)
            .ok_or_else(|| Error::InvalidArgument(format!("no such sheet: '{name}'")))
    }
}

/// Split a range string on the `:` separating its halves, ignoring any
/// colon inside a quoted sheet name.
fn split_range(s: &str) -> Option<(&str, &str)> {
    let mut in_quote = false;
    for (i, c) in s.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            ':' if !in_quote => return Some((&s[..i], &s[i + 1..])),
            _ => {}
        }
    }
    None
}

/// Split a `Sheet<sep>rest` prefix, handling `'quoted sheet names'`.
fn split_sheet_prefix(s: &str, sep: char) -> Option<(String, &str)> {
    if let Some(rest) = s.strip_prefix('\'') {
        let close = rest.find('\'')?;
        let name = rest[..close].to_string();
        let after = &rest[close + 1..];
        let after = after.strip_prefix(sep)?;
        return Some((name, after));
    }
    let idx = s.find(sep)?;
    Some((s[..idx].to_string(), &s[idx + 1..]))
}

/// Parse a bare A1-style cell, tolerating `$` markers. Returns 0-based
/// (row, col).
fn parse_a1_cell(s: &str) -> Option<(RowT, ColT)> {
    let s = s.trim();
    let mut chars = s.char_indices().peekable();

    // Optional column '$'.
    if let Some((_, '$')) = chars.peek() {
        chars.next();
    }
    let col_start = chars.peek()?.0;
    let mut col_end = col_start;
    while let Some(&(i, c)) = chars.peek() {
        if c.is_ascii_alphabetic() {
            col_end = i + c.len_utf8();
            chars.next();
        } else {
            break;
        }
    }
    if col_end == col_start {
        return None;
    }

    // Optional row '$'.
    if let Some(&(_, '$')) = chars.peek() {
        chars.next();
    }
    let row_start = chars.peek()?.0;
    let digits = &s[row_start..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let row: i64 = digits.parse().ok()?;
    if row < 1 {
        return None;
    }

    let col = column_name_to_number(&s[col_start..col_end]).ok()?;
    Some(((row - 1) as RowT, col))
}

/// Parse an absolute `R1C1` reference. Returns `None` when the string is
/// not in R1C1 form.
fn parse_r1c1(s: &str) -> Option<SrcAddress> {
    let rest = s.strip_prefix('R')?;
    let c_pos = rest.find('C')?;
    let row_digits = &rest[..c_pos];
    let col_digits = &rest[c_pos + 1..];
    if row_digits.is_empty() || col_digits.is_empty() {
        return None;
    }
    let row: i64 = row_digits.parse().ok()?;
    let col: i64 = col_digits.parse().ok()?;
    if row < 1 || col < 1 {
        return None;
    }
    Some(SrcAddress::new(-1, (row - 1) as RowT, (col - 1) as ColT))
}
