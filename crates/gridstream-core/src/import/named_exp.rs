//! Named expression import builder.
//!
//! One name per commit: either an expression string (parsed with the
//! formula grammar) or a range string (resolved with the named-range
//! reference dialect and wrapped in a single range token). The base
//! position defaults to sheet 0, cell (0, 0) when not specified.

use std::sync::Arc;

use crate::defined_names::NamedExpression;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::formula::ast::{CellReference, Expr};
use crate::formula::FormulaTokens;
use crate::types::{FormulaRefContext, SheetT, SrcAddress, SrcRange};

use super::resolver::ReferenceResolver;

/// Scope a committed name lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedScope {
    Global,
    Sheet(SheetT),
}

enum Pending {
    None,
    Expression { name: String, expression: String },
    Range { name: String, range: String },
}

/// Buffer-then-commit builder for named expressions.
pub struct ImportNamedExpression<'a> {
    doc: &'a mut Document,
    scope: NamedScope,
    base: SrcAddress,
    pending: Pending,
}

impl<'a> ImportNamedExpression<'a> {
    pub(crate) fn new(doc: &'a mut Document, scope: NamedScope) -> Self {
        Self {
            doc,
            scope,
            base: SrcAddress::new(0, 0, 0),
            pending: Pending::None,
        }
    }

    /// Base position relative references are evaluated from. Defaults to
    /// the top-left cell of the first sheet.
    pub fn set_base_position(&mut self, pos: SrcAddress) {
        self.base = pos;
    }

    /// Define a named expression from an expression string.
    pub fn set_named_expression(&mut self, name: &str, expression: &str) {
        self.pending = Pending::Expression {
            name: name.to_string(),
            expression: expression.to_string(),
        };
    }

    /// Define a named range. Only used when the format expresses named
    /// ranges in a different reference syntax than expressions.
    pub fn set_named_range(&mut self, name: &str, range: &str) {
        self.pending = Pending::Range {
            name: name.to_string(),
            range: range.to_string(),
        };
    }

    /// Compile and store the pending definition.
    ///
    /// # Errors
    ///
    /// Fails when nothing was defined, the expression does not compile
    /// under the current error policy, or the range string cannot be
    /// resolved.
    pub fn commit(self) -> Result<()> {
        let grammar = self.doc.formula_grammar();
        let policy = self.doc.config().error_policy;

        let (name, tokens) = match self.pending {
            Pending::None => {
                return Err(Error::Structure(
                    "named expression committed without a definition".to_string(),
                ))
            }
            Pending::Expression { name, expression } => {
                let tokens = FormulaTokens::compile(&expression, grammar, policy)?;
                (name, tokens)
            }
            Pending::Range { name, range } => {
                let resolver = ReferenceResolver::new(self.doc, FormulaRefContext::NamedRange);
                let resolved = resolver.resolve_range(&range)?;
                let tokens = Arc::new(FormulaTokens {
                    text: range,
                    grammar,
                    expr: Ok(range_token(self.doc, resolved)),
                });
                (name, tokens)
            }
        };

        let entry = NamedExpression {
            name,
            origin: self.base,
            tokens,
        };
        match self.scope {
            NamedScope::Global => self.doc.global_named_expressions_mut().define(entry),
            NamedScope::Sheet(sheet) => {
                let sheet_store = self.doc.sheet_mut(sheet).ok_or_else(|| {
                    Error::Structure(format!(
                        "named expression committed to missing sheet {sheet}"
                    ))
                })?;
                sheet_store.named_expressions_mut().define(entry);
            }
        }
        Ok(())
    }
}

/// Wrap a resolved range in a single absolute range token.
fn range_token(doc: &Document, range: SrcRange) -> Expr {
    let sheet_name = |sheet: SheetT| {
        if sheet < 0 {
            None
        } else {
            doc.sheet_name(sheet).map(str::to_string)
        }
    };
    let make_ref = |addr: SrcAddress| CellReference {
        col: addr.column,
        row: addr.row,
        abs_col: true,
        abs_row: true,
        sheet: sheet_name(addr.sheet),
    };
    if range.first == range.last {
        Expr::CellRef(make_ref(range.first))
    } else {
        Expr::Range {
            start: make_ref(range.first),
            end: make_ref(range.last),
        }
    }
}
