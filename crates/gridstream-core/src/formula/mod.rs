//! Formula engine: parsing, token storage, and recalculation.
//!
//! Parsed expressions are held in [`FormulaTokens`] stores behind `Arc` so
//! that shared-formula groups jointly own one tokens instance; array-formula
//! ranges additionally share one [`ResultMatrix`] holding every member
//! cell's cached result.

pub mod ast;
pub mod eval;
pub mod parser;

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{Address, ErrorPolicy, ErrorValue, FormulaGrammar, Range, StringId};
use ast::Expr;

/// A compiled (or failed-to-compile) formula expression.
///
/// When the import-wide error policy is `Skip`, a failed parse is captured as
/// an error-token stream: the original text is kept and `expr` carries the
/// parse error message. Evaluating such a stream yields `#NAME?`.
#[derive(Debug)]
pub struct FormulaTokens {
    /// Original expression text, without the leading `=`.
    pub text: String,
    /// Grammar the expression was written in.
    pub grammar: FormulaGrammar,
    /// Parsed expression, or the parse error message.
    pub expr: std::result::Result<Expr, String>,
}

impl FormulaTokens {
    /// Compile an expression string into a shared tokens store.
    ///
    /// # Errors
    ///
    /// With [`ErrorPolicy::Fail`], a parse failure is returned to the
    /// caller; with [`ErrorPolicy::Skip`] it is captured in the store
    /// instead.
    pub fn compile(
        text: &str,
        grammar: FormulaGrammar,
        policy: ErrorPolicy,
    ) -> Result<Arc<Self>> {
        match parser::parse_formula(text) {
            Ok(expr) => Ok(Arc::new(Self {
                text: text.to_string(),
                grammar,
                expr: Ok(expr),
            })),
            Err(e) => match policy {
                ErrorPolicy::Fail => Err(Error::Formula(format!(
                    "failed to compile formula '{text}': {e}"
                ))),
                ErrorPolicy::Skip => Ok(Arc::new(Self {
                    text: text.to_string(),
                    grammar,
                    expr: Err(e.to_string()),
                })),
            },
        }
    }
}

/// A cached scalar result of a formula cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormulaScalar {
    Empty,
    Number(f64),
    Bool(bool),
    String(StringId),
    Error(ErrorValue),
}

/// What kind of formula cell an entry in the store represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaCellKind {
    /// An ordinary single-cell formula.
    Normal,
    /// A member of a shared-formula group; the tokens are jointly owned.
    SharedMember { group: usize },
    /// A member of an array formula; its result lives in the range's common
    /// matrix.
    ArrayMember { array: usize },
}

/// One formula cell in a sheet's formula store.
#[derive(Debug)]
pub struct FormulaCell {
    pub tokens: Arc<FormulaTokens>,
    /// Position the expression text is anchored at; relative references
    /// shift with the distance between the cell and this anchor.
    pub origin: Address,
    /// Cached scalar result. Array members keep this `None`; their results
    /// live in the owning matrix.
    pub result: Option<FormulaScalar>,
    pub kind: FormulaCellKind,
}

/// A shared-formula group: one tokens store referenced by every member cell.
#[derive(Debug)]
pub struct SharedFormulaGroup {
    pub tokens: Arc<FormulaTokens>,
    pub origin: Address,
}

/// Result matrix common to all member cells of an array formula.
#[derive(Debug)]
pub struct ResultMatrix {
    pub range: Range,
    /// Row-major cached results, one slot per member cell.
    values: Vec<Option<FormulaScalar>>,
}

impl ResultMatrix {
    pub fn new(range: Range) -> Self {
        let rows = (range.last.row - range.first.row + 1) as usize;
        let cols = (range.last.column - range.first.column + 1) as usize;
        Self {
            range,
            values: vec![None; rows * cols],
        }
    }

    fn slot(&self, pos: Address) -> Option<usize> {
        if !self.range.contains(pos) {
            return None;
        }
        let cols = (self.range.last.column - self.range.first.column + 1) as usize;
        let r = (pos.row - self.range.first.row) as usize;
        let c = (pos.column - self.range.first.column) as usize;
        Some(r * cols + c)
    }

    pub fn get(&self, pos: Address) -> Option<FormulaScalar> {
        self.slot(pos).and_then(|i| self.values[i])
    }

    pub fn set(&mut self, pos: Address, value: FormulaScalar) {
        if let Some(i) = self.slot(pos) {
            self.values[i] = Some(value);
        }
    }
}

/// An array formula spanning a range, with its common result matrix.
#[derive(Debug)]
pub struct ArrayFormula {
    pub tokens: Arc<FormulaTokens>,
    pub matrix: ResultMatrix,
}
