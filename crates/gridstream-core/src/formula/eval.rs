//! Formula evaluation against the workbook model.
//!
//! Evaluation resolves references through the document, follows formula
//! cells recursively with cycle detection, and applies the offset between
//! the evaluated cell and the expression's anchor position to every
//! relative reference (the shared-formula translation rule).

use std::collections::HashSet;

use crate::cell::Cell;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::formula::ast::{BinaryOperator, CellReference, Expr, UnaryOperator};
use crate::formula::FormulaScalar;
use crate::types::{Address, ColT, ErrorValue, RowT, SheetT, SrcAddress};

/// Maximum recursion depth for nested formula evaluation.
const MAX_EVAL_DEPTH: usize = 256;

/// A computed formula value, before string results are interned.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Empty,
    Number(f64),
    Bool(bool),
    Text(String),
    Error(ErrorValue),
}

impl Value {
    pub fn from_scalar(doc: &Document, scalar: FormulaScalar) -> Value {
        match scalar {
            FormulaScalar::Empty => Value::Empty,
            FormulaScalar::Number(n) => Value::Number(n),
            FormulaScalar::Bool(b) => Value::Bool(b),
            FormulaScalar::String(id) => Value::Text(
                doc.shared_strings()
                    .get(id)
                    .map(str::to_string)
                    .unwrap_or_default(),
            ),
            FormulaScalar::Error(e) => Value::Error(e),
        }
    }
}

/// Evaluate an expression as seen from `pos`, with relative references
/// anchored at `anchor`.
pub fn evaluate_at(doc: &Document, expr: &Expr, pos: SrcAddress, anchor: Address) -> Result<Value> {
    let mut ev = Evaluator::new(doc, pos, anchor);
    ev.eval_expr(expr)
}

/// Evaluate a named expression at a base position.
///
/// The name is looked up in the base sheet's scope first, then globally.
///
/// # Errors
///
/// Fails when no expression of that name exists or its tokens carry a parse
/// error.
pub fn evaluate_named_expression(doc: &Document, name: &str, base: SrcAddress) -> Result<Value> {
    let ne = doc
        .named_expression(base.sheet, name)
        .ok_or_else(|| Error::InvalidArgument(format!("undefined name: '{name}'")))?;
    let expr = match &ne.tokens.expr {
        Ok(expr) => expr,
        Err(msg) => return Err(Error::Formula(msg.clone())),
    };
    let anchor = Address::new(ne.origin.row, ne.origin.column);
    evaluate_at(doc, expr, base, anchor)
}

/// Stateful evaluator tracking recursion depth and circular references.
struct Evaluator<'a> {
    doc: &'a Document,
    /// Cell position the expression is evaluated at.
    pos: SrcAddress,
    /// Anchor position relative references are measured from.
    anchor: Address,
    eval_stack: HashSet<(SheetT, RowT, ColT)>,
    depth: usize,
}

impl<'a> Evaluator<'a> {
    fn new(doc: &'a Document, pos: SrcAddress, anchor: Address) -> Self {
        Self {
            doc,
            pos,
            anchor,
            eval_stack: HashSet::new(),
            depth: 0,
        }
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value> {
        self.depth += 1;
        if self.depth > MAX_EVAL_DEPTH {
            self.depth -= 1;
            return Err(Error::Formula(
                "maximum evaluation depth exceeded".to_string(),
            ));
        }
        let result = self.eval_inner(expr);
        self.depth -= 1;
        result
    }

    fn eval_inner(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::String(s) => Ok(Value::Text(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Error(e) => Ok(Value::Error(ErrorValue::from_str(e))),
            Expr::CellRef(r) => {
                let (sheet, addr) = self.locate(r)?;
                self.resolve_cell(sheet, addr)
            }
            Expr::Range { start, end } => {
                // A range in scalar context yields its first cell.
                let values = self.expand_range(start, end)?;
                Ok(values.into_iter().next().unwrap_or(Value::Empty))
            }
            Expr::Name(name) => self.eval_name(name),
            Expr::Paren(inner) => self.eval_expr(inner),
            Expr::BinaryOp { op, left, right } => self.eval_binary(*op, left, right),
            Expr::UnaryOp { op, operand } => self.eval_unary(*op, operand),
            Expr::Function { name, args } => self.eval_function(name, args),
        }
    }

    // -----------------------------------------------------------------------
    // Reference resolution
    // -----------------------------------------------------------------------

    /// Turn a reference into an absolute (sheet, address) pair, applying the
    /// anchor offset to relative components.
    fn locate(&self, r: &CellReference) -> Result<(SheetT, Address)> {
        let sheet = match &r.sheet {
            Some(name) => self
                .doc
                .sheet_index(name)
                .ok_or_else(|| Error::InvalidArgument(format!("no such sheet: '{name}'")))?,
            None => self.pos.sheet,
        };
        let row = if r.abs_row {
            r.row
        } else {
            r.row + (self.pos.row - self.anchor.row)
        };
        let col = if r.abs_col {
            r.col
        } else {
            r.col + (self.pos.column - self.anchor.column)
        };
        Ok((sheet, Address::new(row, col)))
    }

    /// Resolve one cell to a scalar value, following formula cells and
    /// detecting reference cycles.
    fn resolve_cell(&mut self, sheet: SheetT, addr: Address) -> Result<Value> {
        if addr.row < 0 || addr.column < 0 {
            return Ok(Value::Error(ErrorValue::Ref));
        }
        let sheet_store = match self.doc.sheet(sheet) {
            Some(s) => s,
            None => return Ok(Value::Error(ErrorValue::Ref)),
        };
        match sheet_store.cell_at(addr.row, addr.column) {
            Cell::Empty => Ok(Value::Empty),
            Cell::Bool(b) => Ok(Value::Bool(b)),
            Cell::Number(n) => Ok(Value::Number(n)),
            Cell::String(id) => Ok(Value::Text(
                self.doc
                    .shared_strings()
                    .get(id)
                    .map(str::to_string)
                    .unwrap_or_default(),
            )),
            Cell::Formula(fid) => {
                // Use the cached result when one exists.
                if let Some(scalar) = sheet_store.formula_cell_result(fid, addr) {
                    return Ok(Value::from_scalar(self.doc, scalar));
                }

                let key = (sheet, addr.row, addr.column);
                if self.eval_stack.contains(&key) {
                    return Err(Error::Formula(format!(
                        "circular reference at (sheet={sheet}; {addr})"
                    )));
                }

                let fc = sheet_store
                    .formula_cell(fid)
                    .ok_or_else(|| Error::General("dangling formula cell index".to_string()))?;
                let expr = match &fc.tokens.expr {
                    Ok(expr) => expr,
                    Err(_) => return Ok(Value::Error(ErrorValue::Name)),
                };

                self.eval_stack.insert(key);
                let saved_pos = self.pos;
                let saved_anchor = self.anchor;
                self.pos = SrcAddress::new(sheet, addr.row, addr.column);
                self.anchor = fc.origin;
                let result = self.eval_expr(expr);
                self.pos = saved_pos;
                self.anchor = saved_anchor;
                self.eval_stack.remove(&key);
                result
            }
        }
    }

    /// Expand a rectangular range into values, row-major.
    fn expand_range(&mut self, start: &CellReference, end: &CellReference) -> Result<Vec<Value>> {
        let (sheet, first) = self.locate(start)?;
        let (_, last) = self.locate(end)?;
        let min_row = first.row.min(last.row);
        let max_row = first.row.max(last.row);
        let min_col = first.column.min(last.column);
        let max_col = first.column.max(last.column);

        let mut values = Vec::new();
        for row in min_row..=max_row {
            for col in min_col..=max_col {
                values.push(self.resolve_cell(sheet, Address::new(row, col))?);
            }
        }
        Ok(values)
    }

    /// Evaluate a named expression reference from inside a formula.
    fn eval_name(&mut self, name: &str) -> Result<Value> {
        let ne = match self.doc.named_expression(self.pos.sheet, name) {
            Some(ne) => ne,
            None => return Ok(Value::Error(ErrorValue::Name)),
        };
        let expr = match &ne.tokens.expr {
            Ok(expr) => expr,
            Err(_) => return Ok(Value::Error(ErrorValue::Name)),
        };
        let saved_anchor = self.anchor;
        self.anchor = Address::new(ne.origin.row, ne.origin.column);
        let result = self.eval_expr(expr);
        self.anchor = saved_anchor;
        result
    }

    // -----------------------------------------------------------------------
    // Operators
    // -----------------------------------------------------------------------

    fn eval_binary(&mut self, op: BinaryOperator, left: &Expr, right: &Expr) -> Result<Value> {
        let lhs = self.eval_expr(left)?;
        let rhs = self.eval_expr(right)?;

        // Error values propagate through every operator.
        if let Value::Error(e) = lhs {
            return Ok(Value::Error(e));
        }
        if let Value::Error(e) = rhs {
            return Ok(Value::Error(e));
        }

        match op {
            BinaryOperator::Concat => Ok(Value::Text(format!(
                "{}{}",
                coerce_to_text(&lhs),
                coerce_to_text(&rhs)
            ))),
            BinaryOperator::Add
            | BinaryOperator::Sub
            | BinaryOperator::Mul
            | BinaryOperator::Div
            | BinaryOperator::Pow => {
                let (ln, rn) = match (coerce_to_number(&lhs), coerce_to_number(&rhs)) {
                    (Some(l), Some(r)) => (l, r),
                    _ => return Ok(Value::Error(ErrorValue::Value)),
                };
                let result = match op {
                    BinaryOperator::Add => ln + rn,
                    BinaryOperator::Sub => ln - rn,
                    BinaryOperator::Mul => ln * rn,
                    BinaryOperator::Div => {
                        if rn == 0.0 {
                            return Ok(Value::Error(ErrorValue::Div0));
                        }
                        ln / rn
                    }
                    BinaryOperator::Pow => ln.powf(rn),
                    _ => unreachable!(),
                };
                Ok(Value::Number(result))
            }
            BinaryOperator::Eq
            | BinaryOperator::Ne
            | BinaryOperator::Lt
            | BinaryOperator::Le
            | BinaryOperator::Gt
            | BinaryOperator::Ge => Ok(Value::Bool(compare(op, &lhs, &rhs))),
        }
    }

    fn eval_unary(&mut self, op: UnaryOperator, operand: &Expr) -> Result<Value> {
        let v = self.eval_expr(operand)?;
        if let Value::Error(e) = v {
            return Ok(Value::Error(e));
        }
        let n = match coerce_to_number(&v) {
            Some(n) => n,
            None => return Ok(Value::Error(ErrorValue::Value)),
        };
        let result = match op {
            UnaryOperator::Neg => -n,
            UnaryOperator::Pos => n,
            UnaryOperator::Percent => n / 100.0,
        };
        Ok(Value::Number(result))
    }

    // -----------------------------------------------------------------------
    // Functions
    // -----------------------------------------------------------------------

    fn eval_function(&mut self, name: &str, args: &[Expr]) -> Result<Value> {
        match name {
            "SUM" => {
                let nums = self.collect_numbers(args)?;
                Ok(Value::Number(nums.iter().sum()))
            }
            "AVERAGE" => {
                let nums = self.collect_numbers(args)?;
                if nums.is_empty() {
                    return Ok(Value::Error(ErrorValue::Div0));
                }
                Ok(Value::Number(nums.iter().sum::<f64>() / nums.len() as f64))
            }
            "COUNT" => {
                let nums = self.collect_numbers(args)?;
                Ok(Value::Number(nums.len() as f64))
            }
            "COUNTA" => {
                let values = self.flatten_args(args)?;
                let n = values.iter().filter(|v| !matches!(v, Value::Empty)).count();
                Ok(Value::Number(n as f64))
            }
            "MIN" => {
                let nums = self.collect_numbers(args)?;
                if nums.is_empty() {
                    return Ok(Value::Number(0.0));
                }
                Ok(Value::Number(
                    nums.iter().copied().fold(f64::INFINITY, f64::min),
                ))
            }
            "MAX" => {
                let nums = self.collect_numbers(args)?;
                if nums.is_empty() {
                    return Ok(Value::Number(0.0));
                }
                Ok(Value::Number(
                    nums.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                ))
            }
            "IF" => {
                if args.is_empty() {
                    return Ok(Value::Error(ErrorValue::Value));
                }
                let cond = self.eval_expr(&args[0])?;
                let truthy = match cond {
                    Value::Bool(b) => b,
                    Value::Number(n) => n != 0.0,
                    Value::Error(e) => return Ok(Value::Error(e)),
                    _ => false,
                };
                if truthy {
                    match args.get(1) {
                        Some(e) => self.eval_expr(e),
                        None => Ok(Value::Bool(true)),
                    }
                } else {
                    match args.get(2) {
                        Some(e) => self.eval_expr(e),
                        None => Ok(Value::Bool(false)),
                    }
                }
            }
            "CONCATENATE" | "CONCAT" => {
                let values = self.flatten_args(args)?;
                let mut out = String::new();
                for v in &values {
                    if let Value::Error(e) = v {
                        return Ok(Value::Error(*e));
                    }
                    out.push_str(&coerce_to_text(v));
                }
                Ok(Value::Text(out))
            }
            "ABS" => {
                let v = self.eval_arg(args, 0)?;
                match coerce_to_number(&v) {
                    Some(n) => Ok(Value::Number(n.abs())),
                    None => Ok(Value::Error(ErrorValue::Value)),
                }
            }
            "LEN" => {
                let v = self.eval_arg(args, 0)?;
                Ok(Value::Number(coerce_to_text(&v).chars().count() as f64))
            }
            "UPPER" => {
                let v = self.eval_arg(args, 0)?;
                Ok(Value::Text(coerce_to_text(&v).to_uppercase()))
            }
            "LOWER" => {
                let v = self.eval_arg(args, 0)?;
                Ok(Value::Text(coerce_to_text(&v).to_lowercase()))
            }
            _ => Ok(Value::Error(ErrorValue::Name)),
        }
    }

    fn eval_arg(&mut self, args: &[Expr], index: usize) -> Result<Value> {
        match args.get(index) {
            Some(e) => self.eval_expr(e),
            None => Ok(Value::Error(ErrorValue::Value)),
        }
    }

    /// Collect numeric values from the arguments, expanding ranges and
    /// skipping non-numeric cells inside them.
    fn collect_numbers(&mut self, args: &[Expr]) -> Result<Vec<f64>> {
        let mut nums = Vec::new();
        for arg in args {
            match arg {
                Expr::Range { start, end } => {
                    for v in self.expand_range(start, end)? {
                        if let Value::Number(n) = v {
                            nums.push(n);
                        }
                    }
                }
                _ => {
                    let v = self.eval_expr(arg)?;
                    if let Some(n) = coerce_to_number(&v) {
                        nums.push(n);
                    }
                }
            }
        }
        Ok(nums)
    }

    /// Flatten arguments into values, expanding ranges.
    fn flatten_args(&mut self, args: &[Expr]) -> Result<Vec<Value>> {
        let mut values = Vec::new();
        for arg in args {
            match arg {
                Expr::Range { start, end } => values.extend(self.expand_range(start, end)?),
                _ => values.push(self.eval_expr(arg)?),
            }
        }
        Ok(values)
    }
}

// ---------------------------------------------------------------------------
// Coercion helpers
// ---------------------------------------------------------------------------

fn coerce_to_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => Some(*n),
        Value::Bool(true) => Some(1.0),
        Value::Bool(false) => Some(0.0),
        Value::Empty => Some(0.0),
        Value::Text(s) => s.trim().parse::<f64>().ok(),
        Value::Error(_) => None,
    }
}

fn coerce_to_text(v: &Value) -> String {
    match v {
        Value::Empty => String::new(),
        Value::Number(n) => {
            if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{n}")
            }
        }
        Value::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Value::Text(s) => s.clone(),
        Value::Error(e) => e.as_str().to_string(),
    }
}

fn compare(op: BinaryOperator, lhs: &Value, rhs: &Value) -> bool {
    let ord = match (lhs, rhs) {
        (Value::Number(l), Value::Number(r)) => l.partial_cmp(r),
        (Value::Text(l), Value::Text(r)) => Some(l.to_lowercase().cmp(&r.to_lowercase())),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        _ => {
            let l = coerce_to_number(lhs);
            let r = coerce_to_number(rhs);
            match (l, r) {
                (Some(l), Some(r)) => l.partial_cmp(&r),
                _ => None,
            }
        }
    };
    match ord {
        Some(ord) => match op {
            BinaryOperator::Eq => ord.is_eq(),
            BinaryOperator::Ne => ord.is_ne(),
            BinaryOperator::Lt => ord.is_lt(),
            BinaryOperator::Le => ord.is_le(),
            BinaryOperator::Gt => ord.is_gt(),
            BinaryOperator::Ge => ord.is_ge(),
            _ => false,
        },
        None => matches!(op, BinaryOperator::Ne),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::parser::parse_formula;

    fn eval_const(text: &str) -> Value {
        // A document with one empty sheet is enough for constant expressions.
        let mut doc = Document::new(crate::utils::constants::DEFAULT_SHEET_SIZE);
        doc.append_sheet("Sheet1");
        let expr = parse_formula(text).unwrap();
        evaluate_at(
            &doc,
            &expr,
            SrcAddress::new(0, 0, 0),
            Address::new(0, 0),
        )
        .unwrap()
    }

    #[test]
    fn test_eval_arithmetic() {
        assert_eq!(eval_const("1+2*3"), Value::Number(7.0));
        assert_eq!(eval_const("(1+2)*3"), Value::Number(9.0));
        assert_eq!(eval_const("2^10"), Value::Number(1024.0));
        assert_eq!(eval_const("10/4"), Value::Number(2.5));
    }

    #[test]
    fn test_eval_division_by_zero() {
        assert_eq!(eval_const("1/0"), Value::Error(ErrorValue::Div0));
    }

    #[test]
    fn test_eval_comparison_and_concat() {
        assert_eq!(eval_const("1 < 2"), Value::Bool(true));
        assert_eq!(eval_const("\"a\" & \"b\""), Value::Text("ab".to_string()));
        assert_eq!(eval_const("\"A\" = \"a\""), Value::Bool(true));
    }

    #[test]
    fn test_eval_percent() {
        assert_eq!(eval_const("50%"), Value::Number(0.5));
    }

    #[test]
    fn test_eval_if() {
        assert_eq!(eval_const("IF(1<2, 10, 20)"), Value::Number(10.0));
        assert_eq!(eval_const("IF(1>2, 10, 20)"), Value::Number(20.0));
    }

    #[test]
    fn test_eval_unknown_function_yields_name_error() {
        assert_eq!(eval_const("NOSUCHFN(1)"), Value::Error(ErrorValue::Name));
    }
}
