//! Formula expression parser.
//!
//! Parsing runs in two stages. A lexer first reduces the input (which does
//! NOT include the leading `=`) to a flat token sequence, folding sheet
//! prefixes into reference tokens and deciding reference-versus-name per
//! word. A small precedence-climbing parser then assembles the AST from the
//! tokens, driven by a binding-power table instead of one routine per
//! operator tier. Binary operators are left-associative; `%` binds as a
//! postfix and the unary signs as prefixes, both tighter than `^`.

use nom::{
    bytes::complete::take_while1,
    character::complete::digit1,
    combinator::{opt, recognize},
    sequence::{preceded, tuple},
    IResult,
};

use super::ast::{BinaryOperator, CellReference, Expr, UnaryOperator};
use crate::error::{Error, Result};
use crate::types::RowT;
use crate::utils::cell_ref::column_name_to_number;

/// Parse a formula expression string into an AST.
///
/// The input should NOT include the leading `=` sign.
///
/// # Errors
///
/// Returns an error if the formula string cannot be parsed completely.
pub fn parse_formula(input: &str) -> Result<Expr> {
    let tokens = lex(input)?;
    if tokens.is_empty() {
        return Err(Error::Formula("empty formula".to_string()));
    }
    let mut stream = TokenStream { tokens, pos: 0 };
    let expr = stream.expression(0)?;
    if let Some(extra) = stream.peek() {
        return Err(Error::Formula(format!(
            "unexpected trailing input near {extra:?}"
        )));
    }
    Ok(expr)
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Bool(bool),
    ErrLit(String),
    Ref(CellReference),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Amp,
    Percent,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    LParen,
    RParen,
    Comma,
    Colon,
}

/// Characters that may continue a word once one has started.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Length of the leading run of word characters.
fn word_len(s: &str) -> usize {
    s.find(|c: char| !is_word_char(c)).unwrap_or(s.len())
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

fn lex(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = input.trim_start();
    while !rest.is_empty() {
        let (next, token) = lex_token(rest)?;
        tokens.push(token);
        rest = next.trim_start();
    }
    Ok(tokens)
}

fn lex_token(input: &str) -> Result<(&str, Token)> {
    // Two-character comparison operators have to win over their one-char
    // prefixes.
    for (text, token) in [("<=", Token::Le), (">=", Token::Ge), ("<>", Token::Ne)] {
        if let Some(rest) = input.strip_prefix(text) {
            return Ok((rest, token));
        }
    }

    let first = input.chars().next().unwrap_or('\0');
    let single = match first {
        '+' => Some(Token::Plus),
        '-' => Some(Token::Minus),
        '*' => Some(Token::Star),
        '/' => Some(Token::Slash),
        '^' => Some(Token::Caret),
        '&' => Some(Token::Amp),
        '%' => Some(Token::Percent),
        '=' => Some(Token::Eq),
        '<' => Some(Token::Lt),
        '>' => Some(Token::Gt),
        '(' => Some(Token::LParen),
        ')' => Some(Token::RParen),
        ',' => Some(Token::Comma),
        ':' => Some(Token::Colon),
        _ => None,
    };
    if let Some(token) = single {
        return Ok((&input[1..], token));
    }

    match first {
        '0'..='9' => lex_number(input),
        '"' => lex_string(input),
        '#' => lex_error_literal(input),
        '\'' => lex_quoted_sheet_ref(input),
        '$' | '_' => lex_word(input),
        c if c.is_alphabetic() => lex_word(input),
        c => Err(Error::Formula(format!(
            "unrecognized character '{c}' in formula"
        ))),
    }
}

/// A numeric literal: integer part, optional fraction, optional exponent.
fn lex_number(input: &str) -> Result<(&str, Token)> {
    let shape: IResult<&str, &str> = recognize(tuple((
        digit1,
        opt(preceded(nom::character::complete::char('.'), digit1)),
        opt(tuple((
            nom::character::complete::one_of("eE"),
            opt(nom::character::complete::one_of("+-")),
            digit1,
        ))),
    )))(input);
    match shape {
        Ok((rest, text)) => {
            let value: f64 = text
                .parse()
                .map_err(|_| Error::Formula(format!("invalid number literal '{text}'")))?;
            Ok((rest, Token::Number(value)))
        }
        Err(_) => Err(Error::Formula("malformed number literal".to_string())),
    }
}

/// A double-quoted string; `""` inside is one literal quote.
fn lex_string(input: &str) -> Result<(&str, Token)> {
    let mut rest = &input[1..];
    let mut value = String::new();
    loop {
        let quote = rest
            .find('"')
            .ok_or_else(|| Error::Formula("unterminated string literal".to_string()))?;
        value.push_str(&rest[..quote]);
        rest = &rest[quote + 1..];
        if let Some(after) = rest.strip_prefix('"') {
            value.push('"');
            rest = after;
        } else {
            return Ok((rest, Token::Str(value)));
        }
    }
}

/// One of the spreadsheet error literals.
fn lex_error_literal(input: &str) -> Result<(&str, Token)> {
    const LITERALS: [&str; 7] = [
        "#DIV/0!", "#VALUE!", "#REF!", "#NAME?", "#NUM!", "#NULL!", "#N/A",
    ];
    for lit in LITERALS {
        if let Some(rest) = input.strip_prefix(lit) {
            return Ok((rest, Token::ErrLit(lit.to_string())));
        }
    }
    Err(Error::Formula(format!(
        "unrecognized error literal at '{}'",
        head(input)
    )))
}

/// `'Sheet Name'!REF` with `''` as an escaped quote inside the name.
fn lex_quoted_sheet_ref(input: &str) -> Result<(&str, Token)> {
    let mut rest = &input[1..];
    let mut sheet = String::new();
    loop {
        let quote = rest
            .find('\'')
            .ok_or_else(|| Error::Formula("unterminated sheet name quote".to_string()))?;
        sheet.push_str(&rest[..quote]);
        rest = &rest[quote + 1..];
        if let Some(after) = rest.strip_prefix('\'') {
            sheet.push('\'');
            rest = after;
        } else {
            break;
        }
    }
    let rest = rest
        .strip_prefix('!')
        .ok_or_else(|| Error::Formula("expected '!' after a quoted sheet name".to_string()))?;
    let (rest, mut reference) = scan_reference(rest)
        .ok_or_else(|| Error::Formula(format!("expected a cell reference after '{sheet}!'")))?;
    reference.sheet = Some(sheet);
    Ok((rest, Token::Ref(reference)))
}

/// A word starting with a letter, `_`, or `$`: an unquoted-sheet-prefixed
/// reference, a plain reference, a boolean keyword, or an identifier.
fn lex_word(input: &str) -> Result<(&str, Token)> {
    // An unquoted sheet prefix is a word immediately followed by '!'.
    let wlen = word_len(input);
    if wlen > 0 {
        if let Some(after_bang) = input[wlen..].strip_prefix('!') {
            let (rest, mut reference) = scan_reference(after_bang).ok_or_else(|| {
                Error::Formula(format!(
                    "expected a cell reference after '{}!'",
                    &input[..wlen]
                ))
            })?;
            reference.sheet = Some(input[..wlen].to_string());
            return Ok((rest, Token::Ref(reference)));
        }
    }

    if let Some((rest, reference)) = scan_reference(input) {
        return Ok((rest, Token::Ref(reference)));
    }

    if wlen == 0 {
        return Err(Error::Formula(format!(
            "stray '$' in formula at '{}'",
            head(input)
        )));
    }
    let (text, rest) = input.split_at(wlen);
    let token = if text.eq_ignore_ascii_case("TRUE") {
        Token::Bool(true)
    } else if text.eq_ignore_ascii_case("FALSE") {
        Token::Bool(false)
    } else {
        Token::Ident(text.to_string())
    };
    Ok((rest, token))
}

/// Scan a sheet-less cell reference (`B3`, `$AA$10`, `A$1`) at the head of
/// the input. Refuses the match when a word character follows, so `B3x`
/// stays a name.
fn scan_reference(input: &str) -> Option<(&str, CellReference)> {
    let (abs_col, rest) = strip_dollar(input);
    let letters: IResult<&str, &str> = take_while1(|c: char| c.is_ascii_alphabetic())(rest);
    let (rest, col_text) = letters.ok()?;
    let (abs_row, rest) = strip_dollar(rest);
    let digits: IResult<&str, &str> = digit1(rest);
    let (rest, row_text) = digits.ok()?;
    if rest.chars().next().is_some_and(is_word_char) {
        return None;
    }

    let col = column_name_to_number(col_text).ok()?;
    let row = row_text.parse::<i64>().ok().filter(|r| *r >= 1)?;
    Some((
        rest,
        CellReference {
            col,
            row: (row - 1) as RowT,
            abs_col,
            abs_row,
            sheet: None,
        },
    ))
}

fn strip_dollar(input: &str) -> (bool, &str) {
    match input.strip_prefix('$') {
        Some(rest) => (true, rest),
        None => (false, input),
    }
}

/// A short prefix of the input for error messages.
fn head(input: &str) -> &str {
    let end = input
        .char_indices()
        .take(8)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    &input[..end]
}

// ---------------------------------------------------------------------------
// Token-stream parser
// ---------------------------------------------------------------------------

/// Left binding power of a binary operator token; `None` for non-operators.
fn binding_power(token: &Token) -> Option<(BinaryOperator, u8)> {
    let bound = match token {
        Token::Eq => (BinaryOperator::Eq, 1),
        Token::Ne => (BinaryOperator::Ne, 1),
        Token::Lt => (BinaryOperator::Lt, 1),
        Token::Le => (BinaryOperator::Le, 1),
        Token::Gt => (BinaryOperator::Gt, 1),
        Token::Ge => (BinaryOperator::Ge, 1),
        Token::Amp => (BinaryOperator::Concat, 2),
        Token::Plus => (BinaryOperator::Add, 3),
        Token::Minus => (BinaryOperator::Sub, 3),
        Token::Star => (BinaryOperator::Mul, 4),
        Token::Slash => (BinaryOperator::Div, 4),
        Token::Caret => (BinaryOperator::Pow, 5),
        _ => return None,
    };
    Some(bound)
}

struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<()> {
        match self.advance() {
            Some(found) if found == token => Ok(()),
            Some(found) => Err(Error::Formula(format!("expected {what}, found {found:?}"))),
            None => Err(Error::Formula(format!(
                "expected {what}, found end of formula"
            ))),
        }
    }

    /// Precedence climbing: fold in every binary operator whose binding
    /// power reaches `min_bp`, recursing with a higher threshold for the
    /// right-hand side to keep operators left-associative.
    fn expression(&mut self, min_bp: u8) -> Result<Expr> {
        let mut lhs = self.operand()?;
        while let Some((op, bp)) = self.peek().and_then(binding_power) {
            if bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.expression(bp + 1)?;
            lhs = Expr::BinaryOp {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    /// A prefix-signed operand with any postfix `%` applied.
    fn operand(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                Ok(Expr::UnaryOp {
                    op: UnaryOperator::Neg,
                    operand: Box::new(self.operand()?),
                })
            }
            Some(Token::Plus) => {
                self.advance();
                Ok(Expr::UnaryOp {
                    op: UnaryOperator::Pos,
                    operand: Box::new(self.operand()?),
                })
            }
            _ => {
                let mut expr = self.atom()?;
                while self.peek() == Some(&Token::Percent) {
                    self.advance();
                    expr = Expr::UnaryOp {
                        op: UnaryOperator::Percent,
                        operand: Box::new(expr),
                    };
                }
                Ok(expr)
            }
        }
    }

    fn atom(&mut self) -> Result<Expr> {
        let token = self
            .advance()
            .ok_or_else(|| Error::Formula("formula ended where a value was expected".to_string()))?;
        match token {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Str(s) => Ok(Expr::String(s)),
            Token::Bool(b) => Ok(Expr::Bool(b)),
            Token::ErrLit(e) => Ok(Expr::Error(e)),
            Token::Ref(start) => {
                if self.peek() == Some(&Token::Colon) {
                    self.advance();
                    match self.advance() {
                        Some(Token::Ref(end)) => Ok(Expr::Range { start, end }),
                        other => Err(Error::Formula(format!(
                            "expected a reference after ':', found {other:?}"
                        ))),
                    }
                } else {
                    Ok(Expr::CellRef(start))
                }
            }
            Token::Ident(name) => {
                if self.peek() == Some(&Token::LParen) {
                    self.advance();
                    let args = self.argument_list()?;
                    Ok(Expr::Function {
                        name: name.to_uppercase(),
                        args,
                    })
                } else {
                    Ok(Expr::Name(name))
                }
            }
            Token::LParen => {
                let inner = self.expression(0)?;
                self.expect(Token::RParen, "')'")?;
                Ok(Expr::Paren(Box::new(inner)))
            }
            other => Err(Error::Formula(format!(
                "unexpected token {other:?} where a value was expected"
            ))),
        }
    }

    /// Comma-separated arguments up to the closing parenthesis, which is
    /// consumed.
    fn argument_list(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.expression(0)?);
            match self.advance() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                other => {
                    return Err(Error::Formula(format!(
                        "expected ',' or ')' in an argument list, found {other:?}"
                    )))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell(col: i32, row: i32) -> CellReference {
        CellReference {
            col,
            row,
            abs_col: false,
            abs_row: false,
            sheet: None,
        }
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_formula("42").unwrap(), Expr::Number(42.0));
        assert_eq!(parse_formula("3.14").unwrap(), Expr::Number(3.14));
        assert_eq!(parse_formula("1e3").unwrap(), Expr::Number(1000.0));
    }

    #[test]
    fn test_parse_string_with_escaped_quote() {
        assert_eq!(
            parse_formula("\"he said \"\"hi\"\"\"").unwrap(),
            Expr::String("he said \"hi\"".to_string())
        );
    }

    #[test]
    fn test_parse_bool_and_error() {
        assert_eq!(parse_formula("TRUE").unwrap(), Expr::Bool(true));
        assert_eq!(parse_formula("false").unwrap(), Expr::Bool(false));
        assert_eq!(
            parse_formula("#DIV/0!").unwrap(),
            Expr::Error("#DIV/0!".to_string())
        );
    }

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!(parse_formula("B3").unwrap(), Expr::CellRef(cell(1, 2)));
        assert_eq!(
            parse_formula("$AA$10").unwrap(),
            Expr::CellRef(CellReference {
                col: 26,
                row: 9,
                abs_col: true,
                abs_row: true,
                sheet: None,
            })
        );
    }

    #[test]
    fn test_parse_sheet_prefixed_ref() {
        assert_eq!(
            parse_formula("Sheet1!A1").unwrap(),
            Expr::CellRef(CellReference {
                col: 0,
                row: 0,
                abs_col: false,
                abs_row: false,
                sheet: Some("Sheet1".to_string()),
            })
        );
        assert_eq!(
            parse_formula("'My Sheet'!B2").unwrap(),
            Expr::CellRef(CellReference {
                col: 1,
                row: 1,
                abs_col: false,
                abs_row: false,
                sheet: Some("My Sheet".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(
            parse_formula("A1:B10").unwrap(),
            Expr::Range {
                start: cell(0, 0),
                end: cell(1, 9),
            }
        );
    }

    #[test]
    fn test_parse_binary_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3).
        let expr = parse_formula("1+2*3").unwrap();
        assert_eq!(
            expr,
            Expr::BinaryOp {
                op: BinaryOperator::Add,
                left: Box::new(Expr::Number(1.0)),
                right: Box::new(Expr::BinaryOp {
                    op: BinaryOperator::Mul,
                    left: Box::new(Expr::Number(2.0)),
                    right: Box::new(Expr::Number(3.0)),
                }),
            }
        );
    }

    #[test]
    fn test_parse_left_associativity() {
        // 10 - 2 - 3 parses as (10 - 2) - 3.
        let expr = parse_formula("10-2-3").unwrap();
        assert_eq!(
            expr,
            Expr::BinaryOp {
                op: BinaryOperator::Sub,
                left: Box::new(Expr::BinaryOp {
                    op: BinaryOperator::Sub,
                    left: Box::new(Expr::Number(10.0)),
                    right: Box::new(Expr::Number(2.0)),
                }),
                right: Box::new(Expr::Number(3.0)),
            }
        );
    }

    #[test]
    fn test_parse_function_call() {
        let expr = parse_formula("SUM(A1:A3, 5)").unwrap();
        assert_eq!(
            expr,
            Expr::Function {
                name: "SUM".to_string(),
                args: vec![
                    Expr::Range {
                        start: cell(0, 0),
                        end: cell(0, 2),
                    },
                    Expr::Number(5.0),
                ],
            }
        );
    }

    #[test]
    fn test_parse_empty_argument_list() {
        assert_eq!(
            parse_formula("NOW()").unwrap(),
            Expr::Function {
                name: "NOW".to_string(),
                args: vec![],
            }
        );
    }

    #[test]
    fn test_parse_name() {
        assert_eq!(
            parse_formula("PROFIT*2").unwrap(),
            Expr::BinaryOp {
                op: BinaryOperator::Mul,
                left: Box::new(Expr::Name("PROFIT".to_string())),
                right: Box::new(Expr::Number(2.0)),
            }
        );
        // A trailing word character keeps a reference-shaped word a name.
        assert_eq!(
            parse_formula("B3x").unwrap(),
            Expr::Name("B3x".to_string())
        );
    }

    #[test]
    fn test_parse_unary_and_percent() {
        assert_eq!(
            parse_formula("-A1").unwrap(),
            Expr::UnaryOp {
                op: UnaryOperator::Neg,
                operand: Box::new(Expr::CellRef(cell(0, 0))),
            }
        );
        assert_eq!(
            parse_formula("50%").unwrap(),
            Expr::UnaryOp {
                op: UnaryOperator::Percent,
                operand: Box::new(Expr::Number(50.0)),
            }
        );
    }

    #[test]
    fn test_parse_sign_binds_tighter_than_power() {
        // -2^2 parses as (-2)^2, the spreadsheet convention.
        let expr = parse_formula("-2^2").unwrap();
        assert_eq!(
            expr,
            Expr::BinaryOp {
                op: BinaryOperator::Pow,
                left: Box::new(Expr::UnaryOp {
                    op: UnaryOperator::Neg,
                    operand: Box::new(Expr::Number(2.0)),
                }),
                right: Box::new(Expr::Number(2.0)),
            }
        );
    }

    #[test]
    fn test_parse_paren() {
        let expr = parse_formula("(1+2)*3").unwrap();
        match expr {
            Expr::BinaryOp { op, left, .. } => {
                assert_eq!(op, BinaryOperator::Mul);
                assert!(matches!(*left, Expr::Paren(_)));
            }
            other => panic!("unexpected expr: {other:?}"),
        }
    }

    #[test]
    fn test_parse_whitespace_tolerated() {
        assert_eq!(
            parse_formula(" 1 +  2 ").unwrap(),
            Expr::BinaryOp {
                op: BinaryOperator::Add,
                left: Box::new(Expr::Number(1.0)),
                right: Box::new(Expr::Number(2.0)),
            }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_formula("").is_err());
        assert!(parse_formula("1 +").is_err());
        assert!(parse_formula("SUM(1").is_err());
        assert!(parse_formula("\"unterminated").is_err());
        assert!(parse_formula("1 2").is_err());
        assert!(parse_formula("A1:").is_err());
        assert!(parse_formula("$?").is_err());
    }
}
