//! Event-driven CSV parser.
//!
//! The parser walks the input once and emits row and cell events to a
//! [`CsvHandler`]. Cell payloads are zero-copy slices of the input except
//! when a quoted cell contains an escaped (doubled) text qualifier, in which
//! case the unescaped value is materialized in the parser's scratch buffer
//! and flagged transient.

use crate::cursor::{CellBuffer, Cursor};
use crate::error::{ParseError, Result};

/// Receiver of CSV parse events. All methods have empty default bodies so
/// implementors only override the events they care about.
pub trait CsvHandler {
    /// Called when the parser starts parsing a stream.
    fn begin_parse(&mut self) {}

    /// Called when the parser finishes parsing a stream.
    fn end_parse(&mut self) {}

    /// Called at the beginning of every row.
    fn begin_row(&mut self) {}

    /// Called at the end of every row.
    fn end_row(&mut self) {}

    /// Called after every cell is parsed.
    ///
    /// When `transient` is true the value lives in a temporary buffer and
    /// must be copied before the callback returns if it is to be kept.
    fn cell(&mut self, value: &str, transient: bool) {
        let _ = (value, transient);
    }
}

/// CSV parser configuration.
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Field delimiter characters; any one of them separates cells.
    pub delimiters: Vec<u8>,
    /// Optional text qualifier (quote) character.
    pub text_qualifier: Option<u8>,
    /// When true, leading and trailing blanks of unquoted cells are trimmed.
    pub trim_cell_value: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiters: vec![b','],
            text_qualifier: Some(b'"'),
            trim_cell_value: false,
        }
    }
}

/// Parser for CSV documents, generic over the handler type.
pub struct CsvParser<'a, 'h, H: CsvHandler> {
    cursor: Cursor<'a>,
    handler: &'h mut H,
    config: CsvConfig,
    cell_buf: CellBuffer,
}

impl<'a, 'h, H: CsvHandler> CsvParser<'a, 'h, H> {
    pub fn new(content: &'a [u8], handler: &'h mut H, config: CsvConfig) -> Self {
        Self {
            cursor: Cursor::new(content),
            handler,
            config,
            cell_buf: CellBuffer::new(),
        }
    }

    /// Parse the entire stream, emitting events as they occur.
    ///
    /// # Errors
    ///
    /// Fails on an unterminated quoted cell or a stray character after a
    /// closing qualifier.
    pub fn parse(mut self) -> Result<()> {
        self.handler.begin_parse();
        while self.cursor.has_char() {
            self.row()?;
        }
        self.handler.end_parse();
        Ok(())
    }

    fn is_delim(&self, c: u8) -> bool {
        self.config.delimiters.contains(&c)
    }

    fn is_text_qualifier(&self, c: u8) -> bool {
        self.config.text_qualifier == Some(c)
    }

    fn row(&mut self) -> Result<()> {
        self.handler.begin_row();
        loop {
            if self.cursor.has_char() && self.is_text_qualifier(self.cursor.current()) {
                self.quoted_cell()?;
            } else {
                self.cell();
            }

            if !self.cursor.has_char() {
                self.handler.end_row();
                return Ok(());
            }

            let c = self.cursor.current();
            if self.consume_newline(c) {
                self.handler.end_row();
                return Ok(());
            }

            if !self.is_delim(c) {
                return Err(ParseError::new("expected a delimiter", self.cursor.offset()));
            }
            self.cursor.next();

            if self.config.trim_cell_value {
                self.cursor.skip_blanks();
            }

            if !self.cursor.has_char() {
                // Stream ended immediately after a delimiter: emit the
                // trailing empty cell before closing the row.
                self.handler.cell("", false);
                self.handler.end_row();
                return Ok(());
            }
        }
    }

    /// Consume `\n`, `\r`, or `\r\n` when the current character starts one.
    fn consume_newline(&mut self, c: u8) -> bool {
        match c {
            b'\n' => {
                self.cursor.next();
                true
            }
            b'\r' => {
                self.cursor.next();
                if self.cursor.has_char() && self.cursor.current() == b'\n' {
                    self.cursor.next();
                }
                true
            }
            _ => false,
        }
    }

    /// Parse an unquoted cell: everything up to the next delimiter or
    /// newline.
    fn cell(&mut self) {
        let start = self.cursor.offset();
        while self.cursor.has_char() {
            let c = self.cursor.current();
            if c == b'\n' || c == b'\r' || self.is_delim(c) {
                break;
            }
            self.cursor.next();
        }
        let end = self.cursor.offset();
        self.push_cell_value(start, end);
    }

    /// Parse a quoted cell. The opening qualifier is at the current
    /// position.
    fn quoted_cell(&mut self) -> Result<()> {
        self.cursor.next(); // Skip the opening qualifier.

        let start = self.cursor.offset();
        while self.cursor.has_char() {
            let c = self.cursor.current();
            if !self.is_text_qualifier(c) {
                self.cursor.next();
                continue;
            }

            // The current char is a qualifier. A doubled qualifier is an
            // escaped literal; switch to the scratch-buffer path.
            if self.cursor.peek(1).map(|n| self.is_text_qualifier(n)) == Some(true) {
                let head_end = self.cursor.offset();
                self.cursor.next(); // to the 2nd qualifier
                return self.quoted_cell_with_escape(start, head_end);
            }

            // Closing qualifier.
            let end = self.cursor.offset();
            self.handler.cell(self.cursor.str_slice(start, end), false);
            self.cursor.next();
            self.cursor.skip_blanks();
            return Ok(());
        }

        Err(ParseError::new(
            "stream ended prematurely while parsing quoted cell",
            self.cursor.offset(),
        ))
    }

    /// Continue a quoted cell after the first escaped qualifier; the value
    /// is accumulated in the scratch buffer and emitted as transient.
    fn quoted_cell_with_escape(&mut self, head_start: usize, head_end: usize) -> Result<()> {
        self.cell_buf.reset();
        let head = self.cursor.slice(head_start, head_end + 1);
        self.cell_buf.append(head); // includes one of the two qualifiers

        self.cursor.next(); // past the 2nd qualifier
        let mut seg_start = self.cursor.offset();
        while self.cursor.has_char() {
            let c = self.cursor.current();
            if !self.is_text_qualifier(c) {
                self.cursor.next();
                continue;
            }

            if self.cursor.peek(1).map(|n| self.is_text_qualifier(n)) == Some(true) {
                // Another doubled qualifier: flush the segment plus a single
                // literal qualifier, then continue after the pair.
                let seg_end = self.cursor.offset();
                let seg = self.cursor.slice(seg_start, seg_end + 1);
                self.cell_buf.append(seg);
                self.cursor.next();
                self.cursor.next();
                seg_start = self.cursor.offset();
                continue;
            }

            // Closing qualifier: flush the remaining segment and emit.
            let seg_end = self.cursor.offset();
            let seg = self.cursor.slice(seg_start, seg_end);
            self.cell_buf.append(seg);
            self.handler.cell(self.cell_buf.as_str(), true);
            self.cursor.next();
            self.cursor.skip_blanks();
            return Ok(());
        }

        Err(ParseError::new(
            "stream ended prematurely while parsing quoted cell",
            self.cursor.offset(),
        ))
    }

    /// Emit an unquoted cell value, applying the trim option.
    fn push_cell_value(&mut self, start: usize, end: usize) {
        let mut value = self.cursor.str_slice(start, end);
        if self.config.trim_cell_value {
            value = value.trim_matches([' ', '\t']);
        }
        self.handler.cell(value, false);
    }
}
