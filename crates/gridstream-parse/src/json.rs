//! Event-driven JSON parser.
//!
//! The grammar is JSON as written: the root value must be an array or an
//! object, numbers are validated strictly, and escaped string content
//! (including `\uXXXX` sequences and surrogate pairs) is decoded into the
//! parser's scratch buffer and flagged transient.

use crate::cursor::{CellBuffer, Cursor};
use crate::error::{ParseError, Result};

/// Receiver of JSON parse events. All methods have empty default bodies.
pub trait JsonHandler {
    /// Called when the parsing begins.
    fn begin_parse(&mut self) {}

    /// Called when the parsing ends.
    fn end_parse(&mut self) {}

    /// Called on the opening bracket of an array.
    fn begin_array(&mut self) {}

    /// Called on the closing bracket of an array.
    fn end_array(&mut self) {}

    /// Called on the opening curly brace of an object.
    fn begin_object(&mut self) {}

    /// Called when a key string of an object is encountered.
    fn object_key(&mut self, key: &str, transient: bool) {
        let _ = (key, transient);
    }

    /// Called on the closing curly brace of an object.
    fn end_object(&mut self) {}

    /// Called on a `true` keyword.
    fn boolean_true(&mut self) {}

    /// Called on a `false` keyword.
    fn boolean_false(&mut self) {}

    /// Called on a `null` keyword.
    fn null(&mut self) {}

    /// Called on a string value.
    fn string(&mut self, value: &str, transient: bool) {
        let _ = (value, transient);
    }

    /// Called on a numeric value.
    fn number(&mut self, value: f64) {
        let _ = value;
    }
}

/// Where a decoded string value lives.
enum Span {
    /// Zero-copy slice of the input, as `(start, end)` offsets.
    Input(usize, usize),
    /// The value was decoded into the scratch buffer.
    Scratch,
}

/// Low-level JSON parser, generic over the handler type.
pub struct JsonParser<'a, 'h, H: JsonHandler> {
    cursor: Cursor<'a>,
    handler: &'h mut H,
    cell_buf: CellBuffer,
}

impl<'a, 'h, H: JsonHandler> JsonParser<'a, 'h, H> {
    pub fn new(content: &'a [u8], handler: &'h mut H) -> Self {
        Self {
            cursor: Cursor::new(content),
            handler,
            cell_buf: CellBuffer::new(),
        }
    }

    /// Parse the entire stream.
    ///
    /// # Errors
    ///
    /// Fails when the input violates the JSON grammar; the error offset
    /// points at the violating byte.
    pub fn parse(mut self) -> Result<()> {
        self.handler.begin_parse();

        self.cursor.skip_bom();
        self.cursor.skip_whitespace();
        if !self.cursor.has_char() {
            return Err(self.err("no json content could be found in stream"));
        }
        self.root_value()?;

        self.cursor.skip_whitespace();
        if self.cursor.has_char() {
            return Err(self.err("unexpected trailing content"));
        }

        self.handler.end_parse();
        Ok(())
    }

    fn err(&self, message: &str) -> ParseError {
        ParseError::new(message, self.cursor.offset())
    }

    fn err_char(&self, prefix: &str, suffix: &str) -> ParseError {
        let c = if self.cursor.has_char() {
            self.cursor.current() as char
        } else {
            '\0'
        };
        ParseError::with_char(prefix, c, suffix, self.cursor.offset())
    }

    fn root_value(&mut self) -> Result<()> {
        match self.cursor.current() {
            b'[' => self.array(),
            b'{' => self.object(),
            _ => Err(self.err_char("either '[' or '{' was expected, but ", " was found", )),
        }
    }

    fn value(&mut self) -> Result<()> {
        match self.cursor.current() {
            b'-' | b'0'..=b'9' => self.number(),
            b'[' => self.array(),
            b'{' => self.object(),
            b't' => {
                self.keyword(b"true")?;
                self.handler.boolean_true();
                Ok(())
            }
            b'f' => {
                self.keyword(b"false")?;
                self.handler.boolean_false();
                Ok(())
            }
            b'n' => {
                self.keyword(b"null")?;
                self.handler.null();
                Ok(())
            }
            b'"' => self.string_value(),
            _ => Err(self.err_char("value: failed to parse ", "")),
        }
    }

    fn keyword(&mut self, kw: &[u8]) -> Result<()> {
        for &expected in kw {
            if !self.cursor.has_char() || self.cursor.current() != expected {
                return Err(self.err("invalid literal keyword"));
            }
            self.cursor.next();
        }
        Ok(())
    }

    fn array(&mut self) -> Result<()> {
        self.handler.begin_array();
        self.cursor.next(); // skip '['
        self.cursor.skip_whitespace();

        if !self.cursor.has_char() {
            return Err(self.err("array: stream ended prematurely"));
        }
        if self.cursor.current() == b']' {
            self.handler.end_array();
            self.cursor.next();
            return Ok(());
        }

        loop {
            self.value()?;
            self.cursor.skip_whitespace();
            if !self.cursor.has_char() {
                return Err(self.err("array: closing ']' was never reached"));
            }
            match self.cursor.current() {
                b']' => {
                    self.handler.end_array();
                    self.cursor.next();
                    return Ok(());
                }
                b',' => {
                    self.cursor.next();
                    self.cursor.skip_whitespace();
                    if self.cursor.has_char() && self.cursor.current() == b']' {
                        return Err(self.err_char("array: ']' expected but ", " was found"));
                    }
                    if !self.cursor.has_char() {
                        return Err(self.err("array: stream ended prematurely after ','"));
                    }
                }
                _ => {
                    return Err(self.err_char("array: either ']' or ',' expected, but ", " was found"))
                }
            }
        }
    }

    fn object(&mut self) -> Result<()> {
        self.handler.begin_object();
        self.cursor.next(); // skip '{'
        self.cursor.skip_whitespace();

        if !self.cursor.has_char() {
            return Err(self.err("object: stream ended prematurely before reaching a key"));
        }
        if self.cursor.current() == b'}' {
            self.handler.end_object();
            self.cursor.next();
            return Ok(());
        }

        loop {
            if self.cursor.current() != b'"' {
                return Err(self.err_char("object: '\"' was expected, but ", " was found"));
            }
            let span = self.parse_quoted_string()?;
            match span {
                Span::Input(s, e) => {
                    self.handler.object_key(self.cursor.str_slice(s, e), false);
                }
                Span::Scratch => {
                    self.handler.object_key(self.cell_buf.as_str(), true);
                }
            }

            self.cursor.skip_whitespace();
            if !self.cursor.has_char() || self.cursor.current() != b':' {
                return Err(self.err_char("object: ':' was expected, but ", " was found"));
            }
            self.cursor.next();
            self.cursor.skip_whitespace();
            if !self.cursor.has_char() {
                return Err(self.err("object: stream ended prematurely before reaching a value"));
            }
            self.value()?;

            self.cursor.skip_whitespace();
            if !self.cursor.has_char() {
                return Err(self.err(
                    "object: stream ended prematurely before reaching either '}' or ','",
                ));
            }
            match self.cursor.current() {
                b'}' => {
                    self.handler.end_object();
                    self.cursor.next();
                    return Ok(());
                }
                b',' => {
                    self.cursor.next();
                    self.cursor.skip_whitespace();
                    if self.cursor.has_char() && self.cursor.current() == b'}' {
                        return Err(self.err_char("object: new key expected, but ", " was found"));
                    }
                    if !self.cursor.has_char() {
                        return Err(self.err("object: stream ended prematurely after ','"));
                    }
                }
                _ => {
                    return Err(
                        self.err_char("object: either '}' or ',' expected, but ", " was found")
                    )
                }
            }
        }
    }

    fn string_value(&mut self) -> Result<()> {
        let span = self.parse_quoted_string()?;
        match span {
            Span::Input(s, e) => {
                self.handler.string(self.cursor.str_slice(s, e), false);
            }
            Span::Scratch => {
                self.handler.string(self.cell_buf.as_str(), true);
            }
        }
        Ok(())
    }

    /// Parse a double-quoted JSON string. The cursor is on the opening
    /// quote; on success it is past the closing quote.
    fn parse_quoted_string(&mut self) -> Result<Span> {
        self.cursor.next(); // skip the opening quote
        let start = self.cursor.offset();

        // Fast path: scan for a closing quote with no escapes in between.
        loop {
            if !self.cursor.has_char() {
                return Err(self.err(
                    "string: stream ended prematurely before reaching the closing quote",
                ));
            }
            match self.cursor.current() {
                b'"' => {
                    let end = self.cursor.offset();
                    self.cursor.next();
                    return Ok(Span::Input(start, end));
                }
                b'\\' => break,
                _ => self.cursor.next(),
            }
        }

        // Slow path: decode into the scratch buffer.
        self.cell_buf.reset();
        let head = self.cursor.slice(start, self.cursor.offset());
        self.cell_buf.append(head);

        loop {
            if !self.cursor.has_char() {
                return Err(self.err(
                    "string: stream ended prematurely before reaching the closing quote",
                ));
            }
            match self.cursor.current() {
                b'"' => {
                    self.cursor.next();
                    return Ok(Span::Scratch);
                }
                b'\\' => {
                    self.cursor.next();
                    self.decode_escape()?;
                }
                _ => {
                    let seg_start = self.cursor.offset();
                    while self.cursor.has_char() {
                        let c = self.cursor.current();
                        if c == b'"' || c == b'\\' {
                            break;
                        }
                        self.cursor.next();
                    }
                    let seg = self.cursor.slice(seg_start, self.cursor.offset());
                    self.cell_buf.append(seg);
                }
            }
        }
    }

    /// Decode one escape sequence following a backslash into the scratch
    /// buffer.
    fn decode_escape(&mut self) -> Result<()> {
        if !self.cursor.has_char() {
            return Err(self.err("string: stream ended prematurely in an escape sequence"));
        }
        let c = self.cursor.current();
        self.cursor.next();
        match c {
            b'"' => self.cell_buf.append(b"\""),
            b'\\' => self.cell_buf.append(b"\\"),
            b'/' => self.cell_buf.append(b"/"),
            b'b' => self.cell_buf.append(b"\x08"),
            b'f' => self.cell_buf.append(b"\x0c"),
            b'n' => self.cell_buf.append(b"\n"),
            b'r' => self.cell_buf.append(b"\r"),
            b't' => self.cell_buf.append(b"\t"),
            b'u' => {
                let decoded = self.decode_unicode_escape()?;
                self.cell_buf.push_char(decoded);
            }
            _ => {
                return Err(ParseError::with_char(
                    "string: illegal escape character ",
                    c as char,
                    "",
                    self.cursor.offset().saturating_sub(1),
                ));
            }
        }
        Ok(())
    }

    /// Decode a `\uXXXX` code unit, combining a UTF-16 surrogate pair when
    /// one follows.
    fn decode_unicode_escape(&mut self) -> Result<char> {
        let high = self.hex4()?;
        if (0xd800..0xdc00).contains(&high) {
            // High surrogate: a low surrogate escape must follow.
            if self.cursor.peek(0) != Some(b'\\') || self.cursor.peek(1) != Some(b'u') {
                return Err(self.err("string: unpaired UTF-16 high surrogate"));
            }
            self.cursor.next();
            self.cursor.next();
            let low = self.hex4()?;
            if !(0xdc00..0xe000).contains(&low) {
                return Err(self.err("string: invalid UTF-16 low surrogate"));
            }
            let combined = 0x10000 + ((high - 0xd800) << 10) + (low - 0xdc00);
            char::from_u32(combined).ok_or_else(|| self.err("string: invalid code point"))
        } else if (0xdc00..0xe000).contains(&high) {
            Err(self.err("string: unpaired UTF-16 low surrogate"))
        } else {
            char::from_u32(high).ok_or_else(|| self.err("string: invalid code point"))
        }
    }

    fn hex4(&mut self) -> Result<u32> {
        let mut v: u32 = 0;
        for _ in 0..4 {
            if !self.cursor.has_char() {
                return Err(self.err("string: stream ended prematurely in a unicode escape"));
            }
            let c = self.cursor.current();
            let digit = match c {
                b'0'..=b'9' => u32::from(c - b'0'),
                b'a'..=b'f' => u32::from(c - b'a') + 10,
                b'A'..=b'F' => u32::from(c - b'A') + 10,
                _ => return Err(self.err_char("string: invalid hex digit ", "")),
            };
            v = v * 16 + digit;
            self.cursor.next();
        }
        Ok(v)
    }

    /// Parse a number, validating the strict JSON grammar before converting.
    fn number(&mut self) -> Result<()> {
        let start = self.cursor.offset();

        if self.cursor.current() == b'-' {
            self.cursor.next();
        }

        // Integer part: a single zero, or a nonzero digit followed by any
        // number of digits.
        match self.cursor.peek(0) {
            Some(b'0') => self.cursor.next(),
            Some(b'1'..=b'9') => {
                while self.cursor.has_char() && self.cursor.current().is_ascii_digit() {
                    self.cursor.next();
                }
            }
            _ => return Err(self.err("number: expected a digit")),
        }

        // Fractional part.
        if self.cursor.peek(0) == Some(b'.') {
            self.cursor.next();
            if !self.cursor.has_char() || !self.cursor.current().is_ascii_digit() {
                return Err(self.err("number: expected a digit after '.'"));
            }
            while self.cursor.has_char() && self.cursor.current().is_ascii_digit() {
                self.cursor.next();
            }
        }

        // Exponent part.
        if matches!(self.cursor.peek(0), Some(b'e') | Some(b'E')) {
            self.cursor.next();
            if matches!(self.cursor.peek(0), Some(b'+') | Some(b'-')) {
                self.cursor.next();
            }
            if !self.cursor.has_char() || !self.cursor.current().is_ascii_digit() {
                return Err(self.err("number: expected a digit in the exponent"));
            }
            while self.cursor.has_char() && self.cursor.current().is_ascii_digit() {
                self.cursor.next();
            }
        }

        let text = self.cursor.slice(start, self.cursor.offset());
        let value = fast_float2::parse::<f64, _>(text)
            .map_err(|_| ParseError::new("invalid numeric value", start))?;
        self.handler.number(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl JsonHandler for Recorder {
        fn begin_parse(&mut self) {
            self.events.push("begin".into());
        }
        fn end_parse(&mut self) {
            self.events.push("end".into());
        }
        fn begin_array(&mut self) {
            self.events.push("[".into());
        }
        fn end_array(&mut self) {
            self.events.push("]".into());
        }
        fn begin_object(&mut self) {
            self.events.push("{".into());
        }
        fn end_object(&mut self) {
            self.events.push("}".into());
        }
        fn object_key(&mut self, key: &str, transient: bool) {
            self.events
                .push(format!("key[{key}]{}", if transient { "*" } else { "" }));
        }
        fn boolean_true(&mut self) {
            self.events.push("true".into());
        }
        fn boolean_false(&mut self) {
            self.events.push("false".into());
        }
        fn null(&mut self) {
            self.events.push("null".into());
        }
        fn string(&mut self, value: &str, transient: bool) {
            self.events
                .push(format!("str[{value}]{}", if transient { "*" } else { "" }));
        }
        fn number(&mut self, value: f64) {
            self.events.push(format!("num[{value}]"));
        }
    }

    fn parse(input: &str) -> Result<Vec<String>> {
        let mut rec = Recorder::default();
        JsonParser::new(input.as_bytes(), &mut rec).parse()?;
        Ok(rec.events)
    }

    #[test]
    fn test_json_array_of_scalars() {
        let events = parse(r#"[1, "two", true, false, null]"#).unwrap();
        assert_eq!(
            events,
            vec![
                "begin", "[", "num[1]", "str[two]", "true", "false", "null", "]", "end"
            ]
        );
    }

    #[test]
    fn test_json_nested_object() {
        let events = parse(r#"{"a": {"b": [1.5]}}"#).unwrap();
        assert_eq!(
            events,
            vec![
                "begin", "{", "key[a]", "{", "key[b]", "[", "num[1.5]", "]", "}", "}", "end"
            ]
        );
    }

    #[test]
    fn test_json_root_value_rejected() {
        let err = parse("42").unwrap_err();
        assert!(err.message.contains("either '[' or '{' was expected"));
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn test_json_trailing_content_rejected() {
        let err = parse("[1] [2]").unwrap_err();
        assert_eq!(err.message, "unexpected trailing content");
    }

    #[test]
    fn test_json_trailing_comma_rejected() {
        assert!(parse("[1, 2,]").is_err());
        assert!(parse(r#"{"a": 1,}"#).is_err());
    }

    #[test]
    fn test_json_unterminated_string() {
        let err = parse(r#"["abc"#).unwrap_err();
        assert!(err.message.contains("closing quote"));
    }

    #[test]
    fn test_json_illegal_escape() {
        let err = parse(r#"["a\qb"]"#).unwrap_err();
        assert!(err.message.contains("illegal escape character"));
    }

    #[test]
    fn test_json_escaped_string_is_transient() {
        let events = parse(r#"["a\nb"]"#).unwrap();
        assert_eq!(events, vec!["begin", "[", "str[a\nb]*", "]", "end"]);
    }

    #[test]
    fn test_json_unicode_escape() {
        let events = parse(r#"["\u00e9\ud83d\ude00"]"#).unwrap();
        assert_eq!(
            events,
            vec!["begin", "[", "str[\u{e9}\u{1f600}]*", "]", "end"]
        );
    }

    #[test]
    fn test_json_unpaired_surrogate_rejected() {
        assert!(parse(r#"["\ud83d"]"#).is_err());
    }

    #[test]
    fn test_json_plain_string_is_zero_copy() {
        let events = parse(r#"["plain"]"#).unwrap();
        assert_eq!(events, vec!["begin", "[", "str[plain]", "]", "end"]);
    }

    #[test]
    fn test_json_strict_numbers() {
        assert!(parse("[01]").is_err());
        assert!(parse("[1.]").is_err());
        assert!(parse("[.5]").is_err());
        assert!(parse("[1e]").is_err());
        assert!(parse("[+1]").is_err());
        let events = parse("[-0.5e+2]").unwrap();
        assert_eq!(events, vec!["begin", "[", "num[-50]", "]", "end"]);
    }

    #[test]
    fn test_json_empty_containers() {
        assert_eq!(parse("[]").unwrap(), vec!["begin", "[", "]", "end"]);
        assert_eq!(parse("{}").unwrap(), vec!["begin", "{", "}", "end"]);
    }

    #[test]
    fn test_json_empty_input() {
        assert!(parse("  ").is_err());
    }
}
