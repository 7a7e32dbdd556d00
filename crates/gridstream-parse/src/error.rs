//! Error type shared by all streaming parsers.
//!
//! A [`ParseError`] carries the byte offset at which the input stopped making
//! sense, so callers can map it back to a line and column via
//! [`crate::cursor::Cursor::line_and_column`].

use thiserror::Error;

/// A failure encountered while parsing a textual stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (offset: {offset})")]
pub struct ParseError {
    /// Short description of the grammar violation.
    pub message: String,
    /// 0-based byte offset into the input where the error was detected.
    pub offset: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }

    /// Build an error whose message embeds the offending character.
    pub fn with_char(prefix: &str, c: char, suffix: &str, offset: usize) -> Self {
        Self {
            message: format!("{prefix}'{c}'{suffix}"),
            offset,
        }
    }
}

/// A convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new("unexpected token", 42);
        assert_eq!(err.to_string(), "unexpected token (offset: 42)");
    }

    #[test]
    fn test_parse_error_with_char() {
        let err = ParseError::with_char("value: failed to parse ", 'x', ".", 7);
        assert_eq!(err.to_string(), "value: failed to parse 'x'. (offset: 7)");
    }
}
