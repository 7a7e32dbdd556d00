//! gridstream-parse: Low-level streaming parsers for textual spreadsheet inputs.
//!
//! Each parser walks a fully materialized byte buffer and emits typed events
//! to a caller-supplied handler. Event payloads are zero-copy slices into the
//! input wherever possible; when a value had to be decoded (escaped CSV
//! qualifiers, JSON `\uXXXX` sequences, XML entities) the payload instead
//! aliases the parser's scratch buffer and is flagged *transient*, meaning it
//! is only valid for the duration of the callback.

pub mod cursor;
pub mod csv;
pub mod error;
pub mod json;
pub mod namespace;
pub mod pool;
pub mod xml;

pub use cursor::Cursor;
pub use error::{ParseError, Result};
pub use pool::{InternedStr, StringPool};
