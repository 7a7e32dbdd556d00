//! Error types for the workbook model and import pipeline.
//!
//! Provides the top-level [`Error`] enum covering every failure mode a format
//! driver can see from the import interfaces, plus the crate-wide [`Result`]
//! alias.

use thiserror::Error;

/// The top-level error type for gridstream-core.
#[derive(Error, Debug)]
pub enum Error {
    // ===== Parsing =====
    /// The input stream violates a format grammar.
    #[error("parse error: {0}")]
    Parse(#[from] gridstream_parse::ParseError),

    /// A formula expression could not be compiled.
    #[error("formula error: {0}")]
    Formula(String),

    // ===== Arguments =====
    /// A reference or range string could not be resolved.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // ===== Import-time constraints =====
    /// A structural constraint of the import was violated.
    #[error("structure error: {0}")]
    Structure(String),

    /// Miscellaneous internal invariant violation.
    #[error("general error: {0}")]
    General(String),

    /// The requested format or operation was disabled at build time.
    #[error("not supported: {0}")]
    NotSupported(String),

    // ===== I/O =====
    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_argument() {
        let err = Error::InvalidArgument("bad range 'A0'".to_string());
        assert_eq!(err.to_string(), "invalid argument: bad range 'A0'");
    }

    #[test]
    fn test_error_display_parse() {
        let err: Error = gridstream_parse::ParseError::new("expected a delimiter", 3).into();
        assert_eq!(err.to_string(), "parse error: expected a delimiter (offset: 3)");
    }

    #[test]
    fn test_error_display_not_supported() {
        let err = Error::NotSupported("filter for format 'parquet' is not enabled".to_string());
        assert_eq!(
            err.to_string(),
            "not supported: filter for format 'parquet' is not enabled"
        );
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
