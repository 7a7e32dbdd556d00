//! Import filter construction.
//!
//! A filter is the thin driver connecting one input format to the import
//! factory. The CSV driver ships in this crate; the ZIP-based and binary
//! format drivers are external, and requesting one returns an explicit
//! not-enabled error.

use std::path::Path;

use gridstream_core::error::{Error, Result};
use gridstream_core::import::ImportFactory;
use gridstream_core::types::Format;

use crate::csv_import::CsvImportFilter;

/// Per-import configuration carried by a filter.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    /// CSV-specific knobs.
    pub csv: CsvImportConfig,
    /// Emit diagnostic output to stderr while importing.
    pub debug: bool,
}

/// CSV driver configuration.
#[derive(Debug, Clone)]
pub struct CsvImportConfig {
    /// Number of header rows replicated onto continuation sheets when a
    /// long stream is split.
    pub header_row_size: usize,
    /// Split input across multiple sheets when it exceeds the sheet row
    /// count; without this the import stops at the first full sheet.
    pub split_to_multiple_sheets: bool,
}

impl Default for CsvImportConfig {
    fn default() -> Self {
        Self {
            header_row_size: 0,
            split_to_multiple_sheets: false,
        }
    }
}

/// A format driver: reads one document into the factory it was created
/// over.
pub trait ImportFilter {
    /// Read and import a file from a filesystem path.
    fn read_file(&mut self, path: &Path) -> Result<()>;

    /// Import an already-loaded byte stream.
    fn read_stream(&mut self, stream: &[u8]) -> Result<()>;

    /// Short name of the filter (its format tag).
    fn name(&self) -> &'static str;
}

/// Create a filter for a format over an import factory.
///
/// # Errors
///
/// Returns a not-supported error for formats whose drivers are not part of
/// this build.
pub fn create_filter<'a>(
    format: Format,
    factory: ImportFactory<'a>,
    config: FilterConfig,
) -> Result<Box<dyn ImportFilter + 'a>> {
    match format {
        Format::Csv => Ok(Box::new(CsvImportFilter::new(factory, config))),
        other => Err(Error::NotSupported(format!(
            "filter for format '{other}' is not enabled in this build"
        ))),
    }
}
