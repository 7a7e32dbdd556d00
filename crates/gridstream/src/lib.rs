//! gridstream: Spreadsheet document import.
//!
//! Reads spreadsheet-shaped documents (CSV, JSON, XML formats) through
//! streaming event parsers into an in-memory workbook model, and renders
//! deterministic textual dumps for inspection and verification.
//!
//! # Quick start
//!
//! ```
//! use gridstream::{create_filter, detect, FilterConfig, Format, ImportFactory};
//! use gridstream_core::utils::constants::DEFAULT_SHEET_SIZE;
//! use gridstream_core::Document;
//!
//! let content = b"name,score\nalice,10\nbob,20\n";
//! assert_eq!(detect(content), Format::Unknown); // CSV has no magic
//!
//! let mut doc = Document::new(DEFAULT_SHEET_SIZE);
//! {
//!     let factory = ImportFactory::new(&mut doc);
//!     let mut filter = create_filter(Format::Csv, factory, FilterConfig::default()).unwrap();
//!     filter.read_stream(content).unwrap();
//! }
//!
//! let mut check = Vec::new();
//! doc.dump_check(&mut check).unwrap();
//! assert!(String::from_utf8(check).unwrap().contains("data/1/1:numeric:10"));
//! ```

pub mod csv_import;
pub mod detect;
pub mod filter;
pub mod json_import;
pub mod map_tree;
pub mod structure;

pub use csv_import::CsvImportFilter;
pub use detect::detect;
pub use filter::{create_filter, CsvImportConfig, FilterConfig, ImportFilter};
pub use json_import::JsonMapImporter;
pub use map_tree::{CellPosition, MapTree};
pub use structure::{RangeMapper, StructureTree};

// Re-export the model and factory types drivers are written against.
pub use gridstream_core::import::ImportFactory;
pub use gridstream_core::types::{DumpFormat, Format};
pub use gridstream_core::{Document, Error, Result};
