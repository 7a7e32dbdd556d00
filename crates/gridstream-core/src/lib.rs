//! gridstream-core: In-memory workbook model populated through push-style
//! import builders.
//!
//! Format drivers obtain an [`import::ImportFactory`] over a
//! [`document::Document`], feed it values through the capability-based
//! builder interfaces, and call `finalize` when the input is exhausted.
//! Dumpers render the populated model into deterministic textual forms used
//! for verification.

pub mod cell;
pub mod cond_format;
pub mod defined_names;
pub mod document;
pub mod dump;
pub mod error;
pub mod formula;
pub mod import;
pub mod pivot;
pub mod shared_strings;
pub mod sheet;
pub mod styles;
pub mod table;
pub mod types;
pub mod utils;
pub mod view;

pub use document::Document;
pub use error::{Error, Result};
pub use import::ImportFactory;
