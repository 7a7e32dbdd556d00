//! Push-style import builders.
//!
//! A format driver obtains the composite [`ImportFactory`] over a document,
//! then feeds parsed content through the capability-based sub-builders.
//! Every sub-builder follows the buffer-then-commit protocol: setters
//! accumulate into a buffer, and only `commit` writes to the model.

pub mod auto_filter;
pub mod cond_format;
pub mod factory;
pub mod named_exp;
pub mod pivot;
pub mod resolver;
pub mod shared_strings;
pub mod sheet;
pub mod styles;
pub mod table;

pub use auto_filter::{ImportAutoFilter, NodeHandle};
pub use cond_format::ImportCondFormat;
pub use factory::{GlobalSettings, ImportFactory};
pub use named_exp::ImportNamedExpression;
pub use pivot::{ImportPivotCacheDefinition, ImportPivotCacheRecords, ImportPivotFieldGroup};
pub use resolver::ReferenceResolver;
pub use shared_strings::ImportSharedStrings;
pub use sheet::ImportSheet;
pub use styles::ImportStyles;
pub use table::ImportTable;
