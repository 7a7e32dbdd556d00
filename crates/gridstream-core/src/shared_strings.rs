//! Shared string table with rich-text format runs.
//!
//! String cells store an opaque [`StringId`]; this table maps identifiers
//! back to text and carries the per-string format-run arrays used for
//! rich-text content. Storage goes through the process-lifetime string pool
//! so returned views stay stable for the life of the document.

use std::collections::HashMap;

use gridstream_parse::pool::{InternedStr, StringPool};

use crate::types::{Color, StringId};

/// One formatted segment of a rich-text string.
///
/// Runs are ordered by position and do not overlap.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormatRun {
    /// Character position the run starts at.
    pub pos: usize,
    /// Number of characters the run covers.
    pub size: usize,
    pub font: Option<String>,
    pub font_size: Option<f64>,
    pub color: Option<Color>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
}

impl FormatRun {
    /// True when the run carries at least one formatting attribute.
    pub fn formatted(&self) -> bool {
        self.font.is_some()
            || self.font_size.is_some()
            || self.color.is_some()
            || self.bold.is_some()
            || self.italic.is_some()
    }
}

/// De-duplicated string table handing out stable identifiers.
#[derive(Debug, Default)]
pub struct SharedStrings {
    pool: StringPool,
    strings: Vec<InternedStr>,
    index_map: HashMap<InternedStr, StringId>,
    format_runs: HashMap<StringId, Vec<FormatRun>>,
}

impl SharedStrings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a string unconditionally, returning its new identifier.
    ///
    /// Used when the caller knows the string is not yet in the table; the
    /// insertion order determines the identifier values.
    pub fn append(&mut self, s: &str) -> StringId {
        let (interned, _) = self.pool.intern(s);
        let id = self.strings.len() as StringId;
        self.index_map.entry(interned.clone()).or_insert(id);
        self.strings.push(interned);
        id
    }

    /// Add a string, returning the existing identifier when one exists.
    pub fn add(&mut self, s: &str) -> StringId {
        if let Some(&id) = self.index_map.get(s) {
            return id;
        }
        self.append(s)
    }

    /// Look up an identifier without inserting.
    pub fn find(&self, s: &str) -> Option<StringId> {
        self.index_map.get(s).copied()
    }

    /// The text for an identifier.
    pub fn get(&self, id: StringId) -> Option<&str> {
        self.strings.get(id as usize).map(|s| &**s)
    }

    /// Number of strings in the table.
    pub fn count(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Attach format runs to an already-interned string.
    pub fn set_format_runs(&mut self, id: StringId, runs: Vec<FormatRun>) {
        self.format_runs.insert(id, runs);
    }

    pub fn get_format_runs(&self, id: StringId) -> Option<&[FormatRun]> {
        self.format_runs.get(&id).map(Vec::as_slice)
    }

    /// Drop every string and format run.
    pub fn clear(&mut self) {
        self.pool.clear();
        self.strings.clear();
        self.index_map.clear();
        self.format_runs.clear();
    }
}
