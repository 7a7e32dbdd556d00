//! Shared strings import builder.
//!
//! Plain strings go in through [`ImportSharedStrings::append`] and
//! [`ImportSharedStrings::add`]. Rich-text strings are built statefully:
//! segment format setters, then `append_segment`, repeated per run, and a
//! final `commit_segments` that stores the assembled string and its format
//! runs.

use crate::document::Document;
use crate::shared_strings::FormatRun;
use crate::types::{Color, StringId};

/// Rich-text assembly state, owned by the factory so it survives between
/// builder acquisitions.
#[derive(Debug, Default)]
pub struct SegmentState {
    buffer: String,
    runs: Vec<FormatRun>,
    current: FormatRun,
}

/// Import-side interface over the shared string table.
pub struct ImportSharedStrings<'a> {
    doc: &'a mut Document,
    state: &'a mut SegmentState,
}

impl<'a> ImportSharedStrings<'a> {
    pub(crate) fn new(doc: &'a mut Document, state: &'a mut SegmentState) -> Self {
        Self { doc, state }
    }

    /// Append a string known to be new; insertion order determines ids.
    pub fn append(&mut self, s: &str) -> StringId {
        self.doc.shared_strings_mut().append(s)
    }

    /// Add a string, reusing the existing id when present.
    pub fn add(&mut self, s: &str) -> StringId {
        self.doc.shared_strings_mut().add(s)
    }

    // ===== rich-text segment construction =====

    /// Apply the attributes of a font in the styles pool to the current
    /// segment.
    pub fn set_segment_font(&mut self, font_index: usize) {
        if let Some(font) = self.doc.styles().font(font_index) {
            self.state.current.font = font.western.name.clone();
            self.state.current.font_size = font.western.size;
            self.state.current.bold = font.western.bold;
            self.state.current.italic = font.western.italic;
            self.state.current.color = font.color;
        }
    }

    pub fn set_segment_bold(&mut self, bold: bool) {
        self.state.current.bold = Some(bold);
    }

    pub fn set_segment_italic(&mut self, italic: bool) {
        self.state.current.italic = Some(italic);
    }

    pub fn set_segment_font_name(&mut self, name: &str) {
        self.state.current.font = Some(name.to_string());
    }

    pub fn set_segment_font_size(&mut self, point: f64) {
        self.state.current.font_size = Some(point);
    }

    pub fn set_segment_font_color(&mut self, alpha: u8, red: u8, green: u8, blue: u8) {
        self.state.current.color = Some(Color::new(alpha, red, green, blue));
    }

    /// Append a segment with the current format attributes to the buffer.
    pub fn append_segment(&mut self, s: &str) {
        let pos = self.state.buffer.chars().count();
        let size = s.chars().count();
        let mut run = std::mem::take(&mut self.state.current);
        run.pos = pos;
        run.size = size;
        if run.formatted() {
            self.state.runs.push(run);
        }
        self.state.buffer.push_str(s);
    }

    /// Store the assembled formatted string; an identical existing string
    /// is reused.
    pub fn commit_segments(&mut self) -> StringId {
        let buffer = std::mem::take(&mut self.state.buffer);
        let runs = std::mem::take(&mut self.state.runs);
        self.state.current = FormatRun::default();

        let strings = self.doc.shared_strings_mut();
        let id = strings.add(&buffer);
        if !runs.is_empty() && strings.get_format_runs(id).is_none() {
            strings.set_format_runs(id, runs);
        }
        id
    }

    /// Attach format runs to an already-interned string.
    pub fn set_format_runs(&mut self, id: StringId, runs: Vec<FormatRun>) {
        self.doc.shared_strings_mut().set_format_runs(id, runs);
    }
}
