//! Styles import builder.
//!
//! Each substructure gets a dedicated sub-builder with setters followed by
//! `commit`, which appends to the corresponding flyweight store and returns
//! the new index. Named styles are referenced by name and their commit
//! returns nothing.

use crate::document::Document;
use crate::styles::{
    Border, BorderAttrs, CellFormat, CellStyle, Fill, Font, NumberFormat, Protection,
};
use crate::types::{
    BorderDirection, BorderStyle, Color, FillPattern, HorAlignment, StrikethroughStyle,
    UnderlineStyle, VerAlignment,
};

/// Which script class a font attribute applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontScript {
    Western,
    Asian,
    Complex,
}

/// Which of the three cell-format tables an xf builder commits into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XfKind {
    /// Referenced by cells through per-sheet format indices.
    Cell,
    /// Referenced by named styles.
    CellStyle,
    /// Differential formats layered by conditional formatting.
    Differential,
}

/// Import-side interface over the styles pools.
pub struct ImportStyles<'a> {
    doc: &'a mut Document,
}

impl<'a> ImportStyles<'a> {
    pub(crate) fn new(doc: &'a mut Document) -> Self {
        Self { doc }
    }

    pub fn font(&mut self) -> FontBuilder<'_> {
        FontBuilder {
            doc: self.doc,
            buffer: Font::default(),
        }
    }

    pub fn fill(&mut self) -> FillBuilder<'_> {
        FillBuilder {
            doc: self.doc,
            buffer: Fill::default(),
        }
    }

    pub fn border(&mut self) -> BorderBuilder<'_> {
        BorderBuilder {
            doc: self.doc,
            buffer: Border::default(),
        }
    }

    pub fn protection(&mut self) -> ProtectionBuilder<'_> {
        ProtectionBuilder {
            doc: self.doc,
            buffer: Protection::default(),
        }
    }

    pub fn number_format(&mut self) -> NumberFormatBuilder<'_> {
        NumberFormatBuilder {
            doc: self.doc,
            buffer: NumberFormat::default(),
        }
    }

    pub fn xf(&mut self, kind: XfKind) -> XfBuilder<'_> {
        XfBuilder {
            doc: self.doc,
            kind,
            buffer: CellFormat::default(),
        }
    }

    pub fn cell_style(&mut self) -> CellStyleBuilder<'_> {
        CellStyleBuilder {
            doc: self.doc,
            buffer: CellStyle::default(),
        }
    }
}

/// Buffer-then-commit builder for fonts.
pub struct FontBuilder<'a> {
    doc: &'a mut Document,
    buffer: Font,
}

impl FontBuilder<'_> {
    pub fn set_name(&mut self, script: FontScript, name: &str) {
        self.script_attrs(script).name = Some(name.to_string());
    }

    pub fn set_size(&mut self, script: FontScript, point: f64) {
        self.script_attrs(script).size = Some(point);
    }

    pub fn set_bold(&mut self, script: FontScript, bold: bool) {
        self.script_attrs(script).bold = Some(bold);
    }

    pub fn set_italic(&mut self, script: FontScript, italic: bool) {
        self.script_attrs(script).italic = Some(italic);
    }

    pub fn set_color(&mut self, color: Color) {
        self.buffer.color = Some(color);
    }

    pub fn set_underline_style(&mut self, style: UnderlineStyle) {
        self.buffer.underline_style = style;
    }

    pub fn set_underline_color(&mut self, color: Color) {
        self.buffer.underline_color = Some(color);
    }

    pub fn set_strikethrough_style(&mut self, style: StrikethroughStyle) {
        self.buffer.strikethrough_style = style;
    }

    fn script_attrs(&mut self, script: FontScript) -> &mut crate::styles::FontScriptAttrs {
        match script {
            FontScript::Western => &mut self.buffer.western,
            FontScript::Asian => &mut self.buffer.asian,
            FontScript::Complex => &mut self.buffer.complex,
        }
    }

    pub fn commit(self) -> usize {
        self.doc.styles_mut().append_font(self.buffer)
    }
}

/// Buffer-then-commit builder for fills.
pub struct FillBuilder<'a> {
    doc: &'a mut Document,
    buffer: Fill,
}

impl FillBuilder<'_> {
    pub fn set_pattern_type(&mut self, pattern: FillPattern) {
        self.buffer.pattern_type = pattern;
    }

    pub fn set_fg_color(&mut self, color: Color) {
        self.buffer.fg_color = Some(color);
    }

    pub fn set_bg_color(&mut self, color: Color) {
        self.buffer.bg_color = Some(color);
    }

    pub fn commit(self) -> usize {
        self.doc.styles_mut().append_fill(self.buffer)
    }
}

/// Buffer-then-commit builder for borders.
pub struct BorderBuilder<'a> {
    doc: &'a mut Document,
    buffer: Border,
}

impl BorderBuilder<'_> {
    pub fn set_style(&mut self, dir: BorderDirection, style: BorderStyle) {
        if let Some(attrs) = self.attrs(dir) {
            attrs.style = style;
        }
    }

    pub fn set_color(&mut self, dir: BorderDirection, color: Color) {
        if let Some(attrs) = self.attrs(dir) {
            attrs.color = Some(color);
        }
    }

    pub fn set_width(&mut self, dir: BorderDirection, width: f64) {
        if let Some(attrs) = self.attrs(dir) {
            attrs.width = Some(width);
        }
    }

    fn attrs(&mut self, dir: BorderDirection) -> Option<&mut BorderAttrs> {
        match dir {
            BorderDirection::Top => Some(&mut self.buffer.top),
            BorderDirection::Bottom => Some(&mut self.buffer.bottom),
            BorderDirection::Left => Some(&mut self.buffer.left),
            BorderDirection::Right => Some(&mut self.buffer.right),
            BorderDirection::Diagonal => Some(&mut self.buffer.diagonal),
            BorderDirection::DiagonalBlTr => Some(&mut self.buffer.diagonal_bl_tr),
            BorderDirection::DiagonalTlBr => Some(&mut self.buffer.diagonal_tl_br),
            BorderDirection::Unknown => None,
        }
    }

    pub fn commit(self) -> usize {
        self.doc.styles_mut().append_border(self.buffer)
    }
}

/// Buffer-then-commit builder for protection attributes.
pub struct ProtectionBuilder<'a> {
    doc: &'a mut Document,
    buffer: Protection,
}

impl ProtectionBuilder<'_> {
    pub fn set_locked(&mut self, locked: bool) {
        self.buffer.locked = locked;
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.buffer.hidden = hidden;
    }

    pub fn set_print_content(&mut self, print: bool) {
        self.buffer.print_content = print;
    }

    pub fn set_formula_hidden(&mut self, hidden: bool) {
        self.buffer.formula_hidden = hidden;
    }

    pub fn commit(self) -> usize {
        self.doc.styles_mut().append_protection(self.buffer)
    }
}

/// Buffer-then-commit builder for number formats.
pub struct NumberFormatBuilder<'a> {
    doc: &'a mut Document,
    buffer: NumberFormat,
}

impl NumberFormatBuilder<'_> {
    pub fn set_identifier(&mut self, id: usize) {
        self.buffer.identifier = Some(id);
    }

    pub fn set_code(&mut self, code: &str) {
        self.buffer.format_string = Some(code.to_string());
    }

    pub fn commit(self) -> usize {
        self.doc.styles_mut().append_number_format(self.buffer)
    }
}

/// Buffer-then-commit builder for cell formats (any of the three tables).
pub struct XfBuilder<'a> {
    doc: &'a mut Document,
    kind: XfKind,
    buffer: CellFormat,
}

impl XfBuilder<'_> {
    pub fn set_font(&mut self, index: usize) {
        self.buffer.font = index;
        self.buffer.apply_font = true;
    }

    pub fn set_fill(&mut self, index: usize) {
        self.buffer.fill = index;
        self.buffer.apply_fill = true;
    }

    pub fn set_border(&mut self, index: usize) {
        self.buffer.border = index;
        self.buffer.apply_border = true;
    }

    pub fn set_protection(&mut self, index: usize) {
        self.buffer.protection = index;
        self.buffer.apply_protection = true;
    }

    pub fn set_number_format(&mut self, index: usize) {
        self.buffer.number_format = index;
        self.buffer.apply_num_format = true;
    }

    /// Point a cell format at the named style's base format it inherits
    /// from.
    pub fn set_style_xf(&mut self, index: usize) {
        self.buffer.style_xf = Some(index);
    }

    pub fn set_horizontal_alignment(&mut self, align: HorAlignment) {
        self.buffer.hor_align = align;
        self.buffer.apply_alignment = true;
    }

    pub fn set_vertical_alignment(&mut self, align: VerAlignment) {
        self.buffer.ver_align = align;
        self.buffer.apply_alignment = true;
    }

    pub fn set_wrap_text(&mut self, wrap: bool) {
        self.buffer.wrap_text = Some(wrap);
    }

    pub fn set_shrink_to_fit(&mut self, shrink: bool) {
        self.buffer.shrink_to_fit = Some(shrink);
    }

    pub fn commit(self) -> usize {
        let styles = self.doc.styles_mut();
        match self.kind {
            XfKind::Cell => styles.append_cell_format(self.buffer),
            XfKind::CellStyle => styles.append_cell_style_format(self.buffer),
            XfKind::Differential => styles.append_diff_cell_format(self.buffer),
        }
    }
}

/// Buffer-then-commit builder for named cell styles.
pub struct CellStyleBuilder<'a> {
    doc: &'a mut Document,
    buffer: CellStyle,
}

impl CellStyleBuilder<'_> {
    pub fn set_name(&mut self, name: &str) {
        self.buffer.name = name.to_string();
    }

    pub fn set_display_name(&mut self, name: &str) {
        self.buffer.display_name = Some(name.to_string());
    }

    pub fn set_parent_name(&mut self, name: &str) {
        self.buffer.parent_name = Some(name.to_string());
    }

    pub fn set_xf(&mut self, index: usize) {
        self.buffer.xf = index;
    }

    pub fn set_builtin(&mut self, code: usize) {
        self.buffer.builtin = Some(code);
    }

    /// Named styles are referenced by name; commit returns no index.
    pub fn commit(self) {
        self.doc.styles_mut().append_cell_style(self.buffer);
    }
}
