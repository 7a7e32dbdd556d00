//! Flyweight stores for cell formatting.
//!
//! Every substructure (font, fill, border, protection, number format, cell
//! format, named style) lives in its own store returning stable indices in
//! insertion order. Index 0 of each store is the default entry, installed
//! at construction before anything else can be appended.
//!
//! Three cell-format tables coexist: *cell-style formats* referenced by
//! named styles, *cell formats* referenced by sheet positions, and
//! *differential formats* layered on top of base formats by conditional
//! formatting.

use crate::types::{
    BorderStyle, Color, FillPattern, HorAlignment, StrikethroughStyle, UnderlineStyle,
    VerAlignment,
};

/// Name/size/bold/italic attributes for one script class.
///
/// The western attributes are the fallback for the asian and complex script
/// classes when those are unset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FontScriptAttrs {
    pub name: Option<String>,
    pub size: Option<f64>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
}

/// Font description.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Font {
    pub western: FontScriptAttrs,
    pub asian: FontScriptAttrs,
    pub complex: FontScriptAttrs,
    pub underline_style: UnderlineStyle,
    pub underline_color: Option<Color>,
    pub strikethrough_style: StrikethroughStyle,
    pub color: Option<Color>,
}

impl Font {
    /// Effective font name, falling back from asian/complex to western.
    pub fn effective_name(&self) -> Option<&str> {
        self.western.name.as_deref()
    }
}

/// Fill description.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fill {
    pub pattern_type: FillPattern,
    pub fg_color: Option<Color>,
    pub bg_color: Option<Color>,
}

/// Style attributes of a single border edge.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BorderAttrs {
    pub style: BorderStyle,
    pub color: Option<Color>,
    pub width: Option<f64>,
}

/// Borders of a cell, one attribute set per direction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Border {
    pub top: BorderAttrs,
    pub bottom: BorderAttrs,
    pub left: BorderAttrs,
    pub right: BorderAttrs,
    pub diagonal: BorderAttrs,
    pub diagonal_bl_tr: BorderAttrs,
    pub diagonal_tl_br: BorderAttrs,
}

/// Cell protection attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Protection {
    pub locked: bool,
    pub hidden: bool,
    pub print_content: bool,
    pub formula_hidden: bool,
}

/// Number format: either a built-in identifier or an explicit format code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NumberFormat {
    pub identifier: Option<usize>,
    pub format_string: Option<String>,
}

/// Cell format attributes (an "xf" entry).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellFormat {
    pub font: usize,
    pub fill: usize,
    pub border: usize,
    pub protection: usize,
    pub number_format: usize,
    /// Index into the cell-style format table this format inherits from.
    /// Only meaningful for entries of the cell format table.
    pub style_xf: Option<usize>,
    pub hor_align: HorAlignment,
    pub ver_align: VerAlignment,
    pub wrap_text: Option<bool>,
    pub shrink_to_fit: Option<bool>,
    pub apply_num_format: bool,
    pub apply_font: bool,
    pub apply_fill: bool,
    pub apply_border: bool,
    pub apply_alignment: bool,
    pub apply_protection: bool,
}

/// A named cell style, referenced by name rather than by index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellStyle {
    pub name: String,
    pub display_name: Option<String>,
    pub parent_name: Option<String>,
    /// Index into the cell-style format table.
    pub xf: usize,
    pub builtin: Option<usize>,
}

/// The style stores of a document.
#[derive(Debug)]
pub struct Styles {
    fonts: Vec<Font>,
    fills: Vec<Fill>,
    borders: Vec<Border>,
    protections: Vec<Protection>,
    number_formats: Vec<NumberFormat>,
    cell_style_formats: Vec<CellFormat>,
    cell_formats: Vec<CellFormat>,
    diff_formats: Vec<CellFormat>,
    cell_styles: Vec<CellStyle>,
}

impl Styles {
    /// Create the stores with their default (index 0) entries populated.
    pub fn new() -> Self {
        Self {
            fonts: vec![Font::default()],
            fills: vec![Fill::default()],
            borders: vec![Border::default()],
            protections: vec![Protection::default()],
            number_formats: vec![NumberFormat::default()],
            cell_style_formats: vec![CellFormat::default()],
            cell_formats: vec![CellFormat::default()],
            diff_formats: vec![CellFormat::default()],
            cell_styles: vec![CellStyle::default()],
        }
    }

    // ===== append (indices are sequential in insertion order) =====

    pub fn append_font(&mut self, font: Font) -> usize {
        self.fonts.push(font);
        self.fonts.len() - 1
    }

    pub fn append_fill(&mut self, fill: Fill) -> usize {
        self.fills.push(fill);
        self.fills.len() - 1
    }

    pub fn append_border(&mut self, border: Border) -> usize {
        self.borders.push(border);
        self.borders.len() - 1
    }

    pub fn append_protection(&mut self, protection: Protection) -> usize {
        self.protections.push(protection);
        self.protections.len() - 1
    }

    pub fn append_number_format(&mut self, nf: NumberFormat) -> usize {
        self.number_formats.push(nf);
        self.number_formats.len() - 1
    }

    pub fn append_cell_style_format(&mut self, cf: CellFormat) -> usize {
        self.cell_style_formats.push(cf);
        self.cell_style_formats.len() - 1
    }

    pub fn append_cell_format(&mut self, cf: CellFormat) -> usize {
        self.cell_formats.push(cf);
        self.cell_formats.len() - 1
    }

    pub fn append_diff_cell_format(&mut self, cf: CellFormat) -> usize {
        self.diff_formats.push(cf);
        self.diff_formats.len() - 1
    }

    pub fn append_cell_style(&mut self, cs: CellStyle) -> usize {
        self.cell_styles.push(cs);
        self.cell_styles.len() - 1
    }

    // ===== getters =====

    pub fn font(&self, index: usize) -> Option<&Font> {
        self.fonts.get(index)
    }

    pub fn fill(&self, index: usize) -> Option<&Fill> {
        self.fills.get(index)
    }

    pub fn border(&self, index: usize) -> Option<&Border> {
        self.borders.get(index)
    }

    pub fn protection(&self, index: usize) -> Option<&Protection> {
        self.protections.get(index)
    }

    pub fn number_format(&self, index: usize) -> Option<&NumberFormat> {
        self.number_formats.get(index)
    }

    pub fn cell_style_format(&self, index: usize) -> Option<&CellFormat> {
        self.cell_style_formats.get(index)
    }

    pub fn cell_format(&self, index: usize) -> Option<&CellFormat> {
        self.cell_formats.get(index)
    }

    pub fn diff_cell_format(&self, index: usize) -> Option<&CellFormat> {
        self.diff_formats.get(index)
    }

    pub fn cell_style(&self, index: usize) -> Option<&CellStyle> {
        self.cell_styles.get(index)
    }

    pub fn cell_style_by_name(&self, name: &str) -> Option<&CellStyle> {
        self.cell_styles.iter().find(|cs| cs.name == name)
    }

    // ===== counts =====

    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }

    pub fn fill_count(&self) -> usize {
        self.fills.len()
    }

    pub fn border_count(&self) -> usize {
        self.borders.len()
    }

    pub fn protection_count(&self) -> usize {
        self.protections.len()
    }

    pub fn number_format_count(&self) -> usize {
        self.number_formats.len()
    }

    pub fn cell_style_format_count(&self) -> usize {
        self.cell_style_formats.len()
    }

    pub fn cell_format_count(&self) -> usize {
        self.cell_formats.len()
    }

    pub fn diff_cell_format_count(&self) -> usize {
        self.diff_formats.len()
    }

    pub fn cell_style_count(&self) -> usize {
        self.cell_styles.len()
    }

    /// Compute the effective format of a cell-format index by layering the
    /// named style's base format first and the cell format's own overriding
    /// fields on top.
    pub fn effective_format(&self, xf_index: usize) -> Option<CellFormat> {
        let cf = self.cell_formats.get(xf_index)?;
        let base = cf
            .style_xf
            .and_then(|i| self.cell_style_formats.get(i))
            .cloned()
            .unwrap_or_default();

        let mut out = base;
        if cf.apply_font || cf.font != 0 {
            out.font = cf.font;
        }
        if cf.apply_fill || cf.fill != 0 {
            out.fill = cf.fill;
        }
        if cf.apply_border || cf.border != 0 {
            out.border = cf.border;
        }
        if cf.apply_protection || cf.protection != 0 {
            out.protection = cf.protection;
        }
        if cf.apply_num_format || cf.number_format != 0 {
            out.number_format = cf.number_format;
        }
        if cf.apply_alignment || cf.hor_align != HorAlignment::Unknown {
            out.hor_align = cf.hor_align;
        }
        if cf.apply_alignment || cf.ver_align != VerAlignment::Unknown {
            out.ver_align = cf.ver_align;
        }
        if cf.wrap_text.is_some() {
            out.wrap_text = cf.wrap_text;
        }
        if cf.shrink_to_fit.is_some() {
            out.shrink_to_fit = cf.shrink_to_fit;
        }
        out.style_xf = cf.style_xf;
        Some(out)
    }
}

impl Default for Styles {
    fn default() -> Self {
        Self::new()
    }
}

/// Format code of a built-in number format identifier (below 164).
///
/// These codes are defined by the OOXML specification but not stored in the
/// files themselves; identifiers 164 and up are always explicit.
pub fn builtin_number_format(id: usize) -> Option<&'static str> {
    let code = match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    };
    Some(code)
}
