//! Primitive types shared across the workbook model.
//!
//! Rows, columns, and sheet indices are signed 32-bit so `-1` can serve as
//! the conventional invalid sentinel. String identifiers are opaque 64-bit
//! integers handed out by the shared-string store.

use std::fmt;

pub type RowT = i32;
pub type ColT = i32;
pub type SheetT = i32;
pub type ColorElem = u8;
pub type PivotCacheId = u32;

/// Opaque identifier of a string in the workbook string table.
pub type StringId = u64;

/// Identifier denoting the absence of a string. Real identifiers are
/// allocated from 0 upward in insertion order.
pub const EMPTY_STRING_ID: StringId = StringId::MAX;

/// A 2-dimensional cell position within a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address {
    pub row: RowT,
    pub column: ColT,
}

impl Address {
    pub fn new(row: RowT, column: ColT) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(row={}; column={})", self.row, self.column)
    }
}

/// Sheet dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSize {
    pub rows: RowT,
    pub columns: ColT,
}

/// An inclusive rectangular range within a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Range {
    pub first: Address,
    pub last: Address,
}

impl Range {
    pub fn new(first: Address, last: Address) -> Self {
        Self { first, last }
    }

    pub fn contains(&self, pos: Address) -> bool {
        self.first.row <= pos.row
            && pos.row <= self.last.row
            && self.first.column <= pos.column
            && pos.column <= self.last.column
    }

    pub fn intersects(&self, other: &Range) -> bool {
        !(other.last.row < self.first.row
            || self.last.row < other.first.row
            || other.last.column < self.first.column
            || self.last.column < other.first.column)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.last)
    }
}

/// A 3-dimensional (sheet, row, column) cell address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SrcAddress {
    pub sheet: SheetT,
    pub row: RowT,
    pub column: ColT,
}

impl SrcAddress {
    pub fn new(sheet: SheetT, row: RowT, column: ColT) -> Self {
        Self { sheet, row, column }
    }

    /// The conventional invalid address: sheet `-1`.
    pub fn invalid() -> Self {
        Self {
            sheet: -1,
            row: -1,
            column: -1,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.sheet >= 0
    }

    pub fn to_address(self) -> Address {
        Address {
            row: self.row,
            column: self.column,
        }
    }
}

impl Default for SrcAddress {
    fn default() -> Self {
        Self::invalid()
    }
}

/// A 3-dimensional (sheet, row, column) range address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SrcRange {
    pub first: SrcAddress,
    pub last: SrcAddress,
}

impl SrcRange {
    pub fn to_range(self) -> Range {
        Range {
            first: self.first.to_address(),
            last: self.last.to_address(),
        }
    }
}

/// The type a cell currently stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellType {
    Empty,
    Boolean,
    Numeric,
    String,
    Formula,
}

/// Spreadsheet error values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorValue {
    Unknown,
    Null,
    Div0,
    Value,
    Ref,
    Name,
    Num,
    Na,
}

impl ErrorValue {
    /// Parse the canonical `#...` display form.
    pub fn from_str(s: &str) -> Self {
        match s {
            "#NULL!" => Self::Null,
            "#DIV/0!" => Self::Div0,
            "#VALUE!" => Self::Value,
            "#REF!" => Self::Ref,
            "#NAME?" => Self::Name,
            "#NUM!" => Self::Num,
            "#N/A" | "#N/A!" => Self::Na,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "#ERR!",
            Self::Null => "#NULL!",
            Self::Div0 => "#DIV/0!",
            Self::Value => "#VALUE!",
            Self::Ref => "#REF!",
            Self::Name => "#NAME?",
            Self::Num => "#NUM!",
            Self::Na => "#N/A",
        }
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grammar of a formula expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormulaGrammar {
    #[default]
    Unknown,
    /// Excel 2003 XML (XML Spreadsheet) format.
    XlsXml,
    /// Office Open XML spreadsheet format.
    Xlsx,
    /// OpenDocument Spreadsheet format.
    Ods,
    /// Gnumeric XML format.
    Gnumeric,
}

/// Location context a formula reference string occurs in.
///
/// Formats that use more than one reference syntax (notably ODS) resolve
/// named-range and named-expression-base strings with different rules than
/// the global one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormulaRefContext {
    #[default]
    Global,
    /// Base cell position of a named range or expression.
    NamedExpressionBase,
    /// A named range: an expression consisting of one range token.
    NamedRange,
}

/// Function used in the totals row of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TotalsRowFunction {
    #[default]
    None,
    Sum,
    Minimum,
    Maximum,
    Average,
    Count,
    CountNumbers,
    StandardDeviation,
    Variance,
    Custom,
}

impl TotalsRowFunction {
    pub fn from_str(s: &str) -> Self {
        match s {
            "sum" => Self::Sum,
            "min" => Self::Minimum,
            "max" => Self::Maximum,
            "average" => Self::Average,
            "count" => Self::Count,
            "countNums" => Self::CountNumbers,
            "stdDev" => Self::StandardDeviation,
            "var" => Self::Variance,
            "custom" => Self::Custom,
            _ => Self::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Sum => "sum",
            Self::Minimum => "min",
            Self::Maximum => "max",
            Self::Average => "average",
            Self::Count => "count",
            Self::CountNumbers => "countNums",
            Self::StandardDeviation => "stdDev",
            Self::Variance => "var",
            Self::Custom => "custom",
        }
    }
}

/// Grouping mode of a range-grouped pivot cache field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotCacheGroupBy {
    Unknown,
    Days,
    Hours,
    Minutes,
    Months,
    Quarters,
    /// Numeric-range grouping.
    Range,
    Seconds,
    Years,
}

impl PivotCacheGroupBy {
    pub fn from_str(s: &str) -> Self {
        match s {
            "days" => Self::Days,
            "hours" => Self::Hours,
            "minutes" => Self::Minutes,
            "months" => Self::Months,
            "quarters" => Self::Quarters,
            "range" => Self::Range,
            "seconds" => Self::Seconds,
            "years" => Self::Years,
            _ => Self::Unknown,
        }
    }
}

/// Horizontal cell alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorAlignment {
    #[default]
    Unknown,
    Left,
    Center,
    Right,
    Justified,
    Distributed,
    Filled,
}

/// Vertical cell alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerAlignment {
    #[default]
    Unknown,
    Top,
    Middle,
    Bottom,
    Justified,
    Distributed,
}

/// Border position within a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderDirection {
    Unknown,
    Top,
    Bottom,
    Left,
    Right,
    Diagonal,
    DiagonalBlTr,
    DiagonalTlBr,
}

/// Border line style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderStyle {
    #[default]
    Unknown,
    None,
    Solid,
    DashDot,
    DashDotDot,
    Dashed,
    Dotted,
    DoubleBorder,
    Hair,
    Medium,
    MediumDashDot,
    MediumDashDotDot,
    MediumDashed,
    SlantDashDot,
    Thick,
    Thin,
    DoubleThin,
    FineDashed,
}

/// Fill pattern type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillPattern {
    #[default]
    None,
    Solid,
    DarkDown,
    DarkGray,
    DarkGrid,
    DarkHorizontal,
    DarkTrellis,
    DarkUp,
    DarkVertical,
    Gray0625,
    Gray125,
    LightDown,
    LightGray,
    LightGrid,
    LightHorizontal,
    LightTrellis,
    LightUp,
    LightVertical,
    MediumGray,
}

/// Underline style of a font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnderlineStyle {
    #[default]
    None,
    SingleLine,
    SingleAccounting,
    DoubleLine,
    DoubleAccounting,
    Dotted,
    Dash,
    LongDash,
    DotDash,
    DotDotDotDash,
    Wave,
}

/// Strikethrough style of a font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrikethroughStyle {
    #[default]
    None,
    Solid,
    Dash,
    DotDash,
    DotDotDash,
    Dotted,
    LongDash,
    Wave,
}

/// Boolean operator for an auto-filter rule item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoFilterOp {
    Unspecified,
    Empty,
    NotEmpty,
    Equal,
    NotEqual,
    Contain,
    NotContain,
    BeginWith,
    NotBeginWith,
    EndWith,
    NotEndWith,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Top,
    Bottom,
    TopPercent,
    BottomPercent,
}

/// Boolean connector of an auto-filter rule node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoFilterNodeOp {
    #[default]
    Unspecified,
    And,
    Or,
}

/// Pane position within a 4-pane sheet view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetPane {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// ARGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub alpha: ColorElem,
    pub red: ColorElem,
    pub green: ColorElem,
    pub blue: ColorElem,
}

impl Color {
    pub fn new(alpha: ColorElem, red: ColorElem, green: ColorElem, blue: ColorElem) -> Self {
        Self {
            alpha,
            red,
            green,
            blue,
        }
    }

    /// Parse a 6-digit hexadecimal RGB string, optionally prefixed with `#`,
    /// or an 8-digit ARGB string.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        let parse = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            6 => Some(Self {
                alpha: 0xff,
                red: parse(0)?,
                green: parse(2)?,
                blue: parse(4)?,
            }),
            8 => Some(Self {
                alpha: parse(0)?,
                red: parse(2)?,
                green: parse(4)?,
                blue: parse(6)?,
            }),
            _ => None,
        }
    }
}

/// Output form a document dump takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpFormat {
    Check,
    Csv,
    Flat,
    Html,
    Json,
    None,
}

impl DumpFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "check" => Some(Self::Check),
            "csv" => Some(Self::Csv),
            "flat" => Some(Self::Flat),
            "html" => Some(Self::Html),
            "json" => Some(Self::Json),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

/// Detected input document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Ods,
    Xlsx,
    XlsXml,
    Gnumeric,
    Parquet,
    Unknown,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Ods => "ods",
            Self::Xlsx => "xlsx",
            Self::XlsXml => "xls-xml",
            Self::Gnumeric => "gnumeric",
            Self::Parquet => "parquet",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the import pipeline treats recoverable per-cell failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Surface the first error and abort the import.
    #[default]
    Fail,
    /// Substitute an error-token stream and continue.
    Skip,
}

/// How a formula cell with no cached result is pre-populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingResultPolicy {
    /// Leave the cached result empty until recalculation.
    #[default]
    Empty,
    /// Pre-populate with an error sentinel.
    ErrorSentinel,
}
