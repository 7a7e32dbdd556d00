//! Conditional format model.
//!
//! A conditional format covers a range and holds entries; each entry has a
//! type, type-specific properties (databar, iconset, color scale), and zero
//! or more conditions. Conditions carry a formula/value string, an optional
//! color, and a condition type.

use crate::types::{Color, Range};

/// Kind of a conditional format entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CondFormatType {
    #[default]
    Unknown,
    Condition,
    Date,
    Formula,
    Colorscale,
    Databar,
    Iconset,
}

/// Operator of a plain condition entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CondOperator {
    #[default]
    Unknown,
    Equal,
    Less,
    Greater,
    GreaterEqual,
    LessEqual,
    NotEqual,
    Between,
    NotBetween,
    Duplicate,
    Unique,
    TopN,
    BottomN,
    AboveAverage,
    BelowAverage,
    ContainsError,
    ContainsNoError,
    BeginsWith,
    EndsWith,
    Contains,
    ContainsBlanks,
    NotContains,
    Expression,
}

/// Kind of value a condition compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CondValueType {
    #[default]
    Unknown,
    Value,
    Automatic,
    Max,
    Min,
    Formula,
    Percent,
    Percentile,
}

/// Date window of a date-type entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CondDate {
    #[default]
    Unknown,
    Today,
    Yesterday,
    Tomorrow,
    Last7Days,
    ThisWeek,
    NextWeek,
    LastWeek,
    ThisMonth,
    NextMonth,
    LastMonth,
    ThisYear,
    NextYear,
    LastYear,
}

/// Axis placement of a databar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabarAxis {
    #[default]
    None,
    Middle,
    Automatic,
}

/// One condition of an entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CondFormatCondition {
    pub formula: Option<String>,
    pub color: Option<Color>,
    pub value_type: CondValueType,
    pub date: CondDate,
}

/// One entry of a conditional format.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CondFormatEntry {
    pub entry_type: CondFormatType,
    pub operator: CondOperator,
    pub conditions: Vec<CondFormatCondition>,
    /// Differential format index applied when the entry matches.
    pub dxf_index: Option<usize>,
    pub icon_name: Option<String>,
    pub iconset_reverse: bool,
    pub show_value: bool,
    pub databar_gradient: bool,
    pub databar_axis: DatabarAxis,
    pub databar_color_positive: Option<Color>,
    pub databar_color_negative: Option<Color>,
    pub min_databar_length: Option<f64>,
    pub max_databar_length: Option<f64>,
}

/// A conditional format: a range plus its entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CondFormat {
    pub range: Range,
    pub entries: Vec<CondFormatEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Address;

    #[test]
    fn test_cond_format_assembly() {
        let mut format = CondFormat {
            range: Range::new(Address::new(0, 0), Address::new(9, 0)),
            ..CondFormat::default()
        };
        let mut entry = CondFormatEntry {
            entry_type: CondFormatType::Condition,
            operator: CondOperator::Greater,
            ..CondFormatEntry::default()
        };
        entry.conditions.push(CondFormatCondition {
            formula: Some("10".to_string()),
            ..CondFormatCondition::default()
        });
        format.entries.push(entry);

        assert_eq!(format.entries.len(), 1);
        assert_eq!(format.entries[0].operator, CondOperator::Greater);
        assert_eq!(
            format.entries[0].conditions[0].formula.as_deref(),
            Some("10")
        );
    }
}
