//! Tables and auto-filters.
//!
//! A table is a named rectangular range with typed columns and an optional
//! embedded auto-filter. Auto-filters exist in two shapes: the flat
//! per-column match-value form, and the nested boolean-rule tree used by
//! newer inputs. A filter applied at sheet level lives on the sheet; one
//! embedded in a table lives on the table.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{AutoFilterNodeOp, AutoFilterOp, ColT, Range, TotalsRowFunction};

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableColumn {
    pub identifier: usize,
    pub name: String,
    pub totals_row_label: Option<String>,
    pub totals_row_function: TotalsRowFunction,
}

/// Visual style flags of a table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableStyle {
    pub name: Option<String>,
    pub show_first_column: bool,
    pub show_last_column: bool,
    pub show_row_stripes: bool,
    pub show_column_stripes: bool,
}

/// A named rectangular data range.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub identifier: usize,
    pub name: String,
    pub display_name: Option<String>,
    pub range: Range,
    pub totals_row_count: usize,
    pub columns: Vec<TableColumn>,
    pub style: TableStyle,
    pub filter: Option<AutoFilter>,
}

/// A single filter rule: an operator with an optional comparison value.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterItem {
    pub op: AutoFilterOp,
    pub value: FilterValue,
}

/// Comparison operand of a filter rule.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    None,
    Numeric(f64),
    Text(String),
}

/// A node in the boolean-connected filter rule tree.
///
/// Items and child nodes under one node are connected by the node's
/// operator. A node may be pinned to a column offset (`field`) relative to
/// the first column of the filtered range.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterNode {
    pub op: AutoFilterNodeOp,
    /// 0-based column offset this node applies to, when column-scoped.
    pub field: Option<ColT>,
    pub items: Vec<FilterItem>,
    pub children: Vec<FilterNode>,
}

impl FilterNode {
    pub fn new(op: AutoFilterNodeOp) -> Self {
        Self {
            op,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.children.is_empty()
    }
}

/// Flat per-column filter data: a set of match values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterColumn {
    pub match_values: BTreeSet<String>,
}

/// An auto-filter over a range.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AutoFilter {
    pub range: Range,
    /// Flat form: column offset to match-value set.
    pub columns: BTreeMap<ColT, FilterColumn>,
    /// Nested form: boolean-connected rule tree, one root per column.
    pub root: FilterNode,
}

impl AutoFilter {
    pub fn new(range: Range) -> Self {
        Self {
            range,
            ..Self::default()
        }
    }
}
