//! Auto-filter import builder.
//!
//! Supports both protocols: the flat per-column form (`set_column`,
//! `append_column_match_value`, `commit_column`) and the nested
//! boolean-rule form, where `start_column` opens a column-scoped node and
//! rule items or child nodes are appended through [`NodeHandle`]s. The
//! root-level `commit` materializes the filter into its target: the sheet,
//! or the table buffer it is embedded in.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::table::{AutoFilter, FilterItem, FilterNode, FilterValue};
use crate::types::{AutoFilterNodeOp, AutoFilterOp, ColT, Range, SheetT};

/// Where a committed auto-filter lands.
pub(crate) enum FilterTarget<'a> {
    Sheet { doc: &'a mut Document, sheet: SheetT },
    Table { slot: &'a mut Option<AutoFilter> },
}

/// Opaque handle of a node in the rule tree being built.
///
/// A handle is the path of child indices from the root; handles stay valid
/// for the lifetime of the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHandle(Vec<usize>);

/// Buffer-then-commit builder for auto-filters.
pub struct ImportAutoFilter<'a> {
    target: FilterTarget<'a>,
    buffer: AutoFilter,
    current_column: Option<ColT>,
}

impl<'a> ImportAutoFilter<'a> {
    pub(crate) fn for_sheet(doc: &'a mut Document, sheet: SheetT) -> Self {
        Self {
            target: FilterTarget::Sheet { doc, sheet },
            buffer: AutoFilter::default(),
            current_column: None,
        }
    }

    pub(crate) fn for_table(slot: &'a mut Option<AutoFilter>) -> Self {
        Self {
            target: FilterTarget::Table { slot },
            buffer: AutoFilter::default(),
            current_column: None,
        }
    }

    /// Specify the range the filter applies to.
    pub fn set_range(&mut self, range: Range) {
        self.buffer.range = range;
    }

    // ===== flat per-column protocol =====

    /// Open the filter data of one column, relative to the first column of
    /// the filtered range.
    pub fn set_column(&mut self, col: ColT) {
        self.current_column = Some(col);
    }

    /// Add a match value to the current column filter.
    pub fn append_column_match_value(&mut self, value: &str) {
        if let Some(col) = self.current_column {
            self.buffer
                .columns
                .entry(col)
                .or_default()
                .match_values
                .insert(value.to_string());
        }
    }

    /// Close the current column filter.
    pub fn commit_column(&mut self) {
        self.current_column = None;
    }

    // ===== nested rule-tree protocol =====

    /// Open a column-scoped rule node connected by `op` and return its
    /// handle.
    pub fn start_column(&mut self, col: ColT, op: AutoFilterNodeOp) -> NodeHandle {
        let mut node = FilterNode::new(op);
        node.field = Some(col);
        self.buffer.root.children.push(node);
        NodeHandle(vec![self.buffer.root.children.len() - 1])
    }

    /// Append a rule item with a string operand under a node.
    pub fn append_item(&mut self, node: &NodeHandle, op: AutoFilterOp, value: &str) {
        if let Some(n) = self.node_mut(node) {
            n.items.push(FilterItem {
                op,
                value: FilterValue::Text(value.to_string()),
            });
        }
    }

    /// Append a rule item with a numeric operand under a node.
    pub fn append_item_numeric(&mut self, node: &NodeHandle, op: AutoFilterOp, value: f64) {
        if let Some(n) = self.node_mut(node) {
            n.items.push(FilterItem {
                op,
                value: FilterValue::Numeric(value),
            });
        }
    }

    /// Append a rule item with no operand (empty / not-empty rules).
    pub fn append_item_empty(&mut self, node: &NodeHandle, op: AutoFilterOp) {
        if let Some(n) = self.node_mut(node) {
            n.items.push(FilterItem {
                op,
                value: FilterValue::None,
            });
        }
    }

    /// Append a child node connected by `op` and return its handle.
    pub fn append_node(&mut self, parent: &NodeHandle, op: AutoFilterNodeOp) -> NodeHandle {
        let mut path = parent.0.clone();
        if let Some(n) = self.node_mut(parent) {
            n.children.push(FilterNode::new(op));
            path.push(n.children.len() - 1);
        }
        NodeHandle(path)
    }

    fn node_mut(&mut self, handle: &NodeHandle) -> Option<&mut FilterNode> {
        let mut node = &mut self.buffer.root;
        for &idx in &handle.0 {
            node = node.children.get_mut(idx)?;
        }
        Some(node)
    }

    /// Materialize the buffered filter into its destination.
    ///
    /// # Errors
    ///
    /// Fails when the sheet target no longer exists.
    pub fn commit(self) -> Result<()> {
        match self.target {
            FilterTarget::Sheet { doc, sheet } => {
                let sheet_store = doc.sheet_mut(sheet).ok_or_else(|| {
                    Error::Structure(format!("auto filter committed to missing sheet {sheet}"))
                })?;
                sheet_store.set_auto_filter(self.buffer);
                Ok(())
            }
            FilterTarget::Table { slot } => {
                *slot = Some(self.buffer);
                Ok(())
            }
        }
    }
}
