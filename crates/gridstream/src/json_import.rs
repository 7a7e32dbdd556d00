//! JSON document import through the map tree.
//!
//! The importer pairs the JSON event stream with a [`MapTree`]: container
//! events descend and ascend the tree, unrecognized paths are skipped by
//! depth counting, and leaf values under linked nodes are written to their
//! destination cells or range columns. Closing a row-group subtree advances
//! the owning range's row counter.

use gridstream_core::error::{Error, Result};
use gridstream_core::import::ImportFactory;
use gridstream_core::types::SheetT;
use gridstream_parse::json::{JsonHandler, JsonParser};

use crate::map_tree::{CellPosition, MapTree, NodeLink, PathToken};

/// What kind of input node the walker is entering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputNode {
    Container,
    Value,
}

/// A leaf value delivered to a linked node.
#[derive(Debug)]
enum LeafValue<'v> {
    Text(&'v str),
    Number(f64),
    Bool(bool),
    Null,
}

/// Tree navigation state: linked scopes plus an unlinked-depth counter.
#[derive(Debug, Default)]
struct TreeWalker {
    stack: Vec<Scope>,
    unlinked_depth: usize,
    pending_key: Option<PathToken>,
}

#[derive(Debug)]
struct Scope {
    node: usize,
    array_position: u32,
}

/// Row groups closed by one pop.
#[derive(Debug, Default)]
struct PopResult {
    closed_row_group: Option<usize>,
}

impl TreeWalker {
    /// Descend into a child; returns the linked node index when the path
    /// is mapped.
    fn push(&mut self, tree: &MapTree, _input: InputNode) -> Option<usize> {
        if self.unlinked_depth > 0 {
            self.unlinked_depth += 1;
            self.pending_key = None;
            return None;
        }

        let next = if self.stack.is_empty() {
            self.pending_key = None;
            tree.root()
        } else {
            let token = match self.pending_key.take() {
                Some(key) => key,
                None => {
                    let top = self.stack.last().expect("non-empty stack");
                    PathToken::Pos(top.array_position)
                }
            };
            let top = self.stack.last().expect("non-empty stack");
            tree.child(top.node, &token)
        };

        match next {
            Some(node) => {
                self.stack.push(Scope {
                    node,
                    array_position: 0,
                });
                Some(node)
            }
            None => {
                self.unlinked_depth = 1;
                None
            }
        }
    }

    /// Ascend one level, reporting a closed row group.
    fn pop(&mut self, tree: &MapTree) -> PopResult {
        if self.unlinked_depth > 0 {
            self.unlinked_depth -= 1;
            if self.unlinked_depth > 0 {
                return PopResult::default();
            }
            // Leaving the unlinked region re-enters the parent scope; its
            // position advances like any other closed child.
            if let Some(top) = self.stack.last_mut() {
                top.array_position += 1;
            }
            return PopResult::default();
        }

        let closed = self.stack.pop();
        if let Some(top) = self.stack.last_mut() {
            top.array_position += 1;
        }
        let closed_row_group = closed.and_then(|scope| tree.node(scope.node).row_group);
        PopResult { closed_row_group }
    }

    fn set_key(&mut self, key: &str) {
        if self.unlinked_depth == 0 {
            self.pending_key = Some(PathToken::Key(key.to_string()));
        }
    }
}

/// Imports JSON documents into tabular cells by path.
pub struct JsonMapImporter<'a> {
    factory: ImportFactory<'a>,
    tree: MapTree,
    sheet_count: SheetT,
}

impl<'a> JsonMapImporter<'a> {
    pub fn new(factory: ImportFactory<'a>) -> Self {
        Self {
            factory,
            tree: MapTree::new(),
            sheet_count: 0,
        }
    }

    /// Map a path to a single destination cell.
    ///
    /// # Errors
    ///
    /// Fails when the path does not parse.
    pub fn set_cell_link(&mut self, path: &str, pos: CellPosition) -> Result<()> {
        self.tree.set_cell_link(path, pos)
    }

    /// Open a repeating range anchored at a position.
    pub fn start_range(&mut self, pos: CellPosition, row_header: bool) {
        self.tree.start_range(pos, row_header);
    }

    /// Link the next column of the open range to a path.
    ///
    /// # Errors
    ///
    /// Fails when no range is open or the path does not parse.
    pub fn append_field_link(&mut self, path: &str) -> Result<()> {
        self.tree.append_field_link(path)
    }

    /// Mark the row boundary of the open range.
    ///
    /// # Errors
    ///
    /// Fails when no range is open or the path does not parse.
    pub fn set_range_row_group(&mut self, path: &str) -> Result<()> {
        self.tree.set_range_row_group(path)
    }

    /// Finalize the open range.
    pub fn commit_range(&mut self) {
        self.tree.commit_range();
    }

    /// Read access to the mapping tree.
    pub fn map_tree(&self) -> &MapTree {
        &self.tree
    }

    /// Append a destination sheet.
    ///
    /// # Errors
    ///
    /// Propagates sheet-creation failures from the factory.
    pub fn append_sheet(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Ok(());
        }
        self.factory.append_sheet(self.sheet_count, name)?;
        self.sheet_count += 1;
        Ok(())
    }

    /// Parse a JSON stream and route mapped values into the document.
    ///
    /// # Errors
    ///
    /// Fails on JSON grammar violations, on values routed to sheets that
    /// were never appended, and propagates `finalize` failures.
    pub fn read_stream(&mut self, stream: &[u8]) -> Result<()> {
        // Write range header labels before any data lands.
        for range in self.tree.ranges_mut() {
            if range.labels.is_empty() {
                continue;
            }
            range.row_position = 1;
        }
        let headers: Vec<(CellPosition, String)> = self
            .tree
            .ranges()
            .iter()
            .flat_map(|range| {
                range.labels.iter().enumerate().filter_map(|(i, label)| {
                    label.as_ref().map(|text| {
                        (
                            CellPosition::new(
                                &range.origin.sheet,
                                range.origin.row,
                                range.origin.col + i as i32,
                            ),
                            text.clone(),
                        )
                    })
                })
            })
            .collect();
        for (pos, text) in headers {
            self.write_text(&pos, &text)?;
        }

        let mut handler = JsonMapHandler {
            factory: &mut self.factory,
            tree: &mut self.tree,
            walker: TreeWalker::default(),
            error: None,
        };
        JsonParser::new(stream, &mut handler).parse()?;
        if let Some(e) = handler.error.take() {
            return Err(e);
        }
        self.factory.finalize()
    }

    fn write_text(&mut self, pos: &CellPosition, text: &str) -> Result<()> {
        let mut sheet = self.factory.get_sheet(&pos.sheet).ok_or_else(|| {
            Error::InvalidArgument(format!("no sheet named '{}'", pos.sheet))
        })?;
        sheet.set_string_value(pos.row, pos.col, text);
        Ok(())
    }
}

/// JSON event handler pairing the parser with the walker.
struct JsonMapHandler<'h, 'a> {
    factory: &'h mut ImportFactory<'a>,
    tree: &'h mut MapTree,
    walker: TreeWalker,
    error: Option<Error>,
}

impl JsonMapHandler<'_, '_> {
    fn enter_container(&mut self) {
        self.walker.push(self.tree, InputNode::Container);
    }

    fn leave_container(&mut self) {
        let result = self.walker.pop(self.tree);
        if let Some(range) = result.closed_row_group {
            self.tree.ranges_mut()[range].row_position += 1;
        }
    }

    fn leaf(&mut self, value: LeafValue<'_>) {
        if self.error.is_some() {
            return;
        }
        let node = self.walker.push(self.tree, InputNode::Value);
        if let Some(node) = node {
            if let Err(e) = self.write_leaf(node, value) {
                self.error = Some(e);
            }
        }
        let result = self.walker.pop(self.tree);
        if let Some(range) = result.closed_row_group {
            self.tree.ranges_mut()[range].row_position += 1;
        }
    }

    fn write_leaf(&mut self, node: usize, value: LeafValue<'_>) -> Result<()> {
        let target = match &self.tree.node(node).link {
            NodeLink::None => return Ok(()),
            NodeLink::CellRef(pos) => pos.clone(),
            NodeLink::RangeFieldRef { range, column } => {
                let range_ref = &self.tree.ranges()[*range];
                CellPosition::new(
                    &range_ref.origin.sheet,
                    range_ref.origin.row + range_ref.row_position,
                    range_ref.origin.col + column,
                )
            }
        };
        let mut sheet = self.factory.get_sheet(&target.sheet).ok_or_else(|| {
            Error::InvalidArgument(format!("no sheet named '{}'", target.sheet))
        })?;
        match value {
            LeafValue::Text(s) => sheet.set_string_value(target.row, target.col, s),
            LeafValue::Number(n) => sheet.set_value(target.row, target.col, n),
            LeafValue::Bool(b) => sheet.set_bool(target.row, target.col, b),
            LeafValue::Null => {}
        }
        Ok(())
    }
}

impl JsonHandler for JsonMapHandler<'_, '_> {
    fn begin_array(&mut self) {
        self.enter_container();
    }

    fn end_array(&mut self) {
        self.leave_container();
    }

    fn begin_object(&mut self) {
        self.enter_container();
    }

    fn end_object(&mut self) {
        self.leave_container();
    }

    fn object_key(&mut self, key: &str, _transient: bool) {
        self.walker.set_key(key);
    }

    fn string(&mut self, value: &str, _transient: bool) {
        self.leaf(LeafValue::Text(value));
    }

    fn number(&mut self, value: f64) {
        self.leaf(LeafValue::Number(value));
    }

    fn boolean_true(&mut self) {
        self.leaf(LeafValue::Bool(true));
    }

    fn boolean_false(&mut self) {
        self.leaf(LeafValue::Bool(false));
    }

    fn null(&mut self) {
        self.leaf(LeafValue::Null);
    }
}
