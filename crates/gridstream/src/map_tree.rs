//! Path-directed map tree.
//!
//! Routes streamed JSON values to spreadsheet cells by `$`-rooted path:
//! `[n]` selects the n-th array child (`[]` any position), `['key']` an
//! object child. Complete paths map to either a single destination cell or
//! one column of a repeating range; a row-group mark on an interior node
//! makes that node's repetition the row boundary of the range.

use std::collections::BTreeMap;

use gridstream_core::error::{Error, Result};
use gridstream_core::types::{ColT, RowT};

/// A destination cell identified by sheet name and position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellPosition {
    pub sheet: String,
    pub row: RowT,
    pub col: ColT,
}

impl CellPosition {
    pub fn new(sheet: &str, row: RowT, col: ColT) -> Self {
        Self {
            sheet: sheet.to_string(),
            row,
            col,
        }
    }
}

/// One parsed token of a `$`-rooted path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum PathToken {
    /// `[]`: any array position.
    AnyPos,
    /// `[n]`: a specific array position.
    Pos(u32),
    /// `['key']`: an object child.
    Key(String),
}

/// Parse a `$`-rooted path into tokens.
///
/// # Errors
///
/// Fails with an invalid-argument error on any grammar violation.
pub fn parse_path(path: &str) -> Result<Vec<PathToken>> {
    let bad = |msg: &str| Error::InvalidArgument(format!("failed to parse path '{path}': {msg}"));

    let rest = path
        .strip_prefix('$')
        .ok_or_else(|| bad("missing '$' root"))?;
    let mut tokens = Vec::new();
    let mut chars = rest.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '[' {
            return Err(bad("expected '['"));
        }
        match chars.peek() {
            Some(&(_, '\'')) => {
                chars.next();
                let mut key = String::new();
                loop {
                    match chars.next() {
                        Some((_, '\'')) => break,
                        Some((_, c)) => key.push(c),
                        None => return Err(bad("unterminated key quote")),
                    }
                }
                match chars.next() {
                    Some((_, ']')) => tokens.push(PathToken::Key(key)),
                    _ => return Err(bad("expected ']' after key")),
                }
            }
            Some(&(_, ']')) => {
                chars.next();
                tokens.push(PathToken::AnyPos);
            }
            Some(_) => {
                let mut digits = String::new();
                loop {
                    match chars.next() {
                        Some((_, ']')) => break,
                        Some((_, c)) if c.is_ascii_digit() => digits.push(c),
                        Some(_) => return Err(bad("invalid array position")),
                        None => return Err(bad("unterminated '['")),
                    }
                }
                let pos: u32 = digits.parse().map_err(|_| bad("invalid array position"))?;
                tokens.push(PathToken::Pos(pos));
            }
            None => return Err(bad("unterminated '['")),
        }
    }
    Ok(tokens)
}

/// What a tree node links to.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeLink {
    /// No link; the node only routes deeper.
    None,
    /// A single destination cell.
    CellRef(CellPosition),
    /// One column within a repeating range.
    RangeFieldRef { range: usize, column: ColT },
}

/// One node of the map tree.
#[derive(Debug)]
pub struct MapTreeNode {
    pub link: NodeLink,
    /// Range whose row counter this node's repetition advances.
    pub row_group: Option<usize>,
    children: BTreeMap<PathToken, usize>,
}

impl MapTreeNode {
    fn new() -> Self {
        Self {
            link: NodeLink::None,
            row_group: None,
            children: BTreeMap::new(),
        }
    }
}

/// A repeating range destination.
#[derive(Debug)]
pub struct RangeReference {
    pub origin: CellPosition,
    /// Header labels, one per linked field, written above the data rows
    /// when present.
    pub labels: Vec<Option<String>>,
    /// Current 0-based data row, advanced by row-group closures.
    pub row_position: RowT,
}

/// Pending range while fields are being appended.
#[derive(Debug)]
struct PendingRange {
    origin: CellPosition,
    row_header: bool,
    labels: Vec<Option<String>>,
}

/// The map tree itself: nodes in an arena, ranges in a side table.
#[derive(Debug, Default)]
pub struct MapTree {
    nodes: Vec<MapTreeNode>,
    ranges: Vec<RangeReference>,
    pending: Option<(PendingRange, usize)>,
}

impl MapTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the root node, if any link has been set.
    pub fn root(&self) -> Option<usize> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    pub fn node(&self, index: usize) -> &MapTreeNode {
        &self.nodes[index]
    }

    pub fn ranges(&self) -> &[RangeReference] {
        &self.ranges
    }

    pub fn ranges_mut(&mut self) -> &mut [RangeReference] {
        &mut self.ranges
    }

    /// Look up the child of a node for a concrete array position or key.
    pub fn child(&self, index: usize, token: &PathToken) -> Option<usize> {
        let node = &self.nodes[index];
        if let Some(&child) = node.children.get(token) {
            return Some(child);
        }
        // A specific position falls back to the any-position child.
        if matches!(token, PathToken::Pos(_)) {
            return node.children.get(&PathToken::AnyPos).copied();
        }
        None
    }

    /// Map a complete path to a single destination cell.
    ///
    /// # Errors
    ///
    /// Fails when the path does not parse or is empty.
    pub fn set_cell_link(&mut self, path: &str, pos: CellPosition) -> Result<()> {
        let node = self.ensure_path(path)?;
        self.nodes[node].link = NodeLink::CellRef(pos);
        Ok(())
    }

    /// Open a new range anchored at a position. Fields are appended next,
    /// then the range is committed.
    pub fn start_range(&mut self, pos: CellPosition, row_header: bool) {
        let index = self.ranges.len();
        self.pending = Some((
            PendingRange {
                origin: pos,
                row_header,
                labels: Vec::new(),
            },
            index,
        ));
    }

    /// Link one column of the pending range to a path. The column offset is
    /// the order of this call; the field label is the last object key of
    /// the path.
    ///
    /// # Errors
    ///
    /// Fails when no range is open or the path does not parse.
    pub fn append_field_link(&mut self, path: &str) -> Result<()> {
        let tokens = parse_path(path)?;
        let label = tokens.iter().rev().find_map(|t| match t {
            PathToken::Key(k) => Some(k.clone()),
            _ => None,
        });
        let (pending, range_index) = self
            .pending
            .as_mut()
            .ok_or_else(|| Error::InvalidArgument("no range is being built".to_string()))?;
        let column = pending.labels.len() as ColT;
        pending.labels.push(label);
        let range = *range_index;

        let node = self.ensure_tokens(&tokens)?;
        self.nodes[node].link = NodeLink::RangeFieldRef { range, column };
        Ok(())
    }

    /// Mark the node at a path as the row boundary of the pending range.
    ///
    /// # Errors
    ///
    /// Fails when no range is open or the path does not parse.
    pub fn set_range_row_group(&mut self, path: &str) -> Result<()> {
        let range = self
            .pending
            .as_ref()
            .map(|(_, index)| *index)
            .ok_or_else(|| Error::InvalidArgument("no range is being built".to_string()))?;
        let node = self.ensure_path(path)?;
        self.nodes[node].row_group = Some(range);
        Ok(())
    }

    /// Finalize the pending range.
    pub fn commit_range(&mut self) {
        if let Some((pending, _)) = self.pending.take() {
            self.ranges.push(RangeReference {
                origin: pending.origin,
                labels: if pending.row_header {
                    pending.labels
                } else {
                    Vec::new()
                },
                row_position: 0,
            });
        }
    }

    /// The node a complete path leads to, if linked.
    pub fn get_link(&self, path: &str) -> Option<&MapTreeNode> {
        let tokens = parse_path(path).ok()?;
        let mut node = self.root()?;
        for token in &tokens {
            node = self.child(node, token)?;
        }
        Some(&self.nodes[node])
    }

    fn ensure_path(&mut self, path: &str) -> Result<usize> {
        let tokens = parse_path(path)?;
        self.ensure_tokens(&tokens)
    }

    fn ensure_tokens(&mut self, tokens: &[PathToken]) -> Result<usize> {
        if self.nodes.is_empty() {
            self.nodes.push(MapTreeNode::new());
        }
        let mut node = 0;
        for token in tokens {
            let next = match self.nodes[node].children.get(token) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(MapTreeNode::new());
                    self.nodes[node].children.insert(token.clone(), child);
                    child
                }
            };
            node = next;
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_path_tokens() {
        assert_eq!(
            parse_path("$[]['name']").unwrap(),
            vec![PathToken::AnyPos, PathToken::Key("name".to_string())]
        );
        assert_eq!(
            parse_path("$[2][0]").unwrap(),
            vec![PathToken::Pos(2), PathToken::Pos(0)]
        );
        assert_eq!(parse_path("$").unwrap(), vec![]);
    }

    #[test]
    fn test_parse_path_rejects_garbage() {
        assert!(parse_path("no-root").is_err());
        assert!(parse_path("$[").is_err());
        assert!(parse_path("$[x]").is_err());
        assert!(parse_path("$['unterminated").is_err());
        assert!(parse_path("$['k'x]").is_err());
    }

    #[test]
    fn test_cell_link_lookup() {
        let mut tree = MapTree::new();
        let pos = CellPosition::new("data", 2, 3);
        tree.set_cell_link("$['a'][1]", pos.clone()).unwrap();

        let node = tree.get_link("$['a'][1]").unwrap();
        assert_eq!(node.link, NodeLink::CellRef(pos));
        assert!(tree.get_link("$['a'][0]").is_none());
        assert!(tree.get_link("$['b']").is_none());
    }

    #[test]
    fn test_any_position_fallback() {
        let mut tree = MapTree::new();
        tree.set_cell_link("$[]['v']", CellPosition::new("s", 0, 0))
            .unwrap();
        // A concrete position matches through the any-position child.
        assert!(tree.get_link("$[5]['v']").is_some());
    }

    #[test]
    fn test_range_field_links_in_order() {
        let mut tree = MapTree::new();
        tree.start_range(CellPosition::new("data", 0, 0), true);
        tree.append_field_link("$[]['name']").unwrap();
        tree.append_field_link("$[]['age']").unwrap();
        tree.set_range_row_group("$[]").unwrap();
        tree.commit_range();

        assert_eq!(tree.ranges().len(), 1);
        let range = &tree.ranges()[0];
        assert_eq!(range.labels.len(), 2);
        assert_eq!(range.labels[0].as_deref(), Some("name"));
        assert_eq!(range.labels[1].as_deref(), Some("age"));

        match tree.get_link("$[]['name']").unwrap().link {
            NodeLink::RangeFieldRef { range, column } => {
                assert_eq!(range, 0);
                assert_eq!(column, 0);
            }
            ref other => panic!("unexpected link: {other:?}"),
        }
        match tree.get_link("$[]['age']").unwrap().link {
            NodeLink::RangeFieldRef { column, .. } => assert_eq!(column, 1),
            ref other => panic!("unexpected link: {other:?}"),
        }
    }

    #[test]
    fn test_field_link_without_open_range_fails() {
        let mut tree = MapTree::new();
        assert!(tree.append_field_link("$[]['x']").is_err());
        assert!(tree.set_range_row_group("$[]").is_err());
    }

    #[test]
    fn test_row_group_marked() {
        let mut tree = MapTree::new();
        tree.start_range(CellPosition::new("s", 0, 0), false);
        tree.append_field_link("$[]['v']").unwrap();
        tree.set_range_row_group("$[]").unwrap();
        tree.commit_range();
        let node = tree.get_link("$[]").unwrap();
        assert_eq!(node.row_group, Some(0));
        // Without a header request, no labels are kept.
        assert!(tree.ranges()[0].labels.is_empty());
    }
}
