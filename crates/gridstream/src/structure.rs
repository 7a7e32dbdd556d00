//! XML structure tree.
//!
//! One scan of an XML document produces a tree of element properties:
//! children in first-seen order, every attribute name ever seen, a repeat
//! flag (set when the element appeared more than once under the same parent
//! within a single scope), and a has-content flag. A walker navigates the
//! finished tree, and a mapper emits the linkable field paths of every
//! repeating subtree to a caller-supplied handler.

use std::collections::HashMap;

use gridstream_core::error::Result;
use gridstream_parse::namespace::{NamespaceRepository, NsId, NS_NONE};
use gridstream_parse::xml::{XmlAttr, XmlHandler, XmlName, XmlParser};

/// A namespace-qualified entity name.
pub type EntityName = (NsId, String);

/// Properties of one element in the structure tree.
#[derive(Debug)]
pub struct ElementProps {
    pub name: EntityName,
    children: HashMap<EntityName, usize>,
    /// Child names in order of first appearance.
    child_order: Vec<EntityName>,
    /// Attribute names in order of first appearance.
    attributes: Vec<EntityName>,
    /// True when the element appeared more than once under one parent
    /// during a single scope.
    pub repeat: bool,
    /// True when the element carried non-whitespace character data.
    pub has_content: bool,
}

impl ElementProps {
    fn new(name: EntityName) -> Self {
        Self {
            name,
            children: HashMap::new(),
            child_order: Vec::new(),
            attributes: Vec::new(),
            repeat: false,
            has_content: false,
        }
    }

    pub fn child_names(&self) -> &[EntityName] {
        &self.child_order
    }

    pub fn attribute_names(&self) -> &[EntityName] {
        &self.attributes
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// The scanned structure of one XML document.
#[derive(Debug)]
pub struct StructureTree {
    repo: NamespaceRepository,
    nodes: Vec<ElementProps>,
    root: Option<usize>,
}

impl StructureTree {
    /// Scan a document into its structure tree.
    ///
    /// # Errors
    ///
    /// Propagates XML parse failures.
    pub fn scan(content: &[u8]) -> Result<Self> {
        let mut repo = NamespaceRepository::new();
        let mut builder = ScanHandler {
            nodes: Vec::new(),
            root: None,
            stack: Vec::new(),
        };
        XmlParser::new(content, &mut builder, &mut repo).parse()?;
        Ok(Self {
            repo,
            nodes: builder.nodes,
            root: builder.root,
        })
    }

    pub fn repository(&self) -> &NamespaceRepository {
        &self.repo
    }

    /// Walker positioned at the document root.
    pub fn walker(&self) -> StructureWalker<'_> {
        StructureWalker {
            tree: self,
            stack: self.root.into_iter().collect(),
        }
    }

    fn props(&self, index: usize) -> &ElementProps {
        &self.nodes[index]
    }
}

/// Scan-time handler building the tree.
struct ScanHandler {
    nodes: Vec<ElementProps>,
    root: Option<usize>,
    /// Stack of (node index, per-scope child appearance counts).
    stack: Vec<(usize, HashMap<EntityName, usize>)>,
}

impl ScanHandler {
    fn enter(&mut self, name: EntityName) {
        let node = match self.stack.last_mut() {
            None => match self.root {
                Some(root) => root,
                None => {
                    self.nodes.push(ElementProps::new(name));
                    let index = self.nodes.len() - 1;
                    self.root = Some(index);
                    index
                }
            },
            Some((parent, counts)) => {
                let parent = *parent;
                let index = match self.nodes[parent].children.get(&name) {
                    Some(&existing) => existing,
                    None => {
                        self.nodes.push(ElementProps::new(name.clone()));
                        let index = self.nodes.len() - 1;
                        self.nodes[parent].children.insert(name.clone(), index);
                        self.nodes[parent].child_order.push(name.clone());
                        index
                    }
                };
                let count = counts.entry(name).or_insert(0);
                *count += 1;
                if *count > 1 {
                    self.nodes[index].repeat = true;
                }
                index
            }
        };
        self.stack.push((node, HashMap::new()));
    }
}

impl XmlHandler for ScanHandler {
    fn start_element(&mut self, elem: XmlName<'_>) {
        self.enter((elem.ns, elem.name.to_string()));
    }

    fn end_element(&mut self, _elem: XmlName<'_>) {
        self.stack.pop();
    }

    fn attribute(&mut self, attr: XmlAttr<'_>) {
        if let Some((node, _)) = self.stack.last() {
            let name = (attr.ns, attr.name.to_string());
            let props = &mut self.nodes[*node];
            if !props.attributes.contains(&name) {
                props.attributes.push(name);
            }
        }
    }

    fn characters(&mut self, value: &str, _transient: bool) {
        if value.trim().is_empty() {
            return;
        }
        if let Some((node, _)) = self.stack.last() {
            self.nodes[*node].has_content = true;
        }
    }
}

/// Descend/ascend navigation over a finished structure tree.
pub struct StructureWalker<'t> {
    tree: &'t StructureTree,
    stack: Vec<usize>,
}

impl<'t> StructureWalker<'t> {
    /// Properties of the current element; `None` on an empty document.
    pub fn current(&self) -> Option<&'t ElementProps> {
        self.stack.last().map(|&i| self.tree.props(i))
    }

    /// Descend into a named child.
    pub fn descend(&mut self, name: &EntityName) -> Option<&'t ElementProps> {
        let &current = self.stack.last()?;
        let child = *self.tree.props(current).children.get(name)?;
        self.stack.push(child);
        Some(self.tree.props(child))
    }

    /// Ascend to the parent element; the root cannot be left.
    pub fn ascend(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    /// Slash-separated path of the current position.
    pub fn path_string(&self) -> String {
        let mut out = String::new();
        for &index in &self.stack {
            out.push('/');
            out.push_str(&entity_display(self.tree.props(index).name.clone()));
        }
        out
    }
}

fn entity_display((ns, name): EntityName) -> String {
    if ns == NS_NONE {
        name
    } else {
        format!("ns{ns}:{name}")
    }
}

/// A repeating subtree and its linkable field paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeGroup {
    /// Path of the repeating element delimiting rows.
    pub base_path: String,
    /// Paths of content-bearing descendants, attribute paths with an `@`
    /// component.
    pub field_paths: Vec<String>,
}

/// Emits a [`RangeGroup`] for every repeating subtree of the structure
/// tree.
pub struct RangeMapper<'t> {
    tree: &'t StructureTree,
}

impl<'t> RangeMapper<'t> {
    pub fn new(tree: &'t StructureTree) -> Self {
        Self { tree }
    }

    /// Walk the tree and call `handler` once per repeating subtree.
    pub fn map<F: FnMut(&RangeGroup)>(&self, mut handler: F) {
        let Some(root) = self.tree.root else {
            return;
        };
        let mut path = String::new();
        self.visit(root, &mut path, &mut handler);
    }

    fn visit<F: FnMut(&RangeGroup)>(&self, index: usize, path: &mut String, handler: &mut F) {
        let props = self.tree.props(index);
        let seg_len = {
            let seg = format!("/{}", entity_display(props.name.clone()));
            path.push_str(&seg);
            seg.len()
        };

        if props.repeat {
            let mut fields = Vec::new();
            let mut field_path = path.clone();
            self.collect_fields(index, &mut field_path, &mut fields);
            handler(&RangeGroup {
                base_path: path.clone(),
                field_paths: fields,
            });
        } else {
            for name in &props.child_order {
                let child = props.children[name];
                self.visit(child, path, handler);
            }
        }

        path.truncate(path.len() - seg_len);
    }

    /// Collect content and attribute paths below a repeating base element.
    fn collect_fields(&self, index: usize, path: &mut String, fields: &mut Vec<String>) {
        let props = self.tree.props(index);
        for attr in &props.attributes {
            fields.push(format!("{path}/@{}", entity_display(attr.clone())));
        }
        if props.has_content {
            fields.push(path.clone());
        }
        for name in &props.child_order {
            let child = props.children[name];
            let seg = format!("/{}", entity_display(name.clone()));
            path.push_str(&seg);
            self.collect_fields(child, path, fields);
            path.truncate(path.len() - seg.len());
        }
    }
}
