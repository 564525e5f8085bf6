//! Arena DOM
//!
//! html5ever parses into an `RcDom`, which is immediately converted into a flat
//! arena: every node lives in one `Vec` and is addressed by a `NodeId`. Units
//! extracted from a document keep `NodeId`s instead of shared node pointers, so
//! a cloned tree can be edited without touching the loaded document.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

/// Index of a node inside a `Tree`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Doctype {
        name: String,
    },
    Element {
        name: String,
        attrs: Vec<Attr>,
    },
    Text(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        contents: String,
    },
}

#[derive(Clone, Debug)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub data: NodeData,
}

/// Flat, index-addressed document tree
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<Node>,
}

/// Parses HTML text into an arena tree
///
/// Parsing is error-tolerant: malformed markup is repaired the way browsers
/// repair it, so this never fails.
pub fn html_to_tree(html: &str) -> Tree {
    let dom: RcDom = parse_document(RcDom::default(), Default::default()).one(html);

    let mut tree = Tree { nodes: Vec::new() };
    tree.import(&dom.document, None);
    tracing::debug!("Parsed HTML into {} nodes", tree.len());
    tree
}

impl Tree {
    fn import(&mut self, handle: &Handle, parent: Option<NodeId>) -> NodeId {
        let data = match &handle.data {
            RcNodeData::Document => NodeData::Document,
            RcNodeData::Doctype { name, .. } => NodeData::Doctype {
                name: name.to_string(),
            },
            RcNodeData::Text { contents } => NodeData::Text(contents.borrow().to_string()),
            RcNodeData::Comment { contents } => NodeData::Comment(contents.to_string()),
            RcNodeData::Element { name, attrs, .. } => NodeData::Element {
                name: name.local.to_string(),
                attrs: attrs
                    .borrow()
                    .iter()
                    .map(|attr| Attr {
                        name: match &attr.name.prefix {
                            Some(prefix) => format!("{}:{}", prefix, attr.name.local),
                            None => attr.name.local.to_string(),
                        },
                        value: attr.value.to_string(),
                    })
                    .collect(),
            },
            RcNodeData::ProcessingInstruction { target, contents } => {
                NodeData::ProcessingInstruction {
                    target: target.to_string(),
                    contents: contents.to_string(),
                }
            }
        };

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            data,
        });

        let mut child_ids = Vec::new();
        // Template contents live in a separate fragment; flatten them back in
        if let RcNodeData::Element {
            template_contents, ..
        } = &handle.data
        {
            if let Some(contents) = template_contents.borrow().as_ref() {
                for child in contents.children.borrow().iter() {
                    child_ids.push(self.import(child, Some(id)));
                }
            }
        }
        for child in handle.children.borrow().iter() {
            child_ids.push(self.import(child, Some(id)));
        }
        self.nodes[id.0].children = child_ids;

        id
    }

    pub fn document(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.get(id).map(|node| &node.data)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    /// Local name of an element node
    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            Some(NodeData::Element { name, .. }) => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            Some(NodeData::Text(contents)) => Some(contents.as_str()),
            _ => None,
        }
    }

    /// Overwrites a text node; returns `false` when `id` is not a text node
    pub fn set_text(&mut self, id: NodeId, contents: String) -> bool {
        match self.nodes.get_mut(id.0).map(|node| &mut node.data) {
            Some(NodeData::Text(current)) => {
                *current = contents;
                true
            }
            _ => false,
        }
    }

    pub fn attrs(&self, id: NodeId) -> &[Attr] {
        match self.data(id) {
            Some(NodeData::Element { attrs, .. }) => attrs.as_slice(),
            _ => &[],
        }
    }

    /// Attribute value, attribute names compared case-insensitively
    pub fn get_attr(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(attr_name))
            .map(|attr| attr.value.as_str())
    }

    /// Sets or removes (`None`) an attribute; returns `false` for non-elements
    pub fn set_attr(&mut self, id: NodeId, attr_name: &str, attr_value: Option<String>) -> bool {
        let attrs = match self.nodes.get_mut(id.0).map(|node| &mut node.data) {
            Some(NodeData::Element { attrs, .. }) => attrs,
            _ => return false,
        };

        match attr_value {
            Some(value) => {
                if let Some(existing) = attrs
                    .iter_mut()
                    .find(|attr| attr.name.eq_ignore_ascii_case(attr_name))
                {
                    existing.value = value;
                } else {
                    attrs.push(Attr {
                        name: attr_name.to_string(),
                        value,
                    });
                }
            }
            None => attrs.retain(|attr| !attr.name.eq_ignore_ascii_case(attr_name)),
        }

        true
    }

    /// Ancestor chain of `id`, nearest first
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// All nodes below `root` (excluding it) in document order
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            found.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }

        found
    }

    /// First element named `node_name` in document order
    pub fn find_element(&self, node_name: &str) -> Option<NodeId> {
        self.descendants(self.document())
            .into_iter()
            .find(|id| self.element_name(*id) == Some(node_name))
    }

    /// First child element of `parent` named `node_name`
    pub fn get_child_node_by_name(&self, parent: NodeId, node_name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|id| self.element_name(*id) == Some(node_name))
    }

    /// Concatenated text of all text descendants
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|child| self.text(child))
            .collect()
    }
}

pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}
