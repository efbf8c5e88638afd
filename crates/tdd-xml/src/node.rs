//! Owned element tree.
//!
//! Rewrite code addresses children by *element index*: the position of a child
//! among its sibling elements, ignoring text, comment and CDATA nodes. The
//! node-level vector stays available through [`Element::children`] for code
//! that has to preserve mixed content.

use std::path::Path;

use crate::error::Result;

/// A parsed XML document: the root element plus everything below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Parse a document from a string.
    pub fn parse_str(source: &str) -> Result<Self> {
        crate::read::parse_document(source)
    }

    /// Read and parse a document from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| crate::error::XmlError::io("read", path, e))?;
        Self::parse_str(&source)
    }

    /// Serialize with an XML declaration and two-space indentation.
    pub fn to_xml_string(&self) -> Result<String> {
        crate::write::document_to_string(self)
    }

    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        crate::write::write_document(self, path)
    }
}

/// One attribute, stored with its qualified name and unescaped value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// An XML element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    name: String,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

/// Split a qualified name into its prefix (without colon) and local part.
pub fn split_qname(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Element holding a single text node.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.children.push(Node::Text(text.into()));
        element
    }

    /// Builder-style child append.
    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Builder-style attribute set.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    // --- names -------------------------------------------------------------

    /// Qualified name as written, e.g. `oe:items`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn local_name(&self) -> &str {
        split_qname(&self.name).1
    }

    pub fn prefix(&self) -> Option<&str> {
        split_qname(&self.name).0
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    // --- attributes --------------------------------------------------------

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// First attribute whose local name matches, whatever its prefix.
    pub fn attribute_local(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| split_qname(&attr.name).1 == local)
            .map(|attr| attr.value.as_str())
    }

    /// Set an attribute, replacing the value in place when it already exists.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let position = self.attributes.iter().position(|attr| attr.name == name)?;
        Some(self.attributes.remove(position).value)
    }

    pub fn retain_attributes(&mut self, keep: impl FnMut(&Attribute) -> bool) {
        self.attributes.retain(keep);
    }

    // --- raw children ------------------------------------------------------

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    // --- element children --------------------------------------------------

    pub fn child_elements(&self) -> impl DoubleEndedIterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn child_elements_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(Node::as_element_mut)
    }

    pub fn element_count(&self) -> usize {
        self.child_elements().count()
    }

    pub fn has_element_children(&self) -> bool {
        self.child_elements().next().is_some()
    }

    /// Node positions of every child element, in document order.
    ///
    /// Callers that mutate children while walking them take this snapshot
    /// first so renames and insertions below do not disturb the iteration.
    pub fn element_positions(&self) -> Vec<usize> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(position, node)| node.as_element().map(|_| position))
            .collect()
    }

    /// Child element at node position `position`.
    pub fn node_element_mut(&mut self, position: usize) -> Option<&mut Element> {
        self.children.get_mut(position).and_then(Node::as_element_mut)
    }

    pub fn nth_element(&self, index: usize) -> Option<&Element> {
        self.child_elements().nth(index)
    }

    pub fn last_element(&self) -> Option<&Element> {
        self.child_elements().last()
    }

    /// First child element whose local name matches.
    pub fn child(&self, local: &str) -> Option<&Element> {
        self.child_elements().find(|child| child.local_name() == local)
    }

    pub fn child_mut(&mut self, local: &str) -> Option<&mut Element> {
        self.child_elements_mut()
            .find(|child| child.local_name() == local)
    }

    /// Element index of the first child with this local name.
    pub fn element_index_of(&self, local: &str) -> Option<usize> {
        self.child_elements()
            .position(|child| child.local_name() == local)
    }

    /// Element index of the last child with this local name.
    pub fn last_element_index_of(&self, local: &str) -> Option<usize> {
        let positions: Vec<usize> = self
            .child_elements()
            .enumerate()
            .filter(|(_, child)| child.local_name() == local)
            .map(|(index, _)| index)
            .collect();
        positions.last().copied()
    }

    fn node_position(&self, element_index: usize) -> Option<usize> {
        self.children
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node, Node::Element(_)))
            .map(|(position, _)| position)
            .nth(element_index)
    }

    /// Insert `child` so it becomes the element at `element_index`.
    ///
    /// An index past the last element appends.
    pub fn insert_element(&mut self, element_index: usize, child: Element) {
        match self.node_position(element_index) {
            Some(position) => self.children.insert(position, Node::Element(child)),
            None => self.children.push(Node::Element(child)),
        }
    }

    pub fn push_element(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn remove_element(&mut self, element_index: usize) -> Option<Element> {
        let position = self.node_position(element_index)?;
        match self.children.remove(position) {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Drop every child node except the first child element.
    pub fn keep_first_element_only(&mut self) {
        let first = self
            .children
            .iter()
            .position(|node| matches!(node, Node::Element(_)));
        match first {
            Some(position) => {
                let kept = self.children.swap_remove(position);
                self.children.clear();
                self.children.push(kept);
            }
            None => self.children.clear(),
        }
    }

    // --- text --------------------------------------------------------------

    /// Concatenated text and CDATA content of this element and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) | Node::CData(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
                Node::Comment(_) => {}
            }
        }
    }

    /// Replace every child with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.clear();
        self.children.push(Node::Text(text.into()));
    }

    // --- traversal ---------------------------------------------------------

    /// Descendant elements in document order, excluding `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.child_elements().rev().collect(),
        }
    }

    /// Apply `f` to this element and every descendant, children before parents.
    pub fn for_each_postorder_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        for child in self.child_elements_mut() {
            child.for_each_postorder_mut(f);
        }
        f(self);
    }
}

/// Preorder iterator over descendant elements.
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.child_elements().rev());
        Some(next)
    }
}
