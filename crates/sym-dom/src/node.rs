//! Document tree types.
//!
//! The tree is fully owned: cloning a [`Fragment`] is a deep clone, which is
//! exactly what template instantiation needs.

use crate::selector::Selector;
use crate::serializer;

/// A node in the document tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// Element with tag, attributes and children.
    Element(Element),
    /// Plain text (stored unescaped).
    Text(String),
}

impl Node {
    /// Create a text node.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Borrow the element, if this node is one.
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            Self::Text(_) => None,
        }
    }

    /// Mutably borrow the element, if this node is one.
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(el) => Some(el),
            Self::Text(_) => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

/// An element node.
///
/// Attributes keep their source order so that serialized output is stable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name.
    pub tag: String,
    attrs: Vec<(String, String)>,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

impl Element {
    /// Create an empty element.
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder form of [`Element::set_attr`].
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder form of [`Element::set_text`].
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    /// Builder form of [`Element::append`].
    #[must_use]
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.append(child);
        self
    }

    /// Get an attribute value.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Check whether the attribute is present (valueless attributes count).
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(key, _)| key == name)
    }

    /// Set an attribute, replacing any previous value in place.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|(key, _)| key == name)?;
        Some(self.attrs.remove(index).1)
    }

    /// Iterate attributes in source order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Check the whitespace-separated `class` list.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == class))
    }

    /// Replace all children with a single text node.
    ///
    /// The text is stored as-is and escaped on serialization, so content
    /// data can never inject markup.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.children.clear();
        if !text.is_empty() {
            self.children.push(Node::Text(text));
        }
    }

    /// Append a child node.
    pub fn append(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    /// Move all nodes of a fragment to the end of this element.
    pub fn append_fragment(&mut self, fragment: Fragment) {
        self.children.extend(fragment.children);
    }

    /// Remove all children.
    pub fn clear(&mut self) {
        self.children.clear();
    }

    /// Serialize this element (including itself) to HTML.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        serializer::write_element(self, &mut out);
        out
    }
}

/// A detached list of nodes, like a DOM `DocumentFragment`.
///
/// Parsed templates, bound components and assembled pages are all fragments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fragment {
    /// Top-level nodes in document order.
    pub children: Vec<Node>,
}

impl Fragment {
    /// Create an empty fragment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if the fragment has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Append a node.
    pub fn append(&mut self, node: impl Into<Node>) {
        self.children.push(node.into());
    }

    /// Move all nodes of another fragment to the end of this one.
    pub fn extend(&mut self, other: Fragment) {
        self.children.extend(other.children);
    }

    /// Serialize all nodes to HTML.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        serializer::write_nodes(&self.children, &mut out);
        out
    }
}

impl From<Element> for Fragment {
    fn from(element: Element) -> Self {
        Self {
            children: vec![Node::Element(element)],
        }
    }
}

/// Location of an element relative to a parent node.
///
/// Each index selects a child of the previous step. Paths stay valid as
/// long as the siblings along the path are not inserted or removed, which
/// holds for shell regions: only their contents change.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// Path steps.
    #[must_use]
    pub fn steps(&self) -> &[usize] {
        &self.0
    }
}

/// DOM-style queries shared by [`Element`] and [`Fragment`].
///
/// All searches are depth-first in document order and never match the
/// receiver itself, only its descendants.
pub trait ParentNode {
    /// Child nodes.
    fn child_nodes(&self) -> &[Node];

    /// Mutable child nodes.
    fn child_nodes_mut(&mut self) -> &mut Vec<Node>;

    /// Concatenated text of all descendant text nodes.
    fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self.child_nodes(), &mut out);
        out
    }

    /// First descendant matching the selector.
    fn query(&self, selector: &Selector) -> Option<&Element> {
        query(self.child_nodes(), selector)
    }

    /// First descendant matching the selector, mutably.
    fn query_mut(&mut self, selector: &Selector) -> Option<&mut Element> {
        query_mut(self.child_nodes_mut(), selector)
    }

    /// All descendants matching the selector.
    fn query_all(&self, selector: &Selector) -> Vec<&Element> {
        let mut found = Vec::new();
        query_all(self.child_nodes(), selector, &mut found);
        found
    }

    /// First child that is an element.
    fn first_element_child(&self) -> Option<&Element> {
        self.child_nodes().iter().find_map(Node::as_element)
    }

    /// First child that is an element, mutably.
    fn first_element_child_mut(&mut self) -> Option<&mut Element> {
        self.child_nodes_mut()
            .iter_mut()
            .find_map(Node::as_element_mut)
    }

    /// Path to the first descendant matching the selector.
    fn path_of(&self, selector: &Selector) -> Option<NodePath> {
        let mut steps = Vec::new();
        find_path(self.child_nodes(), selector, &mut steps).then_some(NodePath(steps))
    }

    /// Element at a path previously returned by [`ParentNode::path_of`].
    fn element_at(&self, path: &NodePath) -> Option<&Element> {
        let (first, rest) = path.0.split_first()?;
        let mut current = self.child_nodes().get(*first)?.as_element()?;
        for index in rest {
            current = current.children.get(*index)?.as_element()?;
        }
        Some(current)
    }

    /// Mutable element at a path.
    fn element_at_mut(&mut self, path: &NodePath) -> Option<&mut Element> {
        let (first, rest) = path.0.split_first()?;
        let mut current = self.child_nodes_mut().get_mut(*first)?.as_element_mut()?;
        for index in rest {
            current = current.children.get_mut(*index)?.as_element_mut()?;
        }
        Some(current)
    }
}

impl ParentNode for Element {
    fn child_nodes(&self) -> &[Node] {
        &self.children
    }

    fn child_nodes_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }
}

impl ParentNode for Fragment {
    fn child_nodes(&self) -> &[Node] {
        &self.children
    }

    fn child_nodes_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => collect_text(&el.children, out),
        }
    }
}

fn query<'a>(nodes: &'a [Node], selector: &Selector) -> Option<&'a Element> {
    for node in nodes {
        if let Node::Element(el) = node {
            if selector.matches(el) {
                return Some(el);
            }
            if let Some(found) = query(&el.children, selector) {
                return Some(found);
            }
        }
    }
    None
}

fn query_mut<'a>(nodes: &'a mut [Node], selector: &Selector) -> Option<&'a mut Element> {
    for node in nodes {
        if let Node::Element(el) = node {
            if selector.matches(el) {
                return Some(el);
            }
            if let Some(found) = query_mut(&mut el.children, selector) {
                return Some(found);
            }
        }
    }
    None
}

fn query_all<'a>(nodes: &'a [Node], selector: &Selector, found: &mut Vec<&'a Element>) {
    for node in nodes {
        if let Node::Element(el) = node {
            if selector.matches(el) {
                found.push(el);
            }
            query_all(&el.children, selector, found);
        }
    }
}

fn find_path(nodes: &[Node], selector: &Selector, steps: &mut Vec<usize>) -> bool {
    for (index, node) in nodes.iter().enumerate() {
        if let Node::Element(el) = node {
            steps.push(index);
            if selector.matches(el) || find_path(&el.children, selector, steps) {
                return true;
            }
            steps.pop();
        }
    }
    false
}
