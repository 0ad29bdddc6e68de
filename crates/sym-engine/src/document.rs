//! In-memory document.
//!
//! Holds what the engine owns in a browser page: the document element's
//! attributes, `<head>` (title and stylesheet links), and the application
//! root into which the shell is mounted. Shell regions are located once,
//! when the shell is mounted, and addressed by [`Region`] afterwards.

use std::collections::HashMap;

use sym_dom::{Element, Fragment, Node, NodePath, ParentNode, Selector};

/// Id of the application root element.
pub const ROOT_ID: &str = "app-root";

/// Shell regions the engine writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    /// `.site-header`
    Header,
    /// `.site-nav`
    Nav,
    /// `.main-content`, where pages are mounted.
    Main,
    /// `.site-footer`
    Footer,
}

impl Region {
    /// All regions.
    pub const ALL: [Self; 4] = [Self::Header, Self::Nav, Self::Main, Self::Footer];

    /// Class that marks the region in the shell template.
    #[must_use]
    pub fn class_name(self) -> &'static str {
        match self {
            Self::Header => "site-header",
            Self::Nav => "site-nav",
            Self::Main => "main-content",
            Self::Footer => "site-footer",
        }
    }
}

/// The engine's document.
#[derive(Clone, Debug)]
pub struct Document {
    element: Element,
    head: Element,
    root: Element,
    regions: HashMap<Region, NodePath>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with an empty application root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            element: Element::new("html"),
            head: Element::new("head").with_child(Element::new("title")),
            root: Element::new("div").with_attr("id", ROOT_ID),
            regions: HashMap::new(),
        }
    }

    /// Document title.
    #[must_use]
    pub fn title(&self) -> String {
        self.head
            .query(&Selector::tag("title"))
            .map(ParentNode::text_content)
            .unwrap_or_default()
    }

    /// Set the document title.
    pub fn set_title(&mut self, title: &str) {
        match self.head.query_mut(&Selector::tag("title")) {
            Some(el) => el.set_text(title),
            None => self.head.append(Element::new("title").with_text(title)),
        }
    }

    /// The `<head>` element.
    #[must_use]
    pub fn head(&self) -> &Element {
        &self.head
    }

    /// Append a stylesheet link to `<head>`.
    pub fn add_stylesheet(&mut self, href: &str) {
        self.head.append(
            Element::new("link")
                .with_attr("rel", "stylesheet")
                .with_attr("href", href),
        );
    }

    /// Hrefs of attached stylesheets, in attachment order.
    #[must_use]
    pub fn stylesheets(&self) -> Vec<&str> {
        self.head
            .query_all(&Selector::attr_eq("rel", "stylesheet"))
            .into_iter()
            .filter_map(|link| link.attr("href"))
            .collect()
    }

    /// The document element's `class` attribute.
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        self.element.attr("class")
    }

    /// Replace the document element's `class` attribute.
    pub fn set_class(&mut self, class: &str) {
        self.element.set_attr("class", class);
    }

    /// The application root.
    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// The application root, mutably.
    ///
    /// Callers must not add or remove the shell's region elements or their
    /// ancestors; region contents are free to change.
    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Replace the root's content with the shell and locate its regions.
    ///
    /// Returns the regions that were not found.
    pub fn mount_shell(&mut self, shell: Fragment) -> Vec<Region> {
        self.root.clear();
        self.root.append_fragment(shell);
        self.regions.clear();

        let mut missing = Vec::new();
        for region in Region::ALL {
            match self.root.path_of(&Selector::class(region.class_name())) {
                Some(path) => {
                    self.regions.insert(region, path);
                }
                None => missing.push(region),
            }
        }
        missing
    }

    /// A shell region, if the shell is mounted and has it.
    #[must_use]
    pub fn region(&self, region: Region) -> Option<&Element> {
        let path = self.regions.get(&region)?;
        self.root.element_at(path)
    }

    /// A shell region, mutably.
    pub fn region_mut(&mut self, region: Region) -> Option<&mut Element> {
        let path = self.regions.get(&region)?;
        self.root.element_at_mut(path)
    }

    /// Replace a region's content in one operation.
    ///
    /// Returns `false` if the region does not exist.
    pub fn replace_region(&mut self, region: Region, content: Fragment) -> bool {
        match self.region_mut(region) {
            Some(el) => {
                el.clear();
                el.append_fragment(content);
                true
            }
            None => false,
        }
    }

    /// Replace a region's content with a single message paragraph.
    pub fn show_region_error(&mut self, region: Region, message: &str) -> bool {
        self.replace_region(region, error_paragraph(message).into())
    }

    /// Replace the whole application root with a single message paragraph.
    ///
    /// Regions are forgotten; the shell has to be mounted again.
    pub fn show_fatal_error(&mut self, message: &str) {
        self.regions.clear();
        self.root.clear();
        self.root.append(error_paragraph(message));
    }

    /// Set the text of every root element bound to `key`.
    ///
    /// Returns the number of elements updated.
    pub fn bind_text(&mut self, key: &str, text: &str) -> usize {
        let selector = Selector::attr_eq("data-bind", key);
        bind_text_in(&mut self.root.children, &selector, text)
    }

    /// Serialize the whole document.
    #[must_use]
    pub fn to_html(&self) -> String {
        let body = Element::new("body").with_child(self.root.clone());
        let mut html = self.element.clone();
        html.clear();
        html.append(self.head.clone());
        html.append(body);
        format!("<!DOCTYPE html>{}", html.to_html())
    }
}

fn error_paragraph(message: &str) -> Element {
    Element::new("p")
        .with_attr("class", "engine-error")
        .with_text(message)
}

fn bind_text_in(nodes: &mut [Node], selector: &Selector, text: &str) -> usize {
    let mut count = 0;
    for node in nodes {
        if let Node::Element(el) = node {
            if selector.matches(el) {
                el.set_text(text);
                count += 1;
            } else {
                count += bind_text_in(&mut el.children, selector, text);
            }
        }
    }
    count
}
