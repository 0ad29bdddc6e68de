//! Data binder.
//!
//! Fills a cloned template fragment from a component record:
//!
//! - `data-bind="key"` with a scalar value replaces the element's content
//!   with plain text
//! - a sequence of records appends one bound item per record
//! - `null` empties the element
//! - an absent key removes the element if it is marked `optional`, otherwise
//!   leaves it untouched
//!
//! After slot binding, the component type's special binding (links, variants,
//! diagram ids, table rows) is applied. Item templates come from the template
//! store's resolved cache only; the binder never performs I/O.

use serde_json::Value;
use sym_dom::{Element, Fragment, Node, ParentNode, Selector};

use crate::record::{Record, record_type, scalar_text};
use crate::registry::{ComponentRegistry, SpecialBinding};
use crate::template_store::TemplateStore;

/// Maximum nesting of bound collections.
pub const MAX_BIND_DEPTH: usize = 32;

/// Binding slot attribute.
const BIND_ATTR: &str = "data-bind";

/// Marks a slot that is removed when its value is absent.
const OPTIONAL_ATTR: &str = "optional";

/// Binds records into template fragments.
#[derive(Clone, Copy, Debug)]
pub struct Binder<'a> {
    registry: &'a ComponentRegistry,
    templates: &'a TemplateStore,
}

impl<'a> Binder<'a> {
    /// Create a binder over a registry and template store.
    #[must_use]
    pub fn new(registry: &'a ComponentRegistry, templates: &'a TemplateStore) -> Self {
        Self {
            registry,
            templates,
        }
    }

    /// Bind a record into a fragment.
    ///
    /// The fragment should be a clone of a cached template; the record is
    /// not modified.
    #[must_use]
    pub fn bind(&self, fragment: Fragment, record: &Record) -> Fragment {
        self.bind_typed(fragment, record, record_type(record), 0)
    }

    fn bind_typed(
        &self,
        mut fragment: Fragment,
        record: &Record,
        type_name: Option<&str>,
        depth: usize,
    ) -> Fragment {
        let spec = type_name.map(|name| self.registry.resolve(name));
        let item_type = spec.as_ref().and_then(|s| s.item_type.as_deref());

        self.bind_nodes(&mut fragment.children, record, item_type, depth);

        if let Some(special) = spec.and_then(|s| s.special) {
            apply_special(&mut fragment, special, record);
        }

        fragment
    }

    fn bind_nodes(
        &self,
        nodes: &mut Vec<Node>,
        record: &Record,
        item_type: Option<&str>,
        depth: usize,
    ) {
        let mut index = 0;
        while index < nodes.len() {
            let remove = match &mut nodes[index] {
                Node::Element(el) => self.bind_element(el, record, item_type, depth),
                Node::Text(_) => false,
            };
            if remove {
                nodes.remove(index);
            } else {
                index += 1;
            }
        }
    }

    /// Bind one element. Returns `true` if it should be removed.
    fn bind_element(
        &self,
        element: &mut Element,
        record: &Record,
        item_type: Option<&str>,
        depth: usize,
    ) -> bool {
        let Some(key) = element.attr(BIND_ATTR).map(str::to_owned) else {
            self.bind_nodes(&mut element.children, record, item_type, depth);
            return false;
        };

        match record.get(&key) {
            Some(Value::Array(items)) => {
                self.bind_nodes(&mut element.children, record, item_type, depth);
                let bound = self.bind_items(items, item_type, depth);
                element.append_fragment(bound);
                false
            }
            Some(Value::Object(_)) => {
                tracing::warn!(key = %key, "Object value cannot fill a binding slot");
                self.bind_nodes(&mut element.children, record, item_type, depth);
                false
            }
            Some(Value::Null) => {
                element.set_text("");
                false
            }
            Some(value) => {
                if let Some(text) = scalar_text(value) {
                    element.set_text(text);
                }
                false
            }
            None if element.has_attr(OPTIONAL_ATTR) => true,
            None => {
                self.bind_nodes(&mut element.children, record, item_type, depth);
                false
            }
        }
    }

    fn bind_items(&self, items: &[Value], item_type: Option<&str>, depth: usize) -> Fragment {
        let mut out = Fragment::new();
        if items.is_empty() {
            return out;
        }
        if depth >= MAX_BIND_DEPTH {
            tracing::warn!(depth, "Binding depth limit reached, nested items not expanded");
            return out;
        }

        for item in items {
            let Value::Object(item_record) = item else {
                tracing::warn!("Skipping non-record item in collection");
                continue;
            };
            let Some(type_name) = record_type(item_record).or(item_type) else {
                tracing::warn!("Skipping collection item without a type");
                continue;
            };
            let template_name = self.registry.resolve(type_name).template;
            let Some(template) = self.templates.cached(&template_name) else {
                tracing::warn!(template = %template_name, "Item template not loaded, skipping item");
                continue;
            };

            let bound = self.bind_typed((*template).clone(), item_record, Some(type_name), depth + 1);
            out.extend(bound);
        }

        out
    }
}

fn apply_special(fragment: &mut Fragment, special: SpecialBinding, record: &Record) {
    match special {
        SpecialBinding::Card => {
            if let Some(link) = record.get("link").and_then(scalar_text) {
                match fragment.query_mut(&Selector::tag("a")) {
                    Some(anchor) => anchor.set_attr("href", link),
                    None => tracing::debug!("Card template has no anchor for link"),
                }
            }
        }
        SpecialBinding::Callout => {
            set_first_element_attr(fragment, "data-variant", record.get("variant"));
        }
        SpecialBinding::Diagram => {
            set_first_element_attr(fragment, "data-diagram-id", record.get("diagramId"));
        }
        SpecialBinding::TableBlock => bind_table(fragment, record),
    }
}

fn set_first_element_attr(fragment: &mut Fragment, name: &str, value: Option<&Value>) {
    let Some(text) = value.and_then(scalar_text) else {
        return;
    };
    if let Some(first) = fragment.first_element_child_mut() {
        first.set_attr(name, text);
    }
}

fn bind_table(fragment: &mut Fragment, record: &Record) {
    if let Some(Value::Array(headers)) = record.get("headers") {
        if let Some(thead) = fragment.query_mut(&Selector::tag("thead")) {
            thead.append(table_row("th", headers));
        }
    }

    if let Some(Value::Array(rows)) = record.get("rows") {
        if let Some(tbody) = fragment.query_mut(&Selector::tag("tbody")) {
            for row in rows {
                match row {
                    Value::Array(cells) => tbody.append(table_row("td", cells)),
                    _ => tracing::warn!("Skipping table row that is not a sequence"),
                }
            }
        }
    }
}

fn table_row(cell_tag: &str, cells: &[Value]) -> Element {
    let mut row = Element::new("tr");
    for cell in cells {
        let text = scalar_text(cell).unwrap_or_default();
        row.append(Element::new(cell_tag).with_text(text));
    }
    row
}
