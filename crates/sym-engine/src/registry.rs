//! Component type registry.
//!
//! Maps a record's `type` to the template that renders it, the item type
//! used for its sequence fields, and any type-specific binding rule.
//! Resolution order:
//!
//! 1. Manifest `components` declarations
//! 2. Built-in declarations (`CardGrid` → `Card` items, special bindings)
//! 3. The item-suffix convention: `FooGrid` holds `Foo` items

use std::collections::HashMap;

use crate::manifest::Manifest;

/// Type-specific binding applied after slot binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecialBinding {
    /// First `a` gets `href` from `link`.
    Card,
    /// First element gets `data-variant` from `variant`.
    Callout,
    /// First element gets `data-diagram-id` from `diagramId`.
    Diagram,
    /// `headers` and `rows` become table rows.
    TableBlock,
}

/// How to render one component type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentSpec {
    /// Template name.
    pub template: String,
    /// Item type for records in sequence fields without their own `type`.
    pub item_type: Option<String>,
    /// Type-specific binding.
    pub special: Option<SpecialBinding>,
}

/// Registry of component types.
#[derive(Clone, Debug)]
pub struct ComponentRegistry {
    declared: HashMap<String, ComponentSpec>,
    item_suffix: String,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new("Grid")
    }
}

impl ComponentRegistry {
    /// Registry with the built-in declarations.
    #[must_use]
    pub fn new(item_suffix: impl Into<String>) -> Self {
        let mut registry = Self {
            declared: HashMap::new(),
            item_suffix: item_suffix.into(),
        };

        registry.declare("Card", spec("Card", None, Some(SpecialBinding::Card)));
        registry.declare(
            "Callout",
            spec("Callout", None, Some(SpecialBinding::Callout)),
        );
        registry.declare(
            "Diagram",
            spec("Diagram", None, Some(SpecialBinding::Diagram)),
        );
        registry.declare(
            "TableBlock",
            spec("TableBlock", None, Some(SpecialBinding::TableBlock)),
        );
        registry.declare("CardGrid", spec("CardGrid", Some("Card"), None));

        registry
    }

    /// Registry for a manifest: built-ins, the manifest's item suffix, and
    /// its `components` declarations layered on top.
    #[must_use]
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let mut registry = Self::new(manifest.engine.item_suffix.clone());

        for (type_name, decl) in &manifest.components {
            let base = registry.resolve(type_name);
            registry.declare(
                type_name,
                ComponentSpec {
                    template: decl.template.clone().unwrap_or(base.template),
                    item_type: decl.items.clone().or(base.item_type),
                    special: base.special,
                },
            );
        }

        registry
    }

    /// Declare or replace a component type.
    pub fn declare(&mut self, type_name: impl Into<String>, spec: ComponentSpec) {
        self.declared.insert(type_name.into(), spec);
    }

    /// Resolve a component type.
    ///
    /// Undeclared types render with the template of the same name; their
    /// item type follows the suffix convention.
    #[must_use]
    pub fn resolve(&self, type_name: &str) -> ComponentSpec {
        if let Some(spec) = self.declared.get(type_name) {
            return spec.clone();
        }

        let item_type = if self.item_suffix.is_empty() {
            None
        } else {
            type_name
                .strip_suffix(self.item_suffix.as_str())
                .filter(|base| !base.is_empty())
                .map(str::to_owned)
        };

        ComponentSpec {
            template: type_name.to_owned(),
            item_type,
            special: None,
        }
    }
}

fn spec(template: &str, item_type: Option<&str>, special: Option<SpecialBinding>) -> ComponentSpec {
    ComponentSpec {
        template: template.to_owned(),
        item_type: item_type.map(str::to_owned),
        special,
    }
}
