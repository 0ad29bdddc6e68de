//! Component renderer.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use sym_dom::Fragment;

use crate::binder::{Binder, MAX_BIND_DEPTH};
use crate::record::{Record, record_type};
use crate::registry::ComponentRegistry;
use crate::template_store::TemplateStore;

/// Renders component records into bound fragments.
///
/// Failures are component-scoped: they are logged and the component is
/// omitted, never propagated.
#[derive(Clone, Debug)]
pub struct ComponentRenderer {
    templates: TemplateStore,
    registry: Arc<ComponentRegistry>,
}

impl ComponentRenderer {
    /// Create a renderer.
    #[must_use]
    pub fn new(templates: TemplateStore, registry: ComponentRegistry) -> Self {
        Self {
            templates,
            registry: Arc::new(registry),
        }
    }

    /// Template store used by this renderer.
    #[must_use]
    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    /// Render one record.
    ///
    /// The component's own template and every nested item template are
    /// fetched concurrently before binding. Returns `None` when the record
    /// has no type or its template cannot be loaded.
    pub async fn render_component(&self, record: &Value) -> Option<Fragment> {
        let Some(record) = record.as_object() else {
            tracing::warn!("Skipping component that is not a record");
            return None;
        };
        let Some(type_name) = record_type(record) else {
            tracing::warn!("Skipping component without a type");
            return None;
        };

        let spec = self.registry.resolve(type_name);
        let (template, ()) = futures::join!(
            self.templates.fetch_template(&spec.template),
            self.prefetch_items(record, spec.item_type.as_deref()),
        );

        let template = match template {
            Ok(template) => template,
            Err(e) => {
                tracing::warn!(component = %type_name, error = %e, "Failed to render component");
                return None;
            }
        };

        let binder = Binder::new(&self.registry, &self.templates);
        Some(binder.bind((*template).clone(), record))
    }

    /// Fetch every template needed by nested collection items.
    async fn prefetch_items(&self, record: &Record, item_type: Option<&str>) {
        let mut names = BTreeSet::new();
        self.collect_item_templates(record, item_type, 0, &mut names);
        if names.is_empty() {
            return;
        }

        let results = join_all(names.iter().map(|name| self.templates.fetch_template(name))).await;
        for (name, result) in names.iter().zip(results) {
            if let Err(e) = result {
                tracing::debug!(template = %name, error = %e, "Item template unavailable");
            }
        }
    }

    fn collect_item_templates(
        &self,
        record: &Record,
        item_type: Option<&str>,
        depth: usize,
        names: &mut BTreeSet<String>,
    ) {
        if depth >= MAX_BIND_DEPTH {
            return;
        }

        for value in record.values() {
            let Value::Array(items) = value else {
                continue;
            };
            for item in items.iter().filter_map(Value::as_object) {
                let Some(type_name) = record_type(item).or(item_type) else {
                    continue;
                };
                let spec = self.registry.resolve(type_name);
                self.collect_item_templates(item, spec.item_type.as_deref(), depth + 1, names);
                names.insert(spec.template);
            }
        }
    }
}
