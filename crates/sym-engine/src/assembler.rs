//! Page assembler.

use std::sync::Mutex;

use futures::future::join_all;
use sym_dom::Fragment;

use crate::document::{Document, Region};
use crate::record::ContentPayload;
use crate::renderer::ComponentRenderer;

/// Result of assembling a page.
#[derive(Clone, Debug, Default)]
pub struct AssembledPage {
    /// Rendered components in payload order.
    pub fragment: Fragment,
    /// Number of components rendered.
    pub rendered: usize,
    /// Positions (in the payload) of components that were omitted.
    pub dropped: Vec<usize>,
}

/// Renders a content payload into a region.
#[derive(Clone, Debug)]
pub struct PageAssembler {
    renderer: ComponentRenderer,
}

impl PageAssembler {
    /// Create an assembler.
    #[must_use]
    pub fn new(renderer: ComponentRenderer) -> Self {
        Self { renderer }
    }

    /// Component renderer used by this assembler.
    #[must_use]
    pub fn renderer(&self) -> &ComponentRenderer {
        &self.renderer
    }

    /// Render every record concurrently and assemble them in payload order.
    pub async fn assemble(&self, payload: &ContentPayload) -> AssembledPage {
        let results = join_all(
            payload
                .components
                .iter()
                .map(|record| self.renderer.render_component(record)),
        )
        .await;

        let mut page = AssembledPage::default();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Some(fragment) => {
                    page.fragment.extend(fragment);
                    page.rendered += 1;
                }
                None => page.dropped.push(index),
            }
        }
        page
    }

    /// Render a payload and mount it into a region, replacing its content.
    ///
    /// `is_current` is checked after rendering; when it returns `false` the
    /// page is discarded and the region left as is. Returns `None` when the
    /// page was discarded or the region does not exist.
    ///
    /// # Panics
    ///
    /// Panics if the document lock is poisoned.
    pub async fn render_page(
        &self,
        document: &Mutex<Document>,
        region: Region,
        payload: &ContentPayload,
        is_current: impl FnOnce() -> bool,
    ) -> Option<AssembledPage> {
        let mut page = self.assemble(payload).await;

        let mut document = document.lock().unwrap();
        if !is_current() {
            return None;
        }
        let fragment = std::mem::take(&mut page.fragment);
        if !document.replace_region(region, fragment) {
            tracing::warn!(region = region.class_name(), "Region missing, page not mounted");
            return None;
        }
        Some(page)
    }
}
