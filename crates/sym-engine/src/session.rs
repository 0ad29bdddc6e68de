//! Per-session caches.
//!
//! Templates, content payloads and attached stylesheets are cached for the
//! lifetime of a [`Session`]. Caches only grow. Concurrent requests for the
//! same key share a single in-flight load.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use sym_dom::Fragment;
use tokio::sync::OnceCell;

use crate::record::ContentPayload;

/// Keyed cache where each key is loaded at most once.
///
/// A failed load leaves the key empty so a later request can try again.
#[derive(Debug)]
pub(crate) struct OnceMap<V> {
    cells: Mutex<HashMap<String, Arc<OnceCell<V>>>>,
}

impl<V> Default for OnceMap<V> {
    fn default() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }
}

impl<V: Clone> OnceMap<V> {
    fn cell(&self, key: &str) -> Arc<OnceCell<V>> {
        let mut cells = self.cells.lock().unwrap();
        Arc::clone(cells.entry(key.to_owned()).or_default())
    }

    /// Cached value, or the result of `init` shared with concurrent callers.
    pub(crate) async fn get_or_try_init<F, Fut, E>(&self, key: &str, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = self.cell(key);
        cell.get_or_try_init(init).await.cloned()
    }

    /// Value for a key that has finished loading.
    pub(crate) fn get(&self, key: &str) -> Option<V> {
        let cells = self.cells.lock().unwrap();
        cells.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Number of loaded keys.
    pub(crate) fn len(&self) -> usize {
        let cells = self.cells.lock().unwrap();
        cells.values().filter(|cell| cell.initialized()).count()
    }
}

/// Caches owned by one engine session.
#[derive(Debug, Default)]
pub struct Session {
    pub(crate) templates: OnceMap<Arc<Fragment>>,
    pub(crate) content: OnceMap<Arc<ContentPayload>>,
    pub(crate) styles: OnceMap<()>,
}

impl Session {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached templates.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Number of cached content payloads.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn content_count(&self) -> usize {
        self.content.len()
    }

    /// Number of attached stylesheets.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn style_count(&self) -> usize {
        self.styles.len()
    }
}
