//! Page lifecycle notifications.

use std::sync::{Arc, RwLock};

use crate::record::ContentPayload;

/// Notification sent after a page has been mounted.
#[derive(Clone, Debug)]
pub struct PageRendered {
    /// Id of the rendered route.
    pub route_id: String,
    /// Content payload the page was rendered from.
    pub content: Arc<ContentPayload>,
}

type Observer = Arc<dyn Fn(&PageRendered) + Send + Sync>;

/// Observer registry for page-rendered notifications.
///
/// Observers run synchronously, in registration order.
#[derive(Default)]
pub struct Lifecycle {
    observers: RwLock<Vec<Observer>>,
}

impl Lifecycle {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn on_page_rendered(&self, observer: impl Fn(&PageRendered) + Send + Sync + 'static) {
        self.observers.write().unwrap().push(Arc::new(observer));
    }

    /// Notify every observer.
    ///
    /// Observers may register further observers; those are called from the
    /// next notification on.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn notify(&self, event: &PageRendered) {
        let observers = self.observers.read().unwrap().clone();
        for observer in &observers {
            observer(event);
        }
    }

    /// Number of registered observers.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.read().unwrap().len()
    }

    /// Whether no observers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("observers", &self.len())
            .finish()
    }
}
