//! Side-modules.
//!
//! Optional features (theme switching, search, accessibility helpers,
//! diagrams) live outside the engine. The manifest names them under
//! `modules` with a module path; the host registers an implementation for
//! each path it supports. The engine initialises core modules after the
//! shell is mounted and route modules when their route is shown, each at
//! most once per session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::document::Document;
use crate::error::ModuleError;
use crate::lifecycle::{Lifecycle, PageRendered};
use crate::manifest::Manifest;
use crate::preferences::Preferences;

/// A pluggable feature initialised by the engine.
///
/// `init` may be called again after a failure, so implementations should
/// be idempotent.
pub trait SideModule: Send + Sync {
    /// Module name, used in logs.
    fn name(&self) -> &str;

    /// Initialise against a running engine.
    fn init(&self, engine: &EngineHandle) -> Result<(), ModuleError>;
}

/// Side-module implementations keyed by manifest module path.
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<dyn SideModule>>,
}

impl ModuleRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an implementation for a module path.
    #[must_use]
    pub fn with_module(mut self, path: impl Into<String>, module: Arc<dyn SideModule>) -> Self {
        self.register(path, module);
        self
    }

    /// Register an implementation for a module path.
    pub fn register(&mut self, path: impl Into<String>, module: Arc<dyn SideModule>) {
        self.modules.insert(path.into(), module);
    }

    /// Implementation for a module path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Arc<dyn SideModule>> {
        self.modules.get(path)
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut paths: Vec<_> = self.modules.keys().collect();
        paths.sort();
        f.debug_struct("ModuleRegistry")
            .field("paths", &paths)
            .finish()
    }
}

/// What side-modules see of a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    document: Arc<Mutex<Document>>,
    manifest: Arc<Manifest>,
    preferences: Arc<Preferences>,
    lifecycle: Arc<Lifecycle>,
}

impl EngineHandle {
    pub(crate) fn new(
        document: Arc<Mutex<Document>>,
        manifest: Arc<Manifest>,
        preferences: Arc<Preferences>,
        lifecycle: Arc<Lifecycle>,
    ) -> Self {
        Self {
            document,
            manifest,
            preferences,
            lifecycle,
        }
    }

    /// Run a closure with the document locked.
    ///
    /// Do not block or wait inside the closure.
    ///
    /// # Panics
    ///
    /// Panics if the document lock is poisoned.
    pub fn with_document<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        let mut document = self.document.lock().unwrap();
        f(&mut document)
    }

    /// The site manifest.
    #[must_use]
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// User preferences.
    #[must_use]
    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Subscribe to page-rendered notifications.
    pub fn on_page_rendered(&self, observer: impl Fn(&PageRendered) + Send + Sync + 'static) {
        self.lifecycle.on_page_rendered(observer);
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("app_name", &self.manifest.app_name)
            .finish_non_exhaustive()
    }
}
