//! Template-driven content engine for static documentation sites.
//!
//! A site is described by a JSON manifest (routes, template and module
//! paths), JSON content payloads, and HTML templates with binding slots.
//! The engine fetches all of them through a [`sym_fetch::Fetcher`], binds
//! content records into cloned templates, and mounts the result into an
//! in-memory [`Document`].
//!
//! # Architecture
//!
//! - [`TemplateStore`]: fetch, parse and cache templates by name
//! - [`Binder`]: fill `data-bind` slots from a record, recurse into collections
//! - [`ComponentRenderer`]: render one record, `None` on failure
//! - [`PageAssembler`]: render a payload concurrently, mount in order
//! - [`Engine`]: manifest, routing, styles, side-modules, lifecycle
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sym_engine::{Engine, ModuleRegistry, ThemeModule};
//! use sym_fetch::FsFetcher;
//!
//! let modules = ModuleRegistry::new()
//!     .with_module("/modules/theme.js", Arc::new(ThemeModule::default()));
//! let engine = Engine::new(Arc::new(FsFetcher::new("public"))).with_modules(modules);
//!
//! engine.start().await?;
//! let outcome = engine.navigate("#home").await;
//! assert!(outcome.is_rendered());
//! ```

mod assembler;
mod binder;
mod document;
mod engine;
mod error;
mod lifecycle;
mod manifest;
mod modules;
mod preferences;
mod record;
mod registry;
mod renderer;
mod session;
mod template_store;
mod theme;

pub use assembler::{AssembledPage, PageAssembler};
pub use binder::{Binder, MAX_BIND_DEPTH};
pub use document::{Document, ROOT_ID, Region};
pub use engine::{
    DEFAULT_MANIFEST_PATH, Engine, EngineState, ROUTE_FAILURE_MESSAGE, RenderReport,
    RouteOutcome, SHELL_TEMPLATE, STARTUP_FAILURE_MESSAGE,
};
pub use error::{EngineError, ModuleError};
pub use lifecycle::{Lifecycle, PageRendered};
pub use manifest::{ComponentDecl, EngineSettings, Manifest, RouteDescriptor};
pub use modules::{EngineHandle, ModuleRegistry, SideModule};
pub use preferences::{FileStore, MemoryStore, PreferenceError, PreferenceStore, Preferences};
pub use record::{ContentPayload, Record, record_type, scalar_text};
pub use registry::{ComponentRegistry, ComponentSpec, SpecialBinding};
pub use renderer::ComponentRenderer;
pub use session::Session;
pub use template_store::TemplateStore;
pub use theme::{THEME_KEY, TOGGLE_ID, Theme, ThemeModule};
