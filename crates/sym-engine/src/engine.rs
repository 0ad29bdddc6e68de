//! Route resolver and orchestrator.
//!
//! [`Engine`] owns the manifest, the session caches and the document. It
//! boots the shell, maps location fragments to routes, loads each route's
//! content, styles and modules concurrently, and mounts the assembled page.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use futures::future::try_join_all;
use sym_dom::{Element, Fragment, ParentNode, Selector};
use sym_fetch::Fetcher;

use crate::assembler::PageAssembler;
use crate::document::{Document, Region};
use crate::error::EngineError;
use crate::lifecycle::{Lifecycle, PageRendered};
use crate::manifest::{Manifest, RouteDescriptor};
use crate::modules::{EngineHandle, ModuleRegistry};
use crate::preferences::Preferences;
use crate::record::ContentPayload;
use crate::registry::ComponentRegistry;
use crate::renderer::ComponentRenderer;
use crate::session::Session;
use crate::template_store::TemplateStore;

/// Default manifest path.
pub const DEFAULT_MANIFEST_PATH: &str = "/manifest.json";

/// Template mounted into the application root at startup.
pub const SHELL_TEMPLATE: &str = "Shell";

/// Shown in place of the application when startup fails.
pub const STARTUP_FAILURE_MESSAGE: &str = "Failed to load the application.";

/// Shown in the main region when a route fails to load.
pub const ROUTE_FAILURE_MESSAGE: &str = "Failed to load page content.";

/// Engine lifecycle state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// Not started.
    Uninitialized,
    /// Manifest parsed and validated.
    ManifestLoaded,
    /// Shell mounted and regions located.
    ShellMounted,
    /// A route's page is mounted.
    RouteActive(String),
    /// Startup failed. Terminal.
    Failed,
}

/// Summary of a rendered route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderReport {
    /// Route id.
    pub route_id: String,
    /// Document title that was set.
    pub title: String,
    /// Number of components rendered.
    pub rendered: usize,
    /// Payload positions of omitted components.
    pub dropped: Vec<usize>,
}

/// Result of a route change.
#[derive(Debug)]
pub enum RouteOutcome {
    /// The route's page was mounted.
    Rendered(RenderReport),
    /// The route was unknown; the location was rewritten to the default
    /// route, which was then handled.
    Redirected {
        /// Requested route id.
        from: String,
        /// Default route id.
        to: String,
        /// Outcome of handling the default route.
        outcome: Box<RouteOutcome>,
    },
    /// Loading failed; the main region shows an error message.
    Failed {
        /// Route id.
        route_id: String,
        /// Cause.
        error: EngineError,
    },
    /// A newer route change started before this one finished.
    Superseded {
        /// Route id.
        route_id: String,
    },
}

impl RouteOutcome {
    /// Report of the page that was mounted, following redirects.
    #[must_use]
    pub fn report(&self) -> Option<&RenderReport> {
        match self {
            Self::Rendered(report) => Some(report),
            Self::Redirected { outcome, .. } => outcome.report(),
            Self::Failed { .. } | Self::Superseded { .. } => None,
        }
    }

    /// Whether a page was mounted.
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        self.report().is_some()
    }
}

/// Parts that exist once the manifest is loaded.
#[derive(Debug)]
struct Runtime {
    manifest: Arc<Manifest>,
    assembler: PageAssembler,
    handle: EngineHandle,
}

/// The content engine.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use sym_engine::Engine;
/// use sym_fetch::FsFetcher;
///
/// let engine = Engine::new(Arc::new(FsFetcher::new("public")));
/// engine.start().await?;
/// let outcome = engine.navigate("#getting-started").await;
/// println!("{}", engine.document().to_html());
/// ```
pub struct Engine {
    fetcher: Arc<dyn Fetcher>,
    manifest_path: String,
    modules: ModuleRegistry,
    document: Arc<Mutex<Document>>,
    preferences: Arc<Preferences>,
    lifecycle: Arc<Lifecycle>,
    session: Arc<Session>,
    state: Mutex<EngineState>,
    location: Mutex<String>,
    generation: AtomicU64,
    initialised_modules: Mutex<HashSet<String>>,
    runtime: OnceLock<Runtime>,
}

impl Engine {
    /// Create an engine that fetches through `fetcher`.
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            manifest_path: DEFAULT_MANIFEST_PATH.to_owned(),
            modules: ModuleRegistry::new(),
            document: Arc::new(Mutex::new(Document::new())),
            preferences: Arc::new(Preferences::session_only()),
            lifecycle: Arc::new(Lifecycle::new()),
            session: Arc::new(Session::new()),
            state: Mutex::new(EngineState::Uninitialized),
            location: Mutex::new(String::new()),
            generation: AtomicU64::new(0),
            initialised_modules: Mutex::new(HashSet::new()),
            runtime: OnceLock::new(),
        }
    }

    /// Set the manifest path.
    #[must_use]
    pub fn with_manifest_path(mut self, path: impl Into<String>) -> Self {
        self.manifest_path = path.into();
        self
    }

    /// Set the side-module implementations.
    #[must_use]
    pub fn with_modules(mut self, modules: ModuleRegistry) -> Self {
        self.modules = modules;
        self
    }

    /// Set the preference store.
    #[must_use]
    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = Arc::new(preferences);
        self
    }

    /// Set the initial location fragment.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_location(self, fragment: impl Into<String>) -> Self {
        *self.location.lock().unwrap() = fragment.into();
        self
    }

    /// Current state.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn state(&self) -> EngineState {
        self.state.lock().unwrap().clone()
    }

    /// Current location fragment (for example `#guide`).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn location(&self) -> String {
        self.location.lock().unwrap().clone()
    }

    /// Loaded manifest.
    #[must_use]
    pub fn manifest(&self) -> Option<&Manifest> {
        self.runtime.get().map(|runtime| runtime.manifest.as_ref())
    }

    /// Snapshot of the document.
    ///
    /// # Panics
    ///
    /// Panics if the document lock is poisoned.
    #[must_use]
    pub fn document(&self) -> Document {
        self.document.lock().unwrap().clone()
    }

    /// Session caches.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Handle for side-modules and hosts, once started.
    #[must_use]
    pub fn handle(&self) -> Option<EngineHandle> {
        self.runtime.get().map(|runtime| runtime.handle.clone())
    }

    /// Subscribe to page-rendered notifications.
    pub fn on_page_rendered(&self, observer: impl Fn(&PageRendered) + Send + Sync + 'static) {
        self.lifecycle.on_page_rendered(observer);
    }

    /// Boot the engine: load the manifest, mount the shell, initialise core
    /// modules.
    ///
    /// Does not render a route; call [`Engine::handle_route_change`] next.
    /// Any error is fatal: the application root is replaced with a failure
    /// message and the engine moves to [`EngineState::Failed`].
    ///
    /// # Errors
    ///
    /// Returns the error that stopped startup.
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    pub async fn start(&self) -> Result<(), EngineError> {
        if self.runtime.get().is_some() {
            tracing::debug!("Engine already started");
            return Ok(());
        }

        tracing::info!(manifest = %self.manifest_path, "Starting engine");
        match self.boot().await {
            Ok(runtime) => {
                let runtime = self.runtime.get_or_init(|| runtime);
                self.init_core_modules(runtime);
                tracing::info!(app = %runtime.manifest.app_name, "Engine started");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Engine startup failed");
                self.document
                    .lock()
                    .unwrap()
                    .show_fatal_error(STARTUP_FAILURE_MESSAGE);
                self.set_state(EngineState::Failed);
                Err(e)
            }
        }
    }

    async fn boot(&self) -> Result<Runtime, EngineError> {
        let text = self.fetcher.fetch_text(&self.manifest_path).await?;
        let manifest = Arc::new(Manifest::from_json(&text, &self.manifest_path)?);
        self.set_state(EngineState::ManifestLoaded);

        let templates = TemplateStore::new(
            Arc::clone(&self.fetcher),
            manifest.templates.clone(),
            Arc::clone(&self.session),
        );
        let shell = templates.fetch_template(SHELL_TEMPLATE).await?;
        let renderer = ComponentRenderer::new(templates, ComponentRegistry::from_manifest(&manifest));

        {
            let mut document = self.document.lock().unwrap();
            let missing = document.mount_shell((*shell).clone());
            if missing.contains(&Region::Main) {
                return Err(EngineError::Config(format!(
                    "shell template has no .{} region",
                    Region::Main.class_name()
                )));
            }
            for region in missing {
                tracing::debug!(region = region.class_name(), "Shell region not present");
            }
            populate_shell(&mut document, &manifest);
        }
        self.set_state(EngineState::ShellMounted);

        let handle = EngineHandle::new(
            Arc::clone(&self.document),
            Arc::clone(&manifest),
            Arc::clone(&self.preferences),
            Arc::clone(&self.lifecycle),
        );

        Ok(Runtime {
            manifest,
            assembler: PageAssembler::new(renderer),
            handle,
        })
    }

    fn init_core_modules(&self, runtime: &Runtime) {
        for name in &runtime.manifest.engine.core_modules {
            if let Err(e) = self.init_module(runtime, name) {
                tracing::warn!(module = %name, error = %e, "Failed to load core module");
            }
        }
    }

    /// Set the location and handle the route change.
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    pub async fn navigate(&self, fragment: &str) -> RouteOutcome {
        self.set_location(fragment);
        self.handle_route_change().await
    }

    /// Render the route named by the current location.
    ///
    /// An empty fragment selects the default route; an unknown one rewrites
    /// the location to the default route and renders that instead.
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    pub async fn handle_route_change(&self) -> RouteOutcome {
        let Some(runtime) = self.runtime.get() else {
            return RouteOutcome::Failed {
                route_id: route_id_from(&self.location(), ""),
                error: EngineError::NotStarted,
            };
        };
        let manifest = &runtime.manifest;

        let route_id = route_id_from(&self.location(), &manifest.default_route);
        if let Some(route) = manifest.route(&route_id) {
            return self.render_route(runtime, &route_id, route).await;
        }

        tracing::warn!(route = %route_id, "Route not found, redirecting to default");
        let default_id = manifest.default_route.clone();
        self.set_location(&format!("#{default_id}"));

        let outcome = match manifest.route(&default_id) {
            Some(route) => self.render_route(runtime, &default_id, route).await,
            None => RouteOutcome::Failed {
                route_id: default_id.clone(),
                error: EngineError::RouteNotFound(default_id.clone()),
            },
        };

        RouteOutcome::Redirected {
            from: route_id,
            to: default_id,
            outcome: Box::new(outcome),
        }
    }

    async fn render_route(
        &self,
        runtime: &Runtime,
        route_id: &str,
        route: &RouteDescriptor,
    ) -> RouteOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(route = %route_id, generation, "Handling route change");

        let (content, styles, modules) = futures::join!(
            self.load_content(&route.content),
            self.attach_styles(&route.styles),
            self.init_route_modules(runtime, &route.modules),
        );
        let content = match (content, styles, modules) {
            (Ok(content), Ok(()), Ok(())) => content,
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                return self.fail_route(route_id, generation, e);
            }
        };

        let is_current = || self.generation.load(Ordering::SeqCst) == generation;
        let Some(page) = runtime
            .assembler
            .render_page(&self.document, Region::Main, &content, is_current)
            .await
        else {
            tracing::debug!(route = %route_id, "Discarding stale route render");
            return RouteOutcome::Superseded {
                route_id: route_id.to_owned(),
            };
        };

        let title = runtime.manifest.page_title(route);
        self.document.lock().unwrap().set_title(&title);
        self.set_state(EngineState::RouteActive(route_id.to_owned()));

        if !page.dropped.is_empty() {
            tracing::warn!(route = %route_id, dropped = page.dropped.len(), "Some components were not rendered");
        }

        self.lifecycle.notify(&PageRendered {
            route_id: route_id.to_owned(),
            content,
        });

        RouteOutcome::Rendered(RenderReport {
            route_id: route_id.to_owned(),
            title,
            rendered: page.rendered,
            dropped: page.dropped,
        })
    }

    fn fail_route(&self, route_id: &str, generation: u64, error: EngineError) -> RouteOutcome {
        let mut document = self.document.lock().unwrap();
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(route = %route_id, error = %error, "Ignoring failure of stale route");
            return RouteOutcome::Superseded {
                route_id: route_id.to_owned(),
            };
        }

        tracing::error!(route = %route_id, error = %error, "Failed to render route");
        document.show_region_error(Region::Main, ROUTE_FAILURE_MESSAGE);
        RouteOutcome::Failed {
            route_id: route_id.to_owned(),
            error,
        }
    }

    /// Content payload for a path, fetched at most once per session.
    async fn load_content(&self, path: &str) -> Result<Arc<ContentPayload>, EngineError> {
        self.session
            .content
            .get_or_try_init(path, move || async move {
                let text = self.fetcher.fetch_text(path).await?;
                let payload: ContentPayload =
                    serde_json::from_str(&text).map_err(|e| EngineError::parse(path, e))?;
                Ok(Arc::new(payload))
            })
            .await
    }

    async fn attach_styles(&self, paths: &[String]) -> Result<(), EngineError> {
        try_join_all(paths.iter().map(|path| self.attach_style(path))).await?;
        Ok(())
    }

    /// Load a stylesheet and link it from the head, once per path.
    async fn attach_style(&self, path: &str) -> Result<(), EngineError> {
        self.session
            .styles
            .get_or_try_init(path, move || async move {
                self.fetcher.fetch_text(path).await?;
                self.document.lock().unwrap().add_stylesheet(path);
                tracing::debug!(path = %path, "Stylesheet attached");
                Ok(())
            })
            .await
    }

    async fn init_route_modules(
        &self,
        runtime: &Runtime,
        names: &[String],
    ) -> Result<(), EngineError> {
        for name in names {
            self.init_module(runtime, name)?;
        }
        Ok(())
    }

    /// Initialise a module by manifest name, at most once per session.
    ///
    /// Names the manifest does not list are skipped. Returns whether `init`
    /// ran.
    fn init_module(&self, runtime: &Runtime, name: &str) -> Result<bool, EngineError> {
        let Some(path) = runtime.manifest.modules.get(name) else {
            tracing::debug!(module = %name, "Module not declared in manifest, skipping");
            return Ok(false);
        };
        let module = self.modules.get(path).ok_or_else(|| {
            EngineError::Config(format!(
                "module \"{name}\" ({path}) has no registered implementation"
            ))
        })?;

        if !self.initialised_modules.lock().unwrap().insert(name.to_owned()) {
            return Ok(false);
        }

        if let Err(e) = module.init(&runtime.handle) {
            self.initialised_modules.lock().unwrap().remove(name);
            return Err(e.into());
        }

        tracing::info!(module = %name, implementation = module.name(), "Module initialised");
        Ok(true)
    }

    fn set_location(&self, fragment: &str) {
        *self.location.lock().unwrap() = fragment.to_owned();
    }

    fn set_state(&self, state: EngineState) {
        *self.state.lock().unwrap() = state;
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("manifest_path", &self.manifest_path)
            .field("state", &self.state)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// Route id for a location fragment: the fragment without `#`, or the
/// default route when empty.
fn route_id_from(fragment: &str, default_route: &str) -> String {
    let id = fragment.strip_prefix('#').unwrap_or(fragment);
    if id.is_empty() {
        default_route.to_owned()
    } else {
        id.to_owned()
    }
}

/// Fill the shell's static parts: navigation links and the app name.
fn populate_shell(document: &mut Document, manifest: &Manifest) {
    document.bind_text("appName", &manifest.app_name);

    let Some(nav) = document.region_mut(Region::Nav) else {
        return;
    };

    let mut links = Fragment::new();
    let as_list = nav.query(&Selector::tag("ul")).is_some();
    for (id, route) in manifest.nav_routes() {
        let link = Element::new("a")
            .with_attr("class", "nav-link")
            .with_attr("href", format!("#{id}"))
            .with_text(route.title.as_str());
        if as_list {
            links.append(Element::new("li").with_child(link));
        } else {
            links.append(link);
        }
    }

    match nav.query_mut(&Selector::tag("ul")) {
        Some(list) => list.append_fragment(links),
        None => nav.append_fragment(links),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use sym_fetch::MockFetcher;

    use super::*;
    use crate::error::ModuleError;
    use crate::modules::SideModule;
    use crate::preferences::MemoryStore;
    use crate::theme::{THEME_KEY, ThemeModule};

    static_assertions::assert_impl_all!(Engine: Send, Sync);

    const MANIFEST: &str = r#"{
        "appName": "Docs",
        "defaultRoute": "home",
        "engine": { "renderer": "/engine/renderer.js" },
        "templates": {
            "Shell": "/templates/shell.html",
            "Hero": "/templates/hero.html",
            "Card": "/templates/card.html",
            "CardGrid": "/templates/card-grid.html",
            "TableBlock": "/templates/table.html"
        },
        "modules": {
            "theme": "/modules/theme.js",
            "search": "/modules/search.js"
        },
        "routes": {
            "home": {
                "title": "Home",
                "content": "/content/home.json",
                "styles": ["/css/base.css", "/css/home.css"]
            },
            "guide": {
                "title": "Guide",
                "content": "/content/guide.json",
                "styles": ["/css/base.css"],
                "modules": ["search"]
            },
            "broken": { "title": "Broken", "content": "/content/broken.json" },
            "slow": { "title": "Slow", "content": "/content/slow.json" }
        }
    }"#;

    const SHELL: &str = concat!(
        r#"<header class="site-header"><span data-bind="appName"></span><button id="theme-toggle"></button></header>"#,
        r#"<nav class="site-nav"><ul></ul></nav>"#,
        r#"<main class="main-content"></main>"#,
        r#"<footer class="site-footer"><small data-bind="appName"></small></footer>"#,
    );

    fn site() -> MockFetcher {
        MockFetcher::new()
            .with_file("/manifest.json", MANIFEST)
            .with_file("/templates/shell.html", SHELL)
            .with_file(
                "/templates/hero.html",
                r#"<section class="hero"><h1 data-bind="title"></h1><p data-bind="subtitle" optional></p></section>"#,
            )
            .with_file(
                "/templates/card.html",
                r#"<article class="card"><a><h3 data-bind="title"></h3></a></article>"#,
            )
            .with_file(
                "/templates/card-grid.html",
                r#"<section class="cards" data-bind="cards"></section>"#,
            )
            .with_file(
                "/templates/table.html",
                "<table><thead></thead><tbody></tbody></table>",
            )
            .with_file(
                "/content/home.json",
                r##"{"components": [
                    {"type": "Hero", "title": "Welcome"},
                    {"type": "CardGrid", "cards": [{"title": "Start", "link": "#guide"}]}
                ]}"##,
            )
            .with_file(
                "/content/guide.json",
                r#"{"components": [
                    {"type": "Hero", "title": "Guide", "subtitle": "Read me"},
                    {"type": "Unknown"},
                    {"type": "TableBlock", "headers": ["A", "B"], "rows": [["1", "2"]]}
                ]}"#,
            )
            .with_file("/content/broken.json", "{ not json")
            .with_file(
                "/content/slow.json",
                r#"{"components": [{"type": "Hero", "title": "Slow"}]}"#,
            )
            .with_delay("/content/slow.json", Duration::from_millis(50))
            .with_file("/css/base.css", "body{}")
            .with_file("/css/home.css", ".hero{}")
    }

    struct CountingModule {
        name: &'static str,
        inits: AtomicUsize,
        fail: bool,
    }

    impl CountingModule {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                inits: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                inits: AtomicUsize::new(0),
                fail: true,
            })
        }

        fn count(&self) -> usize {
            self.inits.load(Ordering::SeqCst)
        }
    }

    impl SideModule for CountingModule {
        fn name(&self) -> &str {
            self.name
        }

        fn init(&self, _engine: &EngineHandle) -> Result<(), ModuleError> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ModuleError::new(self.name, "init failed"));
            }
            Ok(())
        }
    }

    fn modules(search: &Arc<CountingModule>) -> ModuleRegistry {
        ModuleRegistry::new()
            .with_module("/modules/theme.js", Arc::new(ThemeModule::default()))
            .with_module(
                "/modules/search.js",
                Arc::clone(search) as Arc<dyn SideModule>,
            )
    }

    async fn started(fetcher: &Arc<MockFetcher>) -> Engine {
        let engine = Engine::new(Arc::clone(fetcher) as Arc<dyn Fetcher>)
            .with_modules(modules(&CountingModule::new("search")));
        engine.start().await.unwrap();
        engine
    }

    fn main_html(engine: &Engine) -> String {
        engine
            .document()
            .region(Region::Main)
            .map(Element::to_html)
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_start_mounts_shell() {
        let fetcher = Arc::new(site());
        let engine = started(&fetcher).await;
        let document = engine.document();

        assert_eq!(engine.state(), EngineState::ShellMounted);
        assert_eq!(
            document.region(Region::Nav).unwrap().to_html(),
            concat!(
                r#"<nav class="site-nav"><ul>"#,
                r##"<li><a class="nav-link" href="#broken">Broken</a></li>"##,
                r##"<li><a class="nav-link" href="#guide">Guide</a></li>"##,
                r##"<li><a class="nav-link" href="#home">Home</a></li>"##,
                r##"<li><a class="nav-link" href="#slow">Slow</a></li>"##,
                "</ul></nav>"
            )
        );
        assert_eq!(
            document.region(Region::Header).unwrap().text_content(),
            "Docs"
        );
        assert_eq!(
            document.region(Region::Footer).unwrap().text_content(),
            "Docs"
        );
        assert_eq!(document.class(), Some("theme-light"));
    }

    #[tokio::test]
    async fn test_default_route_renders() {
        let fetcher = Arc::new(site());
        let engine = started(&fetcher).await;

        let outcome = engine.handle_route_change().await;

        let report = outcome.report().unwrap();
        assert_eq!(report.route_id, "home");
        assert_eq!(report.title, "Home | Docs");
        assert_eq!(report.rendered, 2);
        assert_eq!(engine.document().title(), "Home | Docs");
        assert_eq!(engine.state(), EngineState::RouteActive("home".to_owned()));
        assert_eq!(
            main_html(&engine),
            concat!(
                r#"<main class="main-content">"#,
                r#"<section class="hero"><h1 data-bind="title">Welcome</h1></section>"#,
                r#"<section class="cards" data-bind="cards">"#,
                r##"<article class="card"><a href="#guide"><h3 data-bind="title">Start</h3></a></article>"##,
                "</section></main>"
            )
        );
        assert_eq!(
            engine.document().stylesheets(),
            vec!["/css/base.css", "/css/home.css"]
        );
    }

    #[tokio::test]
    async fn test_navigation_replaces_page_and_reports_drops() {
        let fetcher = Arc::new(site());
        let engine = started(&fetcher).await;
        engine.navigate("#home").await;

        let outcome = engine.navigate("#guide").await;

        let report = outcome.report().unwrap();
        assert_eq!(report.rendered, 2);
        assert_eq!(report.dropped, vec![1]);
        let main = main_html(&engine);
        assert!(main.starts_with(
            r#"<main class="main-content"><section class="hero"><h1 data-bind="title">Guide</h1><p data-bind="subtitle" optional>Read me</p></section><table>"#
        ));
        assert!(!main.contains("Welcome"));
        assert_eq!(engine.document().title(), "Guide | Docs");
    }

    #[tokio::test]
    async fn test_unknown_route_redirects_to_default() {
        let fetcher = Arc::new(site());
        let engine = started(&fetcher).await;

        let outcome = engine.navigate("#nope").await;

        match &outcome {
            RouteOutcome::Redirected { from, to, outcome } => {
                assert_eq!(from, "nope");
                assert_eq!(to, "home");
                assert!(outcome.is_rendered());
            }
            other => panic!("expected redirect, got {other:?}"),
        }
        assert_eq!(engine.location(), "#home");
        assert_eq!(engine.state(), EngineState::RouteActive("home".to_owned()));
    }

    #[tokio::test]
    async fn test_redirect_is_idempotent_and_matches_direct_visit() {
        let fetcher = Arc::new(site());
        let engine = started(&fetcher).await;

        engine.navigate("#nope").await;
        let once = engine.document().to_html();
        engine.navigate("#nope").await;
        let twice = engine.document().to_html();

        assert_eq!(once, twice);
        assert_eq!(engine.location(), "#home");

        let direct = started(&Arc::new(site())).await;
        direct.navigate("#home").await;
        assert_eq!(main_html(&engine), main_html(&direct));
        assert_eq!(engine.document().title(), direct.document().title());
        let (redirected_doc, direct_doc) = (engine.document(), direct.document());
        let mut redirected_styles = redirected_doc.stylesheets();
        let mut direct_styles = direct_doc.stylesheets();
        redirected_styles.sort_unstable();
        direct_styles.sort_unstable();
        assert_eq!(redirected_styles, direct_styles);
    }

    #[tokio::test]
    async fn test_content_and_templates_fetched_once() {
        let fetcher = Arc::new(site());
        let engine = started(&fetcher).await;

        engine.navigate("#home").await;
        engine.navigate("#guide").await;
        engine.navigate("#home").await;

        assert_eq!(fetcher.fetch_count("/content/home.json"), 1);
        assert_eq!(fetcher.fetch_count("/templates/hero.html"), 1);
        assert_eq!(fetcher.fetch_count("/templates/card.html"), 1);
        assert_eq!(fetcher.fetch_count("/css/base.css"), 1);
        assert_eq!(engine.session().content_count(), 2);
    }

    #[tokio::test]
    async fn test_shared_stylesheet_linked_once() {
        let fetcher = Arc::new(site().with_delay("/css/base.css", Duration::from_millis(10)));
        let engine = started(&fetcher).await;

        let (a, b) = tokio::join!(engine.attach_style("/css/base.css"), engine.attach_style("/css/base.css"));

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(engine.document().stylesheets(), vec!["/css/base.css"]);
        assert_eq!(fetcher.fetch_count("/css/base.css"), 1);
    }

    #[tokio::test]
    async fn test_route_failure_is_page_local() {
        let fetcher = Arc::new(site());
        let engine = started(&fetcher).await;
        engine.navigate("#home").await;

        let outcome = engine.navigate("#broken").await;

        assert!(matches!(
            outcome,
            RouteOutcome::Failed { ref route_id, error: EngineError::Parse { .. } } if route_id == "broken"
        ));
        assert_eq!(
            main_html(&engine),
            r#"<main class="main-content"><p class="engine-error">Failed to load page content.</p></main>"#
        );
        assert!(engine.document().region(Region::Nav).is_some());
        assert_eq!(engine.state(), EngineState::RouteActive("home".to_owned()));
    }

    #[tokio::test]
    async fn test_missing_stylesheet_fails_route() {
        let fetcher = Arc::new(site().with_status("/css/home.css", 404));
        let engine = started(&fetcher).await;

        let outcome = engine.navigate("#home").await;

        assert!(matches!(
            outcome,
            RouteOutcome::Failed {
                error: EngineError::Fetch(_),
                ..
            }
        ));
        assert!(!engine.document().stylesheets().contains(&"/css/home.css"));
    }

    #[tokio::test]
    async fn test_stale_route_discarded() {
        let fetcher = Arc::new(site());
        let engine = started(&fetcher).await;

        let (slow, fast) = tokio::join!(engine.navigate("#slow"), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            engine.navigate("#guide").await
        });

        assert!(matches!(slow, RouteOutcome::Superseded { ref route_id } if route_id == "slow"));
        assert!(fast.is_rendered());
        assert_eq!(engine.document().title(), "Guide | Docs");
        assert!(!main_html(&engine).contains("Slow"));
        assert_eq!(engine.state(), EngineState::RouteActive("guide".to_owned()));
    }

    #[tokio::test]
    async fn test_startup_failure_replaces_root() {
        let fetcher = Arc::new(site().with_status("/manifest.json", 500));
        let engine = Engine::new(Arc::clone(&fetcher) as Arc<dyn Fetcher>);

        let err = engine.start().await.unwrap_err();

        assert!(matches!(err, EngineError::Fetch(_)));
        assert_eq!(engine.state(), EngineState::Failed);
        assert_eq!(
            engine.document().root().to_html(),
            r#"<div id="app-root"><p class="engine-error">Failed to load the application.</p></div>"#
        );
    }

    #[tokio::test]
    async fn test_shell_without_main_region_is_fatal() {
        let fetcher = Arc::new(site().with_file("/templates/shell.html", "<header class=\"site-header\"></header>"));
        let engine = Engine::new(Arc::clone(&fetcher) as Arc<dyn Fetcher>);

        let err = engine.start().await.unwrap_err();

        assert!(matches!(err, EngineError::Config(_)));
        assert_eq!(engine.state(), EngineState::Failed);
    }

    #[tokio::test]
    async fn test_route_change_before_start() {
        let fetcher = Arc::new(site());
        let engine = Engine::new(Arc::clone(&fetcher) as Arc<dyn Fetcher>);

        let outcome = engine.navigate("#home").await;

        assert!(matches!(outcome, RouteOutcome::Failed { error: EngineError::NotStarted, .. }));
        assert_eq!(fetcher.total_fetches(), 0);
    }

    #[tokio::test]
    async fn test_route_module_initialised_once() {
        let fetcher = Arc::new(site());
        let search = CountingModule::new("search");
        let engine = Engine::new(Arc::clone(&fetcher) as Arc<dyn Fetcher>).with_modules(modules(&search));
        engine.start().await.unwrap();

        engine.navigate("#guide").await;
        engine.navigate("#home").await;
        engine.navigate("#guide").await;

        // Core modules list includes "search" as well.
        assert_eq!(search.count(), 1);
    }

    #[tokio::test]
    async fn test_failing_route_module_fails_route_and_retries() {
        let fetcher = Arc::new(site());
        let search = CountingModule::failing("search");
        let engine = Engine::new(Arc::clone(&fetcher) as Arc<dyn Fetcher>).with_modules(modules(&search));
        engine.start().await.unwrap();

        let outcome = engine.navigate("#guide").await;

        assert!(matches!(outcome, RouteOutcome::Failed { error: EngineError::Module(_), .. }));
        // Once as a core module at startup, once for the route.
        assert_eq!(search.count(), 2);
    }

    #[tokio::test]
    async fn test_unregistered_module_is_config_error() {
        let fetcher = Arc::new(site());
        let engine = Engine::new(Arc::clone(&fetcher) as Arc<dyn Fetcher>).with_modules(
            ModuleRegistry::new().with_module("/modules/theme.js", Arc::new(ThemeModule::default())),
        );
        engine.start().await.unwrap();

        let outcome = engine.navigate("#guide").await;

        assert!(matches!(outcome, RouteOutcome::Failed { error: EngineError::Config(_), .. }));
    }

    #[tokio::test]
    async fn test_page_rendered_observers_in_order() {
        let fetcher = Arc::new(site());
        let engine = started(&fetcher).await;
        let calls = Arc::new(Mutex::new(Vec::new()));
        for name in ["a", "b"] {
            let calls = Arc::clone(&calls);
            engine.on_page_rendered(move |event| {
                calls.lock().unwrap().push(format!(
                    "{name}:{}:{}",
                    event.route_id,
                    event.content.components.len()
                ));
            });
        }

        engine.navigate("#home").await;
        engine.navigate("#broken").await;

        assert_eq!(*calls.lock().unwrap(), vec!["a:home:2", "b:home:2"]);
    }

    #[tokio::test]
    async fn test_theme_preference_applied_at_startup() {
        let fetcher = Arc::new(site());
        let preferences = Preferences::new(MemoryStore::new());
        preferences.set(THEME_KEY, "dark");
        let engine = Engine::new(Arc::clone(&fetcher) as Arc<dyn Fetcher>)
            .with_modules(modules(&CountingModule::new("search")))
            .with_preferences(preferences);

        engine.start().await.unwrap();

        assert_eq!(engine.document().class(), Some("theme-dark"));
    }

    #[tokio::test]
    async fn test_start_twice_is_noop() {
        let fetcher = Arc::new(site());
        let engine = started(&fetcher).await;

        engine.start().await.unwrap();

        assert_eq!(fetcher.fetch_count("/manifest.json"), 1);
    }

    #[test]
    fn test_route_id_from_fragment() {
        assert_eq!(route_id_from("#guide", "home"), "guide");
        assert_eq!(route_id_from("guide", "home"), "guide");
        assert_eq!(route_id_from("#", "home"), "home");
        assert_eq!(route_id_from("", "home"), "home");
    }
}
