//! Site manifest.
//!
//! The manifest is the single JSON document that describes a site: its
//! name, routes, template and module locations, and engine settings. It is
//! loaded once at startup and never changes afterwards.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::error::EngineError;

/// Parsed site manifest.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Application name, used in page titles and the shell.
    pub app_name: String,
    /// Route rendered when the location has no fragment or an unknown one.
    pub default_route: String,
    /// Engine settings.
    #[serde(default)]
    pub engine: EngineSettings,
    /// Template name to markup path.
    #[serde(default)]
    pub templates: HashMap<String, String>,
    /// Side-module name to module path.
    #[serde(default)]
    pub modules: HashMap<String, String>,
    /// Route id to descriptor.
    pub routes: BTreeMap<String, RouteDescriptor>,
    /// Explicit component declarations.
    #[serde(default)]
    pub components: HashMap<String, ComponentDecl>,
    /// Route ids shown in navigation, in order.
    #[serde(default)]
    pub nav: Option<Vec<String>>,
}

/// Engine settings from the manifest's `engine` section.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineSettings {
    /// Renderer module path. Informational only.
    pub renderer: Option<String>,
    /// Modules initialised once the shell is mounted.
    pub core_modules: Vec<String>,
    /// Suffix stripped from a collection type to find its item type.
    pub item_suffix: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            renderer: None,
            core_modules: vec![
                "theme".to_owned(),
                "search".to_owned(),
                "accessibility".to_owned(),
            ],
            item_suffix: "Grid".to_owned(),
        }
    }
}

/// A single route.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RouteDescriptor {
    /// Page title (without the application name).
    pub title: String,
    /// Content payload path.
    pub content: String,
    /// Stylesheets attached when the route is shown.
    #[serde(default)]
    pub styles: Vec<String>,
    /// Side-modules initialised when the route is shown.
    #[serde(default)]
    pub modules: Vec<String>,
}

/// Explicit declaration for a component type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ComponentDecl {
    /// Template name, when it differs from the type name.
    pub template: Option<String>,
    /// Item type used for records in sequence fields.
    pub items: Option<String>,
}

impl Manifest {
    /// Parse and validate a manifest.
    ///
    /// `path` is only used for error context.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Parse`] for malformed JSON and
    /// [`EngineError::Config`] when the default route or a navigation entry
    /// names an undeclared route.
    pub fn from_json(text: &str, path: &str) -> Result<Self, EngineError> {
        let manifest: Self = serde_json::from_str(text).map_err(|e| EngineError::parse(path, e))?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<(), EngineError> {
        if !self.routes.contains_key(&self.default_route) {
            return Err(EngineError::Config(format!(
                "defaultRoute \"{}\" is not a declared route",
                self.default_route
            )));
        }
        if let Some(nav) = &self.nav {
            if let Some(missing) = nav.iter().find(|id| !self.routes.contains_key(*id)) {
                return Err(EngineError::Config(format!(
                    "nav entry \"{missing}\" is not a declared route"
                )));
            }
        }
        Ok(())
    }

    /// Look up a route by id.
    #[must_use]
    pub fn route(&self, id: &str) -> Option<&RouteDescriptor> {
        self.routes.get(id)
    }

    /// Routes shown in navigation, in display order.
    ///
    /// Uses `nav` when present, otherwise every route ordered by id.
    #[must_use]
    pub fn nav_routes(&self) -> Vec<(&str, &RouteDescriptor)> {
        match &self.nav {
            Some(ids) => ids
                .iter()
                .filter_map(|id| self.routes.get_key_value(id))
                .map(|(id, route)| (id.as_str(), route))
                .collect(),
            None => self
                .routes
                .iter()
                .map(|(id, route)| (id.as_str(), route))
                .collect(),
        }
    }

    /// Document title for a route.
    #[must_use]
    pub fn page_title(&self, route: &RouteDescriptor) -> String {
        format!("{} | {}", route.title, self.app_name)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const MANIFEST: &str = r#"{
        "appName": "Docs",
        "defaultRoute": "home",
        "engine": { "renderer": "/engine/renderer.js" },
        "templates": { "Shell": "/templates/shell.html" },
        "modules": { "theme": "/modules/theme.js" },
        "routes": {
            "home": { "title": "Home", "content": "/content/home.json", "styles": ["/css/home.css"] },
            "api": { "title": "API", "content": "/content/api.json", "modules": ["search"] }
        }
    }"#;

    #[test]
    fn test_parse_with_defaults() {
        let manifest = Manifest::from_json(MANIFEST, "/manifest.json").unwrap();

        assert_eq!(manifest.app_name, "Docs");
        assert_eq!(manifest.default_route, "home");
        assert_eq!(
            manifest.engine.renderer.as_deref(),
            Some("/engine/renderer.js")
        );
        assert_eq!(
            manifest.engine.core_modules,
            vec!["theme", "search", "accessibility"]
        );
        assert_eq!(manifest.engine.item_suffix, "Grid");
        assert!(manifest.components.is_empty());

        let api = manifest.route("api").unwrap();
        assert_eq!(api.styles, Vec::<String>::new());
        assert_eq!(api.modules, vec!["search"]);
    }

    #[test]
    fn test_nav_defaults_to_all_routes_by_id() {
        let manifest = Manifest::from_json(MANIFEST, "/manifest.json").unwrap();

        let ids: Vec<_> = manifest.nav_routes().into_iter().map(|(id, _)| id).collect();

        assert_eq!(ids, vec!["api", "home"]);
    }

    #[test]
    fn test_explicit_nav_order() {
        let text = MANIFEST.replacen(
            r#""appName": "Docs","#,
            r#""appName": "Docs", "nav": ["home", "api"],"#,
            1,
        );
        let manifest = Manifest::from_json(&text, "/manifest.json").unwrap();

        let ids: Vec<_> = manifest.nav_routes().into_iter().map(|(id, _)| id).collect();

        assert_eq!(ids, vec!["home", "api"]);
    }

    #[test]
    fn test_unknown_default_route_rejected() {
        let text = MANIFEST.replace(r#""defaultRoute": "home""#, r#""defaultRoute": "nope""#);

        let err = Manifest::from_json(&text, "/manifest.json").unwrap_err();

        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_unknown_nav_entry_rejected() {
        let text = MANIFEST.replacen(
            r#""appName": "Docs","#,
            r#""appName": "Docs", "nav": ["home", "missing"],"#,
            1,
        );

        let err = Manifest::from_json(&text, "/manifest.json").unwrap_err();

        assert_eq!(
            err.to_string(),
            "Configuration error: nav entry \"missing\" is not a declared route"
        );
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = Manifest::from_json("{ not json", "/manifest.json").unwrap_err();

        assert!(matches!(err, EngineError::Parse { ref path, .. } if path == "/manifest.json"));
    }

    #[test]
    fn test_page_title() {
        let manifest = Manifest::from_json(MANIFEST, "/manifest.json").unwrap();

        let title = manifest.page_title(manifest.route("home").unwrap());

        assert_eq!(title, "Home | Docs");
    }
}
