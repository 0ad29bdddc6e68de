//! `sym check` command implementation.

use std::sync::Arc;

use clap::Args;
use sym_engine::{Engine, Manifest, RenderReport, RouteOutcome};

use super::{SiteArgs, build_engine, fetcher_for, load_manifest, site_location};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Treat dropped components as failures.
    #[arg(long)]
    strict: bool,
}

/// Result of rendering one route.
#[derive(Debug)]
pub(crate) enum RouteCheck {
    /// Page mounted.
    Rendered(RenderReport),
    /// Route did not render.
    Failed { route_id: String, message: String },
}

impl CheckArgs {
    /// Execute the check command.
    ///
    /// # Errors
    ///
    /// Returns an error if the site cannot start, a route fails to render,
    /// or (with `--strict`) a route drops components.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let strict = self.strict;

        let config = self.site.load_config()?;
        let fetcher = fetcher_for(&config);
        let manifest = load_manifest(fetcher.as_ref(), &config).await?;

        output.site(&manifest.app_name, &site_location(&config));

        let engine = build_engine(&config, Arc::clone(&fetcher), &manifest);
        engine.start().await?;

        let checks = check_routes(&engine, &manifest).await;

        let mut failures = 0;
        let mut with_drops = 0;
        for check in &checks {
            match check {
                RouteCheck::Rendered(report) => {
                    output.route_rendered(report, strict);
                    if !report.dropped.is_empty() {
                        if strict {
                            failures += 1;
                        } else {
                            with_drops += 1;
                        }
                    }
                }
                RouteCheck::Failed { route_id, message } => {
                    failures += 1;
                    output.route_failed(route_id, message);
                }
            }
        }

        if failures > 0 {
            return Err(CliError::Validation(format!(
                "{failures} of {} routes failed",
                checks.len()
            )));
        }

        output.check_passed(checks.len(), with_drops);
        Ok(())
    }
}

/// Navigate to every route in the manifest, in id order.
pub(crate) async fn check_routes(engine: &Engine, manifest: &Manifest) -> Vec<RouteCheck> {
    let mut checks = Vec::with_capacity(manifest.routes.len());
    for route_id in manifest.routes.keys() {
        let outcome = engine.navigate(&format!("#{route_id}")).await;
        checks.push(route_check(route_id, outcome));
    }
    checks
}

fn route_check(route_id: &str, outcome: RouteOutcome) -> RouteCheck {
    match outcome {
        RouteOutcome::Rendered(report) => RouteCheck::Rendered(report),
        RouteOutcome::Redirected { to, .. } => RouteCheck::Failed {
            route_id: route_id.to_owned(),
            message: format!("redirected to {to}"),
        },
        RouteOutcome::Failed { error, .. } => RouteCheck::Failed {
            route_id: route_id.to_owned(),
            message: error.to_string(),
        },
        RouteOutcome::Superseded { .. } => RouteCheck::Failed {
            route_id: route_id.to_owned(),
            message: "superseded by another route change".to_owned(),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use pretty_assertions::assert_eq;
    use sym_config::Config;

    use super::*;

    const MANIFEST: &str = r#"{
        "appName": "Docs",
        "defaultRoute": "home",
        "templates": {
            "Shell": "/templates/shell.html",
            "Hero": "/templates/hero.html"
        },
        "modules": { "theme": "/modules/theme.js", "search": "/modules/search.js" },
        "routes": {
            "home": { "title": "Home", "content": "/content/home.json", "modules": ["search"] },
            "guide": { "title": "Guide", "content": "/content/guide.json" },
            "broken": { "title": "Broken", "content": "/content/missing.json" }
        }
    }"#;

    fn write(root: &Path, path: &str, content: &str) {
        let file = root.join(path);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(file, content).unwrap();
    }

    fn site() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("public");
        write(&root, "manifest.json", MANIFEST);
        write(
            &root,
            "templates/shell.html",
            r#"<header class="site-header"><button id="theme-toggle"></button></header><main class="main-content"></main>"#,
        );
        write(&root, "templates/hero.html", r#"<h1 data-bind="title"></h1>"#);
        write(
            &root,
            "content/home.json",
            r#"{"components": [{"type": "Hero", "title": "Welcome"}]}"#,
        );
        write(
            &root,
            "content/guide.json",
            r#"{"components": [{"type": "Hero", "title": "Guide"}, {"type": "Missing"}]}"#,
        );
        write(dir.path(), "symbiont.toml", "[site]\nroot = \"public\"\n");

        let config = Config::load(Some(&dir.path().join("symbiont.toml")), None).unwrap();
        (dir, config)
    }

    #[tokio::test]
    async fn test_check_routes_reports_each_route() {
        let (_dir, config) = site();
        let fetcher = fetcher_for(&config);
        let manifest = load_manifest(fetcher.as_ref(), &config).await.unwrap();
        let engine = build_engine(&config, fetcher, &manifest);
        engine.start().await.unwrap();

        let checks = check_routes(&engine, &manifest).await;

        assert_eq!(checks.len(), 3);
        assert!(matches!(
            &checks[0],
            RouteCheck::Failed { route_id, .. } if route_id == "broken"
        ));
        let RouteCheck::Rendered(guide) = &checks[1] else {
            panic!("guide should render: {:?}", checks[1]);
        };
        assert_eq!(guide.rendered, 1);
        assert_eq!(guide.dropped, vec![1]);
        let RouteCheck::Rendered(home) = &checks[2] else {
            panic!("home should render: {:?}", checks[2]);
        };
        assert_eq!(home.title, "Home | Docs");
        assert!(home.dropped.is_empty());
    }

    #[tokio::test]
    async fn test_theme_module_runs_natively() {
        let (_dir, config) = site();
        let fetcher = fetcher_for(&config);
        let manifest = load_manifest(fetcher.as_ref(), &config).await.unwrap();
        let engine = build_engine(&config, fetcher, &manifest);

        engine.start().await.unwrap();

        assert_eq!(engine.document().class(), Some("theme-light"));
    }
}
