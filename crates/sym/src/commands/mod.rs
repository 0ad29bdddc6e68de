//! CLI command implementations.

pub(crate) mod check;
pub(crate) mod routes;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use sym_config::{CliSettings, Config};
use sym_engine::{
    Engine, EngineHandle, FileStore, Manifest, ModuleError, ModuleRegistry, Preferences,
    SideModule, Theme, ThemeModule,
};
use sym_fetch::{Fetcher, FsFetcher, HttpFetcher};

use crate::error::CliError;

pub(crate) use check::CheckArgs;
pub(crate) use routes::RoutesArgs;

/// Manifest module name handled natively by the CLI.
const THEME_MODULE: &str = "theme";

/// Site selection arguments shared by all commands.
#[derive(Args)]
pub(crate) struct SiteArgs {
    /// Path to configuration file (default: auto-discover symbiont.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Site root directory (overrides config).
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Manifest path within the site (overrides config).
    #[arg(short, long)]
    manifest: Option<String>,

    /// Fetch the site over HTTP from this URL (overrides config).
    #[arg(long, env = "SYMBIONT_BASE_URL")]
    base_url: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl SiteArgs {
    /// Load configuration with these arguments applied.
    pub(crate) fn load_config(self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            root: self.root,
            manifest: self.manifest,
            base_url: self.base_url,
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }
}

/// Fetcher for the configured site: HTTP with a base URL, otherwise the
/// site root on disk.
pub(crate) fn fetcher_for(config: &Config) -> Arc<dyn Fetcher> {
    match &config.fetch.base_url {
        Some(base_url) => Arc::new(HttpFetcher::with_timeout(
            base_url,
            Duration::from_secs(config.fetch.timeout_secs),
        )),
        None => Arc::new(FsFetcher::new(&config.site_resolved.root)),
    }
}

/// Human-readable description of where the site is read from.
pub(crate) fn site_location(config: &Config) -> String {
    match &config.fetch.base_url {
        Some(base_url) => base_url.clone(),
        None => config.site_resolved.root.display().to_string(),
    }
}

/// Fetch and validate the manifest.
pub(crate) async fn load_manifest(
    fetcher: &dyn Fetcher,
    config: &Config,
) -> Result<Manifest, CliError> {
    let path = &config.site_resolved.manifest;
    let text = fetcher
        .fetch_text(path)
        .await
        .map_err(sym_engine::EngineError::from)?;
    Ok(Manifest::from_json(&text, path)?)
}

/// Build an engine for the configured site.
///
/// The theme module runs natively; every other module the manifest declares
/// belongs to the browser host and is accepted without running.
pub(crate) fn build_engine(
    config: &Config,
    fetcher: Arc<dyn Fetcher>,
    manifest: &Manifest,
) -> Engine {
    let default_theme =
        Theme::parse(&config.preferences_resolved.default_theme).unwrap_or_default();

    let mut modules = ModuleRegistry::new();
    for (name, path) in &manifest.modules {
        let module: Arc<dyn SideModule> = if name == THEME_MODULE {
            Arc::new(ThemeModule::new(default_theme))
        } else {
            Arc::new(HostModule { name: name.clone() })
        };
        modules.register(path.clone(), module);
    }

    let preferences = match &config.preferences_resolved.path {
        Some(path) => Preferences::new(FileStore::new(path)),
        None => Preferences::session_only(),
    };

    Engine::new(fetcher)
        .with_manifest_path(config.site_resolved.manifest.clone())
        .with_modules(modules)
        .with_preferences(preferences)
}

/// Module implemented by the browser host, not available to the CLI.
struct HostModule {
    name: String,
}

impl SideModule for HostModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&self, _engine: &EngineHandle) -> Result<(), ModuleError> {
        tracing::debug!(module = %self.name, "Module runs in the browser host, skipping");
        Ok(())
    }
}
