//! Host configuration for the Symbiont content engine.
//!
//! Parses `symbiont.toml` with serde and provides auto-discovery of the
//! config file in the current directory and its parents. The file tells a
//! host (the `sym` CLI, a preview shell) where the site lives and how to
//! fetch it; everything about routes and templates lives in the site's own
//! manifest.
//!
//! ```toml
//! [site]
//! root = "public"
//! manifest = "/manifest.json"
//!
//! [fetch]
//! base_url = "${DOCS_URL:-}"
//! timeout_secs = 30
//!
//! [preferences]
//! path = ".symbiont/preferences.json"
//! default_theme = "light"
//! ```
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! String values support `${VAR}` and `${VAR:-default}` expansion:
//! `site.root`, `site.manifest`, `fetch.base_url`.

mod expand;

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "symbiont.toml";

/// Maximum accepted fetch timeout.
const MAX_TIMEOUT_SECS: u64 = 600;

/// CLI settings that override configuration file values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override site root directory.
    pub root: Option<PathBuf>,
    /// Override manifest path.
    pub manifest: Option<String>,
    /// Override base URL (switches fetching to HTTP).
    pub base_url: Option<String>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site location (paths are relative strings from TOML).
    site: SiteConfigRaw,
    /// Fetch configuration.
    pub fetch: FetchConfig,
    /// Preference storage configuration.
    preferences: PreferencesConfigRaw,

    /// Resolved site configuration (set after loading).
    #[serde(skip)]
    pub site_resolved: SiteConfig,
    /// Resolved preferences configuration (set after loading).
    #[serde(skip)]
    pub preferences_resolved: PreferencesConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SiteConfigRaw {
    root: Option<String>,
    manifest: Option<String>,
}

/// Resolved site configuration.
#[derive(Debug, Default)]
pub struct SiteConfig {
    /// Directory holding the manifest, templates and content.
    pub root: PathBuf,
    /// Manifest path as passed to the fetcher.
    pub manifest: String,
}

/// Fetch configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Fetch over HTTP relative to this URL instead of reading `site.root`.
    pub base_url: Option<String>,
    /// Global request timeout for HTTP fetching.
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PreferencesConfigRaw {
    path: Option<String>,
    default_theme: Option<String>,
}

/// Resolved preference storage configuration.
#[derive(Debug)]
pub struct PreferencesConfig {
    /// File backing the preference store. `None` keeps preferences in memory.
    pub path: Option<PathBuf>,
    /// Theme used when no preference has been stored.
    pub default_theme: String,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: None,
            default_theme: "light".to_owned(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`fetch.base_url`").
        field: String,
        /// Error message (e.g., "${`DOCS_URL`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `symbiont.toml` in the current directory and parents, falling back
    /// to defaults relative to the current directory.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(root) = &settings.root {
            self.site_resolved.root.clone_from(root);
        }
        if let Some(manifest) = &settings.manifest {
            self.site_resolved.manifest.clone_from(manifest);
        }
        if let Some(base_url) = &settings.base_url {
            self.fetch.base_url = Some(base_url.clone());
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.site_resolved.manifest, "site.manifest")?;

        if let Some(base_url) = &self.fetch.base_url {
            require_http_url(base_url, "fetch.base_url")?;
        }

        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "fetch.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        if self.fetch.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::Validation(format!(
                "fetch.timeout_secs cannot exceed {MAX_TIMEOUT_SECS}"
            )));
        }

        if !matches!(
            self.preferences_resolved.default_theme.as_str(),
            "light" | "dark"
        ) {
            return Err(ConfigError::Validation(
                "preferences.default_theme must be \"light\" or \"dark\"".to_owned(),
            ));
        }

        Ok(())
    }

    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    fn default_with_base(base: &Path) -> Self {
        Self {
            site: SiteConfigRaw::default(),
            fetch: FetchConfig::default(),
            preferences: PreferencesConfigRaw::default(),
            site_resolved: SiteConfig {
                root: base.join("public"),
                manifest: "/manifest.json".to_owned(),
            },
            preferences_resolved: PreferencesConfig::default(),
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref root) = self.site.root {
            self.site.root = Some(expand::expand_env(root, "site.root")?);
        }
        if let Some(ref manifest) = self.site.manifest {
            self.site.manifest = Some(expand::expand_env(manifest, "site.manifest")?);
        }
        if let Some(ref base_url) = self.fetch.base_url {
            let expanded = expand::expand_env(base_url, "fetch.base_url")?;
            // `${DOCS_URL:-}` expanding to nothing means "not configured".
            self.fetch.base_url = (!expanded.is_empty()).then_some(expanded);
        }
        Ok(())
    }

    fn resolve_paths(&mut self, config_dir: &Path) {
        self.site_resolved = SiteConfig {
            root: config_dir.join(self.site.root.as_deref().unwrap_or("public")),
            manifest: self
                .site
                .manifest
                .clone()
                .unwrap_or_else(|| "/manifest.json".to_owned()),
        };

        self.preferences_resolved = PreferencesConfig {
            path: self.preferences.path.as_deref().map(|p| config_dir.join(p)),
            default_theme: self
                .preferences
                .default_theme
                .clone()
                .unwrap_or_else(|| "light".to_owned()),
        };
    }
}
