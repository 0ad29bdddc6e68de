//! Template store.
//!
//! Resolves a logical template name to its markup path via the manifest,
//! fetches and parses it once, and hands out the cached canonical fragment.
//! Callers clone before mutating.

use std::collections::HashMap;
use std::sync::Arc;

use sym_dom::{Fragment, parse_fragment};
use sym_fetch::Fetcher;

use crate::error::EngineError;
use crate::session::Session;

/// Fetches and caches parsed templates by name.
#[derive(Clone)]
pub struct TemplateStore {
    fetcher: Arc<dyn Fetcher>,
    paths: Arc<HashMap<String, String>>,
    session: Arc<Session>,
}

impl TemplateStore {
    /// Create a store over the manifest's template paths.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        paths: HashMap<String, String>,
        session: Arc<Session>,
    ) -> Self {
        Self {
            fetcher,
            paths: Arc::new(paths),
            session,
        }
    }

    /// Fetch a template by name.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Config`] if the manifest has no path for `name`
    /// - [`EngineError::Fetch`] if the markup cannot be fetched
    /// - [`EngineError::Parse`] if the markup is malformed
    pub async fn fetch_template(&self, name: &str) -> Result<Arc<Fragment>, EngineError> {
        if let Some(fragment) = self.session.templates.get(name) {
            tracing::debug!(template = %name, "Template cache hit");
            return Ok(fragment);
        }

        self.session
            .templates
            .get_or_try_init(name, || self.load(name))
            .await
    }

    /// Template that has already been fetched. Never performs I/O.
    #[must_use]
    pub fn cached(&self, name: &str) -> Option<Arc<Fragment>> {
        self.session.templates.get(name)
    }

    async fn load(&self, name: &str) -> Result<Arc<Fragment>, EngineError> {
        let path = self.paths.get(name).ok_or_else(|| {
            EngineError::Config(format!("no template path for \"{name}\" in manifest"))
        })?;

        let markup = self.fetcher.fetch_text(path).await?;
        let fragment = parse_fragment(&markup).map_err(|e| EngineError::parse(path, e))?;
        tracing::debug!(template = %name, path = %path, "Template loaded");

        Ok(Arc::new(fragment))
    }
}

impl std::fmt::Debug for TemplateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateStore")
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}
