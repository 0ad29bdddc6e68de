//! HTTP fetcher.

use std::time::Duration;

use async_trait::async_trait;
use ureq::Agent;

use crate::fetcher::{FetchError, FetchErrorKind, Fetcher};

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Fetches resources relative to a base URL.
///
/// `ureq` is blocking, so each request runs on tokio's blocking pool.
/// Absolute `http://` / `https://` paths bypass the base URL.
#[derive(Clone)]
pub struct HttpFetcher {
    agent: Agent,
    base_url: String,
}

impl HttpFetcher {
    /// Create a fetcher with the default timeout.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT))
    }

    /// Create a fetcher with a custom global request timeout.
    #[must_use]
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Full URL for a manifest path.
    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_owned();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let url = self.url_for(path);
        let agent = self.agent.clone();
        let owned_path = path.to_owned();

        tracing::debug!(url = %url, "Fetching resource");

        tokio::task::spawn_blocking(move || fetch_blocking(&agent, &url, &owned_path))
            .await
            .map_err(|e| {
                FetchError::new(FetchErrorKind::Other)
                    .with_path(path)
                    .with_backend("Http")
                    .with_source(e)
            })?
    }
}

fn fetch_blocking(agent: &Agent, url: &str, path: &str) -> Result<String, FetchError> {
    let response = agent.get(url).call().map_err(|e| {
        FetchError::new(FetchErrorKind::Transport)
            .with_path(path)
            .with_backend("Http")
            .with_source(e)
    })?;

    let status = response.status().as_u16();
    if !(200..300).contains(&status) {
        return Err(FetchError::status(status, path).with_backend("Http"));
    }

    response.into_body().read_to_string().map_err(|e| {
        FetchError::new(FetchErrorKind::Transport)
            .with_path(path)
            .with_backend("Http")
            .with_source(e)
    })
}
