//! Mock fetcher implementation for testing.
//!
//! Provides [`MockFetcher`] for unit testing without disk or network access.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;

use crate::fetcher::{FetchError, Fetcher};

#[derive(Clone, Debug)]
enum Response {
    Body(String),
    Status(u16),
}

/// Mock fetcher for testing.
///
/// Serves in-memory responses and counts every request per path, so tests
/// can assert cache hits ("fetched once") and inject failures or latency.
/// Paths are normalized by stripping a leading slash.
///
/// # Example
///
/// ```ignore
/// use sym_fetch::{Fetcher, MockFetcher};
///
/// let fetcher = MockFetcher::new()
///     .with_file("/templates/Card.html", "<article></article>")
///     .with_status("/content/broken.json", 500);
///
/// let body = fetcher.fetch_text("/templates/Card.html").await.unwrap();
/// assert_eq!(fetcher.fetch_count("/templates/Card.html"), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockFetcher {
    responses: RwLock<HashMap<String, Response>>,
    delays: RwLock<HashMap<String, Duration>>,
    calls: RwLock<HashMap<String, usize>>,
}

fn normalize(path: &str) -> String {
    path.trim_start_matches('/').to_owned()
}

impl MockFetcher {
    /// Create a new empty mock fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a body for a path.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_file(self, path: &str, body: impl Into<String>) -> Self {
        self.set_file(path, body);
        self
    }

    /// Answer a path with a non-success status.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_status(self, path: &str, status: u16) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(normalize(path), Response::Status(status));
        self
    }

    /// Delay responses for a path.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_delay(self, path: &str, delay: Duration) -> Self {
        self.delays.write().unwrap().insert(normalize(path), delay);
        self
    }

    /// Replace the body served for a path.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_file(&self, path: &str, body: impl Into<String>) {
        self.responses
            .write()
            .unwrap()
            .insert(normalize(path), Response::Body(body.into()));
    }

    /// Number of requests made for a path.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn fetch_count(&self, path: &str) -> usize {
        self.calls
            .read()
            .unwrap()
            .get(&normalize(path))
            .copied()
            .unwrap_or(0)
    }

    /// Number of requests made for any path.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn total_fetches(&self) -> usize {
        self.calls.read().unwrap().values().sum()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let key = normalize(path);
        *self.calls.write().unwrap().entry(key.clone()).or_default() += 1;

        let delay = self.delays.read().unwrap().get(&key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let response = self.responses.read().unwrap().get(&key).cloned();
        match response {
            Some(Response::Body(body)) => Ok(body),
            Some(Response::Status(status)) => {
                Err(FetchError::status(status, path).with_backend("Mock"))
            }
            None => Err(FetchError::not_found(path).with_backend("Mock")),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fetcher::FetchErrorKind;

    static_assertions::assert_impl_all!(MockFetcher: Send, Sync);

    #[tokio::test]
    async fn test_serves_body_and_counts() {
        let fetcher = MockFetcher::new().with_file("/a.html", "<p></p>");

        assert_eq!(fetcher.fetch_text("/a.html").await.unwrap(), "<p></p>");
        assert_eq!(fetcher.fetch_text("a.html").await.unwrap(), "<p></p>");
        assert_eq!(fetcher.fetch_count("/a.html"), 2);
        assert_eq!(fetcher.total_fetches(), 2);
    }

    #[tokio::test]
    async fn test_missing_is_not_found() {
        let fetcher = MockFetcher::new();

        let err = fetcher.fetch_text("/missing.json").await.unwrap_err();

        assert_eq!(err.kind, FetchErrorKind::NotFound);
        assert_eq!(err.backend, Some("Mock"));
        assert_eq!(fetcher.fetch_count("/missing.json"), 1);
    }

    #[tokio::test]
    async fn test_status_response() {
        let fetcher = MockFetcher::new().with_status("/broken.json", 500);

        let err = fetcher.fetch_text("/broken.json").await.unwrap_err();

        assert_eq!(err.kind, FetchErrorKind::Status);
        assert_eq!(err.status, Some(500));
    }

    #[tokio::test]
    async fn test_set_file_replaces_body() {
        let fetcher = MockFetcher::new().with_file("/a", "one");

        fetcher.set_file("/a", "two");

        assert_eq!(fetcher.fetch_text("/a").await.unwrap(), "two");
    }

    #[tokio::test]
    async fn test_delay_still_serves() {
        let fetcher = MockFetcher::new()
            .with_file("/slow", "ok")
            .with_delay("/slow", Duration::from_millis(5));

        assert_eq!(fetcher.fetch_text("/slow").await.unwrap(), "ok");
    }

    #[test]
    fn test_fetch_count_unknown_path_is_zero() {
        assert_eq!(MockFetcher::new().fetch_count("/nope"), 0);
    }
}
