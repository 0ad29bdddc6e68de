//! Filesystem fetcher.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::fetcher::{FetchError, FetchErrorKind, Fetcher};

/// Reads resources from a site directory.
///
/// Manifest paths are resolved against the root directory; a leading slash
/// is ignored and query strings or fragments are stripped. Paths that would
/// leave the root (`..`) are rejected.
#[derive(Clone, Debug)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    /// Create a fetcher rooted at a site directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Site root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a manifest path to a file under the root.
    fn resolve(&self, path: &str) -> Result<PathBuf, FetchError> {
        let trimmed = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_start_matches('/');

        let relative = Path::new(trimmed);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if trimmed.is_empty() || escapes {
            return Err(FetchError::new(FetchErrorKind::InvalidPath)
                .with_path(path)
                .with_backend("Fs"));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl Fetcher for FsFetcher {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let file = self.resolve(path)?;
        tracing::debug!(path = %path, file = %file.display(), "Reading resource");
        tokio::fs::read_to_string(&file)
            .await
            .map_err(|e| FetchError::io(e, path).with_backend("Fs"))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn test_fetch_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("templates")).unwrap();
        fs::write(dir.path().join("templates/Card.html"), "<article></article>").unwrap();
        let fetcher = FsFetcher::new(dir.path());

        let text = fetcher.fetch_text("/templates/Card.html").await.unwrap();

        assert_eq!(text, "<article></article>");
    }

    #[tokio::test]
    async fn test_fetch_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("manifest.json"), "{}").unwrap();
        let fetcher = FsFetcher::new(dir.path());

        assert_eq!(fetcher.fetch_text("manifest.json").await.unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_fetch_strips_query() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("style.css"), "body{}").unwrap();
        let fetcher = FsFetcher::new(dir.path());

        assert_eq!(fetcher.fetch_text("/style.css?v=2").await.unwrap(), "body{}");
    }

    #[tokio::test]
    async fn test_fetch_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FsFetcher::new(dir.path());

        let err = fetcher.fetch_text("/missing.json").await.unwrap_err();

        assert_eq!(err.kind, FetchErrorKind::NotFound);
        assert_eq!(err.backend, Some("Fs"));
        assert_eq!(err.path.as_deref(), Some("/missing.json"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_parent_components() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FsFetcher::new(dir.path().join("site"));

        let err = fetcher.fetch_text("/../secret.txt").await.unwrap_err();

        assert_eq!(err.kind, FetchErrorKind::InvalidPath);
    }

    #[tokio::test]
    async fn test_fetch_rejects_empty() {
        let fetcher = FsFetcher::new("site");

        let err = fetcher.fetch_text("/").await.unwrap_err();

        assert_eq!(err.kind, FetchErrorKind::InvalidPath);
    }
}
