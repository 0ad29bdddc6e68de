//! Fetcher trait and error types.
//!
//! # Path Convention
//!
//! Paths are the strings written in the manifest, e.g. `/manifest.json`,
//! `/templates/Card.html`, `content/home.json`. A leading slash is optional;
//! backends resolve paths relative to their own root.

use async_trait::async_trait;

/// Semantic error categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum FetchErrorKind {
    /// Resource does not exist.
    NotFound,
    /// Server answered with a non-success status.
    Status,
    /// Path escapes the backend root or is malformed.
    InvalidPath,
    /// Connection, DNS, timeout or other transport failure.
    Transport,
    /// Other/unknown error category.
    Other,
}

/// Fetch error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct FetchError {
    /// Semantic error category.
    pub kind: FetchErrorKind,
    /// HTTP status code, when the backend has one.
    pub status: Option<u16>,
    /// Requested path.
    pub path: Option<String>,
    /// Backend identifier (e.g., "Fs", "Http", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl FetchError {
    /// Create a new fetch error.
    #[must_use]
    pub fn new(kind: FetchErrorKind) -> Self {
        Self {
            kind,
            status: None,
            path: None,
            backend: None,
            source: None,
        }
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Create a not found error with path.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::NotFound).with_path(path)
    }

    /// Create an error for a non-success status code.
    ///
    /// 404 and 410 map to [`FetchErrorKind::NotFound`].
    #[must_use]
    pub fn status(code: u16, path: impl Into<String>) -> Self {
        let kind = match code {
            404 | 410 => FetchErrorKind::NotFound,
            _ => FetchErrorKind::Status,
        };
        let mut error = Self::new(kind).with_path(path);
        error.status = Some(code);
        error
    }

    /// Create a fetch error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, path: impl Into<String>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => FetchErrorKind::NotFound,
            std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset => FetchErrorKind::Transport,
            _ => FetchErrorKind::Other,
        };
        Self::new(kind).with_path(path).with_source(err)
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind 404: message (path: /foo)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            FetchErrorKind::NotFound => "Not found",
            FetchErrorKind::Status => "Unsuccessful status",
            FetchErrorKind::InvalidPath => "Invalid path",
            FetchErrorKind::Transport => "Transport error",
            FetchErrorKind::Other => "Error",
        };
        write!(f, "{kind_str}")?;

        if let Some(status) = self.status {
            write!(f, " {status}")?;
        }

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {path})")?;
        }

        Ok(())
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Retrieval of raw resources by path.
///
/// Implementations must be safe to call concurrently; the engine issues
/// content, stylesheet and template fetches for one route together.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieve a resource as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the resource is missing, the backend
    /// answers with a non-success status, or the transport fails.
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError>;
}
