//! Engine error types.

use sym_fetch::FetchError;

/// Error raised by the engine.
///
/// Where an error surfaces decides its scope: during [`Engine::start`] it is
/// fatal, during a route change it replaces the main region with an error
/// message, and while rendering a single component it is logged and the
/// component is omitted.
///
/// [`Engine::start`]: crate::Engine::start
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Manifest is missing a required entry or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Resource could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// JSON or markup could not be parsed.
    #[error("Parse error in {path}: {source}")]
    Parse {
        /// Path of the resource that failed to parse.
        path: String,
        /// Underlying parser error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Route id is not declared in the manifest.
    #[error("Route not found: {0}")]
    RouteNotFound(String),
    /// Side-module failed to initialise.
    #[error(transparent)]
    Module(#[from] ModuleError),
    /// Operation requires a started engine.
    #[error("Engine has not been started")]
    NotStarted,
}

impl EngineError {
    /// Create a parse error for a resource path.
    pub fn parse(
        path: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Parse {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Error reported by a side-module's `init`.
#[derive(Debug, thiserror::Error)]
#[error("Module {module} failed: {message}")]
pub struct ModuleError {
    /// Module name.
    pub module: String,
    /// Failure description.
    pub message: String,
}

impl ModuleError {
    /// Create a module error.
    pub fn new(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            message: message.into(),
        }
    }
}
