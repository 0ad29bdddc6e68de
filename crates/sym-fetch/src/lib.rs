//! Resource fetching abstraction for the Symbiont content engine.
//!
//! The engine loads four kinds of resources by path: the manifest, template
//! markup, route content and stylesheets. This crate hides where they come
//! from behind the [`Fetcher`] trait:
//!
//! - [`FsFetcher`]: reads from a site directory on disk
//! - [`HttpFetcher`]: fetches relative to a base URL
//! - [`MockFetcher`]: in-memory responses with call counting (behind the
//!   `mock` feature flag)
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> Result<(), sym_fetch::FetchError> {
//! use sym_fetch::{Fetcher, FsFetcher};
//!
//! let fetcher = FsFetcher::new("site");
//! let manifest = fetcher.fetch_text("/manifest.json").await?;
//! # Ok(())
//! # }
//! ```

mod fetcher;
mod fs;
mod http;
#[cfg(feature = "mock")]
mod mock;

pub use fetcher::{FetchError, FetchErrorKind, Fetcher};
pub use fs::FsFetcher;
pub use http::HttpFetcher;
#[cfg(feature = "mock")]
pub use mock::MockFetcher;
