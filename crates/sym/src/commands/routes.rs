//! `sym routes` command implementation.

use clap::Args;
use sym_engine::Manifest;

use super::{SiteArgs, fetcher_for, load_manifest};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the routes command.
#[derive(Args)]
pub(crate) struct RoutesArgs {
    #[command(flatten)]
    pub site: SiteArgs,
}

impl RoutesArgs {
    /// Execute the routes command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the manifest cannot be
    /// loaded.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = self.site.load_config()?;
        let fetcher = fetcher_for(&config);
        let manifest = load_manifest(fetcher.as_ref(), &config).await?;

        for line in route_lines(&manifest) {
            output.listing(&line);
        }
        Ok(())
    }
}

/// One aligned line per route: id, page title, content path. The default
/// route is marked with `*`.
fn route_lines(manifest: &Manifest) -> Vec<String> {
    let id_width = manifest.routes.keys().map(String::len).max().unwrap_or(0);
    let title_width = manifest
        .routes
        .values()
        .map(|route| route.title.len())
        .max()
        .unwrap_or(0);

    manifest
        .routes
        .iter()
        .map(|(id, route)| {
            let marker = if *id == manifest.default_route { '*' } else { ' ' };
            format!(
                "{marker} {id:<id_width$}  {title:<title_width$}  {content}",
                title = route.title,
                content = route.content,
            )
        })
        .collect()
}
