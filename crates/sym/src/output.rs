//! Terminal reporting for site checks and listings.

use console::{Style, Term};
use sym_engine::RenderReport;

/// Terminal reporter.
///
/// Progress and diagnostics go to stderr; listings go to stdout so they can
/// be piped.
pub(crate) struct Output {
    diag: Term,
    listing: Term,
    ok: Style,
    warn: Style,
    fail: Style,
    title: Style,
}

impl Output {
    pub(crate) fn new() -> Self {
        Self {
            diag: Term::stderr(),
            listing: Term::stdout(),
            ok: Style::new().green(),
            warn: Style::new().yellow(),
            fail: Style::new().red(),
            title: Style::new().cyan().bold(),
        }
    }

    fn diag(&self, style: Option<&Style>, line: &str) {
        let line = match style {
            Some(style) => style.apply_to(line).to_string(),
            None => line.to_owned(),
        };
        let _ = self.diag.write_line(&line);
    }

    /// Site heading: application name and where it is read from.
    pub(crate) fn site(&self, app_name: &str, location: &str) {
        self.diag(Some(&self.title), &format!("Checking {app_name}"));
        self.diag(None, &format!("Site: {location}"));
    }

    /// A rendered route. Dropped components are shown as a warning, or as a
    /// failure when `strict`.
    pub(crate) fn route_rendered(&self, report: &RenderReport, strict: bool) {
        if report.dropped.is_empty() {
            self.diag(
                None,
                &format!("  {}: {} components", report.route_id, report.rendered),
            );
            return;
        }
        let line = format!(
            "  {}: {} components, dropped at {:?}",
            report.route_id, report.rendered, report.dropped
        );
        self.diag(Some(if strict { &self.fail } else { &self.warn }), &line);
    }

    /// A route that did not render.
    pub(crate) fn route_failed(&self, route_id: &str, message: &str) {
        self.diag(Some(&self.fail), &format!("  {route_id}: {message}"));
    }

    /// Final line of a successful check.
    pub(crate) fn check_passed(&self, routes: usize, with_drops: usize) {
        let line = if with_drops > 0 {
            format!("{routes} routes rendered ({with_drops} with dropped components)")
        } else {
            format!("{routes} routes rendered")
        };
        self.diag(Some(&self.ok), &line);
    }

    /// Fatal command error.
    pub(crate) fn error(&self, msg: &str) {
        self.diag(Some(&self.fail), msg);
    }

    /// A listing line on stdout.
    pub(crate) fn listing(&self, line: &str) {
        let _ = self.listing.write_line(line);
    }
}
