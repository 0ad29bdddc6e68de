//! Theme side-module.
//!
//! Applies the stored light/dark preference to the document element and
//! keeps the shell's `#theme-toggle` control labelled for the next switch.

use std::sync::OnceLock;

use sym_dom::{ParentNode, Selector};

use crate::document::Document;
use crate::error::ModuleError;
use crate::modules::{EngineHandle, SideModule};

/// Preference key holding the theme.
pub const THEME_KEY: &str = "theme";

/// Id of the toggle control in the shell.
pub const TOGGLE_ID: &str = "theme-toggle";

/// Colour theme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
    /// Light theme.
    #[default]
    Light,
    /// Dark theme.
    Dark,
}

impl Theme {
    /// Parse a stored preference value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    /// Preference value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Class applied to the document element.
    #[must_use]
    pub fn class_name(self) -> &'static str {
        match self {
            Self::Light => "theme-light",
            Self::Dark => "theme-dark",
        }
    }

    /// The other theme.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    fn toggle_label(self) -> &'static str {
        match self {
            Self::Light => "Switch to dark theme",
            Self::Dark => "Switch to light theme",
        }
    }
}

/// Theme switching.
///
/// Stays uninitialised when the shell has no `#theme-toggle`.
#[derive(Debug, Default)]
pub struct ThemeModule {
    default: Theme,
    engine: OnceLock<EngineHandle>,
}

impl ThemeModule {
    /// Create the module with the theme used when nothing is stored.
    #[must_use]
    pub fn new(default: Theme) -> Self {
        Self {
            default,
            engine: OnceLock::new(),
        }
    }

    /// Whether `init` found the toggle and applied a theme.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.engine.get().is_some()
    }

    /// Theme currently applied to the document.
    #[must_use]
    pub fn current(&self) -> Option<Theme> {
        let engine = self.engine.get()?;
        Some(engine.with_document(|doc| current_theme(doc)))
    }

    /// Switch to the other theme and store the choice.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError`] if the module is not initialised.
    pub fn toggle(&self) -> Result<Theme, ModuleError> {
        let engine = self
            .engine
            .get()
            .ok_or_else(|| ModuleError::new(self.name(), "not initialised"))?;

        let theme = engine.with_document(|doc| {
            let theme = current_theme(doc).toggled();
            apply(doc, theme);
            theme
        });
        engine.preferences().set(THEME_KEY, theme.as_str());

        Ok(theme)
    }
}

impl SideModule for ThemeModule {
    fn name(&self) -> &str {
        "theme"
    }

    fn init(&self, engine: &EngineHandle) -> Result<(), ModuleError> {
        if self.is_initialized() {
            return Ok(());
        }

        let stored = engine.preferences().get(THEME_KEY);
        let theme = stored.as_deref().and_then(Theme::parse).unwrap_or(self.default);

        let applied = engine.with_document(|doc| {
            if doc.root().query(&Selector::id(TOGGLE_ID)).is_none() {
                return false;
            }
            apply(doc, theme);
            true
        });

        if !applied {
            tracing::warn!("Theme toggle not found in shell, theme module not initialised");
            return Ok(());
        }

        // A concurrent init may have won; both applied the same theme.
        let _ = self.engine.set(engine.clone());
        tracing::info!(theme = theme.as_str(), "Theme module initialised");
        Ok(())
    }
}

fn current_theme(doc: &Document) -> Theme {
    let light = doc
        .class()
        .is_some_and(|class| class.split_whitespace().any(|c| c == Theme::Light.class_name()));
    if light { Theme::Light } else { Theme::Dark }
}

fn apply(doc: &mut Document, theme: Theme) {
    doc.set_class(theme.class_name());
    if let Some(toggle) = doc.root_mut().query_mut(&Selector::id(TOGGLE_ID)) {
        toggle.set_attr("aria-label", theme.toggle_label());
    }
}
