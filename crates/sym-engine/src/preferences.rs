//! User preferences.
//!
//! The engine persists a single kind of state: small string preferences such
//! as the selected theme. A [`PreferenceStore`] backs them; [`Preferences`]
//! adds a session fallback so that an unavailable or failing store degrades
//! to session-only preferences instead of an error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Preference store error.
#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    /// I/O error reading or writing the store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Stored data is not a JSON object of strings.
    #[error("Invalid preference data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistent string key/value storage.
pub trait PreferenceStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;

    /// Write a value.
    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

/// Store that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.values.read().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values
            .write()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Store backed by a JSON object in a file.
///
/// The file is read on every `get` and rewritten on every `set`; a missing
/// file is an empty store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store for a file path. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>, PreferenceError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut values = self.read_all()?;
        values.insert(key.to_owned(), value.to_owned());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&values)?)?;
        Ok(())
    }
}

/// Preferences with a session fallback.
///
/// Writes always land in the session map, then in the store. Reads prefer
/// the store and fall back to the session map when the store fails.
pub struct Preferences {
    store: Option<Box<dyn PreferenceStore>>,
    session: RwLock<HashMap<String, String>>,
}

impl Preferences {
    /// Preferences backed by a store.
    #[must_use]
    pub fn new(store: impl PreferenceStore + 'static) -> Self {
        Self {
            store: Some(Box::new(store)),
            session: RwLock::new(HashMap::new()),
        }
    }

    /// Session-only preferences.
    #[must_use]
    pub fn session_only() -> Self {
        Self {
            store: None,
            session: RwLock::new(HashMap::new()),
        }
    }

    /// Read a preference.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(store) = &self.store {
            match store.get(key) {
                Ok(Some(value)) => return Some(value),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Preference store unavailable, using session value");
                }
            }
        }
        self.session.read().unwrap().get(key).cloned()
    }

    /// Write a preference.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set(&self, key: &str, value: &str) {
        self.session
            .write()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());

        if let Some(store) = &self.store {
            if let Err(e) = store.set(key, value) {
                tracing::warn!(key = %key, error = %e, "Preference not persisted, kept for this session");
            }
        }
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self::session_only()
    }
}

impl std::fmt::Debug for Preferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preferences")
            .field("persistent", &self.store.is_some())
            .finish_non_exhaustive()
    }
}
