//! Persistence contract
//!
//! The store is an external collaborator with a key-value contract: the
//! engine hands it the normalized input (never derived palette values, so
//! algorithm updates can re-derive without stored drift) and tolerates both
//! a missing stored value and a failing write.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{Result, ThemeError};
use crate::normalize::NormalizedThemeInput;

/// Where a chosen theme survives across sessions.
pub trait ThemeStore {
    /// Persist the normalized input. A failure here must not block
    /// publishing; the synchronizer logs it and continues.
    fn save(&mut self, input: &NormalizedThemeInput) -> Result<()>;

    /// Restore the last saved input, or `None` when nothing usable is
    /// stored (first run, unreadable data).
    fn load(&self) -> Option<NormalizedThemeInput>;
}

/// In-memory store for tests and ephemeral hosts. Clones share state;
/// writes can be made to fail to exercise the tolerance path.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreState>>,
}

#[derive(Debug, Default)]
struct MemoryStoreState {
    stored: Option<NormalizedThemeInput>,
    fail_writes: bool,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stored(input: NormalizedThemeInput) -> Self {
        let store = Self::default();
        store.inner.lock().stored = Some(input);
        store
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }

    pub fn saves(&self) -> usize {
        self.inner.lock().saves
    }

    pub fn stored(&self) -> Option<NormalizedThemeInput> {
        self.inner.lock().stored.clone()
    }
}

impl ThemeStore for MemoryStore {
    fn save(&mut self, input: &NormalizedThemeInput) -> Result<()> {
        let mut state = self.inner.lock();
        if state.fail_writes {
            return Err(ThemeError::PersistenceWriteFailure(
                "simulated write failure".to_string(),
            ));
        }
        state.stored = Some(input.clone());
        state.saves += 1;
        Ok(())
    }

    fn load(&self) -> Option<NormalizedThemeInput> {
        self.inner.lock().stored.clone()
    }
}

/// JSON file store, the durable default for desktop hosts.
///
/// The persisted shape is exactly [`NormalizedThemeInput`]. Unreadable or
/// unparseable files degrade to `None` with a warning, never an error.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    /// Store under the platform config directory
    /// (`<config dir>/logotheme/theme.json`).
    pub fn default_location() -> Self {
        let base = dirs::config_dir().unwrap_or_else(std::env::temp_dir);
        JsonFileStore {
            path: base.join("logotheme").join("theme.json"),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl ThemeStore for JsonFileStore {
    fn save(&mut self, input: &NormalizedThemeInput) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ThemeError::PersistenceWriteFailure(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(input)
            .map_err(|e| ThemeError::PersistenceWriteFailure(e.to_string()))?;
        std::fs::write(&self.path, json)
            .map_err(|e| ThemeError::PersistenceWriteFailure(e.to_string()))?;
        debug!(path = %self.path.display(), "Theme persisted");
        Ok(())
    }

    fn load(&self) -> Option<NormalizedThemeInput> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read stored theme");
                return None;
            }
        };
        match serde_json::from_str::<NormalizedThemeInput>(&contents) {
            Ok(input) => {
                debug!(path = %self.path.display(), "Stored theme loaded");
                Some(input)
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Stored theme is malformed, ignoring it"
                );
                None
            }
        }
    }
}
