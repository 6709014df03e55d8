//! Persistence port for the license record.
//!
//! The manager only talks to [`LicenseStore`]; adapters decide where the JSON
//! record lives.

use crate::error::{LicenseError, LicenseResult};
use crate::state::LicenseState;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

/// Storage port for the persisted license record.
pub trait LicenseStore {
    /// Loads the record, or `None` if nothing has been saved yet.
    fn load(&self) -> LicenseResult<Option<LicenseState>>;

    /// Replaces the stored record.
    fn save(&self, state: &LicenseState) -> LicenseResult<()>;
}

impl<S: LicenseStore + ?Sized> LicenseStore for &S {
    fn load(&self) -> LicenseResult<Option<LicenseState>> {
        (**self).load()
    }

    fn save(&self, state: &LicenseState) -> LicenseResult<()> {
        (**self).save(state)
    }
}

/// In-memory store.
///
/// Keeps the serialized JSON rather than the struct so the stored form is
/// exercised the same way as on disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: RwLock<Option<String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with a raw JSON record.
    #[must_use]
    pub fn with_record(json: impl Into<String>) -> Self {
        Self {
            record: RwLock::new(Some(json.into())),
        }
    }

    /// Returns the raw JSON record, if any.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.record.read().ok()?.clone()
    }
}

impl LicenseStore for MemoryStore {
    fn load(&self) -> LicenseResult<Option<LicenseState>> {
        let record = self
            .record
            .read()
            .map_err(|_| LicenseError::Storage("memory store lock poisoned".to_string()))?;

        match record.as_deref() {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, state: &LicenseState) -> LicenseResult<()> {
        let json = serde_json::to_string(state)?;
        let mut record = self
            .record
            .write()
            .map_err(|_| LicenseError::Storage("memory store lock poisoned".to_string()))?;
        *record = Some(json);
        Ok(())
    }
}

/// File-backed store: one JSON file named after the storage key.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Stores the record as `{storage_key}.json` inside `dir`.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>, storage_key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{storage_key}.json")),
        }
    }

    /// Stores the record in the platform data directory for `app_name`.
    ///
    /// - Linux: `~/.local/share/{app_name}/`
    /// - macOS: `~/Library/Application Support/{app_name}/`
    /// - Windows: `C:\Users\{User}\AppData\Roaming\{app_name}\`
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Storage`] if the platform has no data directory.
    pub fn in_data_dir(app_name: &str, storage_key: &str) -> LicenseResult<Self> {
        let base = dirs::data_dir().ok_or_else(|| {
            LicenseError::Storage("could not determine data directory".to_string())
        })?;
        Ok(Self::new(base.join(app_name), storage_key))
    }

    /// Returns the path of the record file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

impl LicenseStore for FileStore {
    fn load(&self) -> LicenseResult<Option<LicenseState>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| LicenseError::Storage(format!("failed to read license state: {e}")))?;
        let state = serde_json::from_str(&contents)?;

        debug!(path = %self.path.display(), "License state loaded");
        Ok(Some(state))
    }

    fn save(&self, state: &LicenseState) -> LicenseResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LicenseError::Storage(format!("failed to create data directory: {e}"))
            })?;
        }

        // Written beside the record and renamed over it; the record itself is
        // never partially written.
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.tmp_path();
        std::fs::write(&tmp, json)
            .map_err(|e| LicenseError::Storage(format!("failed to write license state: {e}")))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| LicenseError::Storage(format!("failed to replace license state: {e}")))?;

        debug!(path = %self.path.display(), "License state saved");
        Ok(())
    }
}
