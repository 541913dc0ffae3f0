//! Settings stores.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::debug;

use contexxt_protocols::{Settings, SettingsError, SettingsPatch, SettingsStore};

use crate::error::ConfigError;
use crate::loader::SettingsLoader;

const WATCH_CAPACITY: usize = 16;

/// Settings persisted as a TOML file.
///
/// A missing file reads as the default record, so a fresh install renders
/// with the defaults until something is saved.
pub struct FileSettingsStore {
    path: PathBuf,
    tx: broadcast::Sender<Settings>,
    write_lock: Mutex<()>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (tx, _) = broadcast::channel(WATCH_CAPACITY);
        Self {
            path: path.into(),
            tx,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load(&self) -> Result<Option<Settings>, SettingsError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Some(Settings::default()));
            }
            Err(e) => return Err(ConfigError::Io(e).into()),
        };
        Ok(Some(SettingsLoader::parse(&content)?))
    }

    async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let _guard = self.write_lock.lock().await;
        let rendered = SettingsLoader::render(settings)?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(ConfigError::Io)?;
        }
        tokio::fs::write(&self.path, rendered)
            .await
            .map_err(ConfigError::Io)?;
        debug!("Settings written to {}", self.path.display());

        // No watchers is not an error.
        let _ = self.tx.send(*settings);
        Ok(())
    }

    fn watch(&self) -> broadcast::Receiver<Settings> {
        self.tx.subscribe()
    }
}

/// In-memory settings store with the same broadcast semantics.
pub struct MemorySettingsStore {
    current: RwLock<Settings>,
    tx: broadcast::Sender<Settings>,
}

impl MemorySettingsStore {
    /// A store with nothing saved yet; it reads as the defaults.
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    /// A store pre-populated with `settings`.
    pub fn with_settings(settings: Settings) -> Self {
        let (tx, _) = broadcast::channel(WATCH_CAPACITY);
        Self {
            current: RwLock::new(settings),
            tx,
        }
    }
}

impl Default for MemorySettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<Option<Settings>, SettingsError> {
        Ok(Some(*self.current.read().await))
    }

    async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        *self.current.write().await = *settings;
        let _ = self.tx.send(*settings);
        Ok(())
    }

    fn watch(&self) -> broadcast::Receiver<Settings> {
        self.tx.subscribe()
    }
}

/// Read-modify-write a partial update onto the stored record (defaults if unset).
pub async fn apply_patch(
    store: &dyn SettingsStore,
    patch: &SettingsPatch,
) -> Result<Settings, SettingsError> {
    let current = store.load().await?.unwrap_or_default();
    let updated = current.merged(patch);
    store.save(&updated).await?;
    Ok(updated)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
