//! Extension-level host capabilities: settings, messaging, clipboard, tabs,
//! downloads, context menus, metadata probing and timers.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::error::{BridgeError, HostError, ProbeError, SettingsError};
use crate::types::{RuntimeMessage, Settings};

/// Browser tab identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab {}", self.0)
    }
}

/// Identifier of a started download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadId(pub u64);

/// Persistent key-value settings storage with change subscription.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Current record. Stores answer the default record when nothing has
    /// been saved; `None` means the backing storage has no snapshot to give.
    async fn load(&self) -> Result<Option<Settings>, SettingsError>;

    /// Persist a record and broadcast it to every watcher.
    async fn save(&self, settings: &Settings) -> Result<(), SettingsError>;

    /// Subscribe to future changes.
    fn watch(&self) -> broadcast::Receiver<Settings>;
}

/// Fire-and-forget messaging between page scripts and the background process.
pub trait RuntimeBridge: Send + Sync {
    fn send_to_background(&self, message: RuntimeMessage) -> Result<(), BridgeError>;

    fn send_to_tab(&self, tab: TabId, message: RuntimeMessage) -> Result<(), BridgeError>;
}

#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), HostError>;
}

/// Opens URLs in a new browsing context.
pub trait TabOpener: Send + Sync {
    fn open_tab(&self, url: &str) -> Result<(), HostError>;
}

#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str) -> Result<DownloadId, HostError>;
}

/// Contexts a menu item appears in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuContext {
    All,
    Image,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub title: String,
    pub contexts: Vec<MenuContext>,
}

#[async_trait]
pub trait ContextMenus: Send + Sync {
    async fn remove_all(&self) -> Result<(), HostError>;

    async fn create(&self, item: MenuItem) -> Result<(), HostError>;
}

/// Metadata reported by a HEAD-style probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
}

impl AssetMetadata {
    pub fn is_empty(&self) -> bool {
        self.content_length.is_none() && self.content_type.is_none()
    }
}

/// Best-effort network metadata lookup.
#[async_trait]
pub trait MetadataProbe: Send + Sync {
    async fn head(&self, url: &str) -> Result<AssetMetadata, ProbeError>;
}

/// Handle to a scheduled callback.
///
/// Cancelling is idempotent; once cancelled the callback never runs.
#[derive(Debug, Clone, Default)]
pub struct TimerHandle {
    token: CancellationToken,
}

impl TimerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the handle is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

/// Fixed-delay timers on the page's event loop.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) -> TimerHandle;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_handle_cancel() {
        let handle = TimerHandle::new();
        let clone = handle.clone();
        assert!(!clone.is_cancelled());
        handle.cancel();
        assert!(clone.is_cancelled());
        handle.cancel();
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_asset_metadata_is_empty() {
        assert!(AssetMetadata::default().is_empty());
        let meta = AssetMetadata {
            content_length: Some(10),
            content_type: None,
        };
        assert!(!meta.is_empty());
    }

    #[test]
    fn test_menu_item_serialize() {
        let item = MenuItem {
            id: "inspect-asset".to_string(),
            title: "Inspect".to_string(),
            contexts: vec![MenuContext::All],
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains(r#""contexts":["all"]"#));
    }
}
