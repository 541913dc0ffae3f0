//! Recording implementations of the extension-level services.
//!
//! Used by the CLI harness and tests; each records what it was asked to do.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

use contexxt_protocols::{
    Clipboard, ContextMenus, DownloadId, Downloader, HostError, MenuItem, TabOpener,
};

/// Clipboard that stores written text. Can be switched to fail.
#[derive(Default)]
pub struct RecordingClipboard {
    writes: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl RecordingClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().clone()
    }
}

#[async_trait]
impl Clipboard for RecordingClipboard {
    async fn write_text(&self, text: &str) -> Result<(), HostError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(HostError::Clipboard("permission denied".to_string()));
        }
        self.writes.lock().push(text.to_string());
        Ok(())
    }
}

/// Records every URL opened in a new tab.
#[derive(Default)]
pub struct RecordingTabs {
    opened: Mutex<Vec<String>>,
}

impl RecordingTabs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }
}

impl TabOpener for RecordingTabs {
    fn open_tab(&self, url: &str) -> Result<(), HostError> {
        info!("Opening tab: {}", url);
        self.opened.lock().push(url.to_string());
        Ok(())
    }
}

/// Records download requests and hands out sequential ids.
#[derive(Default)]
pub struct RecordingDownloader {
    urls: Mutex<Vec<String>>,
    next_id: AtomicU64,
}

impl RecordingDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }
}

#[async_trait]
impl Downloader for RecordingDownloader {
    async fn download(&self, url: &str) -> Result<DownloadId, HostError> {
        if url.is_empty() {
            return Err(HostError::Download("empty URL".to_string()));
        }
        self.urls.lock().push(url.to_string());
        Ok(DownloadId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1))
    }
}

/// Context menu registry that, like browsers, rejects duplicate ids.
#[derive(Default)]
pub struct MemoryContextMenus {
    items: Mutex<Vec<MenuItem>>,
}

impl MemoryContextMenus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> Vec<MenuItem> {
        self.items.lock().clone()
    }
}

#[async_trait]
impl ContextMenus for MemoryContextMenus {
    async fn remove_all(&self) -> Result<(), HostError> {
        self.items.lock().clear();
        Ok(())
    }

    async fn create(&self, item: MenuItem) -> Result<(), HostError> {
        let mut items = self.items.lock();
        if items.iter().any(|i| i.id == item.id) {
            return Err(HostError::ContextMenu(format!(
                "Cannot create item with duplicate id {}",
                item.id
            )));
        }
        items.push(item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contexxt_protocols::MenuContext;

    #[tokio::test]
    async fn test_clipboard_records_and_fails() {
        let clipboard = RecordingClipboard::new();
        clipboard.write_text("hello").await.unwrap();
        clipboard.set_failing(true);
        assert!(clipboard.write_text("nope").await.is_err());
        assert_eq!(clipboard.writes(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_downloader_ids_are_sequential() {
        let downloader = RecordingDownloader::new();
        assert_eq!(downloader.download("a").await.unwrap(), DownloadId(1));
        assert_eq!(downloader.download("b").await.unwrap(), DownloadId(2));
        assert!(downloader.download("").await.is_err());
    }

    #[tokio::test]
    async fn test_menus_reject_duplicate_ids() {
        let menus = MemoryContextMenus::new();
        let item = MenuItem {
            id: "inspect-asset".to_string(),
            title: "Inspect".to_string(),
            contexts: vec![MenuContext::All],
        };
        menus.create(item.clone()).await.unwrap();
        assert!(menus.create(item.clone()).await.is_err());

        menus.remove_all().await.unwrap();
        menus.create(item).await.unwrap();
        assert_eq!(menus.items().len(), 1);
    }
}
