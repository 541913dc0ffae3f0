//! Background service.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use contexxt_protocols::{
    ContextMenus, DownloadId, Downloader, HostError, MenuContext, MenuItem, RuntimeBridge,
    RuntimeMessage, TabId,
};

pub const MENU_ID: &str = "inspect-asset";
pub const MENU_TITLE: &str = "Inspect with Contexxt";

/// A context-menu activation as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuClick {
    pub menu_id: String,
    /// Missing when the menu was opened outside a tab.
    pub tab: Option<TabId>,
}

pub struct BackgroundService {
    menus: Arc<dyn ContextMenus>,
    bridge: Arc<dyn RuntimeBridge>,
    downloader: Arc<dyn Downloader>,
}

impl BackgroundService {
    pub fn new(
        menus: Arc<dyn ContextMenus>,
        bridge: Arc<dyn RuntimeBridge>,
        downloader: Arc<dyn Downloader>,
    ) -> Self {
        Self {
            menus,
            bridge,
            downloader,
        }
    }

    /// Register the inspect entry. Prior entries are cleared first, so this is
    /// safe to call on every install or update.
    pub async fn install(&self) -> Result<(), HostError> {
        self.menus.remove_all().await?;
        self.menus
            .create(MenuItem {
                id: MENU_ID.to_string(),
                title: MENU_TITLE.to_string(),
                contexts: vec![MenuContext::All],
            })
            .await?;
        info!("Registered context menu {}", MENU_ID);
        Ok(())
    }

    /// Forward an inspect click to the page script of the clicked tab.
    ///
    /// Returns whether the message was delivered.
    pub fn on_menu_clicked(&self, click: &MenuClick) -> bool {
        if click.menu_id != MENU_ID {
            return false;
        }
        let Some(tab) = click.tab else {
            debug!("Ignoring inspect click without a tab");
            return false;
        };

        match self.bridge.send_to_tab(tab, RuntimeMessage::InspectElement) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to send inspect request to {}: {}", tab, e);
                false
            }
        }
    }

    /// Handle a message from a page script.
    pub async fn on_message(&self, message: RuntimeMessage) -> Option<DownloadId> {
        match message {
            RuntimeMessage::DownloadAsset { url } => match self.downloader.download(&url).await {
                Ok(id) => {
                    info!("Download {} started for {}", id.0, url);
                    Some(id)
                }
                Err(e) => {
                    warn!("Download of {} failed: {}", url, e);
                    None
                }
            },
            other => {
                debug!("Ignoring {} in background", other.kind());
                None
            }
        }
    }

    /// Serve page messages and menu clicks until both feeds close or a
    /// shutdown signal arrives.
    pub async fn run(
        self: Arc<Self>,
        mut messages: mpsc::UnboundedReceiver<RuntimeMessage>,
        mut clicks: mpsc::UnboundedReceiver<MenuClick>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let mut messages_open = true;
        let mut clicks_open = true;
        while messages_open || clicks_open {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Background service shutting down");
                    break;
                }
                message = messages.recv(), if messages_open => match message {
                    Some(message) => {
                        self.on_message(message).await;
                    }
                    None => messages_open = false,
                },
                click = clicks.recv(), if clicks_open => match click {
                    Some(click) => {
                        self.on_menu_clicked(&click);
                    }
                    None => clicks_open = false,
                },
            }
        }
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
