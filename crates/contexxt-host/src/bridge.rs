//! In-process runtime messaging.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use contexxt_protocols::{BridgeError, RuntimeBridge, RuntimeMessage, TabId};

/// Routes runtime messages over unbounded channels.
///
/// The background process and each tab's page script connect once and get a
/// receiver; sending to a side that never connected (or dropped its
/// receiver) fails with [`BridgeError::NoReceiver`].
#[derive(Default)]
pub struct ChannelBridge {
    background: Mutex<Option<mpsc::UnboundedSender<RuntimeMessage>>>,
    tabs: Mutex<HashMap<TabId, mpsc::UnboundedSender<RuntimeMessage>>>,
}

impl ChannelBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the background process. Replaces any previous receiver.
    pub fn connect_background(&self) -> mpsc::UnboundedReceiver<RuntimeMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.background.lock() = Some(tx);
        rx
    }

    /// Register the page script running in `tab`.
    pub fn connect_tab(&self, tab: TabId) -> mpsc::UnboundedReceiver<RuntimeMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.tabs.lock().insert(tab, tx);
        rx
    }

    pub fn disconnect_tab(&self, tab: TabId) {
        self.tabs.lock().remove(&tab);
    }
}

impl RuntimeBridge for ChannelBridge {
    fn send_to_background(&self, message: RuntimeMessage) -> Result<(), BridgeError> {
        let mut background = self.background.lock();
        let tx = background
            .as_ref()
            .ok_or_else(|| BridgeError::NoReceiver("background".to_string()))?;
        debug!("-> background: {}", message.kind());
        if tx.send(message).is_err() {
            *background = None;
            return Err(BridgeError::Closed);
        }
        Ok(())
    }

    fn send_to_tab(&self, tab: TabId, message: RuntimeMessage) -> Result<(), BridgeError> {
        let mut tabs = self.tabs.lock();
        let tx = tabs
            .get(&tab)
            .ok_or_else(|| BridgeError::NoReceiver(tab.to_string()))?;
        debug!("-> {}: {}", tab, message.kind());
        if tx.send(message).is_err() {
            tabs.remove(&tab);
            return Err(BridgeError::NoReceiver(tab.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_to_tab() {
        let bridge = ChannelBridge::new();
        let mut rx = bridge.connect_tab(TabId(3));

        bridge
            .send_to_tab(TabId(3), RuntimeMessage::InspectElement)
            .unwrap();
        assert_eq!(rx.recv().await, Some(RuntimeMessage::InspectElement));
    }

    #[test]
    fn test_send_to_unknown_tab() {
        let bridge = ChannelBridge::new();
        let result = bridge.send_to_tab(TabId(9), RuntimeMessage::InspectElement);
        assert!(matches!(result, Err(BridgeError::NoReceiver(_))));
    }

    #[test]
    fn test_send_to_dropped_tab() {
        let bridge = ChannelBridge::new();
        drop(bridge.connect_tab(TabId(1)));
        let result = bridge.send_to_tab(TabId(1), RuntimeMessage::InspectElement);
        assert!(matches!(result, Err(BridgeError::NoReceiver(_))));
    }

    #[tokio::test]
    async fn test_send_to_background() {
        let bridge = ChannelBridge::new();
        assert!(bridge
            .send_to_background(RuntimeMessage::InspectElement)
            .is_err());

        let mut rx = bridge.connect_background();
        let msg = RuntimeMessage::DownloadAsset {
            url: "https://a.test/x.png".to_string(),
        };
        bridge.send_to_background(msg.clone()).unwrap();
        assert_eq!(rx.recv().await, Some(msg));
    }
}
