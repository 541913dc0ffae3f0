use super::*;
use contexxt_host::{ChannelBridge, MemoryContextMenus, RecordingDownloader};

struct Harness {
    menus: Arc<MemoryContextMenus>,
    bridge: Arc<ChannelBridge>,
    downloader: Arc<RecordingDownloader>,
    service: Arc<BackgroundService>,
}

fn harness() -> Harness {
    let menus = Arc::new(MemoryContextMenus::new());
    let bridge = Arc::new(ChannelBridge::new());
    let downloader = Arc::new(RecordingDownloader::new());
    let service = Arc::new(BackgroundService::new(
        menus.clone(),
        bridge.clone(),
        downloader.clone(),
    ));
    Harness {
        menus,
        bridge,
        downloader,
        service,
    }
}

fn inspect_click(tab: Option<TabId>) -> MenuClick {
    MenuClick {
        menu_id: MENU_ID.to_string(),
        tab,
    }
}

#[tokio::test]
async fn test_install_is_idempotent() {
    let h = harness();
    h.service.install().await.unwrap();
    h.service.install().await.unwrap();

    let items = h.menus.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "inspect-asset");
    assert_eq!(items[0].title, "Inspect with Contexxt");
    assert_eq!(items[0].contexts, vec![MenuContext::All]);
}

#[tokio::test]
async fn test_menu_click_forwards_to_tab() {
    let h = harness();
    let mut tab = h.bridge.connect_tab(TabId(7));

    assert!(h.service.on_menu_clicked(&inspect_click(Some(TabId(7)))));
    assert_eq!(tab.try_recv().unwrap(), RuntimeMessage::InspectElement);
}

#[tokio::test]
async fn test_menu_click_without_tab_or_for_other_item_is_ignored() {
    let h = harness();
    let mut tab = h.bridge.connect_tab(TabId(1));

    assert!(!h.service.on_menu_clicked(&inspect_click(None)));
    assert!(!h.service.on_menu_clicked(&MenuClick {
        menu_id: "something-else".to_string(),
        tab: Some(TabId(1)),
    }));
    assert!(tab.try_recv().is_err());
}

#[tokio::test]
async fn test_menu_click_to_tab_without_script_is_not_fatal() {
    let h = harness();
    assert!(!h.service.on_menu_clicked(&inspect_click(Some(TabId(3)))));
}

#[tokio::test]
async fn test_download_asset_starts_download() {
    let h = harness();
    let id = h
        .service
        .on_message(RuntimeMessage::DownloadAsset {
            url: "https://a.test/cat.png".to_string(),
        })
        .await;

    assert_eq!(id, Some(DownloadId(1)));
    assert_eq!(h.downloader.urls(), vec!["https://a.test/cat.png".to_string()]);
}

#[tokio::test]
async fn test_failed_download_is_logged_not_fatal() {
    let h = harness();
    let id = h
        .service
        .on_message(RuntimeMessage::DownloadAsset { url: String::new() })
        .await;
    assert_eq!(id, None);
    assert!(h.service.on_message(RuntimeMessage::InspectElement).await.is_none());
}

#[tokio::test]
async fn test_run_serves_both_feeds() {
    let h = harness();
    let mut tab = h.bridge.connect_tab(TabId(2));
    let (message_tx, message_rx) = mpsc::unbounded_channel();
    let (click_tx, click_rx) = mpsc::unbounded_channel();
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let handle = tokio::spawn(h.service.clone().run(message_rx, click_rx, shutdown_rx));
    message_tx
        .send(RuntimeMessage::DownloadAsset {
            url: "https://a.test/clip.mp4".to_string(),
        })
        .unwrap();
    click_tx.send(inspect_click(Some(TabId(2)))).unwrap();
    drop(message_tx);
    drop(click_tx);
    handle.await.unwrap();

    assert_eq!(h.downloader.urls(), vec!["https://a.test/clip.mp4".to_string()]);
    assert_eq!(tab.try_recv().unwrap(), RuntimeMessage::InspectElement);
}
