use super::*;
use async_trait::async_trait;
use contexxt_config::{FileSettingsStore, MemorySettingsStore};
use contexxt_host::{MemoryPage, RecordingTabs};
use contexxt_protocols::{
    DisplaySetting, ElementSnapshot, PointerKind, Rect, SettingsError, Viewport,
};
use tempfile::TempDir;

/// Store whose backing storage cannot be read.
struct UnreadableStore {
    tx: broadcast::Sender<Settings>,
}

impl UnreadableStore {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(4);
        Self { tx }
    }
}

#[async_trait]
impl SettingsStore for UnreadableStore {
    async fn load(&self) -> Result<Option<Settings>, SettingsError> {
        Err(SettingsError::Unavailable("storage locked".to_string()))
    }

    async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let _ = self.tx.send(*settings);
        Ok(())
    }

    fn watch(&self) -> broadcast::Receiver<Settings> {
        self.tx.subscribe()
    }
}

fn settings(show_alt: DisplaySetting, show_url: DisplaySetting) -> Settings {
    Settings {
        show_alt,
        show_url,
        enable_ctrl_click: false,
    }
}

fn section() -> ElementSnapshot {
    ElementSnapshot {
        tag_name: "section".to_string(),
        ..Default::default()
    }
}

fn image(src: &str) -> ElementSnapshot {
    ElementSnapshot {
        tag_name: "img".to_string(),
        src: Some(src.to_string()),
        natural_width: 100,
        natural_height: 100,
        ..Default::default()
    }
}

fn sorted(mut ids: Vec<NodeId>) -> Vec<NodeId> {
    ids.sort();
    ids
}

struct Harness {
    page: Arc<MemoryPage>,
    tabs: Arc<RecordingTabs>,
    registry: OverlayRegistry,
}

impl Harness {
    fn new() -> Self {
        let page = Arc::new(MemoryPage::new());
        let tabs = Arc::new(RecordingTabs::new());
        let registry = OverlayRegistry::new(page.clone(), tabs.clone());
        Self {
            page,
            tabs,
            registry,
        }
    }

    async fn start(&self, settings: Option<Settings>) -> Option<broadcast::Receiver<Settings>> {
        let store = match settings {
            Some(settings) => MemorySettingsStore::with_settings(settings),
            None => MemorySettingsStore::new(),
        };
        self.registry.initialize(&store).await
    }

    /// Deliver pending mutation batches until the page settles.
    fn pump(&self) {
        loop {
            let records = self.page.take_mutations();
            if records.is_empty() {
                break;
            }
            self.registry.handle_mutations(&records);
        }
    }
}

#[tokio::test]
async fn test_skips_bare_media_documents() {
    let page = Arc::new(MemoryPage::with_content_type("image/png"));
    page.insert_image("https://a.test/cat.png", None, Rect::new(0.0, 0.0, 10.0, 10.0));
    let registry = OverlayRegistry::new(page.clone(), Arc::new(RecordingTabs::new()));
    let store = MemorySettingsStore::with_settings(settings(
        DisplaySetting::Always,
        DisplaySetting::Always,
    ));

    assert!(registry.initialize(&store).await.is_none());
    assert!(registry.tracked().is_empty());
    assert!(!page.is_observing_mutations());
    assert!(!page.is_listening_viewport());
}

#[tokio::test]
async fn test_fresh_install_shows_default_overlays() {
    let dir = TempDir::new().unwrap();
    let store = FileSettingsStore::new(dir.path().join("never-saved.toml"));
    let h = Harness::new();
    let img = h
        .page
        .insert_image("https://a.test/cat.png", None, Rect::new(0.0, 0.0, 10.0, 10.0));

    assert!(h.registry.initialize(&store).await.is_some());
    assert!(h.registry.is_enabled());
    assert_eq!(h.registry.tracked(), vec![img]);

    let container = h.registry.container_of(img).unwrap();
    let markup = h.page.container_markup(container).unwrap();
    assert!(markup.contains(r#"class="bottom-bar visible""#));
    assert!(markup.contains(r#"class="alt-badge hidden missing""#));
}

#[tokio::test]
async fn test_unreadable_settings_leave_registry_disabled() {
    let h = Harness::new();
    h.page
        .insert_image("https://a.test/cat.png", None, Rect::new(0.0, 0.0, 10.0, 10.0));
    let store = UnreadableStore::new();

    let mut updates = h.registry.initialize(&store).await.unwrap();
    assert!(!h.registry.is_enabled());
    assert!(h.registry.tracked().is_empty());
    assert!(h.page.attached_containers().is_empty());
    assert!(h.page.is_observing_mutations());
    assert!(h.page.is_listening_viewport());

    // A later change still reaches the registry.
    store.save(&Settings::default()).await.unwrap();
    h.registry.apply_settings(updates.recv().await.unwrap());
    assert!(h.registry.is_enabled());
    assert_eq!(h.registry.tracked().len(), 1);
}

#[tokio::test]
async fn test_initial_scan_tracks_every_media_element() {
    let h = Harness::new();
    let img = h
        .page
        .insert_image("https://a.test/cat.png", Some("cat"), Rect::new(10.0, 20.0, 100.0, 80.0));
    let video = h
        .page
        .insert_video("https://a.test/clip.mp4", Rect::new(0.0, 200.0, 320.0, 180.0));

    h.start(Some(settings(DisplaySetting::Always, DisplaySetting::Always)))
        .await;

    assert!(h.registry.is_enabled());
    assert_eq!(h.registry.tracked(), vec![img, video]);
    assert_eq!(h.page.attached_containers().len(), 2);
    assert_eq!(sorted(h.page.resize_targets()), vec![img, video]);

    let img_container = h.registry.container_of(img).unwrap();
    assert_eq!(
        h.page.container_class_name(img_container).as_deref(),
        Some(CONTAINER_CLASS)
    );
    assert_eq!(
        h.page.container_stylesheet(img_container).as_deref(),
        Some(STYLESHEET)
    );
    assert_eq!(
        h.page.container_placement(img_container),
        Some(Placement {
            left: 10.0,
            top: 20.0,
            width: 100.0,
            height: 80.0,
            displayed: true,
        })
    );
    assert!(!h.page.container_has_class(img_container, "video-mode"));

    let video_container = h.registry.container_of(video).unwrap();
    assert!(h.page.container_has_class(video_container, "video-mode"));
    assert_eq!(h.registry.target_of(video_container), Some(video));
}

#[tokio::test]
async fn test_hover_state_is_styled_on_the_container() {
    let h = Harness::new();
    let img = h
        .page
        .insert_image("https://a.test/cat.png", None, Rect::new(0.0, 0.0, 10.0, 10.0));
    h.start(Some(settings(DisplaySetting::Hover, DisplaySetting::Hover)))
        .await;

    let container = h.registry.container_of(img).unwrap();
    h.registry.handle_pointer(PointerCrossing {
        kind: PointerKind::Enter,
        target: img,
        related: None,
    });
    assert!(h.page.container_has_class(container, "active"));

    let markup = h.page.container_markup(container).unwrap();
    let stylesheet = h.page.container_stylesheet(container).unwrap();
    assert!(markup.contains("show-on-hover"));
    assert!(stylesheet.contains(":host(.active) .show-on-hover { opacity: 1; }"));
    assert!(stylesheet.contains(":host(.active) .icon-btn { opacity: 1; }"));
    assert!(stylesheet.contains(":host(.video-mode) .bottom-bar"));
}

#[tokio::test]
async fn test_removed_subtree_retires_overlays_before_rescan() {
    let h = Harness::new();
    let body = h.page.body();
    let wrapper = h.page.insert(body, section(), Rect::default());
    let inner_a = h
        .page
        .insert(wrapper, image("a.png"), Rect::new(0.0, 0.0, 50.0, 50.0));
    let inner_b = h
        .page
        .insert(wrapper, image("b.png"), Rect::new(0.0, 60.0, 50.0, 50.0));
    let standalone = h
        .page
        .insert_image("c.png", None, Rect::new(0.0, 120.0, 50.0, 50.0));

    h.start(Some(settings(DisplaySetting::Always, DisplaySetting::Always)))
        .await;
    assert_eq!(h.registry.tracked(), vec![inner_a, inner_b, standalone]);
    let container_a = h.registry.container_of(inner_a).unwrap();

    // Removal and insertion arrive in the same batch.
    h.page.remove(wrapper);
    let added = h
        .page
        .insert_image("d.png", None, Rect::new(0.0, 180.0, 50.0, 50.0));
    let records = h.page.take_mutations();
    h.registry.handle_mutations(&records);

    assert_eq!(h.registry.tracked(), vec![standalone, added]);
    assert!(!h.page.is_container_attached(container_a));
    assert_eq!(sorted(h.page.resize_targets()), vec![standalone, added]);
    assert_eq!(h.page.attached_containers().len(), 2);
}

#[tokio::test]
async fn test_overlay_count_follows_attached_media() {
    let h = Harness::new();
    let body = h.page.body();
    h.start(Some(settings(DisplaySetting::Hover, DisplaySetting::Never)))
        .await;

    let mut detached = Vec::new();
    for round in 0..8u32 {
        let wrapper = h.page.insert(body, section(), Rect::default());
        let y = f64::from(round) * 100.0;
        h.page
            .insert(wrapper, image("img.png"), Rect::new(0.0, y, 40.0, 40.0));
        let video = h
            .page
            .insert_video("clip.mp4", Rect::new(50.0, y, 40.0, 40.0));

        if round % 2 == 1 {
            h.page.remove(wrapper);
            detached.push(wrapper);
        }
        if round % 3 == 2 {
            h.page.remove(video);
        }
        if round % 4 == 3 {
            if let Some(back) = detached.first().copied() {
                h.page.append(body, back);
                detached.remove(0);
            }
        }
        h.pump();

        let media = sorted(h.page.query_media());
        assert_eq!(sorted(h.registry.tracked()), media);
        assert_eq!(h.page.attached_containers().len(), media.len());
        for id in h.registry.tracked() {
            assert!(h.page.is_connected(id));
        }
    }
}

#[tokio::test]
async fn test_settings_toggle_clears_and_rescans() {
    let h = Harness::new();
    h.page
        .insert_image("a.png", None, Rect::new(0.0, 0.0, 50.0, 50.0));
    h.page
        .insert_image("b.png", None, Rect::new(0.0, 60.0, 50.0, 50.0));
    h.start(Some(settings(DisplaySetting::Always, DisplaySetting::Always)))
        .await;
    assert_eq!(h.registry.tracked().len(), 2);

    h.registry
        .apply_settings(settings(DisplaySetting::Never, DisplaySetting::Never));
    assert!(!h.registry.is_enabled());
    assert!(h.registry.tracked().is_empty());
    assert!(h.page.attached_containers().is_empty());
    assert!(h.page.resize_targets().is_empty());

    // Ignored while disabled.
    h.page
        .insert_image("c.png", None, Rect::new(0.0, 120.0, 50.0, 50.0));
    h.pump();
    assert!(h.registry.tracked().is_empty());

    h.registry
        .apply_settings(settings(DisplaySetting::Never, DisplaySetting::Hover));
    assert!(h.registry.is_enabled());
    assert_eq!(h.registry.tracked().len(), 3);
    assert_eq!(h.page.attached_containers().len(), 3);
}

#[tokio::test]
async fn test_settings_change_rerenders_in_place() {
    let h = Harness::new();
    let img = h
        .page
        .insert_image("https://a.test/cat.png", Some("cat"), Rect::new(0.0, 0.0, 50.0, 50.0));
    h.start(Some(settings(DisplaySetting::Never, DisplaySetting::Always)))
        .await;

    let container = h.registry.container_of(img).unwrap();
    let before = h.page.container_markup(container).unwrap();
    assert!(before.contains(r#"class="alt-badge hidden""#));

    h.registry
        .apply_settings(settings(DisplaySetting::Always, DisplaySetting::Hover));

    assert_eq!(h.registry.container_of(img), Some(container));
    let after = h.page.container_markup(container).unwrap();
    assert!(after.contains(r#"<div class="alt-badge visible">ALT: cat</div>"#));
    assert!(after.contains(r#"class="bottom-bar show-on-hover""#));
}

#[tokio::test]
async fn test_watch_subscription_delivers_changes() {
    let h = Harness::new();
    h.page
        .insert_image("a.png", None, Rect::new(0.0, 0.0, 50.0, 50.0));
    let store =
        MemorySettingsStore::with_settings(settings(DisplaySetting::Never, DisplaySetting::Never));
    let mut updates = h.registry.initialize(&store).await.unwrap();
    assert!(!h.registry.is_enabled());

    store
        .save(&settings(DisplaySetting::Always, DisplaySetting::Never))
        .await
        .unwrap();
    let next = updates.recv().await.unwrap();
    h.registry.apply_settings(next);

    assert_eq!(h.registry.tracked().len(), 1);
}

#[tokio::test]
async fn test_reposition_tracks_document_coordinates() {
    let h = Harness::new();
    h.page.set_viewport(Viewport {
        width: 800.0,
        height: 600.0,
        scroll_x: 0.0,
        scroll_y: 0.0,
    });
    let img = h
        .page
        .insert_image("a.png", None, Rect::new(50.0, 900.0, 200.0, 100.0));
    h.start(Some(settings(DisplaySetting::Always, DisplaySetting::Always)))
        .await;
    let container = h.registry.container_of(img).unwrap();

    h.page.scroll_to(30.0, 600.0);
    h.registry.reposition_all();
    let placement = h.page.container_placement(container).unwrap();
    assert_eq!((placement.left, placement.top), (50.0, 900.0));
    assert!(placement.displayed);

    h.page.set_rect(img, Rect::new(50.0, 900.0, 0.0, 100.0));
    h.registry.reposition_all();
    let placement = h.page.container_placement(container).unwrap();
    assert!(!placement.displayed);
    assert!(h.page.is_container_attached(container));
    assert_eq!(h.registry.tracked(), vec![img]);
}

#[tokio::test]
async fn test_resize_feed_repositions_overlay() {
    let h = Harness::new();
    let img = h
        .page
        .insert_image("a.png", None, Rect::new(0.0, 0.0, 100.0, 100.0));
    h.start(Some(settings(DisplaySetting::Always, DisplaySetting::Always)))
        .await;

    h.page.set_rect(img, Rect::new(0.0, 0.0, 300.0, 150.0));
    let entries = h.page.take_resizes();
    assert_eq!(entries.len(), 1);
    h.registry.handle_resizes(&entries);

    let container = h.registry.container_of(img).unwrap();
    let placement = h.page.container_placement(container).unwrap();
    assert_eq!((placement.width, placement.height), (300.0, 150.0));
}

#[tokio::test]
async fn test_resize_of_detached_element_retires_overlay() {
    let h = Harness::new();
    let img = h
        .page
        .insert_image("a.png", None, Rect::new(0.0, 0.0, 100.0, 100.0));
    let other = h
        .page
        .insert_image("b.png", None, Rect::new(0.0, 200.0, 100.0, 100.0));
    h.start(Some(settings(DisplaySetting::Always, DisplaySetting::Always)))
        .await;
    let container = h.registry.container_of(img).unwrap();

    // The resize batch lands before the removal's mutation batch.
    h.page.set_rect(img, Rect::new(0.0, 0.0, 300.0, 150.0));
    h.page.set_rect(other, Rect::new(0.0, 200.0, 120.0, 100.0));
    h.page.remove(img);
    let entries = h.page.take_resizes();
    assert_eq!(entries.len(), 2);
    h.registry.handle_resizes(&entries);

    assert_eq!(h.registry.tracked(), vec![other]);
    assert!(!h.page.is_container_attached(container));
    assert_eq!(h.page.resize_targets(), vec![other]);

    h.pump();
    assert_eq!(h.registry.tracked(), vec![other]);
    assert_eq!(h.page.attached_containers().len(), 1);
}

#[tokio::test]
async fn test_hover_crossing_between_element_and_overlay() {
    let h = Harness::new();
    let body = h.page.body();
    let img = h
        .page
        .insert_image("a.png", None, Rect::new(0.0, 0.0, 100.0, 100.0));
    h.start(Some(settings(DisplaySetting::Hover, DisplaySetting::Hover)))
        .await;
    let container = h.registry.container_of(img).unwrap();
    let button = h.page.create_element(
        ElementSnapshot {
            tag_name: "button".to_string(),
            ..Default::default()
        },
        Rect::default(),
    );
    h.page.append(container, button);

    let crossing = |kind, target, related| PointerCrossing {
        kind,
        target,
        related,
    };

    h.registry
        .handle_pointer(crossing(PointerKind::Enter, img, Some(body)));
    assert_eq!(h.registry.hover_state(img), Some(HoverState::Active));
    assert!(h.page.container_has_class(container, "active"));

    // Element to its own overlay, including a node inside the overlay.
    h.registry
        .handle_pointer(crossing(PointerKind::Leave, img, Some(container)));
    h.registry
        .handle_pointer(crossing(PointerKind::Leave, img, Some(button)));
    assert_eq!(h.registry.hover_state(img), Some(HoverState::Active));

    // Overlay back to the element.
    h.registry
        .handle_pointer(crossing(PointerKind::Enter, container, Some(img)));
    h.registry
        .handle_pointer(crossing(PointerKind::Leave, container, Some(img)));
    assert!(h.page.container_has_class(container, "active"));

    // Out of both.
    h.registry
        .handle_pointer(crossing(PointerKind::Leave, container, Some(body)));
    assert_eq!(h.registry.hover_state(img), Some(HoverState::Idle));
    assert!(!h.page.container_has_class(container, "active"));

    h.registry
        .handle_pointer(crossing(PointerKind::Enter, img, None));
    h.registry
        .handle_pointer(crossing(PointerKind::Leave, img, None));
    assert_eq!(h.registry.hover_state(img), Some(HoverState::Idle));
}

#[tokio::test]
async fn test_open_source_from_overlay_button() {
    let h = Harness::new();
    let img = h
        .page
        .insert_image("https://a.test/cat.png", None, Rect::new(0.0, 0.0, 100.0, 100.0));
    h.start(Some(settings(DisplaySetting::Always, DisplaySetting::Always)))
        .await;
    let container = h.registry.container_of(img).unwrap();

    assert!(h.registry.open_source(container));
    assert!(!h.registry.open_source(NodeId(999)));
    assert_eq!(h.tabs.opened(), vec!["https://a.test/cat.png".to_string()]);

    h.registry
        .apply_settings(settings(DisplaySetting::Always, DisplaySetting::Never));
    assert!(!h.registry.open_source(container));
    assert_eq!(h.tabs.opened().len(), 1);
}

#[tokio::test]
async fn test_media_moved_under_overlay_is_not_tracked() {
    let h = Harness::new();
    let img = h
        .page
        .insert_image("a.png", None, Rect::new(0.0, 0.0, 100.0, 100.0));
    h.start(Some(settings(DisplaySetting::Always, DisplaySetting::Always)))
        .await;
    let container = h.registry.container_of(img).unwrap();

    let stray = h
        .page
        .create_element(image("stray.png"), Rect::new(0.0, 0.0, 10.0, 10.0));
    h.page.append(container, stray);
    h.pump();

    assert_eq!(h.registry.tracked(), vec![img]);
}

#[tokio::test]
async fn test_dispose_releases_everything() {
    let h = Harness::new();
    h.page
        .insert_image("a.png", None, Rect::new(0.0, 0.0, 100.0, 100.0));
    h.start(Some(settings(DisplaySetting::Always, DisplaySetting::Always)))
        .await;

    h.registry.dispose();

    assert!(h.registry.tracked().is_empty());
    assert!(h.page.attached_containers().is_empty());
    assert!(h.page.resize_targets().is_empty());
    assert!(!h.page.is_observing_mutations());
    assert!(!h.page.is_listening_viewport());

    h.registry
        .apply_settings(settings(DisplaySetting::Always, DisplaySetting::Always));
    assert!(h.registry.tracked().is_empty());
}

/// Page whose element lookup fails for one node.
struct FlakyPage {
    inner: MemoryPage,
    broken: NodeId,
}

impl Document for FlakyPage {
    fn content_type(&self) -> String {
        self.inner.content_type()
    }
    fn body(&self) -> NodeId {
        self.inner.body()
    }
    fn query_media(&self) -> Vec<NodeId> {
        self.inner.query_media()
    }
    fn query_media_in(&self, root: NodeId) -> Vec<NodeId> {
        self.inner.query_media_in(root)
    }
    fn element(&self, id: NodeId) -> Option<ElementSnapshot> {
        if id == self.broken {
            None
        } else {
            self.inner.element(id)
        }
    }
    fn bounding_client_rect(&self, id: NodeId) -> Rect {
        self.inner.bounding_client_rect(id)
    }
    fn viewport(&self) -> Viewport {
        self.inner.viewport()
    }
    fn is_connected(&self, id: NodeId) -> bool {
        self.inner.is_connected(id)
    }
    fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        self.inner.ancestors(id)
    }
}

impl RenderScope for FlakyPage {
    fn create_container(&self, class_name: &str, stylesheet: &str) -> NodeId {
        self.inner.create_container(class_name, stylesheet)
    }
    fn attach_container(&self, container: NodeId) {
        self.inner.attach_container(container)
    }
    fn detach_container(&self, container: NodeId) {
        self.inner.detach_container(container)
    }
    fn is_container_attached(&self, container: NodeId) -> bool {
        self.inner.is_container_attached(container)
    }
    fn set_markup(&self, container: NodeId, markup: &str) {
        self.inner.set_markup(container, markup)
    }
    fn place(&self, container: NodeId, placement: Placement) {
        self.inner.place(container, placement)
    }
    fn set_class(&self, container: NodeId, class_name: &str, on: bool) {
        self.inner.set_class(container, class_name, on)
    }
}

impl ObservationFeeds for FlakyPage {
    fn observe_mutations(&self, root: NodeId) {
        self.inner.observe_mutations(root)
    }
    fn disconnect_mutations(&self) {
        self.inner.disconnect_mutations()
    }
    fn observe_resize(&self, target: NodeId) {
        self.inner.observe_resize(target)
    }
    fn unobserve_resize(&self, target: NodeId) {
        self.inner.unobserve_resize(target)
    }
    fn disconnect_resize(&self) {
        self.inner.disconnect_resize()
    }
    fn listen_viewport(&self) {
        self.inner.listen_viewport()
    }
    fn unlisten_viewport(&self) {
        self.inner.unlisten_viewport()
    }
    fn listen_pointer_down(&self) {
        self.inner.listen_pointer_down()
    }
    fn unlisten_pointer_down(&self) {
        self.inner.unlisten_pointer_down()
    }
}

#[tokio::test]
async fn test_one_failing_element_does_not_block_others() {
    let inner = MemoryPage::new();
    let first = inner.insert_image("a.png", None, Rect::new(0.0, 0.0, 10.0, 10.0));
    let broken = inner.insert_image("b.png", None, Rect::new(0.0, 20.0, 10.0, 10.0));
    let last = inner.insert_image("c.png", None, Rect::new(0.0, 40.0, 10.0, 10.0));
    let page = Arc::new(FlakyPage { inner, broken });
    let registry = OverlayRegistry::new(page.clone(), Arc::new(RecordingTabs::new()));
    let store = MemorySettingsStore::with_settings(settings(
        DisplaySetting::Always,
        DisplaySetting::Always,
    ));

    registry.initialize(&store).await;

    assert_eq!(registry.tracked(), vec![first, last]);
    registry.reposition_all();
    assert_eq!(page.inner.attached_containers().len(), 2);
}
