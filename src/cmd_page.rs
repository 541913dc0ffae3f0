//! Page snapshot subcommand handlers: `overlays` and `inspect`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

use contexxt_background::{BackgroundService, MenuClick, MENU_ID};
use contexxt_config::{AppConfig, FileSettingsStore};
use contexxt_content::{ContentScript, PageServices};
use contexxt_host::{
    ChannelBridge, HttpProbe, MemoryContextMenus, MemoryPage, PageSnapshot, RecordingClipboard,
    RecordingDownloader, RecordingTabs, TokioScheduler,
};
use contexxt_overlay::OverlayRegistry;
use contexxt_protocols::{NodeId, Point, RuntimeMessage, TabId};

/// Tab the page snapshot is loaded into.
const PAGE_TAB: TabId = TabId(1);

fn load_page(path: &Path) -> Result<(Arc<MemoryPage>, Vec<NodeId>)> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read page snapshot {}", path.display()))?;
    let snapshot = PageSnapshot::from_json(&json)
        .with_context(|| format!("Invalid page snapshot {}", path.display()))?;
    let (page, ids) = MemoryPage::from_snapshot(&snapshot);
    debug!("Loaded {} elements from {}", ids.len(), path.display());
    Ok((Arc::new(page), ids))
}

pub(crate) async fn overlays(store: &FileSettingsStore, page_path: &Path) -> Result<()> {
    let (page, _) = load_page(page_path)?;
    let registry = OverlayRegistry::new(page.clone(), Arc::new(RecordingTabs::new()));

    if registry.initialize(store).await.is_none() {
        println!("Bare media document: no overlays");
        return Ok(());
    }
    if !registry.is_enabled() {
        println!("Overlays are disabled by the current settings");
        return Ok(());
    }

    let tracked = registry.tracked();
    println!("{} overlay(s)", tracked.len());
    for target in tracked {
        let Some(container) = registry.container_of(target) else {
            continue;
        };
        let placement = page
            .container_placement(container)
            .ok_or_else(|| anyhow!("Overlay for {} was never placed", target))?;
        println!(
            "\n{} at ({}, {}) {}x{}{}",
            target,
            placement.left,
            placement.top,
            placement.width,
            placement.height,
            if placement.displayed { "" } else { " [hidden]" }
        );
        println!("{}", page.container_markup(container).unwrap_or_default());
    }

    registry.dispose();
    Ok(())
}

pub(crate) async fn inspect(
    config: &AppConfig,
    store: Arc<FileSettingsStore>,
    page_path: &Path,
    node: usize,
    point: Point,
    offline: bool,
) -> Result<()> {
    let (page, ids) = load_page(page_path)?;
    let target = *ids
        .get(node)
        .ok_or_else(|| anyhow!("No element {} (page has {})", node, ids.len()))?;

    let bridge = Arc::new(ChannelBridge::new());
    let mut tab_messages = bridge.connect_tab(PAGE_TAB);
    let background = BackgroundService::new(
        Arc::new(MemoryContextMenus::new()),
        bridge.clone(),
        Arc::new(RecordingDownloader::new()),
    );
    background.install().await?;

    let services = PageServices {
        page: page.clone(),
        settings: store,
        bridge: bridge.clone(),
        tabs: Arc::new(RecordingTabs::new()),
        clipboard: Arc::new(RecordingClipboard::new()),
        probe: Arc::new(HttpProbe::new(&config.probe)?),
        scheduler: Arc::new(TokioScheduler::new(tokio::runtime::Handle::current())),
    };
    let script = ContentScript::new(services, config.popover.clone());
    script.start().await;

    // Right-click, then pick the menu entry.
    script.on_context_menu(target, point);
    background.on_menu_clicked(&MenuClick {
        menu_id: MENU_ID.to_string(),
        tab: Some(PAGE_TAB),
    });

    while let Ok(message) = tab_messages.try_recv() {
        match message {
            RuntimeMessage::InspectElement if offline => {
                script.inspect().await;
            }
            message => script.on_message(message).await,
        }
    }

    let popover = script.popover();
    let descriptor = popover
        .descriptor()
        .ok_or_else(|| anyhow!("Nothing to inspect at element {}", node))?;
    info!("Inspected {} as {}", target, descriptor.type_label());

    println!("{}", serde_json::to_string_pretty(&descriptor)?);
    if let Some(markup) = popover.container().and_then(|c| page.container_markup(c)) {
        println!("\n{}", markup);
    }

    script.shutdown();
    Ok(())
}
