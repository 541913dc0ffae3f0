//! The page script and its event loop.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use url::Url;

use contexxt_config::PopoverConfig;
use contexxt_inspector::{
    ActionHandler, ActionHandlers, InspectionPopover, SessionId, SubjectDescriptor,
};
use contexxt_overlay::OverlayRegistry;
use contexxt_protocols::{
    Clipboard, Document, MetadataProbe, NodeId, PageHost, Point, RuntimeBridge, RuntimeMessage,
    Scheduler, Settings, SettingsStore, TabOpener,
};

use crate::event::{ClickOutcome, PageEvent};

/// Host capabilities the page script runs against.
#[derive(Clone)]
pub struct PageServices {
    pub page: Arc<dyn PageHost>,
    pub settings: Arc<dyn SettingsStore>,
    pub bridge: Arc<dyn RuntimeBridge>,
    pub tabs: Arc<dyn TabOpener>,
    pub clipboard: Arc<dyn Clipboard>,
    pub probe: Arc<dyn MetadataProbe>,
    pub scheduler: Arc<dyn Scheduler>,
}

#[derive(Default)]
struct ScriptState {
    /// Target of the most recent context-menu event.
    last_target: Option<NodeId>,
    last_point: Point,
    ctrl_click: bool,
}

/// Page script: overlays, the inspection popover and Ctrl/Cmd+Click.
pub struct ContentScript {
    page: Arc<dyn PageHost>,
    settings: Arc<dyn SettingsStore>,
    bridge: Arc<dyn RuntimeBridge>,
    tabs: Arc<dyn TabOpener>,
    probe: Arc<dyn MetadataProbe>,
    registry: OverlayRegistry,
    popover: InspectionPopover,
    state: Mutex<ScriptState>,
}

impl ContentScript {
    pub fn new(services: PageServices, config: PopoverConfig) -> Self {
        let registry = OverlayRegistry::new(services.page.clone(), services.tabs.clone());
        let popover = InspectionPopover::new(
            services.page.clone(),
            services.settings.clone(),
            services.clipboard,
            services.scheduler,
            config,
        );
        Self {
            page: services.page,
            settings: services.settings,
            bridge: services.bridge,
            tabs: services.tabs,
            probe: services.probe,
            registry,
            popover,
            state: Mutex::new(ScriptState::default()),
        }
    }

    pub fn registry(&self) -> &OverlayRegistry {
        &self.registry
    }

    pub fn popover(&self) -> &InspectionPopover {
        &self.popover
    }

    pub fn ctrl_click_enabled(&self) -> bool {
        self.state.lock().ctrl_click
    }

    /// Initialize the overlay registry and read the Ctrl/Cmd+Click flag.
    ///
    /// Returns the settings subscription to pass to [`run`](Self::run).
    pub async fn start(&self) -> broadcast::Receiver<Settings> {
        let updates = match self.registry.initialize(self.settings.as_ref()).await {
            Some(updates) => updates,
            None => self.settings.watch(),
        };

        let ctrl_click = match self.settings.load().await {
            Ok(settings) => settings.unwrap_or_default().enable_ctrl_click,
            Err(e) => {
                warn!("Failed to load settings, Ctrl+Click disabled: {}", e);
                false
            }
        };
        self.state.lock().ctrl_click = ctrl_click;

        info!(ctrl_click, "Page script started");
        updates
    }

    pub fn apply_settings(&self, settings: Settings) {
        self.state.lock().ctrl_click = settings.enable_ctrl_click;
        self.registry.apply_settings(settings);
    }

    pub fn on_context_menu(&self, target: NodeId, point: Point) {
        let mut state = self.state.lock();
        state.last_target = Some(target);
        state.last_point = point;
    }

    /// Ctrl/Cmd+Click on an image or video opens its source in a new tab.
    pub fn on_click(&self, target: NodeId, modifier: bool) -> ClickOutcome {
        if !modifier || !self.ctrl_click_enabled() {
            return ClickOutcome::PassThrough;
        }
        if self.popover.contains(target) {
            return ClickOutcome::PassThrough;
        }
        let Some(element) = self.page.element(target) else {
            return ClickOutcome::PassThrough;
        };
        if element.media_kind().is_none() {
            return ClickOutcome::PassThrough;
        }
        let Some(src) = element.resolved_source() else {
            return ClickOutcome::PassThrough;
        };

        match self.tabs.open_tab(src) {
            Ok(()) => {
                debug!("Ctrl+Click opened {}", src);
                ClickOutcome::Intercepted
            }
            Err(e) => {
                warn!("Failed to open {}: {}", src, e);
                ClickOutcome::PassThrough
            }
        }
    }

    /// Handle a runtime message, awaiting the metadata probe inline.
    pub async fn on_message(&self, message: RuntimeMessage) {
        match message {
            RuntimeMessage::InspectElement => {
                if let Some((session, descriptor)) = self.inspect().await {
                    self.enrich(session, &descriptor).await;
                }
            }
            other => debug!("Ignoring {} in page script", other.kind()),
        }
    }

    /// Mount the popover for the last right-clicked element.
    pub async fn inspect(&self) -> Option<(SessionId, SubjectDescriptor)> {
        let (target, point) = {
            let state = self.state.lock();
            (state.last_target?, state.last_point)
        };
        let Some(element) = self.page.element(target) else {
            debug!("Inspected {} is no longer in the page", target);
            return None;
        };

        let descriptor = SubjectDescriptor::from_snapshot(&element);
        let session = match self.popover.mount(point, descriptor.clone()).await {
            Ok(session) => session,
            Err(e) => {
                debug!("Inspection of {} not shown: {}", target, e);
                return None;
            }
        };
        self.popover.set_handlers(self.action_handlers(&descriptor));

        info!("Inspecting {} as {}", target, descriptor.type_label());
        Some((session, descriptor))
    }

    /// Probe the asset behind `descriptor` and patch the popover if `session`
    /// is still live. Returns whether the popover was updated.
    pub async fn enrich(&self, session: SessionId, descriptor: &SubjectDescriptor) -> bool {
        let Some(url) = descriptor.asset_url() else {
            return false;
        };
        if !is_probeable(url) {
            debug!("Not probing {}", url);
            return false;
        }

        let metadata = match self.probe.head(url).await {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!("Metadata probe for {} failed: {}", url, e);
                return false;
            }
        };
        let Some(enriched) = descriptor.enriched(&metadata) else {
            return false;
        };

        match self.popover.update_session(session, enriched) {
            Ok(()) => true,
            Err(e) => {
                debug!("Dropping probe result for {}: {}", url, e);
                false
            }
        }
    }

    fn action_handlers(&self, descriptor: &SubjectDescriptor) -> ActionHandlers {
        let Some(url) = descriptor.asset_url() else {
            return ActionHandlers::default();
        };

        let bridge = self.bridge.clone();
        let download_url = url.to_string();
        let on_download: ActionHandler = Arc::new(move || {
            let message = RuntimeMessage::DownloadAsset {
                url: download_url.clone(),
            };
            if let Err(e) = bridge.send_to_background(message) {
                warn!("Failed to request download of {}: {}", download_url, e);
            }
        });

        let tabs = self.tabs.clone();
        let tab_url = url.to_string();
        let on_open_tab: ActionHandler = Arc::new(move || {
            if let Err(e) = tabs.open_tab(&tab_url) {
                warn!("Failed to open {}: {}", tab_url, e);
            }
        });

        ActionHandlers {
            on_download: Some(on_download),
            on_open_tab: Some(on_open_tab),
        }
    }

    /// Process page events and settings changes until `events` closes or a
    /// shutdown signal arrives, then tear everything down.
    pub async fn run(
        self: Arc<Self>,
        mut settings: broadcast::Receiver<Settings>,
        mut events: mpsc::UnboundedReceiver<PageEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let mut settings_open = true;
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Page script shutting down");
                    break;
                }
                update = settings.recv(), if settings_open => match update {
                    Ok(update) => self.apply_settings(update),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Missed {} settings updates, reloading", skipped);
                        self.reload_settings().await;
                    }
                    Err(RecvError::Closed) => {
                        debug!("Settings feed closed");
                        settings_open = false;
                    }
                },
                event = events.recv() => match event {
                    Some(event) => self.clone().dispatch(event).await,
                    None => break,
                },
            }
        }
        self.shutdown();
    }

    async fn dispatch(self: Arc<Self>, event: PageEvent) {
        match event {
            PageEvent::ContextMenu { target, point } => self.on_context_menu(target, point),
            PageEvent::Click { target, modifier } => {
                let outcome = self.on_click(target, modifier);
                debug!(?outcome, "Click on {}", target);
            }
            PageEvent::PointerDown { path } => {
                self.popover.handle_pointer_down(&path);
            }
            PageEvent::PopoverClick(target) => {
                self.popover.handle_click(target).await;
            }
            PageEvent::OverlayAction { container } => {
                self.registry.open_source(container);
            }
            PageEvent::Pointer(crossing) => self.registry.handle_pointer(crossing),
            PageEvent::Mutations(records) => self.registry.handle_mutations(&records),
            PageEvent::Resizes(entries) => self.registry.handle_resizes(&entries),
            PageEvent::Viewport => self.registry.reposition_all(),
            // The probe must not hold up later events.
            PageEvent::Message(RuntimeMessage::InspectElement) => {
                if let Some((session, descriptor)) = self.inspect().await {
                    let script = self.clone();
                    tokio::spawn(async move {
                        script.enrich(session, &descriptor).await;
                    });
                }
            }
            PageEvent::Message(other) => self.on_message(other).await,
        }
    }

    async fn reload_settings(&self) {
        match self.settings.load().await {
            Ok(Some(settings)) => self.apply_settings(settings),
            Ok(None) => {}
            Err(e) => warn!("Failed to reload settings: {}", e),
        }
    }

    /// Dispose the overlays and dismiss any open popover.
    pub fn shutdown(&self) {
        self.registry.dispose();
        self.popover.unmount();
    }
}

fn is_probeable(url: &str) -> bool {
    Url::parse(url)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
