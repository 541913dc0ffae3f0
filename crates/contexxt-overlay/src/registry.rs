//! Overlay registry.
//!
//! One registry runs per page-script activation. It owns every overlay
//! container plus the mutation, resize and viewport subscriptions, and gives
//! all of them back in [`OverlayRegistry::dispose`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use contexxt_protocols::{
    Document, MutationRecord, NodeId, ObservationFeeds, PageHost, Placement, PointerCrossing,
    RenderScope, ResizeEntry, Settings, SettingsStore, TabOpener, VisibilityPolicy,
};

use crate::content::{render, CONTAINER_CLASS, STYLESHEET};
use crate::error::OverlayError;
use crate::tracked::{HoverState, TrackedOverlay};

/// Documents that are a bare media file get no overlays.
const SKIPPED_CONTENT_PREFIXES: [&str; 3] = ["image/", "video/", "audio/"];

const ACTIVE_CLASS: &str = "active";
const VIDEO_MODE_CLASS: &str = "video-mode";

#[derive(Default)]
struct RegistryState {
    settings: Option<Settings>,
    enabled: bool,
    /// Initialized and not yet disposed.
    live: bool,
    /// Keyed by the annotated element.
    overlays: BTreeMap<NodeId, TrackedOverlay>,
    /// Container to element.
    by_container: HashMap<NodeId, NodeId>,
}

/// Maintains one positioned badge overlay per media element.
pub struct OverlayRegistry {
    page: Arc<dyn PageHost>,
    tabs: Arc<dyn TabOpener>,
    state: Mutex<RegistryState>,
}

impl OverlayRegistry {
    pub fn new(page: Arc<dyn PageHost>, tabs: Arc<dyn TabOpener>) -> Self {
        Self {
            page,
            tabs,
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Load settings, run the first scan and start observing the page.
    ///
    /// Returns the settings subscription the caller should feed into
    /// [`apply_settings`](Self::apply_settings), or `None` when the document
    /// is a bare image, video or audio file and the registry stays inert.
    pub async fn initialize(
        &self,
        store: &dyn SettingsStore,
    ) -> Option<broadcast::Receiver<Settings>> {
        let content_type = self.page.content_type();
        if SKIPPED_CONTENT_PREFIXES
            .iter()
            .any(|prefix| content_type.starts_with(prefix))
        {
            debug!("Skipping overlays for {} document", content_type);
            return None;
        }

        let updates = store.watch();
        let settings = match store.load().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, overlays stay disabled: {}", e);
                None
            }
        };

        let enabled = {
            let mut state = self.state.lock();
            state.settings = settings;
            state.enabled = settings
                .map(|s| VisibilityPolicy::from_settings(&s).is_enabled())
                .unwrap_or(false);
            state.live = true;
            self.scan_locked(&mut state);
            state.enabled
        };

        self.page.observe_mutations(self.page.body());
        self.page.listen_viewport();

        info!(enabled, "Overlay registry initialized");
        Some(updates)
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// Elements currently annotated, in id order.
    pub fn tracked(&self) -> Vec<NodeId> {
        self.state.lock().overlays.keys().copied().collect()
    }

    pub fn container_of(&self, target: NodeId) -> Option<NodeId> {
        self.state.lock().overlays.get(&target).map(|o| o.container)
    }

    pub fn target_of(&self, container: NodeId) -> Option<NodeId> {
        self.state.lock().by_container.get(&container).copied()
    }

    pub fn hover_state(&self, target: NodeId) -> Option<HoverState> {
        self.state.lock().overlays.get(&target).map(|o| o.hover)
    }

    /// Track every media element that is not tracked yet.
    pub fn scan(&self) {
        let mut state = self.state.lock();
        self.scan_locked(&mut state);
    }

    /// Process one batch from the mutation feed.
    ///
    /// Overlays of removed elements are torn down before any rescan, so no
    /// overlay outlives its element even for one scan.
    pub fn handle_mutations(&self, records: &[MutationRecord]) {
        let mut state = self.state.lock();
        if !state.enabled {
            return;
        }

        let mut should_scan = false;
        for record in records {
            should_scan |= !record.added.is_empty();
            for &root in &record.removed {
                self.remove_locked(&mut state, root);
                for id in self.page.query_media_in(root) {
                    self.remove_locked(&mut state, id);
                }
            }
        }

        if should_scan {
            self.scan_locked(&mut state);
        }
    }

    /// Process one batch from the resize feed.
    ///
    /// The resize feed can report an element that has already left the
    /// document before its mutation batch arrives; its overlay is retired
    /// instead of repositioned.
    pub fn handle_resizes(&self, entries: &[ResizeEntry]) {
        let mut state = self.state.lock();
        for entry in entries {
            if !state.overlays.contains_key(&entry.target) {
                continue;
            }
            if !self.page.is_connected(entry.target) {
                self.remove_locked(&mut state, entry.target);
                continue;
            }
            if let Some(overlay) = state.overlays.get(&entry.target) {
                self.reposition(overlay);
            }
        }
    }

    /// Window scroll or resize.
    pub fn reposition_all(&self) {
        let state = self.state.lock();
        for overlay in state.overlays.values() {
            self.reposition(overlay);
        }
    }

    /// Drive the hover state of the overlay whose element or container was crossed.
    pub fn handle_pointer(&self, crossing: PointerCrossing) {
        let mut state = self.state.lock();

        let (target, partner) = if let Some(overlay) = state.overlays.get(&crossing.target) {
            (overlay.target, overlay.container)
        } else if let Some(&target) = state.by_container.get(&crossing.target) {
            (target, target)
        } else {
            return;
        };
        let into_partner = crossing
            .related
            .is_some_and(|related| self.is_within(related, partner));

        let Some(overlay) = state.overlays.get_mut(&target) else {
            return;
        };
        let next = overlay.hover.next(crossing.kind, into_partner);
        if next != overlay.hover {
            overlay.hover = next;
            self.page
                .set_class(overlay.container, ACTIVE_CLASS, next.is_active());
        }
    }

    /// The overlay's open-in-tab button was pressed.
    ///
    /// Returns whether a tab was opened.
    pub fn open_source(&self, container: NodeId) -> bool {
        let target = {
            let state = self.state.lock();
            let url_hidden = state
                .settings
                .map(|s| VisibilityPolicy::from_settings(&s).url.is_hidden())
                .unwrap_or(true);
            if url_hidden {
                return false;
            }
            match state.by_container.get(&container) {
                Some(&target) => target,
                None => return false,
            }
        };

        let Some(element) = self.page.element(target) else {
            return false;
        };
        let Some(src) = element.resolved_source() else {
            return false;
        };
        match self.tabs.open_tab(src) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to open {}: {}", src, e);
                false
            }
        }
    }

    /// React to a settings change: recompute the enabled state, then either
    /// tear everything down or rescan and re-render every overlay.
    pub fn apply_settings(&self, settings: Settings) {
        let mut state = self.state.lock();
        if !state.live {
            return;
        }
        state.settings = Some(settings);
        state.enabled = VisibilityPolicy::from_settings(&settings).is_enabled();
        debug!(enabled = state.enabled, "Applying settings to overlays");

        self.scan_locked(&mut state);
        if state.enabled {
            self.rerender_locked(&state, &settings);
        }
    }

    /// Remove every overlay and cancel all resize subscriptions.
    pub fn disable(&self) {
        let mut state = self.state.lock();
        state.enabled = false;
        self.cleanup_locked(&mut state);
    }

    /// Tear down and release the page-wide subscriptions.
    pub fn dispose(&self) {
        let mut state = self.state.lock();
        if !state.live {
            return;
        }
        state.live = false;
        state.enabled = false;
        self.cleanup_locked(&mut state);
        self.page.disconnect_mutations();
        self.page.unlisten_viewport();
        info!("Overlay registry disposed");
    }

    fn scan_locked(&self, state: &mut RegistryState) {
        if !state.enabled {
            self.cleanup_locked(state);
            return;
        }
        let Some(settings) = state.settings else {
            return;
        };

        for id in self.page.query_media() {
            if state.overlays.contains_key(&id) {
                continue;
            }
            // Media moved under one of our own containers is not page content.
            if self
                .page
                .ancestors(id)
                .iter()
                .any(|a| state.by_container.contains_key(a))
            {
                continue;
            }
            if let Err(e) = self.create_overlay(state, id, &settings) {
                debug!("Skipping overlay for {}: {}", id, e);
            }
        }
    }

    fn create_overlay(
        &self,
        state: &mut RegistryState,
        target: NodeId,
        settings: &Settings,
    ) -> Result<(), OverlayError> {
        let element = self
            .page
            .element(target)
            .ok_or(OverlayError::ElementGone(target))?;
        let content = render(target, &element, settings)?;

        let container = self.page.create_container(CONTAINER_CLASS, STYLESHEET);
        self.page.set_markup(container, &content.markup);
        self.page
            .set_class(container, VIDEO_MODE_CLASS, content.video_mode);
        self.page.attach_container(container);

        let overlay = TrackedOverlay::new(target, container);
        self.page.observe_resize(target);
        self.reposition(&overlay);
        state.overlays.insert(target, overlay);
        state.by_container.insert(container, target);

        debug!("Tracking {} with overlay {}", target, container);
        Ok(())
    }

    fn rerender_locked(&self, state: &RegistryState, settings: &Settings) {
        for overlay in state.overlays.values() {
            let result = self
                .page
                .element(overlay.target)
                .ok_or(OverlayError::ElementGone(overlay.target))
                .and_then(|element| render(overlay.target, &element, settings));
            match result {
                Ok(content) => {
                    self.page.set_markup(overlay.container, &content.markup);
                    self.page
                        .set_class(overlay.container, VIDEO_MODE_CLASS, content.video_mode);
                }
                Err(e) => debug!("Failed to re-render overlay for {}: {}", overlay.target, e),
            }
        }
    }

    /// Anchor the container over its element's current box. A zero-area box
    /// hides the container instead of removing it.
    fn reposition(&self, overlay: &TrackedOverlay) {
        let rect = self.page.bounding_client_rect(overlay.target);
        let placement = Placement::anchored(rect, &self.page.viewport());
        self.page.place(overlay.container, placement);
    }

    fn remove_locked(&self, state: &mut RegistryState, target: NodeId) {
        if let Some(overlay) = state.overlays.remove(&target) {
            state.by_container.remove(&overlay.container);
            self.page.detach_container(overlay.container);
            self.page.unobserve_resize(target);
            debug!("Retired overlay for {}", target);
        }
    }

    fn cleanup_locked(&self, state: &mut RegistryState) {
        if state.overlays.is_empty() {
            return;
        }
        for overlay in state.overlays.values() {
            self.page.detach_container(overlay.container);
        }
        let count = state.overlays.len();
        state.overlays.clear();
        state.by_container.clear();
        self.page.disconnect_resize();
        debug!("Removed {} overlays", count);
    }

    fn is_within(&self, node: NodeId, ancestor: NodeId) -> bool {
        node == ancestor || self.page.ancestors(node).contains(&ancestor)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
