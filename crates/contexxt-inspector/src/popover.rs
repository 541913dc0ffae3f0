//! The inspection popover.
//!
//! One popover exists per page script. Each `mount` starts a new session with
//! a fresh [`SessionId`]; anything asynchronous that was started for an older
//! session (a metadata probe, a copy confirmation, a pending detach) checks
//! the id before touching the popover and drops its result on mismatch.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, warn};

use contexxt_config::PopoverConfig;
use contexxt_protocols::{
    Clipboard, Document, NodeId, ObservationFeeds, PageHost, Placement, Point, RenderScope,
    Scheduler, Settings, SettingsStore, TimerHandle,
};

use crate::descriptor::SubjectDescriptor;
use crate::error::PopoverError;
use crate::markup::{self, CONTAINER_CLASS, DOWNLOAD_BUTTON_ID, OPEN_TAB_BUTTON_ID, STYLESHEET};

const VISIBLE_CLASS: &str = "visible";

/// Callback run when one of the popover's action buttons is pressed.
pub type ActionHandler = Arc<dyn Fn() + Send + Sync>;

/// The two optional action callbacks. Kept across content replacements.
#[derive(Clone, Default)]
pub struct ActionHandlers {
    pub on_download: Option<ActionHandler>,
    pub on_open_tab: Option<ActionHandler>,
}

/// Which action buttons in the current content have a handler attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundActions {
    pub download: bool,
    pub open_tab: bool,
}

/// Identifies one inspection session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session {}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopoverPhase {
    Unmounted,
    Mounting,
    Visible,
    Dismissing,
}

impl fmt::Display for PopoverPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unmounted => "unmounted",
            Self::Mounting => "mounting",
            Self::Visible => "visible",
            Self::Dismissing => "dismissing",
        };
        f.write_str(name)
    }
}

/// What a click inside the popover landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopoverTarget {
    /// A row's copy button, by row key.
    Copy(String),
    OpenTab,
    Download,
    Other,
}

struct CopyFeedback {
    row: String,
    seq: u64,
}

struct PopoverState {
    /// Created on first mount and reused afterwards.
    container: Option<NodeId>,
    phase: PopoverPhase,
    generation: u64,
    descriptor: Option<SubjectDescriptor>,
    settings: Settings,
    handlers: ActionHandlers,
    /// Action buttons present in the current content.
    buttons: BoundActions,
    bound: BoundActions,
    copied: Option<CopyFeedback>,
    copy_seq: u64,
    copy_timer: Option<TimerHandle>,
    detach_timer: Option<TimerHandle>,
    listening: bool,
}

impl Default for PopoverState {
    fn default() -> Self {
        Self {
            container: None,
            phase: PopoverPhase::Unmounted,
            generation: 0,
            descriptor: None,
            settings: Settings::default(),
            handlers: ActionHandlers::default(),
            buttons: BoundActions::default(),
            bound: BoundActions::default(),
            copied: None,
            copy_seq: 0,
            copy_timer: None,
            detach_timer: None,
            listening: false,
        }
    }
}

/// State reachable from timer callbacks.
struct Shared {
    page: Arc<dyn PageHost>,
    config: PopoverConfig,
    state: Mutex<PopoverState>,
}

impl Shared {
    /// Replace the container content and re-bind action handlers to it.
    fn render(&self, state: &mut PopoverState) {
        let (Some(container), Some(descriptor)) = (state.container, state.descriptor.as_ref())
        else {
            return;
        };
        let copied = state.copied.as_ref().map(|c| c.row.as_str());
        let html = markup::render(descriptor, &state.settings, &self.config, copied);
        self.page.set_markup(container, &html);

        state.buttons = BoundActions {
            download: html.contains(&format!(r#"id="{}""#, DOWNLOAD_BUTTON_ID)),
            open_tab: html.contains(&format!(r#"id="{}""#, OPEN_TAB_BUTTON_ID)),
        };
        Self::bind(state);
    }

    fn bind(state: &mut PopoverState) {
        state.bound = BoundActions {
            download: state.buttons.download && state.handlers.on_download.is_some(),
            open_tab: state.buttons.open_tab && state.handlers.on_open_tab.is_some(),
        };
    }

    fn clear_copied(state: &mut PopoverState) {
        if let Some(timer) = state.copy_timer.take() {
            timer.cancel();
        }
        state.copied = None;
    }

    fn revert_copied(&self, seq: u64) {
        let mut state = self.state.lock();
        if state.copied.as_ref().is_some_and(|c| c.seq == seq) {
            state.copied = None;
            state.copy_timer = None;
            self.render(&mut state);
        }
    }

    fn finish_unmount(&self, generation: u64) {
        let mut state = self.state.lock();
        if state.generation != generation || state.phase != PopoverPhase::Dismissing {
            return;
        }
        if let Some(container) = state.container {
            self.page.detach_container(container);
        }
        state.phase = PopoverPhase::Unmounted;
        state.descriptor = None;
        state.detach_timer = None;
        state.buttons = BoundActions::default();
        state.bound = BoundActions::default();
        debug!("Popover detached after session {}", generation);
    }
}

/// Floating detail panel for one explicitly inspected element.
pub struct InspectionPopover {
    shared: Arc<Shared>,
    settings: Arc<dyn SettingsStore>,
    clipboard: Arc<dyn Clipboard>,
    scheduler: Arc<dyn Scheduler>,
}

impl InspectionPopover {
    pub fn new(
        page: Arc<dyn PageHost>,
        settings: Arc<dyn SettingsStore>,
        clipboard: Arc<dyn Clipboard>,
        scheduler: Arc<dyn Scheduler>,
        config: PopoverConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                page,
                config,
                state: Mutex::new(PopoverState::default()),
            }),
            settings,
            clipboard,
            scheduler,
        }
    }

    pub fn phase(&self) -> PopoverPhase {
        self.shared.state.lock().phase
    }

    /// The live session, if the popover is mounting or visible.
    pub fn session(&self) -> Option<SessionId> {
        let state = self.shared.state.lock();
        match state.phase {
            PopoverPhase::Mounting | PopoverPhase::Visible => Some(SessionId(state.generation)),
            _ => None,
        }
    }

    pub fn container(&self) -> Option<NodeId> {
        self.shared.state.lock().container
    }

    /// Whether `node` is the popover container or inside it.
    pub fn contains(&self, node: NodeId) -> bool {
        let Some(container) = self.container() else {
            return false;
        };
        node == container || self.shared.page.ancestors(node).contains(&container)
    }

    pub fn descriptor(&self) -> Option<SubjectDescriptor> {
        self.shared.state.lock().descriptor.clone()
    }

    pub fn bound_actions(&self) -> BoundActions {
        self.shared.state.lock().bound
    }

    /// Row whose copy button is showing its confirmation.
    pub fn copied_row(&self) -> Option<String> {
        self.shared
            .state
            .lock()
            .copied
            .as_ref()
            .map(|c| c.row.clone())
    }

    /// Start a new session showing `descriptor` next to `anchor`.
    ///
    /// A pending detach from an earlier dismissal is cancelled, so the
    /// container is attached exactly once however quickly sessions follow
    /// each other.
    pub async fn mount(
        &self,
        anchor: Point,
        descriptor: SubjectDescriptor,
    ) -> Result<SessionId, PopoverError> {
        let session = {
            let mut state = self.shared.state.lock();
            if let Some(timer) = state.detach_timer.take() {
                timer.cancel();
            }
            Shared::clear_copied(&mut state);
            state.generation += 1;
            state.phase = PopoverPhase::Mounting;
            SessionId(state.generation)
        };

        let settings = match self.settings.load().await {
            Ok(settings) => settings.unwrap_or_default(),
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                Settings::default()
            }
        };

        let page = &self.shared.page;
        let mut state = self.shared.state.lock();
        if state.generation != session.0 {
            return Err(PopoverError::Superseded(session));
        }

        let container = match state.container {
            Some(container) => container,
            None => {
                let container = page.create_container(CONTAINER_CLASS, STYLESHEET);
                state.container = Some(container);
                container
            }
        };
        if !page.is_container_attached(container) {
            page.attach_container(container);
        }

        state.settings = settings;
        state.descriptor = Some(descriptor);
        self.shared.render(&mut state);

        let size = page.bounding_client_rect(container).size();
        let placement =
            Placement::beside_point(anchor, size, &page.viewport(), self.shared.config.padding);
        page.place(container, placement);
        page.set_class(container, VISIBLE_CLASS, true);

        // One outside-press listener per session.
        if state.listening {
            page.unlisten_pointer_down();
        }
        page.listen_pointer_down();
        state.listening = true;

        state.phase = PopoverPhase::Visible;
        debug!("Mounted {} at ({}, {})", session, placement.left, placement.top);
        Ok(session)
    }

    /// Replace the displayed content in place. Only valid while visible.
    pub fn update(&self, descriptor: SubjectDescriptor) -> Result<(), PopoverError> {
        let mut state = self.shared.state.lock();
        self.update_locked(&mut state, descriptor)
    }

    /// Like [`update`](Self::update), but only if `session` is still the live one.
    pub fn update_session(
        &self,
        session: SessionId,
        descriptor: SubjectDescriptor,
    ) -> Result<(), PopoverError> {
        let mut state = self.shared.state.lock();
        if state.generation != session.0 {
            return Err(PopoverError::StaleSession { session });
        }
        self.update_locked(&mut state, descriptor)
    }

    fn update_locked(
        &self,
        state: &mut PopoverState,
        descriptor: SubjectDescriptor,
    ) -> Result<(), PopoverError> {
        if state.phase != PopoverPhase::Visible {
            return Err(PopoverError::NotVisible { phase: state.phase });
        }
        Shared::clear_copied(state);
        state.descriptor = Some(descriptor);
        self.shared.render(state);
        Ok(())
    }

    /// Register the action callbacks. They stay bound across later updates.
    pub fn set_handlers(&self, handlers: ActionHandlers) {
        let mut state = self.shared.state.lock();
        state.handlers = handlers;
        Shared::bind(&mut state);
    }

    /// Handle a click inside the popover. Returns whether it was acted on.
    pub async fn handle_click(&self, target: PopoverTarget) -> bool {
        let handler = {
            let state = self.shared.state.lock();
            if state.phase != PopoverPhase::Visible {
                return false;
            }
            match &target {
                PopoverTarget::Copy(_) | PopoverTarget::Other => None,
                PopoverTarget::Download if state.bound.download => {
                    state.handlers.on_download.clone()
                }
                PopoverTarget::OpenTab if state.bound.open_tab => {
                    state.handlers.on_open_tab.clone()
                }
                _ => {
                    debug!("No handler bound for {:?}", target);
                    return false;
                }
            }
        };

        if let Some(handler) = handler {
            handler();
            return true;
        }
        match target {
            PopoverTarget::Copy(row) => self.copy(&row).await,
            _ => false,
        }
    }

    async fn copy(&self, row: &str) -> bool {
        let (value, generation) = {
            let state = self.shared.state.lock();
            let Some(descriptor) = state.descriptor.as_ref() else {
                return false;
            };
            let value = markup::detail_rows(descriptor, &state.settings, &self.shared.config)
                .into_iter()
                .find(|r| r.key == row)
                .and_then(|r| r.copy);
            match value {
                Some(value) => (value, state.generation),
                None => return false,
            }
        };

        if let Err(e) = self.clipboard.write_text(&value).await {
            debug!("Clipboard write failed: {}", e);
            return false;
        }

        let mut state = self.shared.state.lock();
        if state.generation != generation || state.phase != PopoverPhase::Visible {
            return true;
        }
        Shared::clear_copied(&mut state);
        state.copy_seq += 1;
        let seq = state.copy_seq;
        state.copied = Some(CopyFeedback {
            row: row.to_string(),
            seq,
        });
        self.shared.render(&mut state);

        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        state.copy_timer = Some(self.scheduler.schedule(
            self.shared.config.copy_feedback(),
            Box::new(move || {
                if let Some(shared) = shared.upgrade() {
                    shared.revert_copied(seq);
                }
            }),
        ));
        true
    }

    /// Global capture-phase pointer-down. `path` is the full composed path of
    /// the event; a press anywhere outside the popover dismisses it.
    pub fn handle_pointer_down(&self, path: &[NodeId]) -> bool {
        {
            let state = self.shared.state.lock();
            if state.phase != PopoverPhase::Visible {
                return false;
            }
            match state.container {
                Some(container) if !path.contains(&container) => {}
                _ => return false,
            }
        }
        self.unmount();
        true
    }

    /// Start the exit transition; the container is detached once it ends.
    /// Calling this while already dismissing or unmounted does nothing.
    pub fn unmount(&self) {
        let mut state = self.shared.state.lock();
        match state.phase {
            PopoverPhase::Unmounted | PopoverPhase::Dismissing => return,
            // Abandon the in-flight mount.
            PopoverPhase::Mounting => state.generation += 1,
            PopoverPhase::Visible => {}
        }
        state.phase = PopoverPhase::Dismissing;
        Shared::clear_copied(&mut state);

        let page = &self.shared.page;
        if let Some(container) = state.container {
            page.set_class(container, VISIBLE_CLASS, false);
        }
        if state.listening {
            page.unlisten_pointer_down();
            state.listening = false;
        }

        let generation = state.generation;
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        state.detach_timer = Some(self.scheduler.schedule(
            self.shared.config.exit_transition(),
            Box::new(move || {
                if let Some(shared) = shared.upgrade() {
                    shared.finish_unmount(generation);
                }
            }),
        ));
        debug!("Dismissing session {}", generation);
    }
}

#[cfg(test)]
#[path = "popover_tests.rs"]
mod tests;
