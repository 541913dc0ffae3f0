//! Events a host page delivers to the page script.

use contexxt_inspector::PopoverTarget;
use contexxt_protocols::{
    MutationRecord, NodeId, Point, PointerCrossing, ResizeEntry, RuntimeMessage,
};

/// Everything the page script reacts to, in delivery order.
#[derive(Debug, Clone)]
pub enum PageEvent {
    /// Capture-phase `contextmenu`: remembers the target and client coordinates.
    ContextMenu { target: NodeId, point: Point },
    /// Primary click. `modifier` is Ctrl on most platforms, Cmd on macOS.
    Click { target: NodeId, modifier: bool },
    /// Capture-phase pointer-down with the event's composed path.
    PointerDown { path: Vec<NodeId> },
    PopoverClick(PopoverTarget),
    /// The action button of the overlay in `container` was pressed.
    OverlayAction { container: NodeId },
    Pointer(PointerCrossing),
    Mutations(Vec<MutationRecord>),
    Resizes(Vec<ResizeEntry>),
    /// Window scroll or resize.
    Viewport,
    Message(RuntimeMessage),
}

/// Result of a click, so the host knows whether to suppress the default action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Intercepted,
    PassThrough,
}

impl ClickOutcome {
    pub fn is_intercepted(&self) -> bool {
        matches!(self, Self::Intercepted)
    }
}
