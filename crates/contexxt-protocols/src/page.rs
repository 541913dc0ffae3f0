//! Page-facing host capabilities.
//!
//! These traits describe what the page script needs from the environment it
//! runs in: read access to the document, an isolated scope to render floating
//! containers into, and disposable observation feeds. Implementations live
//! outside this crate.

use serde::{Deserialize, Serialize};

use crate::types::{ElementSnapshot, NodeId, Placement, Rect, Viewport};

/// One batch entry from the structural mutation feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    /// Roots of subtrees inserted into the document.
    #[serde(default)]
    pub added: Vec<NodeId>,
    /// Roots of subtrees removed from the document.
    #[serde(default)]
    pub removed: Vec<NodeId>,
}

/// One entry from the element size-change feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResizeEntry {
    pub target: NodeId,
    pub rect: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    Enter,
    Leave,
}

/// A pointer crossing a node boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerCrossing {
    pub kind: PointerKind,
    /// The node whose boundary was crossed.
    pub target: NodeId,
    /// The node on the other side of the boundary, if any.
    pub related: Option<NodeId>,
}

/// Read access to the host document.
pub trait Document: Send + Sync {
    /// MIME type of the loaded document (e.g. `text/html`, `image/png`).
    fn content_type(&self) -> String;

    /// The document body; root of mutation observation.
    fn body(&self) -> NodeId;

    /// All attached `img` and `video` elements in document order.
    fn query_media(&self) -> Vec<NodeId>;

    /// Media elements in the subtree rooted at `root`, including `root` itself.
    /// Must also work for subtrees that were just detached.
    fn query_media_in(&self, root: NodeId) -> Vec<NodeId>;

    /// Snapshot of an element's properties, or `None` for unknown nodes.
    fn element(&self, id: NodeId) -> Option<ElementSnapshot>;

    /// Viewport-relative border box.
    fn bounding_client_rect(&self, id: NodeId) -> Rect;

    fn viewport(&self) -> Viewport;

    /// Whether the node is currently attached to the document.
    fn is_connected(&self, id: NodeId) -> bool;

    /// Ancestors from the parent up to the root.
    fn ancestors(&self, id: NodeId) -> Vec<NodeId>;
}

/// Isolated rendering scope for floating containers.
///
/// Each container owns a subtree whose styles neither leak out nor get
/// affected by page styles. Containers are appended to the document body
/// when attached.
pub trait RenderScope: Send + Sync {
    /// Create a detached container carrying `stylesheet` in its isolated subtree.
    fn create_container(&self, class_name: &str, stylesheet: &str) -> NodeId;

    fn attach_container(&self, container: NodeId);

    fn detach_container(&self, container: NodeId);

    fn is_container_attached(&self, container: NodeId) -> bool;

    /// Replace the container's rendered content.
    fn set_markup(&self, container: NodeId, markup: &str);

    fn place(&self, container: NodeId, placement: Placement);

    /// Toggle a state class on the container's content root.
    fn set_class(&self, container: NodeId, class_name: &str, on: bool);
}

/// Disposable subscriptions to host event sources.
///
/// The host delivers the resulting events to the page script; these calls
/// only control which sources are live.
pub trait ObservationFeeds: Send + Sync {
    /// Start delivering structural mutations for the subtree under `root`.
    fn observe_mutations(&self, root: NodeId);

    fn disconnect_mutations(&self);

    /// Start delivering size changes for `target`.
    fn observe_resize(&self, target: NodeId);

    fn unobserve_resize(&self, target: NodeId);

    fn disconnect_resize(&self);

    /// Window scroll (passive, capturing) and window resize listeners.
    fn listen_viewport(&self);

    fn unlisten_viewport(&self);

    /// Global capture-phase pointer-down listener.
    fn listen_pointer_down(&self);

    fn unlisten_pointer_down(&self);
}

/// Everything the page script needs from the page.
pub trait PageHost: Document + RenderScope + ObservationFeeds {}

impl<T: Document + RenderScope + ObservationFeeds + ?Sized> PageHost for T {}
