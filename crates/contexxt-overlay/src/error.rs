use thiserror::Error;

use contexxt_protocols::NodeId;

/// Errors raised while building a single overlay.
///
/// These never escape the registry: the affected element is skipped and the
/// rest of the page keeps its overlays.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("Element is gone: {0}")]
    ElementGone(NodeId),

    #[error("Not a media element: {id} <{tag}>")]
    NotMedia { id: NodeId, tag: String },
}
