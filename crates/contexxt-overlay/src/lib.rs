//! # Contexxt Overlay
//!
//! Keeps one floating badge overlay per media element on the page.
//!
//! The [`OverlayRegistry`] discovers `img`/`video` elements, anchors an
//! isolated container over each one, follows the page as it mutates, scrolls
//! and resizes, and retires overlays as soon as their element leaves the
//! document. What each overlay shows is decided by the current
//! [`VisibilityPolicy`](contexxt_protocols::VisibilityPolicy).

mod content;
mod error;
mod registry;
mod tracked;

pub use content::{file_name, render, visibility_class, OverlayContent, CONTAINER_CLASS, STYLESHEET};
pub use error::OverlayError;
pub use registry::OverlayRegistry;
pub use tracked::HoverState;
