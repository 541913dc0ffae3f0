//! # Contexxt Content
//!
//! The page script. One [`ContentScript`] runs per page activation and owns
//! the page's [`OverlayRegistry`](contexxt_overlay::OverlayRegistry) and
//! [`InspectionPopover`](contexxt_inspector::InspectionPopover).
//!
//! Hosts either call the handlers directly or push [`PageEvent`]s into
//! [`ContentScript::run`].

mod event;
mod script;

pub use event::{ClickOutcome, PageEvent};
pub use script::{ContentScript, PageServices};
