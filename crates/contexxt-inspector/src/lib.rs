//! # Contexxt Inspector
//!
//! The on-demand inspection popover.
//!
//! - [`InspectionPopover`] - single floating panel with a
//!   `Unmounted -> Mounting -> Visible -> Dismissing` lifecycle
//! - [`SubjectDescriptor`] - metadata extracted from the inspected element
//! - [`markup`] - pure descriptor + settings to HTML rendering
//! - [`format`] - byte, duration and colour formatting

mod descriptor;
mod error;
pub mod format;
pub mod markup;
mod popover;

pub use descriptor::{ElementDetails, Enrichment, ImageDetails, SubjectDescriptor, VideoDetails};
pub use error::PopoverError;
pub use popover::{
    ActionHandler, ActionHandlers, BoundActions, InspectionPopover, PopoverPhase, PopoverTarget,
    SessionId,
};
