//! Common data types shared across Contexxt crates.

mod element;
mod geometry;
mod message;
mod settings;

pub use element::{ComputedStyle, ElementSnapshot, MediaKind, NodeId};
pub use geometry::{Placement, Point, Rect, Size, Viewport};
pub use message::RuntimeMessage;
pub use settings::{DisplayMode, DisplaySetting, Settings, SettingsPatch, VisibilityPolicy};
