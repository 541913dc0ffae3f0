//! # Contexxt Background
//!
//! The long-lived background side of the extension. It registers the
//! context-menu entry, forwards menu clicks to the clicked tab's page script
//! as `INSPECT_ELEMENT`, and turns `DOWNLOAD_ASSET` requests into downloads.

mod service;

pub use service::{BackgroundService, MenuClick, MENU_ID, MENU_TITLE};
