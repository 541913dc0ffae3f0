//! # Contexxt Host
//!
//! Concrete implementations of the host capabilities declared in
//! `contexxt-protocols`:
//!
//! - [`MemoryPage`] - an in-memory document with containers and observation feeds
//! - [`ManualScheduler`] / [`TokioScheduler`] - virtual-time and runtime timers
//! - [`HttpProbe`] - HEAD-based asset metadata lookup
//! - [`ChannelBridge`] - in-process runtime messaging
//! - Recording clipboard, tab, download and context-menu services

mod bridge;
mod memory_page;
mod probe;
mod scheduler;
mod services;
mod snapshot;

pub use bridge::ChannelBridge;
pub use memory_page::{MemoryPage, DEFAULT_CONTAINER_SIZE};
pub use probe::HttpProbe;
pub use scheduler::{ManualScheduler, TokioScheduler};
pub use services::{MemoryContextMenus, RecordingClipboard, RecordingDownloader, RecordingTabs};
pub use snapshot::{ElementSpec, PageSnapshot};
