//! # Contexxt Protocols
//!
//! Shared data types and host-capability traits for the Contexxt visual
//! inspector. Contains only interface definitions - no implementations.
//!
//! ## Core Traits
//!
//! - [`Document`] - Read access to the page's element tree and geometry
//! - [`RenderScope`] - Isolated floating containers for overlay UI
//! - [`ObservationFeeds`] - Disposable mutation/resize/viewport subscriptions
//! - [`SettingsStore`] - Persisted settings with change broadcast
//! - [`RuntimeBridge`] - Fire-and-forget messaging between page and background
//! - [`Scheduler`] - Cancellable fixed-delay timers

pub mod error;
pub mod host;
pub mod markup;
pub mod page;
pub mod types;

pub use error::{BridgeError, HostError, ProbeError, SettingsError};
pub use host::{
    AssetMetadata, Clipboard, ContextMenus, DownloadId, Downloader, MenuContext, MenuItem,
    MetadataProbe, RuntimeBridge, Scheduler, SettingsStore, TabId, TabOpener, TimerHandle,
};
pub use markup::escape_html;
pub use page::{
    Document, MutationRecord, ObservationFeeds, PageHost, PointerCrossing, PointerKind,
    RenderScope, ResizeEntry,
};
pub use types::*;
