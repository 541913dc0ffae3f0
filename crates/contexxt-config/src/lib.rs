//! # Contexxt Config
//!
//! Settings persistence and application configuration for Contexxt.

mod error;
mod loader;
mod schema;
mod store;

pub use error::ConfigError;
pub use loader::{ConfigLoader, SettingsLoader};
pub use schema::*;
pub use store::{apply_patch, FileSettingsStore, MemorySettingsStore};
