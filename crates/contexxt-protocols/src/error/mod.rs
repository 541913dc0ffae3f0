//! Error types for the Contexxt protocol layer.

mod bridge;
mod host;
mod probe;
mod settings;

pub use bridge::*;
pub use host::*;
pub use probe::*;
pub use settings::*;
