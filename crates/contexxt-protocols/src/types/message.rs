//! Runtime messages exchanged between the page script and the background process.

use serde::{Deserialize, Serialize};

/// A fire-and-forget runtime message. Serialized as `{"type": "...", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuntimeMessage {
    /// Background -> page: inspect the last right-clicked element.
    InspectElement,
    /// Page -> background: download the given asset.
    DownloadAsset { url: String },
}

impl RuntimeMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InspectElement => "INSPECT_ELEMENT",
            Self::DownloadAsset { .. } => "DOWNLOAD_ASSET",
        }
    }
}
