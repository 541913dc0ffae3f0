use thiserror::Error;

/// Errors from the remaining host capabilities.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Clipboard write failed: {0}")]
    Clipboard(String),

    #[error("Failed to open tab: {0}")]
    OpenTab(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Context menu error: {0}")]
    ContextMenu(String),
}
