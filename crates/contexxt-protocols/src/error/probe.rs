use thiserror::Error;

/// Errors from the best-effort asset metadata probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Unexpected status {0}")]
    Status(u16),
}
