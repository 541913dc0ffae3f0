use thiserror::Error;

/// Errors from the runtime messaging bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No script is listening on the receiving side.
    #[error("No receiver for {0}")]
    NoReceiver(String),

    #[error("Messaging channel closed")]
    Closed,
}
