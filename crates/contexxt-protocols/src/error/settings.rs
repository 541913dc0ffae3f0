use thiserror::Error;

/// Errors from a settings store.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings storage unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid settings record: {0}")]
    Invalid(String),

    #[error("Failed to persist settings: {0}")]
    Persist(String),
}
