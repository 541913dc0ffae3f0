//! Configuration errors.

use thiserror::Error;

use contexxt_protocols::SettingsError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid config format: {0}")]
    InvalidFormat(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl From<ConfigError> for SettingsError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Io(err) => SettingsError::Unavailable(err.to_string()),
            ConfigError::TomlSerialize(err) => SettingsError::Persist(err.to_string()),
            other => SettingsError::Invalid(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = ConfigError::NotFound("contexxt.toml".to_string());
        assert!(err.to_string().contains("contexxt.toml"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_invalid_value_error() {
        let err = ConfigError::InvalidValue {
            field: "popover.padding".to_string(),
            message: "must not be negative".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("popover.padding"));
        assert!(display.contains("must not be negative"));
    }

    #[test]
    fn test_io_error_maps_to_unavailable() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: SettingsError = ConfigError::from(io_err).into();
        assert!(matches!(err, SettingsError::Unavailable(_)));
    }

    #[test]
    fn test_format_error_maps_to_invalid() {
        let err: SettingsError = ConfigError::InvalidFormat("bad".to_string()).into();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }
}
