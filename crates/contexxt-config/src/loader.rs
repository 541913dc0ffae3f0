//! Configuration and settings file loaders.

use std::fs;
use std::path::Path;

use regex::Regex;

use contexxt_protocols::Settings;

use crate::error::ConfigError;
use crate::schema::AppConfig;

/// Application configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a file if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<AppConfig, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(AppConfig::default()),
            other => other,
        }
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<AppConfig, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: AppConfig = toml::from_str(&expanded)?;
        Self::validate(&config)?;
        Ok(config)
    }

    fn validate(config: &AppConfig) -> Result<(), ConfigError> {
        if config.popover.padding < 0.0 || !config.popover.padding.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "popover.padding".to_string(),
                message: "must be a non-negative number".to_string(),
            });
        }
        if config.probe.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "probe.timeout_secs".to_string(),
                message: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        let mut result = content.to_string();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }
}

/// Reads and writes the persisted settings record as TOML.
pub struct SettingsLoader;

impl SettingsLoader {
    pub fn parse(content: &str) -> Result<Settings, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn render(settings: &Settings) -> Result<String, ConfigError> {
        Ok(toml::to_string(settings)?)
    }
}
