//! Application configuration schema.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub popover: PopoverConfig,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub settings: SettingsConfig,
}

/// Inspection popover layout and timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopoverConfig {
    /// Distance from the anchor point and minimum distance from screen edges.
    #[serde(default = "default_padding")]
    pub padding: f64,

    /// Delay between starting the exit transition and detaching the container.
    #[serde(default = "default_exit_transition_ms")]
    pub exit_transition_ms: u64,

    /// How long a copy confirmation stays visible.
    #[serde(default = "default_copy_feedback_ms")]
    pub copy_feedback_ms: u64,

    /// Image file names longer than this are truncated in the source row.
    #[serde(default = "default_source_label_chars")]
    pub source_label_chars: usize,

    /// Number of trailing URL characters shown for video sources.
    #[serde(default = "default_video_source_tail_chars")]
    pub video_source_tail_chars: usize,
}

impl Default for PopoverConfig {
    fn default() -> Self {
        Self {
            padding: default_padding(),
            exit_transition_ms: default_exit_transition_ms(),
            copy_feedback_ms: default_copy_feedback_ms(),
            source_label_chars: default_source_label_chars(),
            video_source_tail_chars: default_video_source_tail_chars(),
        }
    }
}

impl PopoverConfig {
    pub fn exit_transition(&self) -> Duration {
        Duration::from_millis(self.exit_transition_ms)
    }

    pub fn copy_feedback(&self) -> Duration {
        Duration::from_millis(self.copy_feedback_ms)
    }
}

fn default_padding() -> f64 {
    12.0
}

fn default_exit_transition_ms() -> u64 {
    200
}

fn default_copy_feedback_ms() -> u64 {
    1000
}

fn default_source_label_chars() -> usize {
    25
}

fn default_video_source_tail_chars() -> usize {
    30
}

/// Asset metadata probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_probe_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Contexxt/0.1".to_string()
}

/// Where the persisted settings record lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Override for the settings file. `~` is expanded.
    #[serde(default)]
    pub path: Option<String>,
}

impl SettingsConfig {
    /// Resolve the settings file path, defaulting to `~/.contexxt/settings.toml`.
    pub fn resolve_path(&self) -> PathBuf {
        match &self.path {
            Some(path) => PathBuf::from(shellexpand::tilde(path).to_string()),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".contexxt")
                .join("settings.toml"),
        }
    }
}
