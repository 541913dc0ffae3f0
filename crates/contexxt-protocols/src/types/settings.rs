//! Persisted settings and the visibility policy derived from them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Persisted per-field display setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplaySetting {
    Always,
    Hover,
    NoHover,
    Never,
}

impl DisplaySetting {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hover => "hover",
            Self::NoHover => "no-hover",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for DisplaySetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplaySetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(Self::Always),
            "hover" => Ok(Self::Hover),
            "no-hover" => Ok(Self::NoHover),
            "never" => Ok(Self::Never),
            other => Err(format!(
                "unknown display setting '{}' (expected always, hover, no-hover or never)",
                other
            )),
        }
    }
}

/// The persisted settings record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    #[serde(alias = "show_alt")]
    pub show_alt: DisplaySetting,
    #[serde(alias = "show_url")]
    pub show_url: DisplaySetting,
    #[serde(alias = "enable_ctrl_click")]
    pub enable_ctrl_click: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_alt: DisplaySetting::Never,
            show_url: DisplaySetting::Always,
            enable_ctrl_click: false,
        }
    }
}

impl Settings {
    /// Return a copy with every field present in `patch` replaced.
    pub fn merged(mut self, patch: &SettingsPatch) -> Self {
        if let Some(show_alt) = patch.show_alt {
            self.show_alt = show_alt;
        }
        if let Some(show_url) = patch.show_url {
            self.show_url = show_url;
        }
        if let Some(enable_ctrl_click) = patch.enable_ctrl_click {
            self.enable_ctrl_click = enable_ctrl_click;
        }
        self
    }
}

/// A partial settings update, as produced by a single form control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub show_alt: Option<DisplaySetting>,
    pub show_url: Option<DisplaySetting>,
    pub enable_ctrl_click: Option<bool>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.show_alt.is_none() && self.show_url.is_none() && self.enable_ctrl_click.is_none()
    }
}

/// How a policy-gated field is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayMode {
    Always,
    HoverReveal,
    HoverHide,
    Hidden,
}

impl From<DisplaySetting> for DisplayMode {
    fn from(setting: DisplaySetting) -> Self {
        match setting {
            DisplaySetting::Always => Self::Always,
            DisplaySetting::Hover => Self::HoverReveal,
            DisplaySetting::NoHover => Self::HoverHide,
            DisplaySetting::Never => Self::Hidden,
        }
    }
}

impl DisplayMode {
    pub fn is_hidden(&self) -> bool {
        matches!(self, Self::Hidden)
    }
}

/// Per-field display modes derived from one settings snapshot. Never cached
/// beyond the snapshot it was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityPolicy {
    pub alt: DisplayMode,
    pub url: DisplayMode,
}

impl VisibilityPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            alt: settings.show_alt.into(),
            url: settings.show_url.into(),
        }
    }

    /// Overlays exist only while at least one governed field can be shown.
    pub fn is_enabled(&self) -> bool {
        !self.alt.is_hidden() || !self.url.is_hidden()
    }
}
