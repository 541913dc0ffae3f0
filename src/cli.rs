//! CLI definitions for Contexxt.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use contexxt_protocols::{DisplaySetting, SettingsPatch};

/// Contexxt CLI.
#[derive(Parser)]
#[command(name = "contexxt")]
#[command(about = "Visual inspector for page media and elements")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    /// Also write logs to daily rolling files in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Print the overlay each media element of a page snapshot gets
    Overlays {
        /// Page snapshot (JSON)
        page: PathBuf,
    },

    /// Right-click an element of a page snapshot and print the popover
    Inspect {
        /// Page snapshot (JSON)
        page: PathBuf,

        /// Element index in document order, starting at 0
        #[arg(long)]
        node: usize,

        /// Client X of the right-click
        #[arg(long, default_value_t = 0.0)]
        x: f64,

        /// Client Y of the right-click
        #[arg(long, default_value_t = 0.0)]
        y: f64,

        /// Skip the network metadata probe
        #[arg(long)]
        offline: bool,
    },

    /// Show or change the persisted settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum SettingsAction {
    /// Print the current settings
    Show,

    /// Change one or more settings
    Set {
        /// always, hover, no-hover or never
        #[arg(long)]
        show_alt: Option<DisplaySetting>,

        /// always, hover, no-hover or never
        #[arg(long)]
        show_url: Option<DisplaySetting>,

        /// Open media sources on Ctrl/Cmd+Click
        #[arg(long)]
        ctrl_click: Option<bool>,
    },
}

impl SettingsAction {
    /// The partial update a `set` invocation describes.
    pub fn patch(&self) -> SettingsPatch {
        match self {
            Self::Show => SettingsPatch::default(),
            Self::Set {
                show_alt,
                show_url,
                ctrl_click,
            } => SettingsPatch {
                show_alt: *show_alt,
                show_url: *show_url,
                enable_ctrl_click: *ctrl_click,
            },
        }
    }
}
