//! Settings subcommand handlers.

use anyhow::{bail, Result};
use tracing::info;

use contexxt_config::{apply_patch, FileSettingsStore, SettingsLoader};
use contexxt_protocols::SettingsStore;

use crate::cli::SettingsAction;

pub(crate) async fn handle_settings_command(
    store: &FileSettingsStore,
    action: SettingsAction,
) -> Result<()> {
    match action {
        SettingsAction::Show => {
            let settings = store.load().await?.unwrap_or_default();
            println!("# {}", store.path().display());
            print!("{}", SettingsLoader::render(&settings)?);
        }
        SettingsAction::Set { .. } => {
            let patch = action.patch();
            if patch.is_empty() {
                bail!("Nothing to change: pass --show-alt, --show-url or --ctrl-click");
            }
            let settings = apply_patch(store, &patch).await?;
            info!("Saved settings to {}", store.path().display());
            print!("{}", SettingsLoader::render(&settings)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contexxt_protocols::{DisplaySetting, Settings};

    #[tokio::test]
    async fn test_set_merges_into_stored_settings() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.toml"));

        handle_settings_command(
            &store,
            SettingsAction::Set {
                show_alt: Some(DisplaySetting::Hover),
                show_url: None,
                ctrl_click: None,
            },
        )
        .await
        .unwrap();
        handle_settings_command(
            &store,
            SettingsAction::Set {
                show_alt: None,
                show_url: None,
                ctrl_click: Some(true),
            },
        )
        .await
        .unwrap();

        assert_eq!(
            store.load().await.unwrap(),
            Some(Settings {
                show_alt: DisplaySetting::Hover,
                show_url: DisplaySetting::Always,
                enable_ctrl_click: true,
            })
        );
    }

    #[tokio::test]
    async fn test_empty_set_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.toml"));
        let result = handle_settings_command(
            &store,
            SettingsAction::Set {
                show_alt: None,
                show_url: None,
                ctrl_click: None,
            },
        )
        .await;
        assert!(result.is_err());
        assert!(!store.path().exists());
        assert_eq!(store.load().await.unwrap(), Some(Settings::default()));
    }
}
