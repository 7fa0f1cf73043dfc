//! Config command implementation.

use super::doctor::mask_key;
use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::Path;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", render_masked(settings)?);
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }

        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                Output::warning(&format!(
                    "Config already exists at {}. Use --force to overwrite.",
                    config_path.display()
                ));
                return Ok(());
            }
            Settings::default().save_to(&config_path.to_path_buf())?;
            Output::success(&format!("Wrote default config to {}", config_path.display()));
        }
    }

    Ok(())
}

/// TOML for `settings` with every API key masked.
fn render_masked(mut settings: Settings) -> Result<String> {
    let credentials = &mut settings.credentials;
    for key in [
        &mut credentials.understanding_api_key,
        &mut credentials.script_api_key,
        &mut credentials.speech_api_key,
    ] {
        if let Some(value) = key.as_mut() {
            *value = mask_key(value);
        }
    }

    toml::to_string_pretty(&settings)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_masks_keys() {
        let mut settings = Settings::default();
        settings.credentials.speech_api_key = Some("el-abcdefghijklmnop9876".to_string());
        let rendered = render_masked(settings).unwrap();

        assert!(rendered.contains("el-a...9876"));
        assert!(!rendered.contains("abcdefghijklmnop"));
    }

    #[test]
    fn test_init_respects_force() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        run_config(&ConfigAction::Init { force: false }, Settings::default(), &path).unwrap();
        let written = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(written.script.turn_count, Settings::default().script.turn_count);

        std::fs::write(&path, "# mine\n").unwrap();
        run_config(&ConfigAction::Init { force: false }, Settings::default(), &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine\n");

        run_config(&ConfigAction::Init { force: true }, Settings::default(), &path).unwrap();
        assert_ne!(std::fs::read_to_string(&path).unwrap(), "# mine\n");
    }
}
