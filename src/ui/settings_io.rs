use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::ui::settings::AppSettings;

pub fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("story_lab");
    path.push("settings.json");
    path
}

/// Missing or unreadable settings fall back to defaults.
pub fn load_settings_from(path: &Path) -> AppSettings {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| match serde_json::from_str(&s) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "ignoring malformed settings file"
                );
                None
            }
        })
        .unwrap_or_default()
}

pub fn save_settings_to(path: &Path, settings: &AppSettings) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("could not create {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json).with_context(|| format!("could not write {}", path.display()))
}

pub fn load_settings() -> AppSettings {
    let path = settings_path();
    let mut settings = load_settings_from(&path);
    if !path.exists() {
        if let Err(e) = save_settings_to(&path, &settings) {
            tracing::warn!(error = %e, "could not write default settings");
        }
    }
    settings.apply_overrides(|key| std::env::var(key).ok());
    settings
}
