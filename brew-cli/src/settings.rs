//! Application settings

use std::path::{Path, PathBuf};

use anyhow::Context;
use brew_plan::FlasherConfig;
use tracing::{debug, warn};

/// Get the config directory for brewflash
/// Uses $XDG_CONFIG_HOME/brewflash when set, otherwise the platform default
fn config_dir() -> Option<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config);
        if path.is_absolute() {
            return Some(path.join("brewflash"));
        }
    }

    dirs::config_dir().map(|p| p.join("brewflash"))
}

/// Get the settings file path
pub fn settings_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("settings.json"))
}

/// Load settings from disk, falling back to defaults when absent
pub fn load() -> FlasherConfig {
    let mut config = settings_path()
        .and_then(|path| match load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring {}: {:#}", path.display(), e);
                None
            }
        })
        .unwrap_or_default();

    config.version = env!("CARGO_PKG_VERSION").to_string();
    config
}

/// Read a settings file; `Ok(None)` if it does not exist
pub fn load_from(path: &Path) -> anyhow::Result<Option<FlasherConfig>> {
    if !path.exists() {
        debug!("No settings at {}", path.display());
        return Ok(None);
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;
    let config = serde_json::from_str(&json).context("Failed to parse settings")?;
    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from(&dir.path().join("settings.json")).unwrap().is_none());
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"recommended_baud": 115200}"#).unwrap();

        let config = load_from(&path).unwrap().unwrap();
        assert_eq!(config.recommended_baud, 115200);
        assert_eq!(config.handshake.baud_rate, 1200);
        assert!(config.is_supported_baud(921600));
    }

    #[test]
    fn test_partial_settings_keep_default_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let settings_dir = dir.path().join("brewflash");
        std::fs::create_dir_all(&settings_dir).unwrap();
        std::fs::write(
            settings_dir.join("settings.json"),
            r#"{"recommended_baud": 115200}"#,
        )
        .unwrap();

        std::env::set_var("XDG_CONFIG_HOME", dir.path());
        let config = load();
        std::env::remove_var("XDG_CONFIG_HOME");

        assert_eq!(config.recommended_baud, 115200);
        assert_eq!(config.cache_dir, FlasherConfig::default().cache_dir);
        assert_eq!(config.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_invalid_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_from(&path).is_err());
    }
}
