//! Persistence layer.
//!
//! Saves and loads the user's settings (authorization token and minimum
//! balance threshold) to/from a JSON file so the prompt only runs once.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Default settings file path.
pub const DEFAULT_SETTINGS_FILE: &str = "upgrader_settings.json";

/// User-provided settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Value sent as the `Authorization` header (e.g. `Bearer 1718…`).
    pub authorization: String,
    /// Purchases stop once the balance would drop below this.
    pub min_balance_threshold: f64,
}

/// Save settings to a JSON file.
pub fn save_settings(settings: &Settings, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SETTINGS_FILE);
    let json = serde_json::to_string_pretty(settings).context("Failed to serialise settings")?;

    std::fs::write(path, &json).context(format!("Failed to write settings to {path}"))?;

    debug!(path, threshold = settings.min_balance_threshold, "Settings saved");
    Ok(())
}

/// Load settings from a JSON file.
/// Returns None if the file doesn't exist (first run).
pub fn load_settings(path: Option<&str>) -> Result<Option<Settings>> {
    let path = path.unwrap_or(DEFAULT_SETTINGS_FILE);

    if !Path::new(path).exists() {
        info!(path, "No saved settings found");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path).context(format!("Failed to read settings from {path}"))?;

    let settings: Settings =
        serde_json::from_str(&json).context(format!("Failed to parse settings from {path}"))?;

    info!(
        path,
        threshold = settings.min_balance_threshold,
        "Loaded saved settings"
    );

    Ok(Some(settings))
}

/// Delete the settings file (for testing or reset).
pub fn delete_settings(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SETTINGS_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path).context(format!("Failed to delete settings file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> String {
        let mut p = std::env::temp_dir();
        p.push(format!("upgrader_test_settings_{}.json", uuid::Uuid::new_v4()));
        p.to_string_lossy().to_string()
    }

    fn sample() -> Settings {
        Settings {
            authorization: "Bearer 171852test".into(),
            min_balance_threshold: 250_000.0,
        }
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path();
        save_settings(&sample(), Some(&path)).unwrap();

        let loaded = load_settings(Some(&path)).unwrap();
        assert_eq!(loaded, Some(sample()));

        delete_settings(Some(&path)).unwrap();
    }

    #[test]
    fn test_load_nonexistent() {
        let path = temp_path();
        assert!(load_settings(Some(&path)).unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt_file_errors() {
        let path = temp_path();
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_settings(Some(&path)).is_err());
        delete_settings(Some(&path)).unwrap();
    }

    #[test]
    fn test_delete_settings() {
        let path = temp_path();
        save_settings(&sample(), Some(&path)).unwrap();
        assert!(Path::new(&path).exists());

        delete_settings(Some(&path)).unwrap();
        assert!(!Path::new(&path).exists());
    }

    #[test]
    fn test_delete_nonexistent_ok() {
        assert!(delete_settings(Some(&temp_path())).is_ok());
    }
}
