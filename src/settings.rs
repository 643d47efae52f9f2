use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage::{read_json, write_json};

const SETTINGS_VERSION: u32 = 1;

/// Console settings stored in the config directory as `console.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    pub version: u32,
    /// Glob patterns (case-insensitive) over module names. Only matching
    /// modules are scanned for commands.
    #[serde(default = "default_module_patterns")]
    pub module_patterns: Vec<String>,
    /// Persist discovered commands and reuse them on the next start.
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_log_limit")]
    pub log_limit: usize,
}

fn default_module_patterns() -> Vec<String> {
    vec![
        "assembly-csharp".into(),
        "devtools*".into(),
        "game*".into(),
        "project*".into(),
    ]
}

fn default_true() -> bool {
    true
}

fn default_history_limit() -> usize {
    100
}

fn default_log_limit() -> usize {
    1000
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            module_patterns: default_module_patterns(),
            cache_enabled: true,
            history_limit: default_history_limit(),
            log_limit: default_log_limit(),
        }
    }
}

/// Load settings from the config directory. Returns None if no settings file
/// exists or it cannot be read.
pub fn load_settings(config_dir: &Path) -> Option<ConsoleSettings> {
    let path = crate::paths::settings_path(config_dir);
    if !path.exists() {
        return None;
    }
    match read_json::<ConsoleSettings>(&path) {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring unreadable settings: {e}");
            None
        }
    }
}

/// Save settings to the config directory.
pub fn save_settings(config_dir: &Path, settings: &ConsoleSettings) -> Result<(), StorageError> {
    std::fs::create_dir_all(config_dir)?;
    write_json(&crate::paths::settings_path(config_dir), settings)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = ConsoleSettings::default();
        settings.history_limit = 7;
        settings.module_patterns = vec!["mygame*".into()];
        save_settings(dir.path(), &settings).unwrap();

        let loaded = load_settings(dir.path()).expect("should load");
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            crate::paths::settings_path(dir.path()),
            r#"{ "version": 1, "cache_enabled": false }"#,
        )
        .unwrap();

        let loaded = load_settings(dir.path()).expect("should load");
        assert!(!loaded.cache_enabled);
        assert_eq!(loaded.history_limit, 100);
        assert_eq!(loaded.module_patterns, default_module_patterns());
    }

    #[test]
    fn test_load_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_settings(dir.path()).is_none());
    }

    #[test]
    fn test_corrupt_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(crate::paths::settings_path(dir.path()), "{ not json").unwrap();
        assert!(load_settings(dir.path()).is_none());
    }
}
