//! Centralized path definitions for the files the console persists.
//!
//! This module is the single source of truth for leaf filenames and
//! path-building functions. No other module should hard-code these strings.

use std::path::{Path, PathBuf};

// ── Application identity ─────────────────────────────────────────

pub const APP_ID: &str = "dev-console";

// ── Leaf filenames ───────────────────────────────────────────────

pub const SETTINGS_FILE: &str = "console.json";
pub const COMMAND_CACHE_FILE: &str = "command_cache.json";

// ── Config-dir functions (take config_dir) ───────────────────────

pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join(SETTINGS_FILE)
}

/// One command cache per host installation.
pub fn command_cache_path(config_dir: &Path) -> PathBuf {
    config_dir.join(COMMAND_CACHE_FILE)
}

/// Platform config directory for the console: `<config_dir>/dev-console`.
pub fn default_config_dir() -> PathBuf {
    let base = if cfg!(target_os = "windows") {
        std::env::var("APPDATA")
            .map_or_else(|_| PathBuf::from("C:\\Users\\Default\\AppData\\Roaming"), PathBuf::from)
    } else if cfg!(target_os = "macos") {
        home_dir().join("Library/Application Support")
    } else {
        std::env::var("XDG_CONFIG_HOME").map_or_else(|_| home_dir().join(".config"), PathBuf::from)
    };
    base.join(APP_ID)
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_or_else(|_| PathBuf::from("."), PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_in_config_dir() {
        let dir = Path::new("/tmp/console-cfg");
        assert_eq!(settings_path(dir), dir.join("console.json"));
        assert_eq!(command_cache_path(dir), dir.join("command_cache.json"));
        assert!(default_config_dir().ends_with(APP_ID));
    }
}
