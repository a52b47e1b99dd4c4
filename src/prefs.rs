//! Persisted playback preferences.
//!
//! Two process-wide flags (tempo slow-down and reverb) survive restarts
//! independently of any playlist. They are read once at startup and written
//! back on every toggle.
//!
//! File format: TOML
//! Default path (Linux/XDG): `$XDG_CONFIG_HOME/hypertune/prefs.toml` or
//! `~/.config/hypertune/prefs.toml`, overridable via `HYPERTUNE_PREFS_PATH`.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub slowed: bool,
    pub reverb: bool,
}

/// Loads and saves [`Preferences`] at a fixed path.
pub struct PrefsStore {
    path: PathBuf,
}

impl PrefsStore {
    /// Store backed by an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location, if one can be resolved.
    pub fn open() -> Option<Self> {
        resolve_prefs_path().map(Self::at)
    }

    /// Read preferences; absence or corruption reads as defaults.
    pub fn load(&self) -> Preferences {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return Preferences::default();
        };
        match toml::from_str(&raw) {
            Ok(prefs) => prefs,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "preferences unreadable, using defaults");
                Preferences::default()
            }
        }
    }

    /// Write preferences, creating parent directories as needed.
    pub fn save(&self, prefs: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let raw = toml::to_string(prefs).context("serializing preferences")?;
        fs::write(&self.path, raw).with_context(|| format!("writing {}", self.path.display()))
    }
}

/// Resolve the prefs path from `HYPERTUNE_PREFS_PATH` or XDG defaults.
pub fn resolve_prefs_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("HYPERTUNE_PREFS_PATH") {
        return Some(PathBuf::from(p));
    }
    default_prefs_path()
}

/// Default prefs path under `$XDG_CONFIG_HOME/hypertune/prefs.toml` or
/// `~/.config/hypertune/prefs.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_prefs_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else if let Some(home) = env::var_os("HOME") {
        Some(PathBuf::from(home).join(".config"))
    } else {
        None
    };

    config_home.map(|d| d.join("hypertune").join("prefs.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn toggled_preference_survives_a_simulated_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.toml");

        let store = PrefsStore::at(&path);
        let mut prefs = store.load();
        assert_eq!(prefs, Preferences::default());

        prefs.slowed = true;
        store.save(&prefs).unwrap();

        // "Restart": a fresh store reading the same path.
        let reread = PrefsStore::at(&path).load();
        assert!(reread.slowed);
        assert!(!reread.reverb);

        prefs.reverb = true;
        store.save(&prefs).unwrap();
        let reread = PrefsStore::at(&path).load();
        assert!(reread.slowed);
        assert!(reread.reverb);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = PrefsStore::at(dir.path().join("missing.toml"));
        assert_eq!(store.load(), Preferences::default());
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.toml");
        fs::write(&path, "slowed = \"maybe\"").unwrap();
        assert_eq!(PrefsStore::at(&path).load(), Preferences::default());
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deep").join("nested").join("prefs.toml");
        let store = PrefsStore::at(&path);
        store
            .save(&Preferences {
                slowed: false,
                reverb: true,
            })
            .unwrap();
        assert!(store.load().reverb);
    }
}
