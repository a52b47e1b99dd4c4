use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::files;
use crate::resource::ResourceRegistry;

use super::model::{Playlist, Track};

/// The persisted shape of one track: name plus the file reference, nothing
/// else. Transient URLs must never end up on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredTrack {
    pub name: String,
    pub path: PathBuf,
}

type StoredPlaylists = BTreeMap<String, Vec<StoredTrack>>;

/// Persists named playlists in a single TOML document.
///
/// A missing or unreadable document reads as an empty store; individual
/// tracks that fail permission revalidation on load are dropped, not
/// propagated as errors.
pub struct PlaylistStore {
    path: PathBuf,
}

impl PlaylistStore {
    /// Open the store at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Open the store at the default location (see [`default_store_path`]).
    pub fn open() -> Option<Self> {
        resolve_store_path().map(Self::at)
    }

    fn read(&self) -> StoredPlaylists {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return StoredPlaylists::new();
        };
        match toml::from_str(&raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "playlist store unreadable, treating as empty");
                StoredPlaylists::new()
            }
        }
    }

    fn write(&self, all: &StoredPlaylists) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let raw = toml::to_string(all).context("serializing playlist store")?;
        fs::write(&self.path, raw).with_context(|| format!("writing {}", self.path.display()))
    }

    /// Save `tracks` under `name`, replacing any previous entry with that
    /// name. Only `{name, path}` pairs are written.
    pub fn save(&self, name: &str, tracks: &[Track]) -> Result<()> {
        let mut all = self.read();
        all.insert(
            name.to_string(),
            tracks
                .iter()
                .map(|t| StoredTrack {
                    name: t.name.clone(),
                    path: t.path.clone(),
                })
                .collect(),
        );
        self.write(&all)
    }

    /// Names of all stored playlists, sorted.
    pub fn names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Load one playlist by name, resolving each stored track through the
    /// file resolver. Tracks whose files can no longer be read are dropped;
    /// order of the rest is preserved. Returns `None` for unknown names.
    pub fn load(&self, name: &str, registry: &ResourceRegistry) -> Option<Playlist> {
        let all = self.read();
        let stored = all.get(name)?;
        let tracks = stored
            .iter()
            .filter_map(|s| files::resolve_track(&s.name, &s.path, registry))
            .collect();
        Some(Playlist {
            name: name.to_string(),
            tracks,
        })
    }

    /// Load every stored playlist, with the same per-track drop semantics
    /// as [`load`](Self::load).
    pub fn load_all(&self, registry: &ResourceRegistry) -> Vec<Playlist> {
        self.read()
            .keys()
            .filter_map(|name| self.load(name, registry))
            .collect()
    }

    /// Delete a playlist by name. Returns whether it existed.
    pub fn delete(&self, name: &str) -> bool {
        let mut all = self.read();
        if all.remove(name).is_none() {
            warn!(name, "playlist not found, nothing deleted");
            return false;
        }
        match self.write(&all) {
            Ok(()) => true,
            Err(err) => {
                warn!(name, %err, "failed to persist playlist deletion");
                false
            }
        }
    }
}

/// Resolve the store path from `HYPERTUNE_DATA_PATH` or XDG defaults.
pub fn resolve_store_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("HYPERTUNE_DATA_PATH") {
        return Some(PathBuf::from(p));
    }
    default_store_path()
}

/// Default store path under `$XDG_DATA_HOME/hypertune/playlists.toml` or
/// `~/.local/share/hypertune/playlists.toml`.
pub fn default_store_path() -> Option<PathBuf> {
    let data_home = if let Some(xdg) = env::var_os("XDG_DATA_HOME") {
        Some(PathBuf::from(xdg))
    } else if let Some(home) = env::var_os("HOME") {
        Some(PathBuf::from(home).join(".local").join("share"))
    } else {
        None
    };

    data_home.map(|d| d.join("hypertune").join("playlists.toml"))
}
