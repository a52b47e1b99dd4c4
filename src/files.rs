//! File selection and reference resolution.
//!
//! The terminal analog of a multi-select file picker: the user hands paths
//! on the command line, directories are expanded recursively, and anything
//! with a known audio extension becomes a track in the default playlist.
//! `resolve_track` is the revalidation step used when persisted playlists
//! are loaded again.

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::playlist::{Playlist, Track};
use crate::resource::{ResourceRegistry, ResourceUrl};

/// Name given to the playlist built from the picker.
pub const DEFAULT_PLAYLIST_NAME: &str = "Current Playlist";

fn is_audio_file(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
        })
        .unwrap_or(false)
}

fn track_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string()
}

/// Revalidate access to `path` and mint a fresh resource URL for it.
///
/// Returns `None` when the file can no longer be opened (moved, deleted or
/// permission revoked); the caller drops the track rather than failing.
pub fn resolve_track(name: &str, path: &Path, registry: &ResourceRegistry) -> Option<Track> {
    if !ResourceRegistry::can_read(path) {
        warn!(name, path = %path.display(), "permission denied or file missing, dropping track");
        return None;
    }
    Some(Track {
        name: name.to_string(),
        path: path.to_path_buf(),
        url: Some(registry.register_path(path)),
        cover_art: None,
    })
}

/// Build the default playlist from user-picked paths.
///
/// Files are taken as-is, directories are walked recursively; anything that
/// is not a known audio extension is skipped. Directory entries are sorted
/// by name so the playlist order is stable across runs.
pub fn pick(paths: &[PathBuf], extensions: &[String], registry: &ResourceRegistry) -> Playlist {
    let mut files: Vec<PathBuf> = Vec::new();

    for p in paths {
        if p.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(p)
                .follow_links(true)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.path().is_file() && is_audio_file(e.path(), extensions))
                .map(|e| e.path().to_path_buf())
                .collect();
            found.sort();
            files.extend(found);
        } else if is_audio_file(p, extensions) {
            files.push(p.clone());
        } else {
            warn!(path = %p.display(), "not an audio file, skipping");
        }
    }

    let tracks = files
        .iter()
        .filter_map(|p| resolve_track(&track_name(p), p, registry))
        .collect();

    Playlist {
        name: DEFAULT_PLAYLIST_NAME.to_string(),
        tracks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn exts() -> Vec<String> {
        vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()]
    }

    #[test]
    fn is_audio_file_matches_known_extensions_case_insensitive() {
        let e = exts();
        assert!(is_audio_file(Path::new("/tmp/a.mp3"), &e));
        assert!(is_audio_file(Path::new("/tmp/a.MP3"), &e));
        assert!(is_audio_file(Path::new("/tmp/a.ogg"), &e));
        assert!(!is_audio_file(Path::new("/tmp/a.txt"), &e));
        assert!(!is_audio_file(Path::new("/tmp/a"), &e));
    }

    #[test]
    fn pick_expands_directories_and_filters_non_audio() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.MP3"), b"x").unwrap();
        fs::write(dir.path().join("a.ogg"), b"x").unwrap();
        fs::write(dir.path().join("c.txt"), b"ignore").unwrap();

        let reg = ResourceRegistry::new();
        let playlist = pick(&[dir.path().to_path_buf()], &exts(), &reg);

        assert_eq!(playlist.name, DEFAULT_PLAYLIST_NAME);
        assert_eq!(playlist.len(), 2);
        assert_eq!(playlist.tracks[0].name, "a.ogg");
        assert_eq!(playlist.tracks[1].name, "b.MP3");
        assert!(playlist.tracks.iter().all(|t| t.url.is_some()));
        assert!(playlist.tracks.iter().all(|t| t.cover_art.is_none()));
    }

    #[test]
    fn resolve_track_returns_none_for_unreadable_files() {
        let reg = ResourceRegistry::new();
        assert!(resolve_track("gone.mp3", Path::new("/definitely/not/here.mp3"), &reg).is_none());
        assert_eq!(reg.live_count(), 0);
    }
}
