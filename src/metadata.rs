//! Track metadata extraction using Lofty.
//!
//! Metadata is derived per load and never persisted. Extraction never
//! fails outward: any probe or tag error produces the fixed fallback
//! record so the UI always has something to render.

use std::path::Path;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::Accessor;
use tracing::debug;

use crate::resource::{ResourceRegistry, ResourceUrl};

pub const UNKNOWN_TITLE: &str = "Unknown Track";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Descriptive tags for the currently loaded track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Resource URL for embedded cover art, if any.
    pub cover: Option<ResourceUrl>,
    pub duration_secs: f64,
}

impl TrackMetadata {
    /// The record used whenever extraction fails or fields are absent.
    pub fn fallback() -> Self {
        Self {
            title: UNKNOWN_TITLE.to_string(),
            artist: UNKNOWN_ARTIST.to_string(),
            album: UNKNOWN_ALBUM.to_string(),
            cover: None,
            duration_secs: 0.0,
        }
    }
}

/// Extract metadata for the audio file behind `url`.
///
/// Cover art bytes, when present, are registered in the session resource
/// registry so the returned record carries a live URL, mirroring how track
/// audio itself is referenced.
pub fn extract(url: &ResourceUrl, registry: &ResourceRegistry) -> TrackMetadata {
    let Some(path) = registry.path_of(url) else {
        debug!(%url, "no backing path for url, using fallback metadata");
        return TrackMetadata::fallback();
    };
    extract_from_path(&path, registry)
}

fn extract_from_path(path: &Path, registry: &ResourceRegistry) -> TrackMetadata {
    let tagged = match Probe::open(path).and_then(|p| p.read()) {
        Ok(t) => t,
        Err(err) => {
            debug!(path = %path.display(), %err, "metadata probe failed, using fallback");
            return TrackMetadata::fallback();
        }
    };

    let mut meta = TrackMetadata::fallback();
    meta.duration_secs = tagged.properties().duration().as_secs_f64();

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        if let Some(v) = tag.title().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
            meta.title = v;
        }
        if let Some(v) = tag.artist().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
            meta.artist = v;
        }
        if let Some(v) = tag.album().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
            meta.album = v;
        }
        if let Some(pic) = tag.pictures().first() {
            meta.cover = Some(registry.register_bytes(pic.data().to_vec()));
        }
    }

    meta
}

/// Duration probe used by the engine when the decoder cannot report one
/// (common for VBR mp3 streams).
pub fn probe_duration(path: &Path) -> Option<f64> {
    Probe::open(path)
        .and_then(|p| p.read())
        .ok()
        .map(|t| t.properties().duration().as_secs_f64())
        .filter(|d| *d > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn garbage_file_yields_the_documented_fallback_exactly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("noise.mp3");
        fs::write(&path, b"this is not audio").unwrap();

        let reg = ResourceRegistry::new();
        let url = reg.register_path(&path);
        let meta = extract(&url, &reg);

        assert_eq!(meta, TrackMetadata::fallback());
    }

    #[test]
    fn fallback_record_matches_the_contract() {
        let meta = TrackMetadata::fallback();
        assert_eq!(meta.title, "Unknown Track");
        assert_eq!(meta.artist, "Unknown Artist");
        assert_eq!(meta.album, "Unknown Album");
        assert!(meta.cover.is_none());
        assert_eq!(meta.duration_secs, 0.0);
    }

    #[test]
    fn revoked_url_yields_fallback() {
        let reg = ResourceRegistry::new();
        let url = reg.register_bytes(vec![1, 2, 3]);
        // Byte-backed URLs have no path; extraction degrades to fallback.
        assert_eq!(extract(&url, &reg), TrackMetadata::fallback());
    }
}
