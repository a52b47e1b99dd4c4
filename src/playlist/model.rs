use std::path::PathBuf;

use crate::resource::ResourceUrl;

/// One audio file reference plus its transient playable URL.
///
/// `path` is the opaque, revocable capability to re-open the file across
/// sessions; `url` is only valid for the current process and is `None` when
/// the file could not be resolved.
#[derive(Clone, Debug)]
pub struct Track {
    pub name: String,
    pub path: PathBuf,
    pub url: Option<ResourceUrl>,
    pub cover_art: Option<ResourceUrl>,
}

/// A named, ordered collection of tracks. Order defines next/previous.
/// An empty playlist is valid and means "nothing to play".
#[derive(Clone, Debug)]
pub struct Playlist {
    pub name: String,
    pub tracks: Vec<Track>,
}

impl Playlist {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tracks: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
