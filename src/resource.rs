//! Session-scoped resource registry.
//!
//! Tracks never carry raw paths into the playback layer. Instead the
//! registry mints transient `hypertune://<id>` URLs backed by a file path
//! (audio data) or an in-memory byte blob (cover art), resolves them to
//! readers for the decoder, and revokes them when their owner lets go.
//! URLs are valid for the current process only and are never persisted.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A transient locator for an open resource. Cheap to clone, compares by
/// the underlying URL string.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ResourceUrl(String);

impl ResourceUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ResourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceUrl({})", self.0)
    }
}

enum Backing {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

struct Inner {
    next_id: u64,
    entries: HashMap<String, Backing>,
}

/// Shared registry handle. Clones refer to the same session state.
#[derive(Clone)]
pub struct ResourceRegistry {
    inner: Arc<Mutex<Inner>>,
}

/// A readable, seekable view of a registered resource, suitable for the
/// audio decoder.
pub enum ResourceReader {
    File(BufReader<File>),
    Bytes(Cursor<Arc<[u8]>>),
}

impl std::io::Read for ResourceReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            ResourceReader::File(r) => r.read(buf),
            ResourceReader::Bytes(c) => c.read(buf),
        }
    }
}

impl std::io::Seek for ResourceReader {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        match self {
            ResourceReader::File(r) => r.seek(pos),
            ResourceReader::Bytes(c) => c.seek(pos),
        }
    }
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                next_id: 0,
                entries: HashMap::new(),
            })),
        }
    }

    fn register(&self, backing: Backing) -> ResourceUrl {
        let mut inner = self.inner.lock().expect("resource registry poisoned");
        let id = inner.next_id;
        inner.next_id += 1;
        let url = format!("hypertune://{id}");
        inner.entries.insert(url.clone(), backing);
        ResourceUrl(url)
    }

    /// Mint a URL backed by a file on disk.
    pub fn register_path(&self, path: impl Into<PathBuf>) -> ResourceUrl {
        self.register(Backing::Path(path.into()))
    }

    /// Mint a URL backed by an in-memory blob (cover art).
    pub fn register_bytes(&self, bytes: Vec<u8>) -> ResourceUrl {
        self.register(Backing::Bytes(bytes.into()))
    }

    /// The backing path of a URL, if it is path-backed and still live.
    pub fn path_of(&self, url: &ResourceUrl) -> Option<PathBuf> {
        let inner = self.inner.lock().expect("resource registry poisoned");
        match inner.entries.get(url.as_str()) {
            Some(Backing::Path(p)) => Some(p.clone()),
            _ => None,
        }
    }

    /// Open a live URL for reading. Returns `None` for revoked or unknown
    /// URLs, or when the backing file can no longer be opened.
    pub fn open(&self, url: &ResourceUrl) -> Option<ResourceReader> {
        let inner = self.inner.lock().expect("resource registry poisoned");
        match inner.entries.get(url.as_str())? {
            Backing::Path(p) => {
                let file = File::open(p).ok()?;
                Some(ResourceReader::File(BufReader::new(file)))
            }
            Backing::Bytes(b) => Some(ResourceReader::Bytes(Cursor::new(b.clone()))),
        }
    }

    /// Drop a URL. Returns whether it was live.
    pub fn revoke(&self, url: &ResourceUrl) -> bool {
        let mut inner = self.inner.lock().expect("resource registry poisoned");
        inner.entries.remove(url.as_str()).is_some()
    }

    /// Number of live entries. Used to verify nothing leaks across playlist
    /// replacement.
    pub fn live_count(&self) -> usize {
        let inner = self.inner.lock().expect("resource registry poisoned");
        inner.entries.len()
    }

    /// Check that the backing file at `path` is still readable.
    pub fn can_read(path: &Path) -> bool {
        File::open(path).is_ok()
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
