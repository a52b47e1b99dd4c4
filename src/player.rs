//! Playback orchestration: ties the playlist, the engine lifecycle, the
//! effects graph and the persisted preferences together.
//!
//! The player owns at most one engine instance at a time. Switching tracks
//! tears the old instance down (which detaches the effects context) and
//! spawns a fresh one; every load is tagged with a sequence number so that
//! ready notifications from superseded loads are discarded instead of
//! clobbering the current track's state.

mod model;

pub use model::PlaybackState;

use std::sync::mpsc::Receiver;

use tracing::{debug, warn};

use crate::effects::EffectsController;
use crate::engine::{EngineEvent, EngineFactory, TransportEngine};
use crate::metadata::{self, TrackMetadata};
use crate::playlist::{Playlist, Track};
use crate::prefs::{Preferences, PrefsStore};
use crate::resource::ResourceRegistry;

/// Playback rate while the slow-down effect is on.
pub const SLOWED_RATE: f32 = 0.9;
pub const NORMAL_RATE: f32 = 1.0;

pub struct Player {
    playlist: Playlist,
    state: PlaybackState,
    metadata: Option<TrackMetadata>,
    prefs: Preferences,
    prefs_store: Option<PrefsStore>,
    engine: Option<(Box<dyn TransportEngine>, Receiver<EngineEvent>)>,
    effects: EffectsController,
    registry: ResourceRegistry,
    factory: Box<dyn EngineFactory>,
    load_seq: u64,
    volume: f32,
}

impl Player {
    pub fn new(
        factory: Box<dyn EngineFactory>,
        registry: ResourceRegistry,
        effects: EffectsController,
        prefs_store: Option<PrefsStore>,
    ) -> Self {
        let prefs = prefs_store
            .as_ref()
            .map(PrefsStore::load)
            .unwrap_or_default();

        let state = PlaybackState {
            slowed_enabled: prefs.slowed,
            reverb_enabled: prefs.reverb,
            ..PlaybackState::default()
        };

        Self {
            playlist: Playlist::empty(crate::files::DEFAULT_PLAYLIST_NAME),
            state,
            metadata: None,
            prefs,
            prefs_store,
            engine: None,
            effects,
            registry,
            factory,
            load_seq: 0,
            volume: 1.0,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn metadata(&self) -> Option<&TrackMetadata> {
        self.metadata.as_ref()
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.playlist.tracks.get(self.state.current_index)
    }

    /// Replace the playlist. URLs of the outgoing tracks are revoked so the
    /// registry never accumulates dead entries; an index that no longer
    /// exists in the new playlist resets to the first track.
    pub fn set_playlist(&mut self, playlist: Playlist) {
        for track in &self.playlist.tracks {
            if let Some(url) = &track.url {
                self.registry.revoke(url);
            }
            if let Some(cover) = &track.cover_art {
                self.registry.revoke(cover);
            }
        }
        self.playlist = playlist;
        if self.state.current_index >= self.playlist.len() {
            self.state.current_index = 0;
        }
        self.load_current();
    }

    /// Advance to the next track, wrapping at the end. No-op on an empty
    /// playlist.
    pub fn handle_next(&mut self) {
        if self.playlist.is_empty() {
            return;
        }
        self.state.current_index = (self.state.current_index + 1) % self.playlist.len();
        self.load_current();
    }

    /// Step back to the previous track, wrapping at the start. No-op on an
    /// empty playlist.
    pub fn handle_prev(&mut self) {
        if self.playlist.is_empty() {
            return;
        }
        let len = self.playlist.len();
        self.state.current_index = (self.state.current_index + len - 1) % len;
        self.load_current();
    }

    pub fn play(&self) {
        if let Some((engine, _)) = &self.engine {
            engine.play();
        }
    }

    pub fn pause(&self) {
        if let Some((engine, _)) = &self.engine {
            engine.pause();
        }
    }

    pub fn stop(&self) {
        if let Some((engine, _)) = &self.engine {
            engine.stop();
        }
    }

    pub fn seek(&self, secs: f64) {
        if let Some((engine, _)) = &self.engine {
            engine.seek(secs);
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some((engine, _)) = &self.engine {
            engine.set_volume(self.volume);
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Flip the slow-down effect. The new setting applies to the live
    /// engine immediately and is persisted right away.
    pub fn toggle_slowed(&mut self) {
        self.prefs.slowed = !self.prefs.slowed;
        self.state.slowed_enabled = self.prefs.slowed;
        self.save_prefs();
        if let Some((engine, _)) = &self.engine {
            engine.set_rate(self.rate());
        }
    }

    /// Flip the reverb effect. Routing changes on the shared graph take
    /// effect mid-stream; the setting is persisted right away.
    pub fn toggle_reverbed(&mut self) {
        self.prefs.reverb = !self.prefs.reverb;
        self.state.reverb_enabled = self.prefs.reverb;
        self.save_prefs();
        self.effects.set_reverb_enabled(self.prefs.reverb);
    }

    /// Drain pending engine events and fold them into the playback state.
    /// Called from the UI loop every tick.
    pub fn poll_events(&mut self) {
        let mut pending = Vec::new();
        if let Some((_, events)) = &self.engine {
            while let Ok(event) = events.try_recv() {
                pending.push(event);
            }
        }
        for event in pending {
            self.apply_event(event);
        }
    }

    fn apply_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Ready { seq, duration } => {
                if seq != self.load_seq {
                    debug!(seq, current = self.load_seq, "discarding stale ready event");
                    return;
                }
                self.state.is_ready = true;
                self.state.duration = duration;
                if let Some((engine, _)) = &self.engine {
                    engine.set_rate(self.rate());
                    engine.play();
                }
            }
            EngineEvent::Play => self.state.is_playing = true,
            EngineEvent::Pause => self.state.is_playing = false,
            EngineEvent::TimeUpdate(secs) => self.state.current_time = secs,
            EngineEvent::Ended => {
                self.state.is_playing = false;
                self.handle_next();
            }
        }
    }

    fn rate(&self) -> f32 {
        if self.prefs.slowed {
            SLOWED_RATE
        } else {
            NORMAL_RATE
        }
    }

    fn save_prefs(&self) {
        if let Some(store) = &self.prefs_store {
            if let Err(err) = store.save(&self.prefs) {
                warn!(%err, "failed to persist preferences");
            }
        }
    }

    /// Tear down the current engine instance and load the track at the
    /// current index into a fresh one.
    fn load_current(&mut self) {
        // Dropping the engine joins its thread and silences the old sink;
        // the effects context it was attached to goes with it.
        self.engine = None;
        self.effects.detach();

        if let Some(meta) = self.metadata.take() {
            if let Some(cover) = &meta.cover {
                self.registry.revoke(cover);
            }
        }
        self.state.is_ready = false;
        self.state.is_playing = false;
        self.state.current_time = 0.0;
        self.state.duration = 0.0;

        if self.playlist.is_empty() {
            return;
        }
        if self.state.current_index >= self.playlist.len() {
            self.state.current_index = 0;
        }

        let track = &self.playlist.tracks[self.state.current_index];
        let Some(url) = track.url.clone() else {
            warn!(name = %track.name, "track has no playable url, not loading");
            return;
        };

        self.metadata = Some(metadata::extract(&url, &self.registry));

        self.load_seq += 1;
        let (engine, events) = self.factory.create();
        engine.set_volume(self.volume);
        engine.load(self.load_seq, url);
        self.engine = Some((engine, events));
    }
}
