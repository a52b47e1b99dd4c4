//! Engine command/event vocabulary and the transport state machine.

use crate::resource::ResourceUrl;

#[derive(Debug)]
pub enum EngineCmd {
    /// Begin preparing a new track. `seq` tags the request so completions
    /// of superseded loads can be discarded.
    Load { seq: u64, url: ResourceUrl },
    /// Resume or start playback of the loaded track.
    Play,
    /// Pause playback, keeping the position.
    Pause,
    /// Pause playback and reset the reported position to zero.
    Stop,
    /// Seek to an absolute position in seconds. Only meaningful once the
    /// duration is known.
    Seek(f64),
    /// Change the playback rate (tempo). Reapplied after every load.
    SetRate(f32),
    /// Set volume in `[0, 1]`.
    SetVolume(f32),
    /// Shut the engine thread down.
    Quit,
}

/// Observable engine lifecycle, delivered at most once per occurrence.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The track became decodable and its duration is known. Carries the
    /// load sequence number so stale completions can be dropped.
    Ready { seq: u64, duration: f64 },
    Play,
    Pause,
    /// Current position in seconds; emitted during playback and after
    /// seeks.
    TimeUpdate(f64),
    /// The track ran to completion.
    Ended,
}

/// Inputs driving [`EngineState`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineInput {
    LoadRequested,
    DecodeFailed,
    BecameReady,
    PlayRequested,
    PauseRequested,
    StopRequested,
    TrackEnded,
}

/// Transport lifecycle:
/// `Unloaded -> Loading -> Ready <-> {Playing, Paused}`; a track end lands
/// in `Paused` (position reset by stop semantics), and a superseding load
/// returns any state to `Loading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Unloaded,
    Loading,
    Ready,
    Playing,
    Paused,
}

impl EngineState {
    /// Whether transport commands (play/pause/seek) act on the sink.
    pub fn can_transport(self) -> bool {
        matches!(self, Self::Ready | Self::Playing | Self::Paused)
    }

    pub fn next(self, input: EngineInput) -> Self {
        use EngineInput::*;
        use EngineState::*;
        match (self, input) {
            (_, LoadRequested) => Loading,
            (Loading, DecodeFailed) => Unloaded,
            (Loading, BecameReady) => Ready,
            (s, PlayRequested) if s.can_transport() => Playing,
            (s, PauseRequested) if s.can_transport() => Paused,
            (s, StopRequested) if s.can_transport() => Paused,
            (Playing, TrackEnded) => Paused,
            (s, _) => s,
        }
    }
}
