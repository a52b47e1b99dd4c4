/// Snapshot of everything the UI needs to render the transport.
///
/// `current_index` always points into the playlist when it is non-empty;
/// replacing the playlist with a shorter one resets it to the first track.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackState {
    pub current_index: usize,
    pub is_playing: bool,
    pub is_ready: bool,
    pub current_time: f64,
    pub duration: f64,
    pub slowed_enabled: bool,
    pub reverb_enabled: bool,
}
