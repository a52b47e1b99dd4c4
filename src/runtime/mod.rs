use std::path::PathBuf;

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::warn;

use crate::effects::{EffectsController, shared_graph, waveform_buffer};
use crate::engine::RodioEngineFactory;
use crate::files;
use crate::player::Player;
use crate::playlist::PlaylistStore;
use crate::prefs::PrefsStore;
use crate::resource::ResourceRegistry;

mod event_loop;
mod settings;

/// Samples kept for the waveform display; a little over one video frame of
/// stereo audio at 44.1 kHz.
const WAVEFORM_SAMPLES: usize = 4096;

pub fn run(paths: Vec<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();

    let registry = ResourceRegistry::new();
    let prefs_store = PrefsStore::open();
    let prefs = prefs_store.as_ref().map(PrefsStore::load).unwrap_or_default();

    let graph = shared_graph(prefs.reverb);
    let waveform = settings
        .ui
        .show_waveform
        .then(|| waveform_buffer(WAVEFORM_SAMPLES));

    let factory = RodioEngineFactory::new(registry.clone(), graph.clone(), waveform.clone());
    let effects = EffectsController::new(graph);
    let mut player = Player::new(Box::new(factory), registry.clone(), effects, prefs_store);
    player.set_volume(settings.audio.volume);

    let store = PlaylistStore::open();

    // Paths on the command line replace the default playlist; otherwise the
    // last saved one comes back.
    let playlist = if !paths.is_empty() {
        let picked = files::pick(&paths, &settings.library.extensions, &registry);
        if let Some(store) = &store {
            if let Err(err) = store.save(files::DEFAULT_PLAYLIST_NAME, &picked.tracks) {
                warn!(%err, "failed to persist the picked playlist");
            }
        }
        picked
    } else {
        store
            .as_ref()
            .and_then(|s| s.load(files::DEFAULT_PLAYLIST_NAME, &registry))
            .unwrap_or_else(|| crate::playlist::Playlist::empty(files::DEFAULT_PLAYLIST_NAME))
    };
    player.set_playlist(playlist);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result =
        event_loop::run(&mut terminal, &settings, &mut player, store.as_ref(), waveform.as_ref());

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}
