use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::warn;

use crate::config;
use crate::effects::WaveformHandle;
use crate::files;
use crate::player::Player;
use crate::playlist::PlaylistStore;
use crate::ui;

/// How long to wait for a key before redrawing; also bounds how stale the
/// rendered playback position can get.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Main terminal event loop: handles input, UI drawing and engine event
/// sync. Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    player: &mut Player,
    store: Option<&PlaylistStore>,
    waveform: Option<&WaveformHandle>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        player.poll_events();

        terminal.draw(|frame| {
            ui::draw(frame, player, waveform, &settings.ui, &settings.controls);
        })?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if handle_key(key, settings, player, store) {
            return Ok(());
        }
    }
}

/// Apply one keypress. Returns `true` when the app should quit.
fn handle_key(
    key: KeyEvent,
    settings: &config::Settings,
    player: &mut Player,
    store: Option<&PlaylistStore>,
) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
        KeyCode::Char(' ') | KeyCode::Char('p') => {
            if player.state().is_playing {
                player.pause();
            } else {
                player.play();
            }
        }
        KeyCode::Char('l') | KeyCode::Char('n') => player.handle_next(),
        KeyCode::Char('h') => player.handle_prev(),
        KeyCode::Char('s') => player.toggle_slowed(),
        KeyCode::Char('r') => player.toggle_reverbed(),
        KeyCode::Left => {
            let scrub = settings.controls.scrub_seconds as f64;
            player.seek((player.state().current_time - scrub).max(0.0));
        }
        KeyCode::Right => {
            let scrub = settings.controls.scrub_seconds as f64;
            player.seek(player.state().current_time + scrub);
        }
        KeyCode::Char('-') => {
            player.set_volume(player.volume() - settings.controls.volume_step);
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            player.set_volume(player.volume() + settings.controls.volume_step);
        }
        KeyCode::Char('S') => {
            if let Some(store) = store {
                let playlist = player.playlist();
                if let Err(err) = store.save(files::DEFAULT_PLAYLIST_NAME, &playlist.tracks) {
                    warn!(%err, "failed to save playlist");
                }
            }
        }
        _ => {}
    }
    false
}
