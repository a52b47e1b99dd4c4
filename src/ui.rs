//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph, Sparkline, Wrap},
};

use ringbuf::traits::*;

use crate::config::{ControlsSettings, UiSettings};
use crate::effects::WaveformHandle;
use crate::player::Player;

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    [
        "[space] play/pause".to_string(),
        "[h/l] prev/next".to_string(),
        format!("[←/→] scrub -/+{}s", scrub_seconds),
        "[s] slowed".to_string(),
        "[r] reverb".to_string(),
        "[-/+] volume".to_string(),
        "[S] save playlist".to_string(),
        "[q] quit".to_string(),
    ]
    .join(" | ")
}

/// Format a position in seconds as `M:SS`.
///
/// Values that cannot be rendered (negative, NaN, infinite) display as the
/// zero position.
pub fn format_time(secs: f64) -> String {
    if !secs.is_finite() || secs < 0.0 {
        return "0:00".to_string();
    }
    let total = secs as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Build the now-playing text from the extracted metadata and transport
/// state.
fn now_playing_text(player: &Player) -> String {
    let state = player.state();

    let Some(meta) = player.metadata() else {
        return "Nothing loaded".to_string();
    };

    let mut parts = vec![format!("{} - {} ({})", meta.artist, meta.title, meta.album)];

    if state.is_ready {
        parts.push(format!(
            "{} / {}",
            format_time(state.current_time),
            format_time(state.duration)
        ));
    } else {
        parts.push("loading...".to_string());
    }

    parts.push(if state.is_playing { "Playing" } else { "Paused" }.to_string());

    if state.slowed_enabled {
        parts.push("[slowed]".to_string());
    }
    if state.reverb_enabled {
        parts.push("[reverb]".to_string());
    }
    parts.push(format!("Vol {:.0}%", player.volume() * 100.0));

    parts.join(" • ")
}

/// Downsample the waveform ring into sparkline bars for the given width.
fn waveform_bars(waveform: &WaveformHandle, width: usize) -> Vec<u64> {
    let Ok(buf) = waveform.lock() else {
        return Vec::new();
    };
    let samples: Vec<f32> = buf.iter().copied().collect();
    drop(buf);

    if samples.is_empty() || width == 0 {
        return Vec::new();
    }

    let chunk = (samples.len() / width).max(1);
    samples
        .chunks(chunk)
        .take(width)
        .map(|c| {
            let peak = c.iter().fold(0.0f32, |m, s| m.max(s.abs()));
            (peak.min(1.0) * 100.0) as u64
        })
        .collect()
}

/// Render the entire UI into the provided `frame`.
pub fn draw(
    frame: &mut Frame,
    player: &Player,
    waveform: Option<&WaveformHandle>,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let show_waveform = ui_settings.show_waveform && waveform.is_some();
    let mut constraints = vec![Constraint::Length(3), Constraint::Length(4)];
    if show_waveform {
        constraints.push(Constraint::Length(5));
    }
    constraints.push(Constraint::Min(1));
    constraints.push(Constraint::Length(3));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" hypertune ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Now playing
    let now_playing = Paragraph::new(now_playing_text(player))
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" now playing "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(now_playing, chunks[1]);

    let mut next = 2;

    if show_waveform {
        let area = chunks[next];
        let bars = waveform
            .map(|w| waveform_bars(w, area.width.saturating_sub(2) as usize))
            .unwrap_or_default();
        let spark = Sparkline::default()
            .data(&bars)
            .max(100)
            .block(Block::default().borders(Borders::ALL).title(" output "));
        frame.render_widget(spark, area);
        next += 1;
    }

    // Playlist
    {
        let playlist = player.playlist();
        let items: Vec<ListItem> = playlist
            .tracks
            .iter()
            .map(|t| ListItem::new(t.name.as_str()))
            .collect();
        let title = format!(" {} ({} tracks) ", playlist.name, playlist.len());
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if !playlist.is_empty() {
            state.select(Some(player.state().current_index));
        }
        frame.render_stateful_widget(list, chunks[next], &mut state);
        next += 1;
    }

    let footer = Paragraph::new(controls_text(controls_settings.scrub_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[next]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_time_renders_minutes_and_zero_padded_seconds() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(5.0), "0:05");
        assert_eq!(format_time(65.0), "1:05");
        assert_eq!(format_time(600.0), "10:00");
        assert_eq!(format_time(3725.0), "62:05");
    }

    #[test]
    fn format_time_truncates_fractional_seconds() {
        assert_eq!(format_time(59.9), "0:59");
    }

    #[test]
    fn format_time_degrades_on_unrenderable_input() {
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(f64::INFINITY), "0:00");
        assert_eq!(format_time(-3.0), "0:00");
    }

    #[test]
    fn controls_text_shows_the_configured_scrub() {
        let text = controls_text(9);
        assert!(text.contains("-/+9s"));
    }
}
