use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use rodio::{Decoder, OutputStreamBuilder, Sink, Source};
use tracing::{debug, warn};

use crate::effects::{EffectsSource, SharedGraph, WaveformHandle};
use crate::metadata;
use crate::resource::{ResourceRegistry, ResourceUrl};

use super::types::{EngineCmd, EngineEvent, EngineInput, EngineState};

/// Cadence of the command loop; also drives `TimeUpdate` and end-of-track
/// detection.
const TICK: Duration = Duration::from_millis(100);

pub(super) fn spawn_engine_thread(
    rx: Receiver<EngineCmd>,
    events: Sender<EngineEvent>,
    registry: ResourceRegistry,
    graph: SharedGraph,
    waveform: Option<WaveformHandle>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut stream = match OutputStreamBuilder::open_default_stream() {
            Ok(s) => s,
            Err(err) => {
                // No output device: stay alive and inert rather than
                // crash; transport keeps working, audio is silent.
                warn!(%err, "no audio output device, playback disabled");
                while let Ok(cmd) = rx.recv() {
                    if matches!(cmd, EngineCmd::Quit) {
                        break;
                    }
                }
                return;
            }
        };
        // rodio logs to stderr when OutputStream is dropped. That's useful in
        // debugging, but noisy for a TUI app.
        stream.log_on_drop(false);

        let mut sink: Option<Sink> = None;
        let mut state = EngineState::default();
        let mut duration = 0.0f64;
        let mut rate = 1.0f32;
        let mut volume = 1.0f32;
        let mut ended_emitted = false;

        loop {
            match rx.recv_timeout(TICK) {
                Ok(EngineCmd::Load { seq, url }) => {
                    // Fully tear down the previous playable instance
                    // before anything new touches the output.
                    if let Some(old) = sink.take() {
                        old.stop();
                    }
                    state = state.next(EngineInput::LoadRequested);
                    duration = 0.0;
                    ended_emitted = false;

                    match prepare_sink(&stream, &registry, &url, &graph, &waveform) {
                        Some((new_sink, total)) => {
                            new_sink.set_speed(rate);
                            new_sink.set_volume(volume);
                            sink = Some(new_sink);
                            duration = total;
                            state = state.next(EngineInput::BecameReady);
                            let _ = events.send(EngineEvent::Ready { seq, duration });
                        }
                        None => {
                            state = state.next(EngineInput::DecodeFailed);
                        }
                    }
                }
                Ok(EngineCmd::Play) => {
                    if let Some(s) = sink.as_ref().filter(|_| state.can_transport()) {
                        s.play();
                        state = state.next(EngineInput::PlayRequested);
                        let _ = events.send(EngineEvent::Play);
                    }
                }
                Ok(EngineCmd::Pause) => {
                    if let Some(s) = sink.as_ref().filter(|_| state.can_transport()) {
                        s.pause();
                        state = state.next(EngineInput::PauseRequested);
                        let _ = events.send(EngineEvent::Pause);
                    }
                }
                Ok(EngineCmd::Stop) => {
                    if let Some(s) = sink.as_ref().filter(|_| state.can_transport()) {
                        s.pause();
                        if let Err(err) = s.try_seek(Duration::ZERO) {
                            debug!(%err, "rewind on stop failed");
                        }
                        state = state.next(EngineInput::StopRequested);
                        let _ = events.send(EngineEvent::TimeUpdate(0.0));
                        let _ = events.send(EngineEvent::Pause);
                    }
                }
                Ok(EngineCmd::Seek(secs)) => {
                    if duration <= 0.0 {
                        debug!(secs, "seek ignored, duration unknown");
                        continue;
                    }
                    if let Some(s) = sink.as_ref().filter(|_| state.can_transport()) {
                        // Expressed as a fraction of the track, clamped to
                        // its bounds.
                        let fraction = (secs / duration).clamp(0.0, 1.0);
                        let target = fraction * duration;
                        match s.try_seek(Duration::from_secs_f64(target)) {
                            Ok(()) => {
                                ended_emitted = false;
                                let _ = events.send(EngineEvent::TimeUpdate(target));
                            }
                            Err(err) => warn!(%err, secs, "seek failed"),
                        }
                    }
                }
                Ok(EngineCmd::SetRate(r)) => {
                    rate = r;
                    if let Some(s) = sink.as_ref() {
                        s.set_speed(rate);
                    }
                }
                Ok(EngineCmd::SetVolume(v)) => {
                    volume = v.clamp(0.0, 1.0);
                    if let Some(s) = sink.as_ref() {
                        s.set_volume(volume);
                    }
                }
                Ok(EngineCmd::Quit) => {
                    if let Some(s) = sink.take() {
                        s.stop();
                    }
                    break;
                }
                Err(RecvTimeoutError::Timeout) => {
                    let Some(s) = sink.as_ref() else {
                        continue;
                    };
                    if state == EngineState::Playing {
                        if s.empty() {
                            if !ended_emitted {
                                ended_emitted = true;
                                state = state.next(EngineInput::TrackEnded);
                                let _ = events.send(EngineEvent::Ended);
                            }
                        } else {
                            let _ = events
                                .send(EngineEvent::TimeUpdate(s.get_pos().as_secs_f64()));
                        }
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    if let Some(s) = sink.take() {
                        s.stop();
                    }
                    break;
                }
            }
        }
    })
}

/// Resolve, decode and wire a track into a paused sink. Returns the sink
/// and the track duration, or `None` when the resource is unusable (the
/// caller stays in a clean unloaded state).
fn prepare_sink(
    stream: &rodio::OutputStream,
    registry: &ResourceRegistry,
    url: &ResourceUrl,
    graph: &SharedGraph,
    waveform: &Option<WaveformHandle>,
) -> Option<(Sink, f64)> {
    let Some(reader) = registry.open(url) else {
        warn!(%url, "resource url not resolvable, skipping load");
        return None;
    };

    let source = match Decoder::new(reader) {
        Ok(s) => s,
        Err(err) => {
            warn!(%url, %err, "decode failed, skipping load");
            return None;
        }
    };

    let duration = source
        .total_duration()
        .map(|d| d.as_secs_f64())
        .or_else(|| registry.path_of(url).as_deref().and_then(metadata::probe_duration))
        .unwrap_or(0.0);

    // First decodable moment: the effects context attaches to this engine
    // instance's output (created lazily if none exists).
    {
        let mut g = graph.lock().expect("effects graph poisoned");
        g.attach(source.sample_rate(), usize::from(source.channels()));
    }

    let routed = EffectsSource::new(source, graph.clone(), waveform.clone());
    let sink = Sink::connect_new(stream.mixer());
    sink.append(routed);
    sink.pause();

    Some((sink, duration))
}
