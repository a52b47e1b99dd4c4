//! Playback engine: owns the audio output and the sink for the currently
//! loaded track.
//!
//! One engine instance exists per loaded track; switching tracks tears the
//! whole instance down (audio thread joined, sink stopped, channels closed)
//! before a new one is created. Commands go in over an mpsc channel, and
//! lifecycle/timing events come back on another, which the orchestrator
//! drains from its own loop.

mod thread;
mod types;

pub use types::{EngineCmd, EngineEvent, EngineInput, EngineState};

use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use crate::effects::{SharedGraph, WaveformHandle};
use crate::resource::{ResourceRegistry, ResourceUrl};

/// Transport surface of an engine instance. Object-safe so orchestration
/// tests can substitute a recording fake.
pub trait TransportEngine: Send {
    fn load(&self, seq: u64, url: ResourceUrl);
    fn play(&self);
    fn pause(&self);
    fn stop(&self);
    fn seek(&self, secs: f64);
    fn set_rate(&self, rate: f32);
    fn set_volume(&self, volume: f32);
}

/// Creates engine instances together with their event channel.
pub trait EngineFactory {
    fn create(&self) -> (Box<dyn TransportEngine>, Receiver<EngineEvent>);
}

/// The real engine: an audio thread driving a rodio sink whose source is
/// routed through the shared effects graph.
pub struct RodioEngine {
    tx: Sender<EngineCmd>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl RodioEngine {
    pub fn spawn(
        registry: ResourceRegistry,
        graph: SharedGraph,
        waveform: Option<WaveformHandle>,
    ) -> (Self, Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel::<EngineCmd>();
        let (event_tx, event_rx) = mpsc::channel::<EngineEvent>();

        let handle = thread::spawn_engine_thread(rx, event_tx, registry, graph, waveform);

        (
            Self {
                tx,
                join: Mutex::new(Some(handle)),
            },
            event_rx,
        )
    }

    fn send(&self, cmd: EngineCmd) {
        let _ = self.tx.send(cmd);
    }
}

impl TransportEngine for RodioEngine {
    fn load(&self, seq: u64, url: ResourceUrl) {
        self.send(EngineCmd::Load { seq, url });
    }
    fn play(&self) {
        self.send(EngineCmd::Play);
    }
    fn pause(&self) {
        self.send(EngineCmd::Pause);
    }
    fn stop(&self) {
        self.send(EngineCmd::Stop);
    }
    fn seek(&self, secs: f64) {
        self.send(EngineCmd::Seek(secs));
    }
    fn set_rate(&self, rate: f32) {
        self.send(EngineCmd::SetRate(rate));
    }
    fn set_volume(&self, volume: f32) {
        self.send(EngineCmd::SetVolume(volume));
    }
}

impl Drop for RodioEngine {
    // Teardown is synchronous: audio stops before the handle is gone.
    fn drop(&mut self) {
        let _ = self.tx.send(EngineCmd::Quit);
        if let Ok(mut join) = self.join.lock() {
            if let Some(handle) = join.take() {
                let _ = handle.join();
            }
        }
    }
}

/// Factory wiring new engine instances to the session registry, the shared
/// effects graph and the waveform buffer.
pub struct RodioEngineFactory {
    registry: ResourceRegistry,
    graph: SharedGraph,
    waveform: Option<WaveformHandle>,
}

impl RodioEngineFactory {
    pub fn new(
        registry: ResourceRegistry,
        graph: SharedGraph,
        waveform: Option<WaveformHandle>,
    ) -> Self {
        Self {
            registry,
            graph,
            waveform,
        }
    }
}

impl EngineFactory for RodioEngineFactory {
    fn create(&self) -> (Box<dyn TransportEngine>, Receiver<EngineEvent>) {
        let (engine, events) = RodioEngine::spawn(
            self.registry.clone(),
            self.graph.clone(),
            self.waveform.clone(),
        );
        (Box::new(engine), events)
    }
}

#[cfg(test)]
mod tests;
