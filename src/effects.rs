//! Effects graph: a persistent processing context wired between the
//! playback engine's output and the audio destination.
//!
//! The graph keeps a fixed set of nodes (master gain, dry/wet gains,
//! band-pass filter, convolution reverb) and an explicit edge list that is
//! torn down and rebuilt from scratch whenever the reverb toggle changes.
//! The DSP context backing the nodes is created lazily at attach time and
//! dies with its engine instance; the reverb preference itself outlives it.

mod dsp;
mod graph;
mod impulse;

pub use dsp::{EffectsSource, WaveformHandle, waveform_buffer};
pub use graph::{EffectsGraph, NodeId, topology};

use std::sync::{Arc, Mutex};

pub type SharedGraph = Arc<Mutex<EffectsGraph>>;

/// Create a graph handle shared between the orchestrator and the engine's
/// sample path.
pub fn shared_graph(reverb_enabled: bool) -> SharedGraph {
    Arc::new(Mutex::new(EffectsGraph::new(reverb_enabled)))
}

/// Orchestrator-side handle for reconfiguring the graph.
pub struct EffectsController {
    graph: SharedGraph,
}

impl EffectsController {
    pub fn new(graph: SharedGraph) -> Self {
        Self { graph }
    }

    /// Rebuild the routing for the given reverb state. Before the engine
    /// has attached this only records the desired state; the topology is
    /// applied at attach time.
    pub fn set_reverb_enabled(&self, enabled: bool) {
        let mut graph = self.graph.lock().expect("effects graph poisoned");
        graph.set_enabled(enabled);
    }

    /// Destroy the processing context. Called when the engine instance that
    /// owned it is torn down; the next attach recreates everything.
    pub fn detach(&self) {
        let mut graph = self.graph.lock().expect("effects graph poisoned");
        graph.detach();
    }
}

#[cfg(test)]
mod tests;
