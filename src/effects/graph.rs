use super::dsp::{Biquad, FftConvolver};
use super::impulse::impulse_response;

/// Fixed dry-path gain on the reverb topology.
pub const DRY_GAIN: f32 = 1.0;
/// Fixed wet-path gain on the reverb topology.
pub const WET_GAIN: f32 = 1.25;
/// Master gain applied to the summed output.
pub const MASTER_GAIN: f32 = 1.0;
/// Band edges whose geometric mean sets the filter center (~1000 Hz).
pub const FILTER_LOW_HZ: f32 = 200.0;
pub const FILTER_HIGH_HZ: f32 = 5000.0;
pub const FILTER_Q: f32 = 1.0;
/// Impulse response length in seconds and its decay exponent.
pub const IMPULSE_SECONDS: u32 = 3;
pub const IMPULSE_DECAY: f32 = 2.0;

/// Center frequency of the wet-path band-pass filter.
pub fn filter_center_hz() -> f32 {
    (FILTER_LOW_HZ * FILTER_HIGH_HZ).sqrt()
}

/// Nodes of the processing graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeId {
    Source,
    DryGain,
    WetGain,
    Filter,
    Reverb,
    MasterGain,
    Destination,
}

pub type Edge = (NodeId, NodeId);

/// The full connection list for a reverb state. Pure: the only input is
/// the toggle, the output is the exact set of edges to install.
pub fn topology(reverb_enabled: bool) -> Vec<Edge> {
    use NodeId::*;
    if reverb_enabled {
        vec![
            // Dry path.
            (Source, DryGain),
            (DryGain, MasterGain),
            // Wet path: filtered, convolved, level-matched.
            (Source, Filter),
            (Filter, Reverb),
            (Reverb, WetGain),
            (WetGain, MasterGain),
            (MasterGain, Destination),
        ]
    } else {
        vec![(Source, MasterGain), (MasterGain, Destination)]
    }
}

/// Per-engine-instance DSP state backing the graph nodes. One filter and
/// one convolver per channel; the stereo impulse response is generated once
/// per context lifetime.
struct DspContext {
    filters: Vec<Biquad>,
    convolvers: Vec<FftConvolver>,
}

impl DspContext {
    fn new(sample_rate: u32, channels: usize) -> Self {
        let impulse = impulse_response(sample_rate, IMPULSE_SECONDS, IMPULSE_DECAY);
        let filters = (0..channels)
            .map(|_| Biquad::bandpass(sample_rate as f32, filter_center_hz(), FILTER_Q))
            .collect();
        let convolvers = (0..channels)
            .map(|ch| FftConvolver::new(&impulse[ch % impulse.len()]))
            .collect();
        Self {
            filters,
            convolvers,
        }
    }

    fn reset(&mut self) {
        for f in &mut self.filters {
            f.reset();
        }
        for c in &mut self.convolvers {
            c.reset();
        }
    }
}

/// The effects graph: desired reverb state, current edge list, and the
/// lazily created DSP context.
pub struct EffectsGraph {
    enabled: bool,
    edges: Vec<Edge>,
    context: Option<DspContext>,
}

impl EffectsGraph {
    pub fn new(reverb_enabled: bool) -> Self {
        Self {
            enabled: reverb_enabled,
            edges: Vec::new(),
            context: None,
        }
    }

    /// Attach to an engine output. Idempotent: the context and all nodes
    /// are constructed only if none exist yet, then the current topology
    /// is (re)applied.
    pub fn attach(&mut self, sample_rate: u32, channels: usize) {
        if self.context.is_none() {
            self.context = Some(DspContext::new(sample_rate, channels.max(1)));
        }
        self.apply_topology();
    }

    pub fn is_attached(&self) -> bool {
        self.context.is_some()
    }

    /// Record the reverb state; when attached, rebuild the routing.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if self.is_attached() {
            self.apply_topology();
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Drop the DSP context and all connections. The enabled flag is kept
    /// so the next attach restores the same routing.
    pub fn detach(&mut self) {
        self.context = None;
        self.edges.clear();
    }

    // Disconnect everything unconditionally, then install exactly one
    // topology. Repeated calls can never accumulate duplicate edges.
    fn apply_topology(&mut self) {
        self.edges.clear();
        self.edges.extend(topology(self.enabled));
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Route one sample of channel `ch` through the current topology.
    /// Passthrough until attached.
    pub fn process(&mut self, ch: usize, x: f32) -> f32 {
        let Some(ctx) = self.context.as_mut() else {
            return x;
        };

        let mut acc = 0.0;
        if self.edges.contains(&(NodeId::Source, NodeId::MasterGain)) {
            acc += x;
        }
        if self.edges.contains(&(NodeId::Source, NodeId::DryGain)) {
            acc += x * DRY_GAIN;
        }
        if self.edges.contains(&(NodeId::Source, NodeId::Filter)) {
            let ch = ch % ctx.filters.len();
            let filtered = ctx.filters[ch].process(x);
            acc += ctx.convolvers[ch].process(filtered) * WET_GAIN;
        }
        acc * MASTER_GAIN
    }

    /// Clear filter and convolver state after a seek so stale audio does
    /// not bleed into the new position.
    pub fn reset_dsp(&mut self) {
        if let Some(ctx) = self.context.as_mut() {
            ctx.reset();
        }
    }
}
