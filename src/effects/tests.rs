use super::dsp::{Biquad, FftConvolver};
use super::graph::*;
use super::impulse::impulse_response;
use super::*;

use NodeId::*;

#[test]
fn disabled_topology_is_dry_only() {
    assert_eq!(
        topology(false),
        vec![(Source, MasterGain), (MasterGain, Destination)]
    );
}

#[test]
fn enabled_topology_has_parallel_dry_and_wet_paths() {
    let edges = topology(true);
    assert_eq!(edges.len(), 7);
    // Dry path.
    assert!(edges.contains(&(Source, DryGain)));
    assert!(edges.contains(&(DryGain, MasterGain)));
    // Wet path.
    assert!(edges.contains(&(Source, Filter)));
    assert!(edges.contains(&(Filter, Reverb)));
    assert!(edges.contains(&(Reverb, WetGain)));
    assert!(edges.contains(&(WetGain, MasterGain)));
    // Summed at the master gain, single output edge.
    assert!(edges.contains(&(MasterGain, Destination)));
    assert!(!edges.contains(&(Source, MasterGain)));
}

#[test]
fn filter_center_is_the_geometric_mean_of_the_band() {
    let center = filter_center_hz();
    assert!((center - 1000.0).abs() < 1.0, "center was {center}");
}

#[test]
fn double_toggle_restores_the_original_routing() {
    let mut graph = EffectsGraph::new(false);
    graph.attach(44_100, 2);
    let original = graph.edges().to_vec();

    graph.set_enabled(true);
    graph.set_enabled(false);

    assert_eq!(graph.edges(), original.as_slice());
}

#[test]
fn repeated_toggles_never_accumulate_duplicate_edges() {
    let mut graph = EffectsGraph::new(false);
    graph.attach(44_100, 2);

    for _ in 0..5 {
        graph.set_enabled(true);
    }
    assert_eq!(graph.edges().len(), topology(true).len());
    for edge in topology(true) {
        assert_eq!(graph.edges().iter().filter(|&&e| e == edge).count(), 1);
    }

    for _ in 0..5 {
        graph.set_enabled(false);
    }
    assert_eq!(graph.edges(), topology(false).as_slice());
}

#[test]
fn set_enabled_before_attach_only_records_the_flag() {
    let mut graph = EffectsGraph::new(false);
    graph.set_enabled(true);
    assert!(graph.enabled());
    assert!(graph.edges().is_empty());
    assert!(!graph.is_attached());

    graph.attach(44_100, 2);
    assert_eq!(graph.edges(), topology(true).as_slice());
}

#[test]
fn detach_destroys_the_context_but_keeps_the_preference() {
    let mut graph = EffectsGraph::new(true);
    graph.attach(44_100, 2);
    assert!(graph.is_attached());

    graph.detach();
    assert!(!graph.is_attached());
    assert!(graph.edges().is_empty());
    assert!(graph.enabled());

    // Next engine instance re-attaches and the routing comes back.
    graph.attach(48_000, 2);
    assert_eq!(graph.edges(), topology(true).as_slice());
}

#[test]
fn attach_is_idempotent_per_context() {
    let mut graph = EffectsGraph::new(true);
    graph.attach(44_100, 2);
    graph.attach(44_100, 2);
    assert_eq!(graph.edges().len(), topology(true).len());
}

#[test]
fn unattached_graph_passes_samples_through() {
    let mut graph = EffectsGraph::new(true);
    assert_eq!(graph.process(0, 0.5), 0.5);
}

#[test]
fn dry_only_routing_is_unity_gain() {
    let mut graph = EffectsGraph::new(false);
    graph.attach(44_100, 1);
    for x in [0.0f32, 0.25, -0.75, 1.0] {
        assert!((graph.process(0, x) - x).abs() < 1e-6);
    }
}

#[test]
fn impulse_response_has_the_expected_shape() {
    let rate = 8_000;
    let [left, right] = impulse_response(rate, 3, 2.0);

    assert_eq!(left.len(), (rate * 3) as usize);
    assert_eq!(right.len(), (rate * 3) as usize);
    assert!(left.iter().all(|s| s.abs() <= 1.0));
    assert!(right.iter().all(|s| s.abs() <= 1.0));

    // Channels are drawn independently.
    assert_ne!(left, right);

    // The decay envelope: the head is loud, the tail is near-silent.
    let head_peak = left[..left.len() / 10]
        .iter()
        .fold(0.0f32, |m, s| m.max(s.abs()));
    let tail_peak = left[left.len() * 9 / 10..]
        .iter()
        .fold(0.0f32, |m, s| m.max(s.abs()));
    assert!(head_peak > 0.1);
    assert!(tail_peak < 0.02, "tail peak was {tail_peak}");
}

#[test]
fn bandpass_rejects_dc_and_passes_the_center_frequency() {
    let rate = 44_100.0;
    let center = filter_center_hz();

    // DC settles to (near) zero.
    let mut filter = Biquad::bandpass(rate, center, FILTER_Q);
    let mut last = 0.0;
    for _ in 0..4000 {
        last = filter.process(1.0);
    }
    assert!(last.abs() < 0.01, "dc residue was {last}");

    // A sine at the center frequency keeps (roughly) unit amplitude.
    let mut filter = Biquad::bandpass(rate, center, FILTER_Q);
    let mut peak = 0.0f32;
    for i in 0..44_100 {
        let x = (2.0 * std::f32::consts::PI * center * i as f32 / rate).sin();
        let y = filter.process(x);
        if i > 4_000 {
            peak = peak.max(y.abs());
        }
    }
    assert!((peak - 1.0).abs() < 0.05, "center peak was {peak}");
}

#[test]
fn convolution_with_a_delta_reproduces_the_input_after_one_block() {
    let block = 1024;
    let mut conv = FftConvolver::new(&[1.0]);

    let input: Vec<f32> = (0..block * 3).map(|i| (i % 97) as f32 / 97.0).collect();
    let output: Vec<f32> = input.iter().map(|&x| conv.process(x)).collect();

    // The first computed sample comes out of the call that completes the
    // block, so the wet path lags by block - 1 samples of silence.
    let latency = block - 1;
    for &y in &output[..latency] {
        assert_eq!(y, 0.0);
    }
    for (i, (&y, &x)) in output[latency..].iter().zip(input.iter()).enumerate() {
        assert!((y - x).abs() < 1e-3, "sample {i}: {y} vs {x}");
    }
}

#[test]
fn convolver_reset_clears_the_tail() {
    let mut conv = FftConvolver::new(&[0.5; 4096]);
    for _ in 0..4096 {
        conv.process(1.0);
    }
    conv.reset();
    // After a reset, silence in is silence out.
    for _ in 0..2048 {
        assert_eq!(conv.process(0.0), 0.0);
    }
}

#[test]
fn controller_toggles_the_shared_graph() {
    let graph = shared_graph(false);
    let controller = EffectsController::new(graph.clone());

    graph.lock().unwrap().attach(44_100, 2);
    controller.set_reverb_enabled(true);
    assert_eq!(graph.lock().unwrap().edges(), topology(true).as_slice());

    controller.detach();
    assert!(!graph.lock().unwrap().is_attached());
    assert!(graph.lock().unwrap().enabled());
}
