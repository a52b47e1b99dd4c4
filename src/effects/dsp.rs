//! DSP primitives behind the graph nodes and the rodio source adapter
//! that routes the decoded stream through them.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ringbuf::{HeapRb, traits::*};
use rodio::source::SeekError;
use rodio::{ChannelCount, SampleRate, Source};
use rustfft::{Fft, FftPlanner, num_complex::Complex};

use super::SharedGraph;

/// Shared ring of recent post-effects samples for the waveform display.
pub type WaveformHandle = Arc<Mutex<HeapRb<f32>>>;

pub fn waveform_buffer(capacity: usize) -> WaveformHandle {
    Arc::new(Mutex::new(HeapRb::new(capacity)))
}

/// RBJ band-pass biquad (constant 0 dB peak gain), direct form II
/// transposed.
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
}

impl Biquad {
    pub fn bandpass(sample_rate: f32, center_hz: f32, q: f32) -> Self {
        let omega = 2.0 * std::f32::consts::PI * center_hz / sample_rate;
        let alpha = omega.sin() / (2.0 * q);
        let cos = omega.cos();
        let a0 = 1.0 + alpha;
        Self {
            b0: alpha / a0,
            b1: 0.0,
            b2: -alpha / a0,
            a1: -2.0 * cos / a0,
            a2: (1.0 - alpha) / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    pub fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

/// Streaming convolution with a long impulse response, realized as
/// uniformly partitioned overlap-save FFT convolution.
///
/// Samples go in one at a time and come out one at a time with one block
/// of latency on the wet path; each full input block triggers one
/// FFT/multiply-accumulate/IFFT round against the partitioned impulse
/// spectrum.
pub struct FftConvolver {
    block: usize,
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    /// Impulse partitions in the frequency domain, each `2 * block` bins.
    partitions: Vec<Vec<Complex<f32>>>,
    /// Spectra of recent input blocks, newest first (frequency delay line).
    history: VecDeque<Vec<Complex<f32>>>,
    input: Vec<f32>,
    prev_block: Vec<f32>,
    output: VecDeque<f32>,
}

const CONV_BLOCK: usize = 1024;

impl FftConvolver {
    pub fn new(impulse: &[f32]) -> Self {
        let block = CONV_BLOCK;
        let fft_len = 2 * block;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_len);
        let ifft = planner.plan_fft_inverse(fft_len);

        let partitions = impulse
            .chunks(block)
            .map(|chunk| {
                let mut buf = vec![Complex::new(0.0, 0.0); fft_len];
                for (slot, &h) in buf.iter_mut().zip(chunk.iter()) {
                    *slot = Complex::new(h, 0.0);
                }
                fft.process(&mut buf);
                buf
            })
            .collect();

        Self {
            block,
            fft,
            ifft,
            partitions,
            history: VecDeque::new(),
            input: Vec::with_capacity(block),
            prev_block: vec![0.0; block],
            output: VecDeque::new(),
        }
    }

    pub fn process(&mut self, x: f32) -> f32 {
        self.input.push(x);
        if self.input.len() == self.block {
            self.process_block();
        }
        self.output.pop_front().unwrap_or(0.0)
    }

    fn process_block(&mut self) {
        let fft_len = 2 * self.block;

        // Overlap-save: transform the last 2N input samples.
        let mut spectrum: Vec<Complex<f32>> = self
            .prev_block
            .iter()
            .chain(self.input.iter())
            .map(|&s| Complex::new(s, 0.0))
            .collect();
        self.fft.process(&mut spectrum);

        self.history.push_front(spectrum);
        self.history.truncate(self.partitions.len());

        // Multiply-accumulate each delayed input spectrum with its
        // matching impulse partition.
        let mut acc = vec![Complex::new(0.0, 0.0); fft_len];
        for (past, part) in self.history.iter().zip(self.partitions.iter()) {
            for ((a, &x), &h) in acc.iter_mut().zip(past.iter()).zip(part.iter()) {
                *a += x * h;
            }
        }
        self.ifft.process(&mut acc);

        // The last N samples of the circular convolution are valid.
        let norm = 1.0 / fft_len as f32;
        for c in &acc[self.block..] {
            self.output.push_back(c.re * norm);
        }

        std::mem::swap(&mut self.prev_block, &mut self.input);
        self.input.clear();
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.input.clear();
        self.prev_block.fill(0.0);
        self.output.clear();
    }
}

/// Rodio source adapter: pulls decoded samples, routes them through the
/// shared effects graph, and mirrors the result into the waveform buffer.
pub struct EffectsSource<S> {
    inner: S,
    graph: SharedGraph,
    waveform: Option<WaveformHandle>,
    channels: usize,
    ch: usize,
}

impl<S> EffectsSource<S>
where
    S: Source,
{
    pub fn new(inner: S, graph: SharedGraph, waveform: Option<WaveformHandle>) -> Self {
        let channels = usize::from(inner.channels()).max(1);
        Self {
            inner,
            graph,
            waveform,
            channels,
            ch: 0,
        }
    }
}

impl<S> Iterator for EffectsSource<S>
where
    S: Source,
{
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let x = self.inner.next()?;
        let y = {
            let mut graph = self.graph.lock().expect("effects graph poisoned");
            graph.process(self.ch, x)
        };
        self.ch = (self.ch + 1) % self.channels;

        if let Some(ref buffer) = self.waveform {
            if let Ok(mut buf) = buffer.lock() {
                if buf.is_full() {
                    let _ = buf.try_pop();
                }
                let _ = buf.try_push(y);
            }
        }

        Some(y)
    }
}

impl<S> Source for EffectsSource<S>
where
    S: Source,
{
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> ChannelCount {
        self.inner.channels()
    }

    fn sample_rate(&self) -> SampleRate {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        self.inner.try_seek(pos)?;
        let mut graph = self.graph.lock().expect("effects graph poisoned");
        graph.reset_dsp();
        Ok(())
    }
}
