use rand::Rng;

/// Synthesize the stereo reverb impulse response.
///
/// Each channel is `sample_rate * seconds` samples of uniform noise in
/// `(-1, 1)` shaped by the envelope `(1 - i/len)^decay`, drawn
/// independently per channel.
pub fn impulse_response(sample_rate: u32, seconds: u32, decay: f32) -> [Vec<f32>; 2] {
    let len = (sample_rate * seconds) as usize;
    let mut rng = rand::rng();

    std::array::from_fn(|_| {
        (0..len)
            .map(|i| {
                let envelope = (1.0 - i as f32 / len as f32).powf(decay);
                rng.random_range(-1.0f32..1.0) * envelope
            })
            .collect()
    })
}
