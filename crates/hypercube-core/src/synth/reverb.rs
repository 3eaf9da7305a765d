use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::constants::{MAX_REVERB_DECAY_SEC, MIN_REVERB_DECAY_SEC, REVERB_DECAY_DB, REVERB_SEED};

/// Decay seconds made safe for buffer allocation.
pub fn clamp_decay(decay: f32) -> f32 {
    if !decay.is_finite() || decay <= 0.0 {
        return MIN_REVERB_DECAY_SEC;
    }
    decay.clamp(MIN_REVERB_DECAY_SEC, MAX_REVERB_DECAY_SEC)
}

/// Stereo impulse response: seeded noise under an exponential envelope that
/// reaches -60 dB at the end of the tail.
pub fn generate_impulse(sample_rate: f32, decay: f32) -> [Vec<f32>; 2] {
    let seconds = clamp_decay(decay);
    let sample_rate = if sample_rate.is_finite() && sample_rate > 0.0 {
        sample_rate
    } else {
        44_100.0
    };
    let len = ((sample_rate * seconds) as usize).max(1);
    // ln(10^(dB/20)) per second of tail
    let k = REVERB_DECAY_DB / 20.0 * std::f32::consts::LN_10 / seconds;
    let dt = 1.0 / sample_rate;

    let mut rng = StdRng::seed_from_u64(REVERB_SEED);
    let mut channel = || {
        (0..len)
            .map(|i| {
                let n: f32 = rng.gen_range(-1.0..1.0);
                n * (-k * i as f32 * dt).exp()
            })
            .collect::<Vec<f32>>()
    };
    let left = channel();
    let right = channel();
    [left, right]
}
