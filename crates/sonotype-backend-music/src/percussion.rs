//! Percussion voices: closed hat and kick.

use rand::Rng;
use rand_pcg::Pcg32;

use sonotype_backend_audio::automation::ParamTimeline;
use sonotype_backend_audio::filter::{BiquadCoeffs, BiquadFilter};
use sonotype_backend_audio::oscillator::TWO_PI;

/// Hat body length in seconds.
const HAT_LENGTH_S: f64 = 0.05;

/// Hat highpass corner in Hz.
const HAT_HIGHPASS_HZ: f64 = 6000.0;

/// Hat level.
const HAT_GAIN: f64 = 0.15;

/// Kick body length in seconds.
const KICK_LENGTH_S: f64 = 0.22;

/// Renders the closed hat: linearly decaying noise through a highpass.
///
/// One buffer serves the whole piece; every scheduled hit reuses it, so
/// the hat timbre is constant and fully determined by the generator
/// passed in.
pub fn render_hat(sample_rate: f64, rng: &mut Pcg32) -> Vec<f64> {
    let len = (sample_rate * HAT_LENGTH_S).floor() as usize;
    let mut noise: Vec<f64> = (0..len)
        .map(|i| {
            let decay = 1.0 - i as f64 / len.max(1) as f64;
            (rng.gen::<f64>() * 2.0 - 1.0) * decay
        })
        .collect();

    let mut hp = BiquadFilter::new(BiquadCoeffs::highpass(HAT_HIGHPASS_HZ, 1.0, sample_rate));
    hp.process_buffer(&mut noise);
    for s in noise.iter_mut() {
        *s *= HAT_GAIN;
    }
    noise
}

/// Renders the kick: a sine dropping exponentially from 120 to 48 Hz
/// under a fast exponential amplitude envelope.
///
/// `level` is clamped to [0.2, 1.4] like every derived level.
pub fn render_kick(sample_rate: f64, level: f64) -> Vec<f64> {
    let len = (sample_rate * KICK_LENGTH_S).floor() as usize;
    let gain = if level.is_finite() {
        level.clamp(0.2, 1.4)
    } else {
        0.9
    };

    let mut pitch = ParamTimeline::new(120.0);
    pitch.set_value_at(0.0, 120.0);
    pitch.exponential_ramp_to(0.18, 48.0);
    let freq = pitch.render(sample_rate, len);

    let mut env = ParamTimeline::new(1e-4);
    env.set_value_at(0.0, 1e-4);
    env.exponential_ramp_to(0.005, 1.0);
    env.exponential_ramp_to(0.18, 1e-4);
    let amp = env.render(sample_rate, len);

    let mut phase = 0.0_f64;
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        out.push((TWO_PI * phase).sin() * amp[i] * gain);
        phase += freq[i] / sample_rate;
    }
    out
}
