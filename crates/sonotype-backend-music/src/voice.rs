//! The melodic voice model.
//!
//! One voice is three detuned unison oscillators of a shared shape,
//! through a lowpass filter, shaped by a three-stage exponential
//! envelope: attack to full, settle to a 0.25 sustain by 100 ms, release
//! to silence. Rendering is a pure function of the event; events are
//! produced by the scheduler and consumed immediately.

use sonotype_backend_audio::automation::ParamTimeline;
use sonotype_backend_audio::filter::{BiquadCoeffs, BiquadFilter};
use sonotype_backend_audio::oscillator::{sample, PhaseAccumulator, Waveform};

/// Unison spread: +6 and -7 cents around the center oscillator.
const DETUNE_UP_CENTS: f64 = 6.0;
const DETUNE_DOWN_CENTS: f64 = 7.0;

/// Sustain level after the initial transient.
const SUSTAIN_LEVEL: f64 = 0.25;

/// Time at which the envelope settles onto the sustain level.
const SUSTAIN_AT: f64 = 0.10;

/// One scheduled melodic note.
///
/// All parameters arrive already derived and clamped by the scheduler;
/// rendering applies its own last-line clamps so a stray value cannot
/// destabilize the filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceEvent {
    /// Onset time in seconds from the start of the piece.
    pub start: f64,
    /// Center frequency in Hz.
    pub freq: f64,
    /// Peak amplitude.
    pub amp: f64,
    /// Stereo position in [-1, 1].
    pub pan: f64,
    /// Oscillator shape for all three unison voices.
    pub shape: Waveform,
    /// Linear detune in Hz added to each oscillator.
    pub detune: f64,
    /// Lowpass cutoff in Hz.
    pub cutoff: f64,
    /// Lowpass resonance.
    pub q: f64,
    /// Envelope attack in seconds.
    pub attack: f64,
    /// Envelope release in seconds.
    pub release: f64,
}

impl VoiceEvent {
    /// Length of the rendered note, release tail included.
    pub fn duration(&self) -> f64 {
        self.release.clamp(0.2, 1.2) + 0.2
    }
}

/// Renders a voice event to a mono buffer starting at its onset.
pub fn render_voice(event: &VoiceEvent, sample_rate: f64) -> Vec<f64> {
    let num_samples = (event.duration() * sample_rate).ceil() as usize;

    let up = 2.0_f64.powf(DETUNE_UP_CENTS / 1200.0);
    let down = 2.0_f64.powf(-DETUNE_DOWN_CENTS / 1200.0);
    let freqs = [
        (event.freq + event.detune).max(10.0),
        (event.freq * up + event.detune).max(10.0),
        (event.freq * down + event.detune).max(10.0),
    ];

    let amp = event.amp.max(0.0);
    let mut oscs: Vec<PhaseAccumulator> = freqs
        .iter()
        .map(|_| PhaseAccumulator::new(sample_rate))
        .collect();

    let mut buffer = Vec::with_capacity(num_samples);
    for _ in 0..num_samples {
        let mut s = 0.0;
        for (osc, &f) in oscs.iter_mut().zip(freqs.iter()) {
            s += sample(event.shape, osc.advance(f));
        }
        buffer.push(s * amp);
    }

    let cutoff = event.cutoff.clamp(50.0, 20_000.0);
    let q = event.q.clamp(1e-4, 25.0);
    let mut filter = BiquadFilter::new(BiquadCoeffs::lowpass(cutoff, q, sample_rate));
    filter.process_buffer(&mut buffer);

    let mut env = ParamTimeline::new(1e-4);
    env.set_value_at(0.0, 1e-4);
    env.exponential_ramp_to(event.attack.max(0.001), 1.0);
    env.exponential_ramp_to(SUSTAIN_AT, SUSTAIN_LEVEL);
    env.exponential_ramp_to(event.release.max(0.12), 1e-4);
    let curve = env.render(sample_rate, num_samples);
    for (s, e) in buffer.iter_mut().zip(curve.iter()) {
        *s *= e;
    }

    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> VoiceEvent {
        VoiceEvent {
            start: 0.0,
            freq: 440.0,
            amp: 0.3,
            pan: 0.0,
            shape: Waveform::Sine,
            detune: 0.0,
            cutoff: 3000.0,
            q: 0.8,
            attack: 0.02,
            release: 0.4,
        }
    }

    #[test]
    fn test_voice_length_includes_tail() {
        let sr = 48000.0;
        let v = render_voice(&event(), sr);
        assert_eq!(v.len(), ((0.4 + 0.2) * sr).ceil() as usize);
    }

    #[test]
    fn test_voice_starts_and_ends_quiet() {
        let v = render_voice(&event(), 48000.0);
        assert!(v[0].abs() < 1e-3);
        let tail_peak = v[v.len() - 100..].iter().fold(0.0_f64, |p, s| p.max(s.abs()));
        assert!(tail_peak < 0.01);
        let body_peak = v.iter().fold(0.0_f64, |p, s| p.max(s.abs()));
        assert!(body_peak > 0.05);
    }

    #[test]
    fn test_voice_is_deterministic() {
        let a = render_voice(&event(), 48000.0);
        let b = render_voice(&event(), 48000.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_extreme_parameters_stay_finite() {
        let mut e = event();
        e.cutoff = 1e9;
        e.q = 0.0;
        e.detune = -500.0;
        e.release = 0.0;
        let v = render_voice(&e, 48000.0);
        assert!(!v.is_empty());
        assert!(v.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_negative_amp_renders_silence() {
        let mut e = event();
        e.amp = -1.0;
        let v = render_voice(&e, 48000.0);
        assert!(v.iter().all(|&s| s == 0.0));
    }
}
