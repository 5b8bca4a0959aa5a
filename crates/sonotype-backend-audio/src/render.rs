//! Additive signal render.
//!
//! Sums the harmonic set into a slowly LFO-modulated waveform, shapes it
//! with raised-cosine attack/release edges, normalizes the peak and runs
//! the result through a fixed mastering chain. Offline and snapshot
//! driven: the harmonic set is read once, the buffer comes back complete.

use sonotype_spec::Harmonic;

use crate::error::{AudioError, AudioResult};
use crate::graph::{CompressorParams, FilterParams, SignalGraph};
use crate::mixer::{normalize_peak, MixerOutput};
use crate::oscillator::TWO_PI;

/// Headroom applied before normalization.
const HEADROOM: f64 = 0.38;

/// Peak ceiling after normalization.
const PEAK_CEILING: f64 = 0.98;

/// Attack edge length in seconds.
const ATTACK_S: f64 = 0.035;

/// Release edge length in seconds.
const RELEASE_S: f64 = 0.16;

/// LFO period: one cycle every 3.2 seconds (~0.31 Hz).
const LFO_PERIOD_S: f64 = 3.2;

/// Renders the harmonic set to a mono buffer.
///
/// The LFO depth rides the mean harmonic amplitude (0.02 at neutral up
/// to 0.07 at full tilt), so near-silent profiles do not shimmer.
/// Harmonic fields are sanitized per the input contract: non-finite amp
/// and phase read as 0, non-finite freq as 1.
pub fn render_signal(
    harmonics: &[Harmonic],
    seconds: f64,
    sample_rate: f64,
) -> AudioResult<Vec<f64>> {
    if !sample_rate.is_finite() || !(8000.0..=192_000.0).contains(&sample_rate) {
        return Err(AudioError::InvalidSampleRate { rate: sample_rate });
    }
    if !seconds.is_finite() || seconds <= 0.0 || seconds > 600.0 {
        return Err(AudioError::InvalidDuration { duration: seconds });
    }
    let length = (seconds * sample_rate).floor() as usize;
    if length < 2 {
        return Err(AudioError::InvalidDuration { duration: seconds });
    }

    let parts: Vec<(f64, f64, f64)> = harmonics
        .iter()
        .map(|h| {
            let amp = if h.amp.is_finite() { h.amp } else { 0.0 };
            let freq = if h.freq.is_finite() { h.freq } else { 1.0 };
            let phase = if h.phase.is_finite() { h.phase } else { 0.0 };
            (amp, freq, phase)
        })
        .collect();

    let mean_amp = if parts.is_empty() {
        0.0
    } else {
        parts.iter().map(|(a, _, _)| a.abs()).sum::<f64>() / parts.len() as f64
    };
    let lfo_depth = 0.02 + 0.05 * mean_amp;
    let lfo_step = TWO_PI / (sample_rate * LFO_PERIOD_S);

    let attack_samples = (sample_rate * ATTACK_S).floor() as usize;
    let release_samples = (sample_rate * RELEASE_S).floor() as usize;

    let mut buffer = Vec::with_capacity(length);
    let mut lfo_phase = 0.0_f64;
    for i in 0..length {
        let u = i as f64 / (length - 1) as f64;
        let lfo = lfo_phase.sin();
        let mut sample = 0.0;
        for &(amp, freq, phase) in &parts {
            sample += amp * (TWO_PI * (freq * u + lfo_depth * lfo) + phase).sin();
        }

        let mut env = 1.0;
        if i < attack_samples {
            let a = i as f64 / attack_samples.max(1) as f64;
            env *= (1.0 - (std::f64::consts::PI * a).cos()) * 0.5;
        }
        if i + release_samples + 1 > length {
            let r = (length - 1 - i) as f64 / release_samples.max(1) as f64;
            env *= (1.0 - (std::f64::consts::PI * r).cos()) * 0.5;
        }

        buffer.push(sample * HEADROOM * env);
        lfo_phase += lfo_step;
    }

    normalize_peak(&mut buffer, PEAK_CEILING);
    master(buffer, sample_rate)
}

/// Fixed mastering chain: slight high-shelf cut, slight low-shelf lift,
/// gentle glue compression.
fn master(buffer: Vec<f64>, sample_rate: f64) -> AudioResult<Vec<f64>> {
    let length = buffer.len();
    let mut graph = SignalGraph::new(sample_rate, length)?;
    let src = graph.add_source_mono(buffer);
    let hi_trim = graph.add_filter(FilterParams::high_shelf(9000.0, -1.5));
    let lo_lift = graph.add_filter(FilterParams::low_shelf(120.0, 0.8));
    let comp = graph.add_compressor(CompressorParams {
        threshold_db: -16.0,
        knee_db: 12.0,
        ratio: 3.0,
        attack_s: 0.004,
        release_s: 0.12,
    });
    graph.connect(src, hi_trim)?;
    graph.connect(hi_trim, lo_lift)?;
    graph.connect(lo_lift, comp)?;

    match graph.render(comp)? {
        MixerOutput::Mono(samples) => Ok(samples),
        MixerOutput::Stereo(_) => Err(AudioError::graph("mastering chain must stay mono")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonotype_spec::{harmonics_from_values, TraitValues, TRAITS};

    #[test]
    fn test_neutral_profile_renders_silence() {
        let harmonics = harmonics_from_values(&TraitValues::neutral());
        let buffer = render_signal(&harmonics, 1.0, 48000.0).unwrap();
        let peak = buffer.iter().fold(0.0_f64, |p, s| p.max(s.abs()));
        assert!(peak < 1e-6, "neutral render peaked at {peak}");
    }

    #[test]
    fn test_active_profile_stays_under_ceiling() {
        let mut values = TraitValues::neutral();
        for t in TRAITS {
            values.set(t.key, 1.0).unwrap();
        }
        let harmonics = harmonics_from_values(&values);
        let buffer = render_signal(&harmonics, 2.0, 48000.0).unwrap();
        let peak = buffer.iter().fold(0.0_f64, |p, s| p.max(s.abs()));
        assert!(peak > 0.01, "full-tilt render should be audible");
        assert!(peak <= 1.0, "mastered render must not clip");
        assert!(buffer.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_render_is_deterministic() {
        let mut values = TraitValues::neutral();
        values.set("merry-serious", 0.7).unwrap();
        values.set("logic-ethics", -0.4).unwrap();
        let harmonics = harmonics_from_values(&values);
        let a = render_signal(&harmonics, 1.0, 48000.0).unwrap();
        let b = render_signal(&harmonics, 1.0, 48000.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_edges_are_enveloped() {
        let mut values = TraitValues::neutral();
        values.set("merry-serious", 1.0).unwrap();
        let harmonics = harmonics_from_values(&values);
        let sr = 48000.0;
        let buffer = render_signal(&harmonics, 1.0, sr).unwrap();
        assert!(buffer[0].abs() < 1e-6);
        // The mastering filters carry a short memory, so the final sample
        // is near zero rather than exactly zero.
        assert!(buffer.last().unwrap().abs() < 1e-4);
    }

    #[test]
    fn test_bad_parameters_are_rejected() {
        let harmonics = harmonics_from_values(&TraitValues::neutral());
        assert!(render_signal(&harmonics, 0.0, 48000.0).is_err());
        assert!(render_signal(&harmonics, -1.0, 48000.0).is_err());
        assert!(render_signal(&harmonics, 1.0, 0.0).is_err());
        assert!(render_signal(&harmonics, 1.0, f64::NAN).is_err());
    }

    #[test]
    fn test_non_finite_harmonics_are_masked() {
        let mut harmonics = harmonics_from_values(&TraitValues::neutral());
        harmonics[0].amp = f64::NAN;
        harmonics[1].freq = f64::INFINITY;
        harmonics[2].phase = f64::NAN;
        let buffer = render_signal(&harmonics, 0.5, 48000.0).unwrap();
        assert!(buffer.iter().all(|s| s.is_finite()));
    }
}
