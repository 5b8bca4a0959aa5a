//! Trait colorization of user audio.
//!
//! Takes an externally decoded mono buffer and tilts it toward the
//! current personality profile: shelf EQ from overall intensity, a
//! peaking tilt from phase polarity, an LFO auto-filter, a step gate and
//! a slow auto-pan, ending in a compressor. The input buffer is never
//! mutated; colorization always produces a new stereo buffer.

use sonotype_spec::Harmonic;

use crate::automation::ParamTimeline;
use crate::error::{AudioError, AudioResult};
use crate::graph::{CompressorParams, FilterParams, SignalGraph};
use crate::mixer::{equal_power_pan, MixerOutput, StereoOutput};

/// Gate tempo; the colorization pulse is fixed at a moderate 96 BPM.
const GATE_BPM: f64 = 96.0;

/// Profile scalars the effect chain is tuned by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorProfile {
    /// Mean absolute harmonic amplitude.
    pub mean_amp: f64,
    /// Amplitude-weighted mean frequency ratio.
    pub brightness: f64,
    /// Sign-weighted mean amplitude by phase, in [-1, 1].
    pub polarity: f64,
}

impl ColorProfile {
    /// Derives the colorization scalars from a harmonic set.
    ///
    /// Harmonic fields are sanitized per the input contract; an empty
    /// set produces the neutral profile.
    pub fn from_harmonics(harmonics: &[Harmonic]) -> Self {
        let n = harmonics.len().max(1) as f64;
        let mut mean_amp = 0.0;
        let mut brightness = 0.0;
        let mut polarity = 0.0;
        for h in harmonics {
            let amp = if h.amp.is_finite() { h.amp.abs() } else { 0.0 };
            let freq = if h.freq.is_finite() { h.freq } else { 0.0 };
            let phase = if h.phase.is_finite() { h.phase } else { 0.0 };
            mean_amp += amp;
            brightness += freq * amp;
            polarity += if phase >= 0.0 { amp } else { -amp };
        }
        Self {
            mean_amp: mean_amp / n,
            brightness: brightness / n,
            polarity: polarity / n,
        }
    }
}

/// Builds the gate timeline: a two-level pump per four-beat bar with a
/// linear recovery over 40% of each eighth-note step.
fn gate_timeline(seconds: f64) -> ParamTimeline {
    let beat = 60.0 / GATE_BPM;
    let step = beat / 2.0;
    let mut gate = ParamTimeline::new(1.0);
    let mut t = 0.0;
    while t < seconds {
        let in_bar = t % (beat * 4.0);
        let level = if in_bar < beat * 2.5 { 0.85 } else { 0.55 };
        gate.set_value_at(t, level);
        gate.linear_ramp_to(t + step * 0.4, 1.0);
        t += step;
    }
    gate
}

/// Applies the profile to a mono buffer, producing a new stereo buffer.
pub fn colorize(
    samples: &[f64],
    sample_rate: f64,
    harmonics: &[Harmonic],
) -> AudioResult<StereoOutput> {
    if samples.is_empty() {
        return Err(AudioError::EmptyBuffer);
    }
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(AudioError::InvalidSampleRate { rate: sample_rate });
    }

    let profile = ColorProfile::from_harmonics(harmonics);
    let seconds = samples.len() as f64 / sample_rate;

    let mut graph = SignalGraph::new(sample_rate, samples.len())?;
    let src = graph.add_source_mono(samples.to_vec());

    let lo = graph.add_filter(FilterParams::low_shelf(140.0, 3.0 * profile.mean_amp));
    let tilt = graph.add_filter(FilterParams::peaking(
        1200.0,
        0.6,
        profile.polarity * 2.2,
    ));
    let hi_gain = if profile.brightness > 1.2 { 3.0 } else { 1.0 };
    let hi = graph.add_filter(FilterParams::high_shelf(6500.0, hi_gain));

    let auto_filter = graph.add_filter(
        FilterParams::lowpass(8000.0, 1.0).with_cutoff_lfo(
            0.15 + 0.5 * profile.mean_amp,
            3200.0 + 2400.0 * profile.mean_amp,
        ),
    );

    let gate = graph.add_gain_timeline(gate_timeline(seconds));

    // Auto-pan: both sides start at equal power and breathe in opposite
    // directions around it.
    let (base_l, base_r) = equal_power_pan(0.0, 1.0);
    let pan_rate = 0.08 + 0.18 * profile.mean_amp;
    let pan_depth = 0.6 * profile.mean_amp;
    let left = graph.add_gain_lfo(base_l, pan_rate, pan_depth);
    let right = graph.add_gain_lfo(base_r, pan_rate, -pan_depth);

    let merge = graph.add_merge();
    let comp = graph.add_compressor(CompressorParams {
        threshold_db: -18.0,
        knee_db: 12.0,
        ratio: 3.0,
        attack_s: 0.004,
        release_s: 0.22,
    });

    graph.connect(src, lo)?;
    graph.connect(lo, tilt)?;
    graph.connect(tilt, hi)?;
    graph.connect(hi, auto_filter)?;
    graph.connect(auto_filter, gate)?;
    graph.connect(gate, left)?;
    graph.connect(gate, right)?;
    graph.connect(left, merge)?;
    graph.connect(right, merge)?;
    graph.connect(merge, comp)?;

    match graph.render(comp)? {
        MixerOutput::Stereo(stereo) => Ok(stereo),
        MixerOutput::Mono(_) => Err(AudioError::graph("colorization must end stereo")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oscillator::TWO_PI;
    use sonotype_spec::{harmonics_from_values, TraitValues};

    fn tone(freq: f64, sample_rate: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| 0.5 * (TWO_PI * freq * i as f64 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_profile_of_neutral_harmonics() {
        let harmonics = harmonics_from_values(&TraitValues::neutral());
        let p = ColorProfile::from_harmonics(&harmonics);
        assert_eq!(p.mean_amp, 0.0);
        assert_eq!(p.brightness, 0.0);
        assert_eq!(p.polarity, 0.0);
    }

    #[test]
    fn test_polarity_follows_phase_signs() {
        let mut values = TraitValues::neutral();
        values.set("merry-serious", 1.0).unwrap();
        let p = ColorProfile::from_harmonics(&harmonics_from_values(&values));
        assert!(p.polarity > 0.0);

        values.set("merry-serious", -1.0).unwrap();
        let p = ColorProfile::from_harmonics(&harmonics_from_values(&values));
        assert!(p.polarity < 0.0);
    }

    #[test]
    fn test_colorize_produces_new_stereo_buffer() {
        let sr = 48000.0;
        let input = tone(440.0, sr, 48000);
        let snapshot = input.clone();
        let mut values = TraitValues::neutral();
        values.set("positivist-negativist", 0.8).unwrap();
        values.set("extravert-introvert", 0.5).unwrap();
        let harmonics = harmonics_from_values(&values);

        let out = colorize(&input, sr, &harmonics).unwrap();
        assert_eq!(out.left.len(), input.len());
        assert_eq!(out.right.len(), input.len());
        assert!(out.left.iter().all(|s| s.is_finite()));
        assert!(out.right.iter().all(|s| s.is_finite()));
        // Input untouched
        assert_eq!(input, snapshot);
        // Something actually came through
        let peak = out.left.iter().fold(0.0_f64, |p, s| p.max(s.abs()));
        assert!(peak > 0.01);
    }

    #[test]
    fn test_colorize_rejects_empty_input() {
        let harmonics = harmonics_from_values(&TraitValues::neutral());
        assert!(matches!(
            colorize(&[], 48000.0, &harmonics),
            Err(AudioError::EmptyBuffer)
        ));
    }

    #[test]
    fn test_gate_timeline_pumps_and_recovers() {
        let gate = gate_timeline(4.0);
        let beat = 60.0 / GATE_BPM;
        // Start of a bar sits at the high gate level.
        assert!((gate.value_at(0.0) - 0.85).abs() < 1e-9);
        // Late in the bar the gate dips lower.
        let late = 3.0 * beat;
        assert!((gate.value_at(late) - 0.55).abs() < 1e-9);
        // Recovery reaches unity before the next step.
        assert!((gate.value_at(late + beat * 0.25) - 1.0).abs() < 1e-9);
    }
}
