//! The step scheduler and music render.
//!
//! A fixed-length grid of eighth-note steps spans the piece. Every step
//! carries a closed hat, every fourth a kick; each pooled melodic voice
//! passes a deterministic gate per step and, when it sounds, gets its
//! synthesis parameters derived from the harmonic that owns it plus the
//! global trait scores. Events render into dry left/right buses and a
//! mono echo send, which the signal graph folds into the mastered
//! stereo output.

use sonotype_spec::{score_map, Harmonic, ScoreMap};

use sonotype_backend_audio::error::{AudioError, AudioResult};
use sonotype_backend_audio::graph::{CompressorParams, SignalGraph};
use sonotype_backend_audio::mixer::{add_at, equal_power_pan, MixerOutput, StereoOutput};
use sonotype_backend_audio::oscillator::Waveform;
use sonotype_backend_audio::rng::create_component_rng;

use crate::modulation::{derive, Target};
use crate::percussion::{render_hat, render_kick};
use crate::scale::{quantize_to_scale, DEFAULT_SCALE, MAJOR_PENTATONIC};
use crate::voice::{render_voice, VoiceEvent};

/// Default piece length in seconds.
pub const DEFAULT_DURATION: f64 = 16.0;

/// Melodic voice pool size.
pub const VOICE_POOL: usize = 8;

/// Reference pitch multiplied by each harmonic's frequency ratio.
const BASE_PITCH_HZ: f64 = 220.0;

/// Lead-in before the first step.
const LEAD_IN_S: f64 = 0.05;

/// Echo feedback and tone are fixed; only the time and send level move
/// with the profile.
const FX_FEEDBACK: f64 = 0.32;
const FX_TONE_HZ: f64 = 4200.0;

/// Master output gain.
const MASTER_GAIN: f64 = 0.9;

/// Global parameters of one composed piece.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MusicParams {
    /// Tempo in BPM, already rounded to a whole beat.
    pub tempo_bpm: f64,
    /// Swing fraction applied to every second step.
    pub swing: f64,
    /// Stereo width for the pan law.
    pub stereo_width: f64,
    /// Oscillator shape shared by the whole piece.
    pub shape: Waveform,
    /// True when the merry pentatonic table is active.
    pub merry_scale: bool,
    /// Echo send level.
    pub fx_send: f64,
    /// Echo delay time in seconds.
    pub fx_delay_time: f64,
    /// Kick level.
    pub kick_level: f64,
    /// Master compressor threshold in dBFS.
    pub comp_threshold_db: f64,
    /// Master compressor ratio.
    pub comp_ratio: f64,
}

impl MusicParams {
    /// Derives all global parameters from the score map.
    pub fn from_scores(scores: &ScoreMap) -> Self {
        Self {
            tempo_bpm: derive(Target::TempoBpm, scores).round(),
            swing: derive(Target::Swing, scores),
            stereo_width: derive(Target::StereoWidth, scores),
            shape: choose_shape(scores),
            merry_scale: scores.get("merry-serious") > 0.0,
            fx_send: derive(Target::FxSend, scores),
            fx_delay_time: derive(Target::FxDelayTime, scores),
            kick_level: derive(Target::KickLevel, scores),
            comp_threshold_db: derive(Target::CompThresholdDb, scores),
            comp_ratio: derive(Target::CompRatio, scores),
        }
    }

    /// The active note table.
    pub fn scale(&self) -> &'static [i32] {
        if self.merry_scale {
            MAJOR_PENTATONIC
        } else {
            DEFAULT_SCALE
        }
    }
}

/// Picks the oscillator shape from the judgment and regulation axes.
///
/// Held constant for the whole piece; the decision table is global, not
/// per voice.
fn choose_shape(scores: &ScoreMap) -> Waveform {
    let tf = scores.get("logic-ethics");
    let pj = scores.get("rational-irrational");
    if tf > 0.4 && pj < 0.0 {
        Waveform::Square
    } else if pj > 0.4 {
        Waveform::Sawtooth
    } else if tf < -0.4 {
        Waveform::Triangle
    } else {
        Waveform::Sine
    }
}

/// Selects the top-K harmonics by absolute amplitude, descending.
///
/// The sort is stable, so harmonics of equal weight keep their catalog
/// order inside the pool.
pub fn voice_pool(harmonics: &[Harmonic], k: usize) -> Vec<&Harmonic> {
    let mut pool: Vec<&Harmonic> = harmonics.iter().collect();
    pool.sort_by(|a, b| {
        sanitize(b.amp, 0.0)
            .abs()
            .total_cmp(&sanitize(a.amp, 0.0).abs())
    });
    pool.truncate(k);
    pool
}

/// The deterministic voice gate, in [0, 1].
///
/// A sine hash of voice and step index, not a seeded RNG; the schedule
/// must reproduce exactly across runs and across seeds.
pub fn voice_gate(voice_index: usize, step_index: usize) -> f64 {
    ((voice_index as f64 + 1.0) * 53.17 + step_index as f64 * 0.77).sin() * 0.5 + 0.5
}

/// Gate threshold: the voice sounds when the gate falls below this.
///
/// Quieter voices drop out more, tactics and carefree profiles densify
/// the phrase, strategy and farsightedness thin it.
pub fn gate_threshold(activity: f64, scores: &ScoreMap) -> f64 {
    let tac = scores.get("tactics-strategy");
    let care = scores.get("carefree-farsighted");
    // Tactics densify symmetrically; foresight thins more than
    // carelessness thickens.
    let density_bias = 0.12 * tac + if care > 0.0 { -0.08 * care } else { 0.06 * -care };
    0.55 + 0.35 * activity.clamp(0.0, 1.0) + density_bias
}

fn sanitize(value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        default
    }
}

/// Clamps a derived per-voice parameter, masking non-finite input.
fn finite_clamp(value: f64, min: f64, max: f64, default: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        default
    }
}

/// Builds the voice event for one (voice, step) slot.
fn voice_event(
    h: &Harmonic,
    vi: usize,
    si: usize,
    t0: f64,
    params: &MusicParams,
    scores: &ScoreMap,
) -> VoiceEvent {
    let activity = sanitize(h.amp, 0.0).abs();
    let score = sanitize(h.score, 0.0);
    let freq_ratio = sanitize(h.freq, 1.0);

    let base = quantize_to_scale(freq_ratio * BASE_PITCH_HZ, params.scale());
    let mut octave = match vi % 3 {
        0 => 0.5,
        1 => 1.0,
        _ => 2.0,
    };
    let ns = scores.get("intuition-sensing");
    if ns > 0.3 {
        octave *= 2.0;
    } else if ns < -0.3 {
        octave *= 0.5;
    }

    let pan = match h.pan {
        Some(p) if p.is_finite() => p.clamp(-1.0, 1.0),
        _ => (vi as f64 * 0.9 + si as f64 * 0.2).sin().clamp(-1.0, 1.0),
    };

    let qd = scores.get("questioning-declaring");
    let jitter = if qd > 0.0 { qd * 6.0 } else { 0.0 };
    let detune = score * 8.0 + jitter * (si as f64 * 0.31 + vi as f64 * 0.7).sin();

    let brightness = scores.get("positivist-negativist").max(0.0);
    let cutoff = finite_clamp(
        1800.0 + 3400.0 * (0.5 + score * 0.5) + 800.0 * brightness,
        200.0,
        12_000.0,
        3000.0,
    );
    let q = finite_clamp(0.8 + 0.6 * activity, 1e-4, 20.0, 0.8);

    let pj = scores.get("rational-irrational");
    let tac = scores.get("tactics-strategy");
    let attack = finite_clamp(
        0.01 + 0.05 * (1.0 - score.abs()) + 0.03 * pj.max(0.0),
        0.001,
        0.25,
        0.02,
    );
    let release = finite_clamp(
        0.28 + 0.5 * (0.5 + score * 0.5) + 0.25 * (-pj).max(0.0) + 0.2 * (-tac).max(0.0),
        0.12,
        1.6,
        0.4,
    );

    VoiceEvent {
        start: t0,
        freq: base * octave,
        amp: 0.10 + 0.35 * activity * activity,
        pan,
        shape: params.shape,
        detune,
        cutoff,
        q,
        attack,
        release,
    }
}

/// Composes and renders the piece to stereo.
///
/// Deterministic: equal harmonics, duration, sample rate and seed give a
/// byte-identical buffer, and the note schedule itself ignores the seed
/// entirely (only percussion noise timbre and nothing else draws from
/// it).
pub fn render_music(
    harmonics: &[Harmonic],
    seconds: f64,
    sample_rate: f64,
    seed: u32,
) -> AudioResult<StereoOutput> {
    if !sample_rate.is_finite() || !(8000.0..=192_000.0).contains(&sample_rate) {
        return Err(AudioError::InvalidSampleRate { rate: sample_rate });
    }
    if !seconds.is_finite() || seconds < 1.0 || seconds > 600.0 {
        return Err(AudioError::InvalidDuration { duration: seconds });
    }
    let length = (seconds * sample_rate).floor() as usize;

    let scores = score_map(harmonics);
    let params = MusicParams::from_scores(&scores);
    let pool = voice_pool(harmonics, VOICE_POOL);

    let beat = 60.0 / params.tempo_bpm;
    let step = beat / 2.0;
    let total_steps = ((seconds - 2.0 * LEAD_IN_S) / step).floor() as usize;

    let mut dry_l = vec![0.0; length];
    let mut dry_r = vec![0.0; length];
    let mut fx_bus = vec![0.0; length];

    let hat = render_hat(sample_rate, &mut create_component_rng(seed, "hat"));
    let kick = render_kick(sample_rate, params.kick_level);

    for si in 0..total_steps {
        let t_base = LEAD_IN_S + si as f64 * step;
        let t0 = if si % 2 == 1 {
            t_base + params.swing * step
        } else {
            t_base
        };
        let offset = (t0 * sample_rate) as usize;

        add_at(&mut dry_l, offset, &hat, 1.0);
        add_at(&mut dry_r, offset, &hat, 1.0);

        if si % 4 == 0 {
            add_at(&mut dry_l, offset, &kick, 1.0);
            add_at(&mut dry_r, offset, &kick, 1.0);
        }

        for (vi, h) in pool.iter().enumerate() {
            let activity = sanitize(h.amp, 0.0).abs();
            if voice_gate(vi, si) >= gate_threshold(activity, &scores) {
                continue;
            }

            let event = voice_event(h, vi, si, t0, &params, &scores);
            let rendered = render_voice(&event, sample_rate);
            let (gain_l, gain_r) = equal_power_pan(event.pan, params.stereo_width);

            add_at(&mut dry_l, offset, &rendered, gain_l);
            add_at(&mut dry_r, offset, &rendered, gain_r);
            add_at(&mut fx_bus, offset, &rendered, params.fx_send);
        }
    }

    master(dry_l, dry_r, fx_bus, &params, sample_rate, length)
}

/// Folds the buses through the echo and the master chain.
fn master(
    dry_l: Vec<f64>,
    dry_r: Vec<f64>,
    fx_bus: Vec<f64>,
    params: &MusicParams,
    sample_rate: f64,
    length: usize,
) -> AudioResult<StereoOutput> {
    let mut graph = SignalGraph::new(sample_rate, length)?;

    let fx_src = graph.add_source_mono(fx_bus);
    let echo = graph.add_delay_feedback(params.fx_delay_time, FX_FEEDBACK, FX_TONE_HZ);
    let wet_l = graph.add_gain(0.9);
    let wet_r = graph.add_gain(0.9);

    let dry_l_src = graph.add_source_mono(dry_l);
    let dry_r_src = graph.add_source_mono(dry_r);
    let bus_l = graph.add_gain(1.0);
    let bus_r = graph.add_gain(1.0);

    let merge = graph.add_merge();
    let comp = graph.add_compressor(CompressorParams {
        threshold_db: params.comp_threshold_db,
        knee_db: 12.0,
        ratio: params.comp_ratio,
        attack_s: 0.006,
        release_s: 0.18,
    });
    let out = graph.add_gain(MASTER_GAIN);

    graph.connect(fx_src, echo)?;
    graph.connect(echo, wet_l)?;
    graph.connect(echo, wet_r)?;
    graph.connect(wet_l, bus_l)?;
    graph.connect(wet_r, bus_r)?;
    graph.connect(dry_l_src, bus_l)?;
    graph.connect(dry_r_src, bus_r)?;
    graph.connect(bus_l, merge)?;
    graph.connect(bus_r, merge)?;
    graph.connect(merge, comp)?;
    graph.connect(comp, out)?;

    match graph.render(out)? {
        MixerOutput::Stereo(stereo) => Ok(stereo),
        MixerOutput::Mono(_) => Err(AudioError::graph("music master must be stereo")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonotype_spec::{harmonics_from_values, TraitValues};

    fn harmonics_with(pairs: &[(&str, f64)]) -> Vec<Harmonic> {
        let mut values = TraitValues::neutral();
        for (key, v) in pairs {
            values.set(key, *v).unwrap();
        }
        harmonics_from_values(&values)
    }

    #[test]
    fn test_gate_is_deterministic_and_bounded() {
        for vi in 0..8 {
            for si in 0..64 {
                let g = voice_gate(vi, si);
                assert!((0.0..=1.0).contains(&g));
                assert_eq!(g, voice_gate(vi, si));
            }
        }
    }

    #[test]
    fn test_quiet_voices_drop_out_more() {
        let scores = score_map(&harmonics_with(&[]));
        let loud = gate_threshold(1.0, &scores);
        let quiet = gate_threshold(0.0, &scores);
        assert!(loud > quiet);

        let steps = 256;
        let sounding = |threshold: f64| {
            (0..steps)
                .filter(|&si| voice_gate(0, si) < threshold)
                .count()
        };
        assert!(sounding(loud) > sounding(quiet));
    }

    #[test]
    fn test_density_bias_direction() {
        let tactical = score_map(&harmonics_with(&[("tactics-strategy", 1.0)]));
        let strategic = score_map(&harmonics_with(&[("tactics-strategy", -1.0)]));
        assert!(gate_threshold(0.5, &tactical) > gate_threshold(0.5, &strategic));

        let carefree = score_map(&harmonics_with(&[("carefree-farsighted", -1.0)]));
        let farsighted = score_map(&harmonics_with(&[("carefree-farsighted", 1.0)]));
        assert!(gate_threshold(0.5, &carefree) > gate_threshold(0.5, &farsighted));
    }

    #[test]
    fn test_dominant_trait_leads_the_pool() {
        let harmonics = harmonics_with(&[("questioning-declaring", 1.0), ("merry-serious", 0.2)]);
        let pool = voice_pool(&harmonics, VOICE_POOL);
        assert_eq!(pool.len(), VOICE_POOL);
        assert_eq!(pool[0].key, "questioning-declaring");
        assert!((pool[0].amp - 1.0).abs() < 1e-12);
        assert_eq!(pool[1].key, "merry-serious");

        // The dominant voice actually sounds: with activity 1 the
        // threshold clears 0.55 + 0.35, so most gates pass.
        let scores = score_map(&harmonics);
        let sounding = (0..64)
            .filter(|&si| voice_gate(0, si) < gate_threshold(1.0, &scores))
            .count();
        assert!(sounding > 32);
    }

    #[test]
    fn test_pool_ties_keep_catalog_order() {
        let harmonics = harmonics_with(&[]);
        let pool = voice_pool(&harmonics, 4);
        let indices: Vec<usize> = pool.iter().map(|h| h.color_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_shape_decision_table() {
        let shape = |pairs: &[(&str, f64)]| MusicParams::from_scores(&score_map(&harmonics_with(pairs))).shape;
        assert_eq!(
            shape(&[("logic-ethics", 0.8), ("rational-irrational", -0.5)]),
            Waveform::Square
        );
        assert_eq!(shape(&[("rational-irrational", 0.8)]), Waveform::Sawtooth);
        assert_eq!(shape(&[("logic-ethics", -0.8)]), Waveform::Triangle);
        assert_eq!(shape(&[]), Waveform::Sine);
    }

    #[test]
    fn test_scale_follows_mood() {
        let merry = MusicParams::from_scores(&score_map(&harmonics_with(&[("merry-serious", 0.5)])));
        assert!(merry.merry_scale);
        assert_eq!(merry.scale(), MAJOR_PENTATONIC);
        let serious =
            MusicParams::from_scores(&score_map(&harmonics_with(&[("merry-serious", -0.5)])));
        assert_eq!(serious.scale(), DEFAULT_SCALE);
    }

    #[test]
    fn test_render_is_deterministic_for_fixed_seed() {
        let harmonics = harmonics_with(&[("merry-serious", 0.6), ("logic-ethics", 0.5)]);
        let a = render_music(&harmonics, 2.0, 22050.0, 42).unwrap();
        let b = render_music(&harmonics, 2.0, 22050.0, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_render_produces_audible_stereo() {
        let harmonics = harmonics_with(&[
            ("merry-serious", 0.8),
            ("extravert-introvert", 0.7),
            ("process-result", -0.6),
        ]);
        let out = render_music(&harmonics, 2.0, 22050.0, 1).unwrap();
        assert_eq!(out.len(), 44100);
        let peak = out
            .left
            .iter()
            .chain(out.right.iter())
            .fold(0.0_f64, |p, s| p.max(s.abs()));
        assert!(peak > 0.01);
        assert!(out.left.iter().all(|s| s.is_finite()));
        assert!(out.right.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_render_rejects_bad_parameters() {
        let harmonics = harmonics_with(&[]);
        assert!(render_music(&harmonics, 0.1, 48000.0, 1).is_err());
        assert!(render_music(&harmonics, 16.0, 100.0, 1).is_err());
        assert!(render_music(&harmonics, f64::NAN, 48000.0, 1).is_err());
    }

    #[test]
    fn test_masked_scores_never_reach_the_schedule() {
        let mut harmonics = harmonics_with(&[("merry-serious", 0.9)]);
        harmonics[0].score = f64::NAN;
        harmonics[0].amp = f64::NAN;
        harmonics[1].freq = f64::INFINITY;
        let out = render_music(&harmonics, 1.5, 22050.0, 9).unwrap();
        assert!(out.left.iter().all(|s| s.is_finite()));
    }
}
