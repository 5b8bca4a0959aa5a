//! The static trait catalog and the per-trait harmonic mapping.

use std::f64::consts::FRAC_PI_2;

/// Amplitude, frequency ratio and phase derived from one trait value.
///
/// `freq` is a ratio against the renderer's reference pitch, not Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicParams {
    /// Amplitude in [0, 1].
    pub amp: f64,
    /// Frequency ratio, >= 1.
    pub freq: f64,
    /// Phase offset in radians; sign follows the pole.
    pub phase: f64,
}

/// One personality axis.
///
/// `poles[0]` is the pole a negative value leans toward, `poles[1]` the
/// positive one. The key is the stable identifier used by trait values,
/// share tokens and the composer's modulation routing.
#[derive(Debug, Clone, Copy)]
pub struct TraitDef {
    /// Stable identifier.
    pub key: &'static str,
    /// Human-readable axis name.
    pub name: &'static str,
    /// Negative and positive pole labels.
    pub poles: [&'static str; 2],
    /// One-line description of the axis.
    pub description: &'static str,
    /// How this axis is heard in the composed piece.
    pub music_hint: &'static str,
    /// Frequency ratio this trait's harmonic sits at.
    base_ratio: f64,
}

impl TraitDef {
    /// Maps a slider value to this trait's harmonic contribution.
    ///
    /// Total over all inputs: the value is clamped to [-1, 1] and a
    /// non-finite input maps to the neutral harmonic (zero amplitude).
    pub fn to_harmonic(&self, value: f64) -> HarmonicParams {
        let v = if value.is_finite() {
            value.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        HarmonicParams {
            amp: v.abs(),
            freq: self.base_ratio,
            phase: v * FRAC_PI_2,
        }
    }
}

/// The full catalog, in declaration order.
///
/// Order is load-bearing: index = harmonic `color_index` = composer voice
/// ordering. Base ratios are staggered so each axis occupies its own rung
/// of the harmonic ladder.
pub const TRAITS: &[TraitDef] = &[
    TraitDef {
        key: "extravert-introvert",
        name: "Orientation",
        poles: ["Introverted", "Extraverted"],
        description: "Where attention and energy are directed: inward or outward.",
        music_hint: "widens the stereo field and lengthens the echo",
        base_ratio: 1.0,
    },
    TraitDef {
        key: "intuition-sensing",
        name: "Perception",
        poles: ["Sensing", "Intuitive"],
        description: "Preference for concrete detail versus abstract possibility.",
        music_hint: "shifts melodic voices up or down an octave",
        base_ratio: 1.5,
    },
    TraitDef {
        key: "logic-ethics",
        name: "Judgment",
        poles: ["Ethical", "Logical"],
        description: "Decisions weighed by impersonal structure or by human value.",
        music_hint: "hard square versus soft triangle voice character",
        base_ratio: 2.0,
    },
    TraitDef {
        key: "rational-irrational",
        name: "Regulation",
        poles: ["Rational", "Irrational"],
        description: "Living by plan and closure, or by flow and improvisation.",
        music_hint: "sawtooth bite, attack and release shaping",
        base_ratio: 2.5,
    },
    TraitDef {
        key: "carefree-farsighted",
        name: "Foresight",
        poles: ["Carefree", "Farsighted"],
        description: "Improvising around problems versus providing for them ahead.",
        music_hint: "note density and syncopation",
        base_ratio: 3.0,
    },
    TraitDef {
        key: "yielding-obstinate",
        name: "Persistence",
        poles: ["Yielding", "Obstinate"],
        description: "How easily a taken position is given up.",
        music_hint: "master compression drive",
        base_ratio: 3.5,
    },
    TraitDef {
        key: "static-dynamic",
        name: "Motion",
        poles: ["Static", "Dynamic"],
        description: "The world seen as states or as continuous change.",
        music_hint: "swing feel",
        base_ratio: 4.0,
    },
    TraitDef {
        key: "democratic-aristocratic",
        name: "Grouping",
        poles: ["Democratic", "Aristocratic"],
        description: "People met as individuals or as members of their circles.",
        music_hint: "stereo width",
        base_ratio: 4.5,
    },
    TraitDef {
        key: "tactics-strategy",
        name: "Planning",
        poles: ["Strategic", "Tactical"],
        description: "Steering by distant goals or by the next concrete step.",
        music_hint: "phrase density",
        base_ratio: 5.0,
    },
    TraitDef {
        key: "constructivist-emotivist",
        name: "Contact",
        poles: ["Constructivist", "Emotivist"],
        description: "Leading interactions with matter-of-fact help or with mood.",
        music_hint: "echo send level",
        base_ratio: 5.5,
    },
    TraitDef {
        key: "positivist-negativist",
        name: "Polarity",
        poles: ["Negativist", "Positivist"],
        description: "Framing situations by what is present or by what is missing.",
        music_hint: "filter brightness",
        base_ratio: 6.0,
    },
    TraitDef {
        key: "questioning-declaring",
        name: "Address",
        poles: ["Declaring", "Questioning"],
        description: "Speech that states versus speech that probes.",
        music_hint: "detune jitter",
        base_ratio: 6.5,
    },
    TraitDef {
        key: "judicious-decisive",
        name: "Resolve",
        poles: ["Judicious", "Decisive"],
        description: "Comfort in deliberation versus comfort in mobilization.",
        music_hint: "kick drum weight",
        base_ratio: 7.0,
    },
    TraitDef {
        key: "merry-serious",
        name: "Mood",
        poles: ["Serious", "Merry"],
        description: "Emotional atmosphere as a goal in itself, or as a byproduct.",
        music_hint: "tempo and scale choice",
        base_ratio: 7.5,
    },
    TraitDef {
        key: "process-result",
        name: "Completion",
        poles: ["Result", "Process"],
        description: "Immersion in the doing versus orientation to the outcome.",
        music_hint: "swing amount and kick weight",
        base_ratio: 8.0,
    },
];

/// Looks up a trait by key.
pub fn trait_by_key(key: &str) -> Option<&'static TraitDef> {
    TRAITS.iter().find(|t| t.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_keys_are_unique() {
        for (i, a) in TRAITS.iter().enumerate() {
            for b in &TRAITS[i + 1..] {
                assert_ne!(a.key, b.key);
            }
        }
    }

    #[test]
    fn test_to_harmonic_is_total_and_finite() {
        let steps = 201;
        for t in TRAITS {
            for i in 0..steps {
                let v = -1.0 + 2.0 * i as f64 / (steps - 1) as f64;
                let h = t.to_harmonic(v);
                assert!(h.amp.is_finite());
                assert!(h.freq.is_finite());
                assert!(h.phase.is_finite());
                assert!(h.amp >= 0.0 && h.amp <= 1.0);
            }
        }
    }

    #[test]
    fn test_to_harmonic_tolerates_bad_input() {
        let t = &TRAITS[0];
        for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 5.0, -5.0] {
            let h = t.to_harmonic(v);
            assert!(h.amp.is_finite());
            assert!(h.freq.is_finite());
            assert!(h.phase.is_finite());
        }
        // Out of range clamps rather than extrapolates
        assert_eq!(t.to_harmonic(5.0).amp, 1.0);
        // Non-finite input is neutral
        assert_eq!(t.to_harmonic(f64::NAN).amp, 0.0);
    }

    #[test]
    fn test_phase_sign_follows_pole() {
        let t = trait_by_key("merry-serious").unwrap();
        assert!(t.to_harmonic(0.8).phase > 0.0);
        assert!(t.to_harmonic(-0.8).phase < 0.0);
        assert_eq!(t.to_harmonic(0.0).phase, 0.0);
    }
}
