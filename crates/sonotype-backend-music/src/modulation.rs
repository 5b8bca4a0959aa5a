//! Trait-score modulation routing.
//!
//! Every global musical parameter is derived the same way: a base value,
//! plus declared contributions from named trait scores, clamped into a
//! safe range. The routing lives in one table instead of inline
//! arithmetic so each parameter can be audited and tested on its own,
//! and a non-finite derivation falls back to the target's documented
//! default instead of leaking NaN into the schedule.

use sonotype_spec::ScoreMap;

/// How a score feeds a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `max(score, 0)` - only the positive pole contributes.
    PositivePart,
    /// `max(-score, 0)` - only the negative pole contributes.
    NegativePart,
    /// `|score|` - either pole contributes equally.
    Absolute,
}

impl Shape {
    fn apply(self, score: f64) -> f64 {
        match self {
            Shape::PositivePart => score.max(0.0),
            Shape::NegativePart => (-score).max(0.0),
            Shape::Absolute => score.abs(),
        }
    }
}

/// A derivable global parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Tempo in beats per minute.
    TempoBpm,
    /// Swing fraction applied to every second eighth-note step.
    Swing,
    /// Stereo width multiplier for the pan law.
    StereoWidth,
    /// Echo send level for melodic voices.
    FxSend,
    /// Echo delay time in seconds.
    FxDelayTime,
    /// Kick drum level.
    KickLevel,
    /// Master compressor threshold in dBFS.
    CompThresholdDb,
    /// Master compressor ratio.
    CompRatio,
}

/// Base value, clamp range and non-finite fallback for a target.
#[derive(Debug, Clone, Copy)]
pub struct TargetSpec {
    pub base: f64,
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl Target {
    /// The target's base, range and fallback.
    pub fn spec(self) -> TargetSpec {
        match self {
            Target::TempoBpm => TargetSpec {
                base: 96.0,
                min: 72.0,
                max: 132.0,
                default: 96.0,
            },
            Target::Swing => TargetSpec {
                base: 0.02,
                min: 0.0,
                max: 0.5,
                default: 0.02,
            },
            Target::StereoWidth => TargetSpec {
                base: 0.7,
                min: 0.2,
                max: 1.2,
                default: 0.7,
            },
            Target::FxSend => TargetSpec {
                base: 0.18,
                min: 0.0,
                max: 1.0,
                default: 0.18,
            },
            Target::FxDelayTime => TargetSpec {
                base: 0.18,
                min: 0.05,
                max: 0.5,
                default: 0.23,
            },
            Target::KickLevel => TargetSpec {
                base: 0.9,
                min: 0.2,
                max: 1.4,
                default: 0.9,
            },
            Target::CompThresholdDb => TargetSpec {
                base: -18.0,
                min: -30.0,
                max: -6.0,
                default: -18.0,
            },
            Target::CompRatio => TargetSpec {
                base: 3.4,
                min: 1.0,
                max: 8.0,
                default: 3.4,
            },
        }
    }
}

/// One score contribution to one target.
#[derive(Debug, Clone, Copy)]
pub struct ModRoute {
    pub trait_key: &'static str,
    pub target: Target,
    pub coeff: f64,
    pub shape: Shape,
}

/// The complete routing table.
pub const ROUTES: &[ModRoute] = &[
    // Merry profiles run a little faster.
    ModRoute {
        trait_key: "merry-serious",
        target: Target::TempoBpm,
        coeff: 8.0,
        shape: Shape::PositivePart,
    },
    // Process immersion and dynamics push the groove off the grid.
    ModRoute {
        trait_key: "process-result",
        target: Target::Swing,
        coeff: 0.10,
        shape: Shape::PositivePart,
    },
    ModRoute {
        trait_key: "static-dynamic",
        target: Target::Swing,
        coeff: 0.05,
        shape: Shape::PositivePart,
    },
    // Extraverts and aristocrats spread wide; democrats pull center.
    ModRoute {
        trait_key: "extravert-introvert",
        target: Target::StereoWidth,
        coeff: 0.35,
        shape: Shape::PositivePart,
    },
    ModRoute {
        trait_key: "democratic-aristocratic",
        target: Target::StereoWidth,
        coeff: 0.25,
        shape: Shape::PositivePart,
    },
    ModRoute {
        trait_key: "democratic-aristocratic",
        target: Target::StereoWidth,
        coeff: -0.2,
        shape: Shape::NegativePart,
    },
    // Emotivists and extraverts live in the echo.
    ModRoute {
        trait_key: "constructivist-emotivist",
        target: Target::FxSend,
        coeff: 0.18,
        shape: Shape::PositivePart,
    },
    ModRoute {
        trait_key: "extravert-introvert",
        target: Target::FxSend,
        coeff: 0.12,
        shape: Shape::PositivePart,
    },
    ModRoute {
        trait_key: "extravert-introvert",
        target: Target::FxDelayTime,
        coeff: 0.14,
        shape: Shape::PositivePart,
    },
    // Result orientation and decisiveness hit harder.
    ModRoute {
        trait_key: "process-result",
        target: Target::KickLevel,
        coeff: 0.4,
        shape: Shape::NegativePart,
    },
    ModRoute {
        trait_key: "judicious-decisive",
        target: Target::KickLevel,
        coeff: 0.2,
        shape: Shape::Absolute,
    },
    // Obstinacy leans on the master bus.
    ModRoute {
        trait_key: "yielding-obstinate",
        target: Target::CompThresholdDb,
        coeff: -4.0,
        shape: Shape::PositivePart,
    },
    ModRoute {
        trait_key: "yielding-obstinate",
        target: Target::CompRatio,
        coeff: 1.2,
        shape: Shape::Absolute,
    },
];

/// Derives one target from the routing table.
pub fn derive(target: Target, scores: &ScoreMap) -> f64 {
    let spec = target.spec();
    let mut value = spec.base;
    for route in ROUTES.iter().filter(|r| r.target == target) {
        value += route.coeff * route.shape.apply(scores.get(route.trait_key));
    }
    if !value.is_finite() {
        return spec.default;
    }
    value.clamp(spec.min, spec.max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonotype_spec::{harmonics_from_values, score_map, TraitValues};

    fn scores_with(key: &str, value: f64) -> ScoreMap {
        let mut values = TraitValues::neutral();
        values.set(key, value).unwrap();
        score_map(&harmonics_from_values(&values))
    }

    #[test]
    fn test_neutral_scores_give_base_values() {
        let scores = scores_with("merry-serious", 0.0);
        for target in [
            Target::TempoBpm,
            Target::Swing,
            Target::StereoWidth,
            Target::FxSend,
            Target::FxDelayTime,
            Target::KickLevel,
            Target::CompThresholdDb,
            Target::CompRatio,
        ] {
            assert_eq!(derive(target, &scores), target.spec().base);
        }
    }

    #[test]
    fn test_tempo_is_monotone_in_merriness_and_clamped() {
        let mut last = 0.0;
        for i in 0..=40 {
            let v = -1.0 + i as f64 / 20.0;
            let bpm = derive(Target::TempoBpm, &scores_with("merry-serious", v));
            assert!(bpm >= 72.0 && bpm <= 132.0);
            assert!(bpm >= last, "tempo fell from {last} to {bpm} at {v}");
            last = bpm;
        }
        // The serious half of the axis does not slow the piece down.
        assert_eq!(derive(Target::TempoBpm, &scores_with("merry-serious", -1.0)), 96.0);
        assert_eq!(derive(Target::TempoBpm, &scores_with("merry-serious", 1.0)), 104.0);
    }

    #[test]
    fn test_swing_is_bounded_and_non_negative() {
        for key in ["process-result", "static-dynamic"] {
            for v in [-1.0, -0.3, 0.0, 0.4, 1.0] {
                let swing = derive(Target::Swing, &scores_with(key, v));
                assert!((0.0..=0.5).contains(&swing));
            }
        }
        let full = derive(Target::Swing, &scores_with("process-result", 1.0));
        assert!((full - 0.12).abs() < 1e-12);
    }

    #[test]
    fn test_width_narrows_for_democrats() {
        let wide = derive(Target::StereoWidth, &scores_with("democratic-aristocratic", 1.0));
        let narrow = derive(
            Target::StereoWidth,
            &scores_with("democratic-aristocratic", -1.0),
        );
        assert!((wide - 0.95).abs() < 1e-12);
        assert!((narrow - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_kick_level_responds_to_result_and_resolve() {
        let result_heavy = derive(Target::KickLevel, &scores_with("process-result", -1.0));
        assert!((result_heavy - 1.3).abs() < 1e-12);
        let decisive = derive(Target::KickLevel, &scores_with("judicious-decisive", -1.0));
        assert!((decisive - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_clamps_hold_at_extremes() {
        // Obstinacy drives both compressor routes at once.
        let scores = scores_with("yielding-obstinate", 1.0);
        assert_eq!(derive(Target::CompThresholdDb, &scores), -22.0);
        assert!((derive(Target::CompRatio, &scores) - 4.6).abs() < 1e-12);
    }
}
