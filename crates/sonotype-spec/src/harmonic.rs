//! The harmonic set derived from trait values.

use std::collections::BTreeMap;

use crate::traits::TRAITS;
use crate::values::TraitValues;

/// One trait's sinusoidal contribution, recomputed on every value change.
///
/// This is the input contract shared by the additive renderer, the
/// composer and the colorization path. Consumers must treat a zero-ish
/// harmonic as inert rather than erroring: amp and phase default to 0,
/// freq to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Harmonic {
    /// Originating trait key.
    pub key: &'static str,
    /// Originating trait name.
    pub name: &'static str,
    /// Raw trait score in [-1, 1].
    pub score: f64,
    /// Amplitude in [0, 1].
    pub amp: f64,
    /// Frequency ratio against the reference pitch.
    pub freq: f64,
    /// Phase offset in radians.
    pub phase: f64,
    /// Catalog declaration index; stable visual/voice identity.
    pub color_index: usize,
    /// Whether this trait is the one currently being edited.
    pub active: bool,
    /// Optional fixed stereo position in [-1, 1]; the composer derives
    /// one deterministically when absent.
    pub pan: Option<f64>,
}

/// Derives one harmonic per catalog trait, in declaration order.
pub fn harmonics_from_values(values: &TraitValues) -> Vec<Harmonic> {
    TRAITS
        .iter()
        .enumerate()
        .map(|(idx, t)| {
            let score = values.score(t.key);
            let params = t.to_harmonic(score);
            Harmonic {
                key: t.key,
                name: t.name,
                score,
                amp: params.amp,
                freq: params.freq,
                phase: params.phase,
                color_index: idx,
                active: false,
                pan: None,
            }
        })
        .collect()
}

/// Trait scores indexed by key, built from a harmonic set.
///
/// Missing keys and non-finite scores read as 0.0, which is the neutral
/// contribution everywhere scores are consumed.
#[derive(Debug, Clone, Default)]
pub struct ScoreMap {
    scores: BTreeMap<&'static str, f64>,
}

impl ScoreMap {
    /// Returns the score for a key, 0.0 when absent.
    pub fn get(&self, key: &str) -> f64 {
        self.scores.get(key).copied().unwrap_or(0.0)
    }
}

/// Collects finite scores from a harmonic set.
pub fn score_map(harmonics: &[Harmonic]) -> ScoreMap {
    let mut scores = BTreeMap::new();
    for h in harmonics {
        let s = if h.score.is_finite() { h.score } else { 0.0 };
        scores.insert(h.key, s);
    }
    ScoreMap { scores }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_order_is_color_index() {
        let harmonics = harmonics_from_values(&TraitValues::neutral());
        assert_eq!(harmonics.len(), TRAITS.len());
        for (idx, h) in harmonics.iter().enumerate() {
            assert_eq!(h.color_index, idx);
            assert_eq!(h.key, TRAITS[idx].key);
        }
    }

    #[test]
    fn test_neutral_harmonics_are_silent() {
        for h in harmonics_from_values(&TraitValues::neutral()) {
            assert_eq!(h.amp, 0.0);
            assert_eq!(h.phase, 0.0);
            assert!(h.freq >= 1.0);
        }
    }

    #[test]
    fn test_score_map_reads_back_scores() {
        let mut values = TraitValues::neutral();
        values.set("tactics-strategy", 0.75).unwrap();
        let harmonics = harmonics_from_values(&values);
        let scores = score_map(&harmonics);
        assert_eq!(scores.get("tactics-strategy"), 0.75);
        assert_eq!(scores.get("merry-serious"), 0.0);
        assert_eq!(scores.get("unknown"), 0.0);
    }
}
